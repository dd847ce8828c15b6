//! In-memory [`VideoProcess`] for tests.
//!
//! Counts live handles so tests can assert the single-session guarantee,
//! and writes scripted gray frames on screenshot so thumbnail retries can
//! be exercised without a real player.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{GrayImage, Luma};

use crate::error::PlayerError;
use crate::process::{PlayerHandle, VideoProcess};

/// Luma of frames written once the script is exhausted.
const DEFAULT_FRAME: u8 = 160;

#[derive(Default)]
struct Shared {
    live: AtomicUsize,
    spawned: Mutex<Vec<String>>,
    fail_next: AtomicBool,
    frames: Mutex<VecDeque<u8>>,
    screenshots: AtomicUsize,
    current: Mutex<Option<Arc<FakeHandle>>>,
}

/// Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct FakeVideoProcess {
    shared: Arc<Shared>,
}

impl FakeVideoProcess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles spawned and not yet terminated or killed.
    pub fn live_processes(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }

    pub fn spawn_count(&self) -> usize {
        self.shared.spawned.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn spawned_sources(&self) -> Vec<String> {
        self.shared.spawned.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn screenshot_count(&self) -> usize {
        self.shared.screenshots.load(Ordering::SeqCst)
    }

    /// Make the next spawn fail.
    pub fn fail_next_spawn(&self) {
        self.shared.fail_next.store(true, Ordering::SeqCst);
    }

    /// Luma values for the next screenshots, in order.
    pub fn queue_frames(&self, frames: &[u8]) {
        if let Ok(mut queue) = self.shared.frames.lock() {
            queue.extend(frames.iter().copied());
        }
    }

    /// Simulate the most recent player exiting on its own.
    pub fn kill_current(&self) {
        let current = self.shared.current.lock().ok().and_then(|c| c.clone());
        if let Some(handle) = current {
            handle.exit();
        }
    }
}

#[async_trait]
impl VideoProcess for FakeVideoProcess {
    async fn spawn(&self, _video_id: &str, source: &str) -> Result<Arc<dyn PlayerHandle>, PlayerError> {
        if let Ok(mut spawned) = self.shared.spawned.lock() {
            spawned.push(source.to_string());
        }
        if self.shared.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PlayerError::Spawn(format!("scripted failure for {source}")));
        }

        self.shared.live.fetch_add(1, Ordering::SeqCst);
        let handle = Arc::new(FakeHandle {
            alive: AtomicBool::new(true),
            shared: Arc::clone(&self.shared),
        });
        if let Ok(mut current) = self.shared.current.lock() {
            *current = Some(Arc::clone(&handle));
        }
        Ok(handle)
    }
}

pub struct FakeHandle {
    alive: AtomicBool,
    shared: Arc<Shared>,
}

impl FakeHandle {
    fn exit(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            self.shared.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl PlayerHandle for FakeHandle {
    async fn wait_ready(&self) -> Result<(), PlayerError> {
        if self.alive.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PlayerError::NotRunning)
        }
    }

    async fn focus(&self) -> Result<(), PlayerError> {
        Ok(())
    }

    async fn screenshot(&self, dest: &Path) -> Result<(), PlayerError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(PlayerError::NotRunning);
        }
        self.shared.screenshots.fetch_add(1, Ordering::SeqCst);
        let luma = self
            .shared
            .frames
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or(DEFAULT_FRAME);
        GrayImage::from_pixel(16, 16, Luma([luma])).save(dest)?;
        Ok(())
    }

    async fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn terminate(&self) -> Result<(), PlayerError> {
        self.exit();
        Ok(())
    }
}
