//! `mpv`-backed [`VideoProcess`].
//!
//! Each player gets its own JSON IPC socket under `ipc_dir`; screenshots are
//! requested over that socket with `screenshot-to-file`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::error::PlayerError;
use crate::process::{PlayerHandle, VideoProcess};

/// How long to wait for the IPC socket after spawning.
const READY_TIMEOUT: Duration = Duration::from_secs(15);

const READY_POLL: Duration = Duration::from_millis(100);

/// Grace period between kill and reap.
const TERMINATE_TIMEOUT: Duration = Duration::from_secs(3);

/// Timeout for a single IPC request or focus command.
const IPC_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct MpvConfig {
    /// Player executable (default `mpv`).
    pub binary: String,
    /// Directory for per-player IPC sockets.
    pub ipc_dir: PathBuf,
    /// Optional command run after start to raise the window, e.g.
    /// `["wmctrl", "-a", "mpv"]`.
    pub focus_command: Option<Vec<String>>,
}

pub struct MpvProcess {
    config: MpvConfig,
}

impl MpvProcess {
    pub fn new(config: MpvConfig) -> Self {
        Self { config }
    }

    fn args(source: &str, socket: &Path) -> Vec<String> {
        vec![
            "--fullscreen".into(),
            "--no-terminal".into(),
            "--no-osc".into(),
            "--loop-file=inf".into(),
            "--force-window=immediate".into(),
            format!("--input-ipc-server={}", socket.display()),
            source.to_string(),
        ]
    }
}

#[async_trait]
impl VideoProcess for MpvProcess {
    async fn spawn(&self, video_id: &str, source: &str) -> Result<Arc<dyn PlayerHandle>, PlayerError> {
        tokio::fs::create_dir_all(&self.config.ipc_dir).await?;
        let socket = self.config.ipc_dir.join(format!("{video_id}.sock"));
        let _ = tokio::fs::remove_file(&socket).await;

        let child = Command::new(&self.config.binary)
            .args(Self::args(source, &socket))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlayerError::Spawn(format!("{}: {e}", self.config.binary)))?;

        tracing::info!(video_id, pid = ?child.id(), socket = %socket.display(), "Spawned mpv");

        Ok(Arc::new(MpvHandle {
            child: Mutex::new(child),
            socket,
            focus_command: self.config.focus_command.clone(),
        }))
    }
}

pub struct MpvHandle {
    child: Mutex<Child>,
    socket: PathBuf,
    focus_command: Option<Vec<String>>,
}

impl MpvHandle {
    /// Send one IPC command and return its `data` field.
    async fn request(&self, command: Value) -> Result<Value, PlayerError> {
        tokio::time::timeout(IPC_TIMEOUT, self.exchange(command))
            .await
            .map_err(|_| PlayerError::Ipc("timed out".into()))?
    }

    async fn exchange(&self, command: Value) -> Result<Value, PlayerError> {
        let stream = UnixStream::connect(&self.socket)
            .await
            .map_err(|e| PlayerError::Ipc(format!("connect: {e}")))?;
        let (read, mut write) = stream.into_split();

        let mut line = serde_json::to_vec(&json!({ "command": command }))
            .map_err(|e| PlayerError::Ipc(e.to_string()))?;
        line.push(b'\n');
        write.write_all(&line).await?;

        // mpv interleaves event lines; the reply is the first line with an
        // `error` field.
        let mut lines = BufReader::new(read).lines();
        while let Some(line) = lines.next_line().await? {
            let Ok(reply) = serde_json::from_str::<Value>(&line) else {
                continue;
            };
            let Some(status) = reply.get("error").and_then(Value::as_str) else {
                continue;
            };
            if status != "success" {
                return Err(PlayerError::Ipc(status.to_string()));
            }
            return Ok(reply.get("data").cloned().unwrap_or(Value::Null));
        }
        Err(PlayerError::Ipc("socket closed before reply".into()))
    }
}

#[async_trait]
impl PlayerHandle for MpvHandle {
    async fn wait_ready(&self) -> Result<(), PlayerError> {
        let deadline = tokio::time::Instant::now() + READY_TIMEOUT;
        loop {
            if let Some(status) = self.child.lock().await.try_wait()? {
                return Err(PlayerError::Spawn(format!("mpv exited during startup ({status})")));
            }
            if tokio::fs::try_exists(&self.socket).await.unwrap_or(false) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(PlayerError::Spawn("mpv IPC socket never appeared".into()));
            }
            tokio::time::sleep(READY_POLL).await;
        }
    }

    async fn focus(&self) -> Result<(), PlayerError> {
        let Some((program, args)) = self.focus_command.as_ref().and_then(|c| c.split_first()) else {
            return Ok(());
        };
        let output = tokio::time::timeout(IPC_TIMEOUT, Command::new(program).args(args).output())
            .await
            .map_err(|_| PlayerError::Spawn(format!("{program} timed out")))??;
        if !output.status.success() {
            return Err(PlayerError::Spawn(format!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    async fn screenshot(&self, dest: &Path) -> Result<(), PlayerError> {
        if !self.is_alive().await {
            return Err(PlayerError::NotRunning);
        }
        let dest = dest.to_string_lossy().into_owned();
        self.request(json!(["screenshot-to-file", dest, "video"])).await?;
        Ok(())
    }

    async fn is_alive(&self) -> bool {
        matches!(self.child.lock().await.try_wait(), Ok(None))
    }

    async fn terminate(&self) -> Result<(), PlayerError> {
        let mut child = self.child.lock().await;
        if child.try_wait()?.is_none() {
            child.start_kill()?;
            match tokio::time::timeout(TERMINATE_TIMEOUT, child.wait()).await {
                Ok(status) => {
                    tracing::debug!(status = ?status.ok(), "mpv exited");
                }
                Err(_) => tracing::warn!(pid = ?child.id(), "mpv did not exit after kill"),
            }
        }
        let _ = tokio::fs::remove_file(&self.socket).await;
        Ok(())
    }
}
