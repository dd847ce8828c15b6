//! Still-frame capture for video thumbnails.
//!
//! Wait for the player to warm up, grab a frame, and reject it when it is
//! too dark (fade-ins, black intros). Retries are bounded; after the last
//! one the frame is kept whatever it looks like.

use std::path::{Path, PathBuf};
use std::time::Duration;

use image::GrayImage;

use crate::error::PlayerError;
use crate::process::PlayerHandle;

#[derive(Debug, Clone)]
pub struct ThumbnailPolicy {
    /// Delay between `Playing` and the first capture.
    pub warm_up: Duration,
    /// Delay before each retry.
    pub retry_delay: Duration,
    /// Retries after the first capture.
    pub max_retries: u32,
    /// Mean luma (0-255) below which a frame counts as dark.
    pub darkness_threshold: f64,
}

impl Default for ThumbnailPolicy {
    fn default() -> Self {
        Self {
            warm_up: Duration::from_secs(20),
            retry_delay: Duration::from_secs(5),
            max_retries: 2,
            darkness_threshold: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub path: PathBuf,
    /// Total captures taken, including the accepted one.
    pub attempts: u32,
    pub luminance: f64,
    /// True when the retries ran out on a dark frame.
    pub dark: bool,
}

/// Mean luma of an 8-bit grayscale image. Empty images count as black.
pub fn mean_luminance(image: &GrayImage) -> f64 {
    let pixels = image.as_raw();
    if pixels.is_empty() {
        return 0.0;
    }
    let sum: u64 = pixels.iter().map(|&p| u64::from(p)).sum();
    sum as f64 / pixels.len() as f64
}

/// Decode `path` and return its mean luma.
pub fn file_luminance(path: &Path) -> Result<f64, PlayerError> {
    let image = image::open(path)?.to_luma8();
    Ok(mean_luminance(&image))
}

/// Where attempts are written before one is accepted: `<id>.tmp.jpg`
/// next to `dest`. The extension stays last so the player and the decoder
/// still pick the format from it.
pub fn staging_path(dest: &Path) -> PathBuf {
    dest.with_extension("tmp.jpg")
}

/// Run the capture loop against a live player.
///
/// Attempts go to [`staging_path`]; only the accepted frame is renamed to
/// `dest`, so `dest` never holds a frame that is still being retried.
/// Screenshot or decode failures abort the capture; the caller logs them,
/// removes the staging file and playback carries on.
pub async fn capture(handle: &dyn PlayerHandle, dest: &Path, policy: &ThumbnailPolicy) -> Result<Capture, PlayerError> {
    tokio::time::sleep(policy.warm_up).await;

    let staging = staging_path(dest);
    let mut attempts = 0;
    loop {
        attempts += 1;
        handle.screenshot(&staging).await?;
        let luminance = file_luminance(&staging)?;
        let dark = luminance < policy.darkness_threshold;

        if !dark || attempts > policy.max_retries {
            if dark {
                tracing::warn!(
                    path = %dest.display(),
                    attempts,
                    luminance,
                    "Keeping dark thumbnail after exhausting retries"
                );
            }
            tokio::fs::rename(&staging, dest).await?;
            return Ok(Capture {
                path: dest.to_path_buf(),
                attempts,
                luminance,
                dark,
            });
        }

        tracing::debug!(path = %dest.display(), attempts, luminance, "Thumbnail too dark, retrying");
        tokio::time::sleep(policy.retry_delay).await;
    }
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    #[test]
    fn mean_of_uniform_image() {
        let image = GrayImage::from_pixel(4, 4, Luma([100]));
        assert_eq!(mean_luminance(&image), 100.0);
    }

    #[test]
    fn mean_of_half_black_half_white() {
        let mut image = GrayImage::from_pixel(2, 1, Luma([0]));
        image.put_pixel(1, 0, Luma([255]));
        assert_eq!(mean_luminance(&image), 127.5);
    }

    #[test]
    fn empty_image_is_black() {
        assert_eq!(mean_luminance(&GrayImage::new(0, 0)), 0.0);
    }

    #[test]
    fn reads_luminance_from_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        GrayImage::from_pixel(8, 8, Luma([42])).save(&path).unwrap();
        assert_eq!(file_luminance(&path).unwrap(), 42.0);
    }

    #[test]
    fn staging_path_keeps_the_image_extension() {
        let dest = Path::new("/thumbs/video_ab12.jpg");
        assert_eq!(staging_path(dest), Path::new("/thumbs/video_ab12.tmp.jpg"));
    }
}
