use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Media items are keyed by file name (images) or a URL-derived id (videos).
pub type ItemId = String;

/// Themes are keyed by their unique name.
pub type ThemeId = String;

/// Atmospheres are keyed by their unique name.
pub type AtmosphereId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Name of the theme that always exists and means "no theme filter".
pub const ALL_IMAGES_THEME: &str = "All Images";

/// Name of the second protected theme.
pub const EXTRAS_THEME: &str = "Extras";

/// Name of the atmosphere that always exists and means "show everything".
pub const ALL_ATMOSPHERE: &str = "All";

/// Default rotation interval for newly created themes and atmospheres.
pub const DEFAULT_GROUP_INTERVAL_SECS: u64 = 3600;

/// Image file extensions accepted by the media library.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Prefix of every registered video id.
pub const VIDEO_ID_PREFIX: &str = "video_";

/// What a media item is rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

/// Normalized crop rectangle (all values in `0.0..=1.0` of the source).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    /// A crop is valid when it has positive area and stays inside the source.
    pub fn is_valid(&self) -> bool {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        in_unit(self.x)
            && in_unit(self.y)
            && self.width > 0.0
            && self.height > 0.0
            && self.x + self.width <= 1.0 + f64::EPSILON
            && self.y + self.height <= 1.0 + f64::EPSILON
    }
}

/// A displayable item as seen by the selection resolver and the clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: ItemId,
    pub kind: MediaKind,
    pub enabled: bool,
    /// Empty means the item only shows up in unfiltered views.
    pub themes: BTreeSet<ThemeId>,
    /// File path for images, remote URL for videos.
    pub source_location: String,
    pub crop: Option<CropRect>,
}

impl MediaItem {
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

fn safe_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._ -]{0,254}$").expect("valid regex"))
}

/// Whether `id` can be used as a file name inside the media directory.
///
/// Rejects path separators, parent references and leading dots.
pub fn is_safe_item_id(id: &str) -> bool {
    safe_id_regex().is_match(id) && !id.contains("..")
}

/// Whether `file_name` has one of the accepted image extensions.
pub fn has_image_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Stable id for a video registered by URL.
///
/// The same URL always maps to the same id, so re-registering is idempotent.
pub fn video_id_for_url(url: &str) -> ItemId {
    let digest = Sha256::digest(url.trim().as_bytes());
    let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("{VIDEO_ID_PREFIX}{hex}")
}
