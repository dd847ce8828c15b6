//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// `?enabled_only=` on item listings.
///
/// `true` returns the resolved selection in display order; `false` (the
/// default) returns the whole catalog sorted by id.
#[derive(Debug, Default, Deserialize)]
pub struct EnabledOnlyParams {
    #[serde(default)]
    pub enabled_only: bool,
}
