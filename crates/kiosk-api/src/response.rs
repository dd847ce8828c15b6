//! Shared response envelope types for API handlers.
//!
//! Management endpoints answer with a `{ "data": ... }` envelope. The
//! display protocol (`/api/items`, `/api/control/*`, `/api/videos/status`)
//! keeps the bare shapes the display client expects.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: themes }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
