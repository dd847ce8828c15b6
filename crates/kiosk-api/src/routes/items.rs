use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::items;
use crate::state::AppState;

/// Item routes mounted at `/items`.
///
/// ```text
/// GET    /                -> list_items
/// DELETE /{id}            -> delete_item
/// POST   /{id}/toggle     -> toggle_item
/// POST   /{id}/themes     -> set_item_themes
/// POST   /{id}/crop       -> set_item_crop
/// DELETE /{id}/crop       -> clear_item_crop
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(items::list_items))
        .route("/{id}", delete(items::delete_item))
        .route("/{id}/toggle", post(items::toggle_item))
        .route("/{id}/themes", post(items::set_item_themes))
        .route(
            "/{id}/crop",
            post(items::set_item_crop).delete(items::clear_item_crop),
        )
}
