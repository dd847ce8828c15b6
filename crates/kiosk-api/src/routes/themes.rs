use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::themes;
use crate::state::AppState;

/// Theme routes mounted at `/themes`.
///
/// ```text
/// GET    /                  -> list_themes
/// POST   /                  -> create_theme
/// POST   /active            -> set_active_theme
/// DELETE /{name}            -> delete_theme
/// POST   /{name}/interval   -> set_theme_interval
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(themes::list_themes).post(themes::create_theme))
        .route("/active", post(themes::set_active_theme))
        .route("/{name}", delete(themes::delete_theme))
        .route("/{name}/interval", post(themes::set_theme_interval))
}
