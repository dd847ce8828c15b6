use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::atmospheres;
use crate::state::AppState;

/// Atmosphere routes mounted at `/atmospheres`.
///
/// ```text
/// GET    /                  -> list_atmospheres
/// POST   /                  -> create_atmosphere
/// POST   /active            -> set_active_atmosphere
/// DELETE /{name}            -> delete_atmosphere
/// POST   /{name}/interval   -> set_atmosphere_interval
/// POST   /{name}/themes     -> set_atmosphere_themes
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(atmospheres::list_atmospheres).post(atmospheres::create_atmosphere),
        )
        .route("/active", post(atmospheres::set_active_atmosphere))
        .route("/{name}", delete(atmospheres::delete_atmosphere))
        .route("/{name}/interval", post(atmospheres::set_atmosphere_interval))
        .route("/{name}/themes", post(atmospheres::set_atmosphere_themes))
}
