pub mod atmospheres;
pub mod control;
pub mod day;
pub mod health;
pub mod items;
pub mod kiosk;
pub mod settings;
pub mod test_mode;
pub mod themes;
pub mod videos;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                  WebSocket push channel (?role=display|controller)
///
/// /items                               list (?enabled_only=)
/// /items/{id}                          delete
/// /items/{id}/toggle                   enable/disable (POST)
/// /items/{id}/themes                   set theme set (POST)
/// /items/{id}/crop                     set (POST), clear (DELETE)
///
/// /settings                            get, save partial document (POST)
///
/// /themes                              list, create
/// /themes/active                       switch active theme (POST)
/// /themes/{name}                       delete
/// /themes/{name}/interval              set interval (POST)
///
/// /atmospheres                         list, create
/// /atmospheres/active                  set or clear active atmosphere (POST)
/// /atmospheres/{name}                  delete
/// /atmospheres/{name}/interval         set interval (POST)
/// /atmospheres/{name}/themes           set theme refs (POST)
///
/// /day/status                          schedule overview
/// /day/enable                          enable day scheduling (POST)
/// /day/disable                         disable day scheduling (POST)
/// /day/time-periods/{slot}             assign atmospheres (POST)
///
/// /control/send                        send remote command (POST)
/// /control/poll                        collect pending command
///
/// /videos                              list, register
/// /videos/{id}                         delete
/// /videos/play                         start playback (POST)
/// /videos/stop                         stop playback (POST)
/// /videos/status                       playback status
///
/// /kiosk/current-image                 get, report
/// /debug/log                           append (POST)
/// /debug/messages                      list
/// /debug/clear                         clear (POST)
///
/// /test/status                         clock status
/// /test/enable                         (POST)
/// /test/disable                        (POST)
/// /test/time                           pin mock time (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/items", items::router())
        .nest("/settings", settings::router())
        .nest("/themes", themes::router())
        .nest("/atmospheres", atmospheres::router())
        .nest("/day", day::router())
        .nest("/control", control::router())
        .nest("/videos", videos::router())
        .nest("/kiosk", kiosk::kiosk_router())
        .nest("/debug", kiosk::debug_router())
        .nest("/test", test_mode::router())
}
