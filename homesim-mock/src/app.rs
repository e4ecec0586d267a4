use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handles::*;
use crate::simulate::SharedHome;

pub fn create_app(home: SharedHome) -> Router {
    let device = Router::new()
        .route("/:device_id", get(get_device))
        .route("/:device_id/set", post(set_device))
        .route("/:device_id/toggle", get(toggle_device))
        .route("/:device_id/turn-on", get(turn_on_device))
        .route("/:device_id/turn-off", get(turn_off_device))
        .with_state(DeviceState { home: home.clone() });

    Router::new()
        .route("/devices", get(get_devices))
        .with_state(DeviceState { home })
        .nest("/device", device)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
