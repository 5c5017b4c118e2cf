//! HTTP surface of the compost ledger

mod admin_handlers;
mod error;
mod event_handlers;
mod income_handlers;
mod payout_handlers;
mod routes;
mod state;
mod token_handlers;

pub use error::{ApiError, ApiResult};
pub use event_handlers::MAX_EVENTS_PER_PAGE;
pub use income_handlers::MAX_PERIODS_PER_PAGE;
pub use state::ApiState;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing as log;

/// Build the application router with CORS and request tracing
pub fn create_app(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    routes::create_routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn start_server(addr: SocketAddr, state: ApiState) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Compost API listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
