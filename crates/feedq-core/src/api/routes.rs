//! Router assembly and the HTTP server loop.

use std::net::SocketAddr;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{Error, Result};

use super::auth::require_basic_auth;
use super::handlers;
use super::state::ApiState;

/// Build the CORS layer from the configured origin list. Unparseable
/// origins are logged and skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Create the router with every route behind Basic auth.
pub fn create_router(state: ApiState, cors_allow_origins: &[String]) -> Router {
    Router::new()
        .route("/rss", get(handlers::list_entries))
        .route("/rss/{id}", put(handlers::update_entry))
        .route(
            "/rss/queue",
            get(handlers::queue_count).put(handlers::reject_reserved_id),
        )
        .route("/rss/queue/next", get(handlers::next_unviewed))
        .route(
            "/rss/viewed",
            post(handlers::mark_all_viewed).put(handlers::reject_reserved_id),
        )
        .route("/checkauth", post(handlers::check_auth))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_allow_origins))
        .with_state(state)
}

/// Serve `router` on an already bound listener until `shutdown` flips to
/// true (or its sender is dropped), then drain in-flight requests.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow_and_update() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
            tracing::info!("API server shutting down");
        })
        .await
        .map_err(|e| Error::Other(format!("Server error: {}", e)))?;

    Ok(())
}

/// Bind `0.0.0.0:port` and serve until shutdown.
pub async fn start_server(
    port: u16,
    router: Router,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Other(format!("Failed to bind {}: {}", addr, e)))?;
    serve(listener, router, shutdown).await
}
