pub mod api;
pub mod assets;

use crate::agent::TravelAgent;
use axum::{ middleware, routing::{ any, get }, Router };
use governor::{ DefaultDirectRateLimiter, Quota, RateLimiter };
use log::{ error, info };
use std::error::Error;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{ Any, CorsLayer };

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<TravelAgent>,
    pub public_dir: Arc<PathBuf>,
    pub limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl AppState {
    /// `requests_per_second` of `None` leaves the API unthrottled.
    pub fn new(agent: TravelAgent, public_dir: PathBuf, requests_per_second: Option<NonZeroU32>) -> Self {
        let limiter = requests_per_second.map(|rate| Arc::new(RateLimiter::direct(Quota::per_second(rate))));
        Self {
            agent: Arc::new(agent),
            public_dir: Arc::new(public_dir),
            limiter,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(api::AGENT.path, any(api::agent_handler))
        .route(api::AGENT_BARE.path, any(api::agent_bare_handler))
        .route(api::CHAT.path, any(api::chat_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), api::rate_limit));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes)
        .fallback(get(assets::serve_static))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert_path: String,
    pub key_path: String,
}

pub struct Server {
    addr: String,
    state: AppState,
    tls: Option<TlsPaths>,
}

impl Server {
    pub fn new(addr: String, state: AppState, tls: Option<TlsPaths>) -> Self {
        Self { addr, state, tls }
    }

    pub async fn run(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let app = router(self.state);

        match self.tls {
            Some(tls) => {
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    tls.cert_path,
                    tls.key_path
                );
                let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                    &tls.cert_path,
                    &tls.key_path
                ).await?;

                info!("Travel agent server is running at https://{}", addr);
                axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
            }
            None => {
                let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                    error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
                    e
                })?;
                info!("Travel agent server is running at http://{}", addr);
                axum::serve(listener, app.into_make_service()).await?;
            }
        }

        Ok(())
    }
}
