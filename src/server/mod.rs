pub mod routes;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the HTTP surface over shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/session",
            post(routes::create_session).delete(routes::delete_session),
        )
        .route("/status", get(routes::status))
        .route("/signup", post(routes::signup))
        .route("/login", post(routes::login))
        .route("/logout", post(routes::logout))
        .route("/image", post(routes::apply_image_filter))
        .route("/videos", get(routes::list_videos))
        .route("/videos/play", post(routes::play_video))
        .route("/recharge", post(routes::recharge))
        .route("/recharge/packages", get(routes::recharge_packages))
        .route("/chat/simple", post(routes::simple_chat))
        .route("/chat/assistant", post(routes::assistant_chat))
        .route("/chat/history", get(routes::chat_history))
        .route("/chat/clear", post(routes::clear_chat))
        .route(
            "/chat/api-key",
            get(routes::api_key).put(routes::set_api_key),
        )
        .route("/flags/:name/toggle", post(routes::toggle_flag))
        .route(
            "/reveal",
            get(routes::revealed_text).post(routes::reveal_text),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct AppServer {
    state: Arc<AppState>,
    sweep_interval: Duration,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl AppServer {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            shutdown_tx: None,
        }
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub async fn start(&mut self, addr: SocketAddr) -> Result<SocketAddr> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.shutdown_tx = Some(tx);

        let app = router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Server starting on {}", local_addr);

        let server = axum::serve(listener, app.into_make_service()).into_future();

        // Idle sessions are swept for as long as the server runs
        let sessions = self.state.sessions.clone();
        let mut tick = tokio::time::interval(self.sweep_interval);
        let sweeper = async move {
            loop {
                tick.tick().await;
                sessions.sweep_idle().await;
            }
        };

        tokio::spawn(async move {
            tokio::select! {
                result = server => {
                    if let Err(e) = result {
                        tracing::error!("Server error: {}", e);
                    }
                },
                _ = sweeper => {},
                _ = rx => {
                    tracing::info!("Server shutting down");
                }
            }
        });

        Ok(local_addr)
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        Ok(())
    }
}
