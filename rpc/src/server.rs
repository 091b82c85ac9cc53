//! Axum-based RPC server.

use axum::routing::{get, post};
use axum::Router;
use blam_engine::{CancelToken, PolicyEngine};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::error::RpcError;
use crate::handlers::{self, AppState};

pub struct RpcServer {
    pub port: u16,
    state: AppState,
}

impl RpcServer {
    pub fn new(port: u16, engine: Arc<PolicyEngine>, cancel: CancelToken) -> Self {
        Self {
            port,
            state: AppState { engine, cancel },
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/stats", get(handlers::stats))
            .route("/commands", post(handlers::run_command))
            .route("/slash/blam", post(handlers::slash_blam))
            .route("/slash/idv", post(handlers::slash_idv))
            .route("/events/member-joined", post(handlers::member_joined))
            .route("/channels/:id", get(handlers::channel_policy))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {addr}: {e}")))?;
        tracing::info!("RPC server listening on {addr}");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;

        tracing::info!("RPC server stopped");
        Ok(())
    }
}
