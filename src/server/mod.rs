//! HTTP server for the v1 API
//!
//! An axum [`Router`](axum::Router) served on a tokio listener. hyper owns the
//! connection handling: keep-alive, framing and rejection of unparseable
//! requests.

pub mod config;
pub mod handlers;
pub mod routes;

pub use config::{ServerConfig, MAX_BODY_BYTES};
pub use routes::create_router;

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use log::{error, info};
use tokio::net::TcpListener;

use crate::core::GatewayEngine;
use crate::types::GatewayError;

/// The API server
pub struct Server {
    listener: TcpListener,
    router: Router,
}

impl Server {
    /// Bind the listener and build the router
    pub async fn bind(config: ServerConfig, engine: GatewayEngine) -> Result<Self, GatewayError> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        Ok(Self {
            listener,
            router: create_router(engine, config.request_timeout),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, GatewayError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until Ctrl-C
    pub async fn run(self) -> Result<(), GatewayError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("server: failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serve until `shutdown` completes, then drain open requests
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("server: listening on {}", self.local_addr()?);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("server: received shutdown signal");
            })
            .await?;

        info!("server: stopped");
        Ok(())
    }
}
