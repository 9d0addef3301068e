//! Router assembly and the serve loop.

use crate::config::ServeConfig;
use crate::error::{GateError, Result};
use crate::gate::{AccessGate, enforce};
use crate::site::{SiteDir, serve_site};
use axum::Router;
use axum::middleware::from_fn_with_state;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Put `inner` behind the access gate. Every request, including fallbacks, hits the gate first.
pub fn gated(inner: Router, gate: Arc<AccessGate>) -> Router {
    inner.layer(from_fn_with_state(gate, enforce))
}

/// The full application: gate in front of the static site.
pub fn app(gate: Arc<AccessGate>, site: Arc<SiteDir>) -> Router {
    gated(Router::new().fallback(serve_site).with_state(site), gate)
}

/// A bound listener plus the application it will serve.
pub struct Server {
    listener: TcpListener,
    app: Router,
}

impl Server {
    /// Build the gate from `config` and bind the listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the gate configuration is invalid or the address cannot be bound.
    pub async fn bind(config: ServeConfig) -> Result<Self> {
        let gate = Arc::new(AccessGate::new(config.gate)?);
        let site = Arc::new(SiteDir::new(config.site_dir));
        let listener = TcpListener::bind(config.bind)
            .await
            .map_err(|e| GateError::Startup(format!("bind {}: {e}", config.bind)))?;
        Ok(Self {
            listener,
            app: app(gate, site),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the listener's local address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying accept loop fails.
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
