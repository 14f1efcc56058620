//! Web server implementation using axum

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use ddsweb_core::dds::Launcher;
use ddsweb_core::relay::Relay;

use crate::config::Settings;

use super::page::{self, PageState};
use super::socket::{self, SOCKET_PATH};

/// Web server for browser control
pub struct WebServer<L> {
    settings: Settings,
    relay: Arc<Relay<L>>,
}

impl<L: Launcher + 'static> WebServer<L> {
    /// Create a new web server
    pub fn new(settings: Settings, relay: Arc<Relay<L>>) -> Self {
        Self { settings, relay }
    }

    /// Build the router: the socket route plus the page on every other path
    pub fn router(&self) -> Router {
        let page_state = Arc::new(PageState {
            path: self.settings.web.page.clone(),
        });

        let page_routes = Router::new()
            .fallback(page::serve_page)
            .with_state(page_state);

        Router::new()
            .route(SOCKET_PATH, get(socket::upgrade::<L>))
            .with_state(self.relay.clone())
            .merge(page_routes)
            .layer(TraceLayer::new_for_http())
    }

    /// Bind on all interfaces at the configured port and serve
    pub async fn run(self) -> Result<()> {
        let port = self.settings.web.port;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let app = self.router();

        tracing::info!(
            "Web server starting on http://{} (page {:?}, {:?} sessions)",
            listener.local_addr()?,
            self.settings.web.page,
            self.relay.sessions().scope(),
        );

        axum::serve(listener, app).await.context("Web server failed")?;

        Ok(())
    }
}
