use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ddsweb::config::{Config, Settings};
use ddsweb::web::WebServer;
use ddsweb_core::dds::ProcessLauncher;
use ddsweb_core::relay::Relay;
use ddsweb_core::session::SessionStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging
    setup_logging(cli.debug);

    // Load settings
    let mut settings = Settings::load(cli.config.as_ref())?;
    settings.merge_cli(&cli);
    settings.validate();

    let relay = Relay::new(
        SessionStore::new(settings.session.scope, settings.session.defaults.clone()),
        settings.dds.options(),
        ProcessLauncher::new(settings.dds.timeout()),
    );

    WebServer::new(settings, Arc::new(relay)).run().await
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("ddsweb=debug,ddsweb_core=debug,tower_http=debug")
    } else {
        EnvFilter::new("ddsweb=info,ddsweb_core=info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
