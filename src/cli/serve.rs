use std::net::SocketAddr;

use crate::{config::Config, error, info, server, success, warning};

/// Starts the gateway and keeps it running.
///
/// Configuration problems are fatal here, before any socket is bound. With
/// `open`, the login entry point is opened in the default browser once the
/// listener is up.
pub async fn serve(addr: Option<SocketAddr>, open: bool) {
    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("Cannot start spotgate. Err: {}", e),
    };
    if let Some(addr) = addr {
        config.server_addr = addr;
    }

    info!("Starting spotgate on http://{}", config.server_addr);

    let result = server::start_api_server(config, |config| {
        let login_url = config.login_url();
        success!("Ready. Sign in at {}", login_url);

        if open && webbrowser::open(&login_url).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                login_url
            )
        }
    })
    .await;

    if let Err(e) = result {
        error!("Server stopped. Err: {}", e);
    }
}
