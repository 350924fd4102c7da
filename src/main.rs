use std::net::SocketAddr;
use std::sync::Arc;

use chefcito_relay::{
    init_tracing, AppConfig, ConversationRelay, GeminiClient, RelayServer, SessionRegistry,
};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match std::env::var("CHEFCITO_CONFIG") {
        Ok(path) => match AppConfig::from_env_or_file(&path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("failed to read config {path}: {err}");
                std::process::exit(1);
            }
        },
        Err(_) => AppConfig::from_env(),
    };

    if let Err(err) = init_tracing(&config.logging) {
        eprintln!("{err}");
        std::process::exit(1);
    }

    if let Err(err) = config.validate() {
        error!("{err}");
        std::process::exit(1);
    }

    let provider = match GeminiClient::from_config(&config.model) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            error!("failed to build completion provider: {err}");
            std::process::exit(1);
        }
    };

    let relay = ConversationRelay::new(
        SessionRegistry::new(),
        provider,
        config.model.model.clone(),
        config.model.timeout(),
    );
    info!(model = %config.model.model, "relay ready");

    let addr: SocketAddr = match format!("{}:{}", config.server.host, config.server.port).parse() {
        Ok(addr) => addr,
        Err(err) => {
            error!("invalid bind address: {err}");
            std::process::exit(1);
        }
    };

    let server = RelayServer::new(Arc::new(relay)).with_strict_status(config.server.strict_status);
    if let Err(err) = server.serve(addr).await {
        error!("server error: {err}");
        std::process::exit(1);
    }
}
