//! ircordd - an IRC gateway to a Discord-style chat service.
//!
//! Accepts plain IRC connections and bridges them onto remote-service
//! sessions: authenticate with `PASS <token>[:<guildID>]`, then JOIN and
//! PRIVMSG the guild's channels as if they were IRC channels.

mod config;
mod error;
mod gateway;
mod remote;
mod render;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::gateway::Client;
use crate::remote::memory::MemoryConnector;
use crate::remote::SessionMap;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ircord.toml".to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).map_err(|e| {
            error!(path = %config_path, error = %e, "Failed to load config");
            e
        })?
    } else {
        Config::default()
    };

    info!(server = %config.server.name, "Starting ircordd");

    // In-memory backend; every token gets a fixed single-guild world.
    let sessions = Arc::new(SessionMap::new(Box::new(|token| {
        Ok(MemoryConnector::shared(token))
    })));

    let listener = tokio::net::TcpListener::bind(config.listen.address).await?;
    info!(address = %config.listen.address, "Listening for IRC connections");

    loop {
        let (stream, peer) = listener.accept().await?;
        info!(peer = %peer, "Accepted connection");
        let client = Client::new(
            stream,
            config.server.name.clone(),
            &peer.to_string(),
            Arc::clone(&sessions),
        );
        tokio::spawn(async move {
            if let Err(e) = client.run().await {
                warn!(error = %e, code = e.error_code(), "Connection ended with error");
            }
        });
    }
}
