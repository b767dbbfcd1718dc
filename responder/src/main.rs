//! Sampling reset responder
//!
//! Listens on the agent sampling port and answers every poll with a fixed
//! probabilistic strategy, resetting tracing clients to the default rate.

use anyhow::{Context, Result};
use clap::Parser;
use sampreset_responder::{
    server::{http, tcp},
    RenderedResponse, ResponderConfig,
};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "sampreset")]
#[command(about = "Serve a fixed sampling strategy to reset tracing clients", long_about = None)]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the port of --bind)
    #[arg(short, long)]
    port: Option<u16>,

    /// Full listen address
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Serve /healthz and /metrics on this address
    #[arg(long)]
    admin_addr: Option<SocketAddr>,

    /// How long to wait for a request before answering anyway (e.g. "5s", "500ms")
    #[arg(long)]
    read_timeout: Option<String>,

    /// Upper bound on writing a response (e.g. "5s")
    #[arg(long)]
    write_timeout: Option<String>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Layer CLI flags over `config` (normally the environment-derived one)
    fn into_config(self, mut config: ResponderConfig) -> Result<ResponderConfig> {
        if let Some(bind) = self.bind {
            config.listen_addr = bind;
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if let Some(admin_addr) = self.admin_addr {
            config.admin_addr = Some(admin_addr);
        }
        if let Some(ref s) = self.read_timeout {
            config.read_timeout = sampreset_shared::utils::parse_duration(s)
                .context("Failed to parse read timeout")?;
        }
        if let Some(ref s) = self.write_timeout {
            config.write_timeout = sampreset_shared::utils::parse_duration(s)
                .context("Failed to parse write timeout")?;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref(), args.verbose);

    let config = args.into_config(ResponderConfig::default())?;
    info!("Configuration: {:?}", config);

    let response = RenderedResponse::reset_default().context("Failed to render response")?;
    let listener = tcp::bind(config.listen_addr).await?;

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    if let Some(admin_addr) = config.admin_addr {
        let admin_listener = std::net::TcpListener::bind(admin_addr)
            .with_context(|| format!("Failed to bind admin address {}", admin_addr))?;
        let admin_shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = http::serve_admin(admin_listener, admin_shutdown).await {
                warn!("Admin HTTP server error: {}", e);
            }
        });
    }

    tcp::serve(listener, response, (&config).into(), shutdown).await;
    info!("Sampling responder stopped");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: Option<&str>, verbose: bool) {
    let default_level = match (log_level, verbose) {
        (Some(level), _) => level,
        (None, true) => "debug",
        (None, false) => "info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Cancel `shutdown` on SIGINT or SIGTERM
async fn wait_for_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Signal received");
    shutdown.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn env_config() -> ResponderConfig {
        ResponderConfig::from_lookup(|key| match key {
            "SAMPRESET_LISTEN" => Some("127.0.0.1:6000".to_string()),
            "SAMPRESET_READ_TIMEOUT" => Some("2s".to_string()),
            _ => None,
        })
    }

    #[test]
    fn test_port_overrides_bind_port() {
        let args = Args::try_parse_from(["sampreset", "--bind", "127.0.0.2:7000", "--port", "7001"])
            .unwrap();
        let config = args.into_config(env_config()).unwrap();
        assert_eq!(config.listen_addr.to_string(), "127.0.0.2:7001");
    }

    #[test]
    fn test_cli_overrides_env() {
        let args = Args::try_parse_from(["sampreset", "-p", "7002", "--read-timeout", "750ms"])
            .unwrap();
        let config = args.into_config(env_config()).unwrap();
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:7002");
        assert_eq!(config.read_timeout, Duration::from_millis(750));
    }

    #[test]
    fn test_env_kept_without_flags() {
        let args = Args::try_parse_from(["sampreset"]).unwrap();
        let config = args.into_config(env_config()).unwrap();
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:6000");
        assert_eq!(config.read_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_cli_timeouts_rejected() {
        let args = Args::try_parse_from(["sampreset", "--write-timeout", "0s"]).unwrap();
        assert!(args.into_config(env_config()).is_err());

        let args =
            Args::try_parse_from(["sampreset", "--read-timeout", "18446744073709551615"]).unwrap();
        assert!(args.into_config(env_config()).is_err());
    }
}
