use clap::{Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(
    name = "payoff",
    about = "Debt payoff projection and strategy simulation service",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API backed by an in-memory store
    Serve(ServeConfig),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeConfig {
    #[arg(long, env = "PAYOFF_HOST", default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, env = "PAYOFF_PORT", default_value_t = 8080)]
    pub port: u16,
    /// Used when RUST_LOG is unset
    #[arg(long, env = "PAYOFF_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("host must be an IPv4/IPv6 address or localhost, got '{host}'")]
    InvalidHost {
        host: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

impl ServeConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost {
                host: self.host.clone(),
                source,
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
