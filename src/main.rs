use clap::Parser;
use payoff::config::{Cli, Command};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(config) => {
            if let Err(e) = payoff::telemetry::init(&config.log_level) {
                eprintln!("Telemetry error: {e}");
                std::process::exit(1);
            }
            let addr = match config.socket_addr() {
                Ok(addr) => addr,
                Err(e) => {
                    eprintln!("Configuration error: {e}");
                    std::process::exit(2);
                }
            };
            if let Err(e) = payoff::api::run_http_server(addr).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
    }
}
