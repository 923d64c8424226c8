use clap::Parser;
use foxhole_relay::{Relay, RelayConfig};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match RelayConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => RelayConfig::default(),
    };
    config.apply_env();
    args.apply(&mut config);

    ::log::info!(
        "Relaying pages from {} to native host {}",
        config.webdriver_url,
        config.host_name
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            ::log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    if let Err(e) = Relay::new().with_config(config).run(shutdown).await {
        ::log::error!("Relay failed: {}", e);
        std::process::exit(1);
    }
}
