use dotenvy::dotenv;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;

use leadserver::{build_store, run_axum_server, AppConfig, AppState};

fn print_usage() {
    println!("Usage: leadserver [--config <path>]");
    println!();
    println!("Options:");
    println!("  --config <path>  TOML configuration file (default: leadserver.toml)");
    println!("  -h, --help       Show this help");
    println!();
    println!("Environment overrides use the LEADSERVER_ prefix, e.g. LEADSERVER_SERVER__PORT=9000.");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            "--config" => match iter.next() {
                Some(path) => config_path = Some(PathBuf::from(path)),
                None => anyhow::bail!("--config requires a path"),
            },
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("Run 'leadserver --help' for usage information");
                anyhow::bail!("unknown argument {other}");
            }
        }
    }

    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let config = AppConfig::load(config_path.as_deref())?;
    info!(
        "Starting {} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let store = build_store(&config)?;
    let state = Arc::new(AppState::new(config, store));

    if let Err(e) = run_axum_server(state).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }
    Ok(())
}
