//! Fresar CLI — CAM settings persistence.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "fresar",
    version,
    about = "Rust-native CAM settings persistence — layered defaults, ordinal references, toolpath provenance"
)]
struct Cli {
    #[command(subcommand)]
    command: fresar::cli::Commands,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = fresar::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
