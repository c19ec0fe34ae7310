// CLI modules
mod cli;
mod state;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Device, Identity, Init, Invite, Password, Room, Version};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

command_enum! {
    (Device, Device),
    (Identity, Identity),
    (Init, Init),
    (Invite, Invite),
    (Password, Password),
    (Room, Room),
    (Version, Version),
}

/// Log to stderr so command output on stdout stays pipeable
fn init_logging(level: LevelFilter) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Use the configured level when a state directory exists
    let level = state::AppState::load(args.config_path.clone())
        .map(|state| state.config.level_filter())
        .unwrap_or(LevelFilter::WARN);
    init_logging(level);

    let ctx = cli::op::OpContext::new(args.config_path);

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
