pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tandem")]
#[command(about = "Manage Tandem identities, devices and room invites")]
pub struct Args {
    /// Path to the tandem config directory (defaults to ~/.tandem)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
