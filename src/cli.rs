use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "camera-linker")]
#[command(about = "Overlay by-camera and by-date symlink trees on recorder captures", long_about = None)]
pub struct Cli {
    /// Base name of the configuration file (any format the config crate reads)
    #[arg(short, long, global = true, default_value = camera_linker::config::DEFAULT_CONFIG_NAME)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create any missing links (default when no subcommand is given)
    Link,
    /// Print configuration values
    PrintConfig,
}
