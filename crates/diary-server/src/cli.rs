//! Command-line interface definition using clap.

use clap::Parser;

/// Diary gateway - routes diary input to storage or question answering
#[derive(Parser, Debug)]
#[command(name = "diary-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Host to bind to (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl Cli {
    /// Log level implied by the verbosity flag.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
