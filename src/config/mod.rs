pub mod cli;
pub mod settings;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::sample::DEFAULT_SAMPLE_PATH;
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "bulk-sender")]
#[command(about = "Send personalized chat messages to every contact in a spreadsheet")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Send one message per contact
    Send(SendArgs),
    /// Show the first contacts and the estimated sending time
    Preview(PreviewArgs),
    /// Write a sample contact file
    Sample(SampleArgs),
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Args)]
pub struct SendArgs {
    /// Contact file (.csv, .tsv or .xlsx) with phone and message columns
    pub input: String,

    /// Seconds to wait after each message
    #[arg(long)]
    pub delay_secs: Option<f64>,

    /// Random extra wait of up to this many seconds
    #[arg(long)]
    pub jitter_secs: Option<f64>,

    /// Log the messages instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// WebDriver server URL
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Chat web client base URL
    #[arg(long)]
    pub chat_url: Option<String>,

    /// CSS selector of the send control
    #[arg(long)]
    pub send_selector: Option<String>,

    /// Browser name passed to the WebDriver server
    #[arg(long)]
    pub browser: Option<String>,

    #[arg(long)]
    pub headless: bool,

    /// Browser profile directory (keeps the chat login between runs)
    #[arg(long)]
    pub user_data_dir: Option<String>,

    /// Seconds to wait for the send control to appear
    #[arg(long)]
    pub element_timeout_secs: Option<u64>,

    /// Seconds to wait after clicking send
    #[arg(long)]
    pub post_send_wait_secs: Option<f64>,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct PreviewArgs {
    pub input: String,

    /// Number of contacts to show
    #[arg(long)]
    pub rows: Option<usize>,

    #[arg(long)]
    pub delay_secs: Option<f64>,

    #[arg(long)]
    pub jitter_secs: Option<f64>,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct SampleArgs {
    #[arg(short, long, default_value = DEFAULT_SAMPLE_PATH)]
    pub output: String,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
