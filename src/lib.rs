pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::channels::{DryRunChannel, WebDriverChannel, WebDriverSettings};
pub use app::reporters::ConsoleReporter;
pub use config::cli::LocalStorage;
pub use config::settings::{ChannelKind, SenderSettings};
pub use core::{
    context::RunContext, engine::BulkSendEngine, loader::ContactLoader, send_loop::SendLoop,
};
pub use utils::error::{Result, SendError};
