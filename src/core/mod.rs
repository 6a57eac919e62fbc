pub mod context;
pub mod engine;
pub mod loader;
pub mod sample;
pub mod send_loop;
pub mod xlsx;

pub use crate::domain::model::{Contact, ProgressUpdate, RunSummary, SendOutcome};
pub use crate::domain::ports::{ConfigProvider, DeliveryChannel, ProgressReporter, Storage};
pub use crate::utils::error::Result;
