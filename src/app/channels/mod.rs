pub mod dry_run;
pub mod webdriver;

pub use dry_run::DryRunChannel;
pub use webdriver::{WebDriverChannel, WebDriverSettings};
