use crate::app::channels::WebDriverSettings;
use crate::config::toml_config::FileConfig;
use crate::core::send_loop::DEFAULT_SEND_DELAY;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    parse_seconds, validate_max_duration, validate_non_empty_string, validate_path,
    validate_positive_number, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Upper bound for every configured wait and timeout.
pub const MAX_WAIT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelKind {
    #[default]
    Webdriver,
    DryRun,
}

/// Fully resolved settings: defaults, then the TOML file, then flags.
#[derive(Debug, Clone, PartialEq)]
pub struct SenderSettings {
    pub input_path: String,
    pub delay: Duration,
    pub jitter: Duration,
    pub preview_rows: usize,
    pub channel: ChannelKind,
    pub webdriver: WebDriverSettings,
}

impl SenderSettings {
    pub fn new(input_path: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            delay: DEFAULT_SEND_DELAY,
            jitter: Duration::ZERO,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            channel: ChannelKind::default(),
            webdriver: WebDriverSettings::default(),
        }
    }

    /// Defaults overlaid with the optional config file.
    pub fn load(config_path: Option<&str>, input_path: &str) -> Result<Self> {
        let mut settings = Self::new(input_path);
        if let Some(path) = config_path {
            tracing::debug!("Loading configuration from {}", path);
            settings.apply_file(&FileConfig::from_file(path)?)?;
        }
        Ok(settings)
    }

    pub fn apply_file(&mut self, file: &FileConfig) -> Result<()> {
        if let Some(send) = &file.send {
            if let Some(secs) = send.delay_seconds {
                self.delay = parse_seconds("send.delay_seconds", secs)?;
            }
            if let Some(secs) = send.jitter_seconds {
                self.jitter = parse_seconds("send.jitter_seconds", secs)?;
            }
            if let Some(rows) = send.preview_rows {
                self.preview_rows = rows;
            }
        }

        let Some(channel) = &file.channel else {
            return Ok(());
        };
        if let Some(kind) = channel.kind {
            self.channel = kind;
        }
        if let Some(wd) = &channel.webdriver {
            let target = &mut self.webdriver;
            if let Some(endpoint) = &wd.endpoint {
                target.endpoint = endpoint.clone();
            }
            if let Some(chat_url) = &wd.chat_url {
                target.chat_url = chat_url.clone();
            }
            if let Some(selector) = &wd.send_selector {
                target.send_selector = selector.clone();
            }
            if let Some(browser) = &wd.browser {
                target.browser = browser.clone();
            }
            if let Some(headless) = wd.headless {
                target.headless = headless;
            }
            if let Some(dir) = &wd.user_data_dir {
                target.user_data_dir = Some(dir.clone());
            }
            if let Some(secs) = wd.element_timeout_seconds {
                target.element_timeout = Duration::from_secs(secs);
            }
            if let Some(secs) = wd.post_send_wait_seconds {
                target.post_send_wait =
                    parse_seconds("channel.webdriver.post_send_wait_seconds", secs)?;
            }
        }
        Ok(())
    }

    #[cfg(feature = "cli")]
    pub fn apply_send_args(&mut self, args: &crate::config::SendArgs) -> Result<()> {
        self.apply_pacing_args(args.delay_secs, args.jitter_secs)?;
        if args.dry_run {
            self.channel = ChannelKind::DryRun;
        }

        let target = &mut self.webdriver;
        if let Some(endpoint) = &args.webdriver_url {
            target.endpoint = endpoint.clone();
        }
        if let Some(chat_url) = &args.chat_url {
            target.chat_url = chat_url.clone();
        }
        if let Some(selector) = &args.send_selector {
            target.send_selector = selector.clone();
        }
        if let Some(browser) = &args.browser {
            target.browser = browser.clone();
        }
        if args.headless {
            target.headless = true;
        }
        if let Some(dir) = &args.user_data_dir {
            target.user_data_dir = Some(dir.clone());
        }
        if let Some(secs) = args.element_timeout_secs {
            target.element_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = args.post_send_wait_secs {
            target.post_send_wait = parse_seconds("--post-send-wait-secs", secs)?;
        }
        Ok(())
    }

    pub fn apply_pacing_args(
        &mut self,
        delay_secs: Option<f64>,
        jitter_secs: Option<f64>,
    ) -> Result<()> {
        if let Some(secs) = delay_secs {
            self.delay = parse_seconds("--delay-secs", secs)?;
        }
        if let Some(secs) = jitter_secs {
            self.jitter = parse_seconds("--jitter-secs", secs)?;
        }
        Ok(())
    }
}

impl ConfigProvider for SenderSettings {
    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn send_delay(&self) -> Duration {
        self.delay
    }

    fn delay_jitter(&self) -> Duration {
        self.jitter
    }
}

impl Validate for SenderSettings {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input_path)?;
        validate_positive_number("send.preview_rows", self.preview_rows as u64, 1)?;
        validate_max_duration("send.delay_seconds", self.delay, MAX_WAIT)?;
        validate_max_duration("send.jitter_seconds", self.jitter, MAX_WAIT)?;
        validate_url("channel.webdriver.chat_url", &self.webdriver.chat_url)?;

        if self.channel == ChannelKind::Webdriver {
            validate_url("channel.webdriver.endpoint", &self.webdriver.endpoint)?;
            validate_non_empty_string(
                "channel.webdriver.send_selector",
                &self.webdriver.send_selector,
            )?;
            validate_non_empty_string("channel.webdriver.browser", &self.webdriver.browser)?;
            validate_positive_number(
                "channel.webdriver.element_timeout_seconds",
                self.webdriver.element_timeout.as_secs(),
                1,
            )?;
            validate_max_duration(
                "channel.webdriver.element_timeout_seconds",
                self.webdriver.element_timeout,
                MAX_WAIT,
            )?;
            validate_max_duration(
                "channel.webdriver.post_send_wait_seconds",
                self.webdriver.post_send_wait,
                MAX_WAIT,
            )?;
        }
        Ok(())
    }
}
