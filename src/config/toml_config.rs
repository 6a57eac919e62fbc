use crate::config::settings::ChannelKind;
use crate::utils::error::{Result, SendError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

/// Optional TOML configuration file. Every field may be omitted; command-line
/// flags take precedence over anything set here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub send: Option<SendSection>,
    pub channel: Option<ChannelSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendSection {
    pub delay_seconds: Option<f64>,
    pub jitter_seconds: Option<f64>,
    pub preview_rows: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelSection {
    pub kind: Option<ChannelKind>,
    pub webdriver: Option<WebDriverSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebDriverSection {
    pub endpoint: Option<String>,
    pub chat_url: Option<String>,
    pub send_selector: Option<String>,
    pub browser: Option<String>,
    pub headless: Option<bool>,
    pub user_data_dir: Option<String>,
    pub element_timeout_seconds: Option<u64>,
    pub post_send_wait_seconds: Option<f64>,
}

impl FileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| SendError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are
    /// left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }
}
