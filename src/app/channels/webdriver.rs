//! Browser delivery through a W3C WebDriver server (chromedriver, geckodriver).
//!
//! Each message is sent by opening the chat client's `send?phone=..&text=..`
//! link in the driven browser and clicking the send control once the page
//! has rendered it.

use crate::domain::ports::DeliveryChannel;
use crate::utils::error::{Result, SendError};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_CHAT_URL: &str = "https://web.whatsapp.com";
pub const DEFAULT_SEND_SELECTOR: &str = r#"span[data-icon="send"]"#;
pub const DEFAULT_BROWSER: &str = "chrome";
pub const DEFAULT_ELEMENT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POST_SEND_WAIT: Duration = Duration::from_secs(3);

/// Key under which WebDriver returns element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[derive(Debug, Clone, PartialEq)]
pub struct WebDriverSettings {
    pub endpoint: String,
    pub chat_url: String,
    pub send_selector: String,
    pub browser: String,
    pub headless: bool,
    /// Browser profile directory; reusing one keeps the chat login.
    pub user_data_dir: Option<String>,
    pub element_timeout: Duration,
    pub post_send_wait: Duration,
}

impl Default for WebDriverSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_WEBDRIVER_URL.to_string(),
            chat_url: DEFAULT_CHAT_URL.to_string(),
            send_selector: DEFAULT_SEND_SELECTOR.to_string(),
            browser: DEFAULT_BROWSER.to_string(),
            headless: false,
            user_data_dir: None,
            element_timeout: DEFAULT_ELEMENT_TIMEOUT,
            post_send_wait: DEFAULT_POST_SEND_WAIT,
        }
    }
}

/// `<chat_url>/send?phone=<phone>&text=<form-encoded message>`
pub fn build_send_url(chat_url: &str, phone: &str, message: &str) -> Result<Url> {
    let mut url = Url::parse(chat_url)?;
    url.path_segments_mut()
        .map_err(|_| SendError::ConfigError {
            message: format!("chat URL '{}' cannot have a path", chat_url),
        })?
        .pop_if_empty()
        .push("send");
    url.query_pairs_mut()
        .append_pair("phone", phone)
        .append_pair("text", message);
    Ok(url)
}

pub struct WebDriverChannel {
    client: Client,
    settings: WebDriverSettings,
    session_id: Option<String>,
}

impl WebDriverChannel {
    pub fn new(settings: WebDriverSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
            session_id: None,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn capabilities(&self) -> Value {
        let mut args: Vec<String> = Vec::new();
        let browser = self.settings.browser.to_ascii_lowercase();

        match browser.as_str() {
            "chrome" | "chromium" | "msedge" => {
                if self.settings.headless {
                    args.push("--headless=new".to_string());
                }
                if let Some(dir) = &self.settings.user_data_dir {
                    args.push(format!("--user-data-dir={}", dir));
                }
                let options_key = if browser == "msedge" {
                    "ms:edgeOptions"
                } else {
                    "goog:chromeOptions"
                };
                json!({ "browserName": browser, options_key: { "args": args } })
            }
            "firefox" => {
                if self.settings.headless {
                    args.push("-headless".to_string());
                }
                if let Some(dir) = &self.settings.user_data_dir {
                    args.push("-profile".to_string());
                    args.push(dir.clone());
                }
                json!({ "browserName": browser, "moz:firefoxOptions": { "args": args } })
            }
            _ => json!({ "browserName": browser }),
        }
    }

    fn session_path(&self, suffix: &str) -> Result<String> {
        let id = self.session_id.as_deref().ok_or(SendError::SessionNotOpen)?;
        Ok(format!("session/{}{}", id, suffix))
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!(
            "{}/{}",
            self.settings.endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        tracing::debug!("WebDriver {} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let payload = serde_json::from_str::<Value>(&text).unwrap_or(Value::Null);
            return Err(webdriver_error(status, &payload, &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        let payload: Value = serde_json::from_str(&text)?;
        Ok(payload.get("value").cloned().unwrap_or(Value::Null))
    }
}

fn webdriver_error(status: StatusCode, payload: &Value, raw: &str) -> SendError {
    let value = payload.get("value");
    let field = |name: &str| {
        value
            .and_then(|v| v.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    SendError::WebDriverError {
        error: field("error").unwrap_or_else(|| status.to_string()),
        message: field("message").unwrap_or_else(|| raw.trim().to_string()),
    }
}

#[async_trait]
impl DeliveryChannel for WebDriverChannel {
    fn name(&self) -> &str {
        "webdriver"
    }

    async fn open_session(&mut self) -> Result<()> {
        if self.session_id.is_some() {
            return Ok(());
        }

        let body = json!({ "capabilities": { "alwaysMatch": self.capabilities() } });
        let value = self.command(Method::POST, "session", Some(body)).await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| SendError::WebDriverError {
                error: "session not created".to_string(),
                message: "response did not contain a sessionId".to_string(),
            })?
            .to_string();
        tracing::info!("WebDriver session {} started ({})", session_id, self.settings.browser);
        self.session_id = Some(session_id);

        let timeouts = json!({ "implicit": self.settings.element_timeout.as_millis() as u64 });
        let path = self.session_path("/timeouts")?;
        if let Err(e) = self.command(Method::POST, &path, Some(timeouts)).await {
            let _ = self.close_session().await;
            return Err(e);
        }

        Ok(())
    }

    async fn deliver(&mut self, phone: &str, message: &str) -> Result<()> {
        let navigate = self.session_path("/url")?;
        let url = build_send_url(&self.settings.chat_url, phone, message)?;
        self.command(Method::POST, &navigate, Some(json!({ "url": url.as_str() })))
            .await?;

        let find = self.session_path("/element")?;
        let element = self
            .command(
                Method::POST,
                &find,
                Some(json!({ "using": "css selector", "value": self.settings.send_selector })),
            )
            .await?;
        let element_id = element
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| SendError::DeliveryError {
                message: format!("send control '{}' not found", self.settings.send_selector),
            })?
            .to_string();

        let click = self.session_path(&format!("/element/{}/click", element_id))?;
        self.command(Method::POST, &click, Some(json!({}))).await?;
        tracing::debug!("Clicked send control for {}", phone);

        if !self.settings.post_send_wait.is_zero() {
            tokio::time::sleep(self.settings.post_send_wait).await;
        }
        Ok(())
    }

    async fn close_session(&mut self) -> Result<()> {
        let Some(session_id) = self.session_id.take() else {
            return Ok(());
        };
        self.command(Method::DELETE, &format!("session/{}", session_id), None)
            .await?;
        tracing::info!("WebDriver session {} closed", session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn settings(server: &MockServer) -> WebDriverSettings {
        WebDriverSettings {
            endpoint: server.base_url(),
            post_send_wait: Duration::ZERO,
            ..WebDriverSettings::default()
        }
    }

    async fn mock_session(server: &MockServer) -> (httpmock::Mock<'_>, httpmock::Mock<'_>) {
        let create = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/session")
                    .body_contains(r#""browserName":"chrome""#);
                then.status(200)
                    .json_body(json!({ "value": { "sessionId": "abc123", "capabilities": {} } }));
            })
            .await;
        let timeouts = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/session/abc123/timeouts")
                    .body_contains(r#""implicit":30000"#);
                then.status(200).json_body(json!({ "value": null }));
            })
            .await;
        (create, timeouts)
    }

    #[test]
    fn test_build_send_url() {
        let url = build_send_url(DEFAULT_CHAT_URL, "911234567890", "Hi John & co").unwrap();
        assert_eq!(
            url.as_str(),
            "https://web.whatsapp.com/send?phone=911234567890&text=Hi+John+%26+co"
        );

        let nested = build_send_url("https://chat.example.com/app/", "1", "x").unwrap();
        assert_eq!(nested.as_str(), "https://chat.example.com/app/send?phone=1&text=x");
    }

    #[test]
    fn test_capabilities_per_browser() {
        let chrome = WebDriverChannel::new(WebDriverSettings {
            headless: true,
            user_data_dir: Some("/tmp/profile".to_string()),
            ..WebDriverSettings::default()
        });
        let caps = chrome.capabilities();
        assert_eq!(caps["browserName"], "chrome");
        assert_eq!(
            caps["goog:chromeOptions"]["args"],
            json!(["--headless=new", "--user-data-dir=/tmp/profile"])
        );

        let firefox = WebDriverChannel::new(WebDriverSettings {
            browser: "Firefox".to_string(),
            headless: true,
            ..WebDriverSettings::default()
        });
        assert_eq!(firefox.capabilities()["moz:firefoxOptions"]["args"], json!(["-headless"]));
    }

    #[tokio::test]
    async fn test_full_session_lifecycle() {
        let server = MockServer::start_async().await;
        let (create, timeouts) = mock_session(&server).await;
        let navigate = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/session/abc123/url")
                    .body_contains("phone=911234567890")
                    .body_contains("text=Hi+John");
                then.status(200).json_body(json!({ "value": null }));
            })
            .await;
        let find = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/session/abc123/element")
                    .body_contains("css selector");
                then.status(200)
                    .json_body(json!({ "value": { ELEMENT_KEY: "el-1" } }));
            })
            .await;
        let click = server
            .mock_async(|when, then| {
                when.method(POST).path("/session/abc123/element/el-1/click");
                then.status(200).json_body(json!({ "value": null }));
            })
            .await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/session/abc123");
                then.status(200).json_body(json!({ "value": null }));
            })
            .await;

        let mut channel = WebDriverChannel::new(settings(&server));
        channel.open_session().await.unwrap();
        assert_eq!(channel.session_id(), Some("abc123"));

        channel.deliver("911234567890", "Hi John").await.unwrap();
        channel.close_session().await.unwrap();
        assert_eq!(channel.session_id(), None);

        create.assert_async().await;
        timeouts.assert_async().await;
        navigate.assert_async().await;
        find.assert_async().await;
        click.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_send_control_is_a_webdriver_error() {
        let server = MockServer::start_async().await;
        let _session = mock_session(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/session/abc123/url");
                then.status(200).json_body(json!({ "value": null }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/session/abc123/element");
                then.status(404).json_body(json!({
                    "value": { "error": "no such element", "message": "Unable to locate element" }
                }));
            })
            .await;

        let mut channel = WebDriverChannel::new(settings(&server));
        channel.open_session().await.unwrap();
        let err = channel.deliver("911234567890", "Hi").await.unwrap_err();

        match err {
            SendError::WebDriverError { error, message } => {
                assert_eq!(error, "no such element");
                assert_eq!(message, "Unable to locate element");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_session_not_created() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/session");
                then.status(500).json_body(json!({
                    "value": { "error": "session not created", "message": "Chrome failed to start" }
                }));
            })
            .await;

        let mut channel = WebDriverChannel::new(settings(&server));
        let err = channel.open_session().await.unwrap_err();
        assert!(err.to_string().contains("Chrome failed to start"));
        assert_eq!(channel.session_id(), None);
    }

    #[tokio::test]
    async fn test_deliver_without_session() {
        let mut channel = WebDriverChannel::new(WebDriverSettings::default());
        let err = channel.deliver("911234567890", "Hi").await.unwrap_err();
        assert!(matches!(err, SendError::SessionNotOpen));
    }
}
