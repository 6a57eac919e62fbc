use crate::app::channels::webdriver::build_send_url;
use crate::domain::ports::DeliveryChannel;
use crate::utils::error::{Result, SendError};
use async_trait::async_trait;

/// Logs each message with the link it would open instead of sending it.
#[derive(Debug, Clone)]
pub struct DryRunChannel {
    chat_url: String,
    open: bool,
    delivered: usize,
}

impl DryRunChannel {
    pub fn new(chat_url: impl Into<String>) -> Self {
        Self {
            chat_url: chat_url.into(),
            open: false,
            delivered: 0,
        }
    }

    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

#[async_trait]
impl DeliveryChannel for DryRunChannel {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn open_session(&mut self) -> Result<()> {
        self.open = true;
        tracing::info!("🔍 DRY RUN - no messages will be sent");
        Ok(())
    }

    async fn deliver(&mut self, phone: &str, message: &str) -> Result<()> {
        if !self.open {
            return Err(SendError::SessionNotOpen);
        }
        let url = build_send_url(&self.chat_url, phone, message)?;
        tracing::info!("[dry run] {} <- {:?}", phone, message);
        tracing::debug!("[dry run] would open {}", url);
        self.delivered += 1;
        Ok(())
    }

    async fn close_session(&mut self) -> Result<()> {
        self.open = false;
        tracing::info!("[dry run] {} messages prepared", self.delivered);
        Ok(())
    }
}
