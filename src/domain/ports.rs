use crate::domain::model::{ProgressUpdate, RunSummary};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn send_delay(&self) -> Duration;
    fn delay_jitter(&self) -> Duration;
}

/// The external system that actually transmits a message.
///
/// A channel is owned exclusively by one send loop. `open_session` is called
/// once before the first delivery and `close_session` once after the last.
#[async_trait]
pub trait DeliveryChannel: Send {
    fn name(&self) -> &str;
    async fn open_session(&mut self) -> Result<()>;
    async fn deliver(&mut self, phone: &str, message: &str) -> Result<()>;
    async fn close_session(&mut self) -> Result<()>;
}

pub trait ProgressReporter: Send {
    fn on_start(&mut self, total: usize);
    fn on_progress(&mut self, update: &ProgressUpdate);
    fn on_complete(&mut self, summary: &RunSummary);
}

#[async_trait]
impl<T: DeliveryChannel + ?Sized> DeliveryChannel for &mut T {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn open_session(&mut self) -> Result<()> {
        (**self).open_session().await
    }

    async fn deliver(&mut self, phone: &str, message: &str) -> Result<()> {
        (**self).deliver(phone, message).await
    }

    async fn close_session(&mut self) -> Result<()> {
        (**self).close_session().await
    }
}

#[async_trait]
impl<T: DeliveryChannel + ?Sized> DeliveryChannel for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn open_session(&mut self) -> Result<()> {
        (**self).open_session().await
    }

    async fn deliver(&mut self, phone: &str, message: &str) -> Result<()> {
        (**self).deliver(phone, message).await
    }

    async fn close_session(&mut self) -> Result<()> {
        (**self).close_session().await
    }
}
