use crate::core::context::RunContext;
use crate::core::loader::{ContactLoader, InputFormat};
use crate::core::send_loop::{Pacing, SendLoop};
use crate::domain::model::{Contact, Preview, RunSummary};
use crate::domain::ports::{ConfigProvider, DeliveryChannel, ProgressReporter, Storage};
use crate::utils::error::Result;

pub struct BulkSendEngine<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    loader: ContactLoader,
}

impl<S: Storage, C: ConfigProvider> BulkSendEngine<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            loader: ContactLoader::new(),
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn pacing(&self) -> Pacing {
        Pacing::new(self.config.send_delay(), self.config.delay_jitter())
    }

    pub async fn load_contacts(&self) -> Result<Vec<Contact>> {
        let path = self.config.input_path();
        let format = InputFormat::from_path(path)?;

        tracing::info!("Loading contacts from {}", path);
        let bytes = self.storage.read_file(path).await?;
        let contacts = self.loader.load(format, &bytes)?;
        tracing::info!("Loaded {} contacts", contacts.len());

        Ok(contacts)
    }

    pub async fn preview(&self, rows: usize) -> Result<Preview> {
        let mut contacts = self.load_contacts().await?;
        let total = contacts.len();
        contacts.truncate(rows);

        Ok(Preview {
            contacts,
            total,
            estimated_duration: self.pacing().estimate(total),
        })
    }

    /// Loads the contact file and sends every message through `channel`.
    /// File and schema errors surface before the channel is touched.
    pub async fn run<D, R>(&self, channel: D, reporter: &mut R) -> Result<RunSummary>
    where
        D: DeliveryChannel,
        R: ProgressReporter + ?Sized,
    {
        let contacts = self.load_contacts().await?;

        let mut ctx = RunContext::new();
        let mut send_loop = SendLoop::new(channel, self.pacing());
        send_loop.run(contacts, &mut ctx, reporter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::send_loop::tests::{FakeChannel, RecordingReporter};
    use crate::utils::error::SendError;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn with_file(path: &str, content: &str) -> Self {
            let storage = Self::default();
            storage.write_file(path, content.as_bytes()).await.unwrap();
            storage
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                SendError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn exists(&self, path: &str) -> bool {
            self.files.lock().await.contains_key(path)
        }
    }

    struct MockConfig {
        input_path: String,
        delay: Duration,
        jitter: Duration,
    }

    impl MockConfig {
        fn new(input_path: &str) -> Self {
            Self {
                input_path: input_path.to_string(),
                delay: Duration::ZERO,
                jitter: Duration::ZERO,
            }
        }
    }

    impl ConfigProvider for MockConfig {
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

    const CONTACTS: &str = concat!(
        "Name,Phone,Message\n",
        "John,911234567890,Hi {name}\n",
        "Jane,911234567891,Hi {name}\n",
        "Jim,911234567892,Hi {name}\n",
    );

    #[tokio::test]
    async fn test_run_sends_every_contact() {
        let storage = MockStorage::with_file("contacts.csv", CONTACTS).await;
        let engine = BulkSendEngine::new(storage, MockConfig::new("contacts.csv"));
        let mut channel = FakeChannel::default();
        let mut reporter = RecordingReporter::default();

        let summary = engine.run(&mut channel, &mut reporter).await.unwrap();

        assert_eq!(summary.succeeded, 3);
        assert_eq!(channel.delivered[2].1, "Hi Jim");
        assert_eq!(channel.closed, 1);
    }

    #[tokio::test]
    async fn test_schema_error_never_opens_the_channel() {
        let storage = MockStorage::with_file("contacts.csv", "Name,Number\nJohn,1\n").await;
        let engine = BulkSendEngine::new(storage, MockConfig::new("contacts.csv"));
        let mut channel = FakeChannel::default();

        let err = engine
            .run(&mut channel, &mut RecordingReporter::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::MissingColumns { .. }));
        assert_eq!(channel.opened, 0);
        assert!(channel.delivered.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_io_error() {
        let engine = BulkSendEngine::new(MockStorage::default(), MockConfig::new("absent.csv"));
        let err = engine.load_contacts().await.unwrap_err();
        assert!(matches!(err, SendError::IoError(_)));
    }

    #[tokio::test]
    async fn test_preview_truncates_and_estimates() {
        let storage = MockStorage::with_file("contacts.csv", CONTACTS).await;
        let config = MockConfig {
            delay: Duration::from_secs(2),
            ..MockConfig::new("contacts.csv")
        };
        let engine = BulkSendEngine::new(storage, config);

        let preview = engine.preview(2).await.unwrap();

        assert_eq!(preview.total, 3);
        assert_eq!(preview.contacts.len(), 2);
        assert_eq!(preview.estimated_duration, Duration::from_secs(6));
    }
}
