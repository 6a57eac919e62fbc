use crate::core::context::RunContext;
use crate::domain::model::{Contact, ProgressUpdate, RunSummary, SendOutcome};
use crate::domain::ports::{DeliveryChannel, ProgressReporter};
use crate::utils::error::Result;
use crate::utils::phone::validate_phone;
use rand::Rng;
use std::time::Duration;

pub const DEFAULT_SEND_DELAY: Duration = Duration::from_secs(2);

/// Wait between two sends: a fixed delay plus a uniform random extra in
/// `[0, jitter]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    delay: Duration,
    jitter: Duration,
}

impl Pacing {
    pub fn new(delay: Duration, jitter: Duration) -> Self {
        Self { delay, jitter }
    }

    pub fn fixed(delay: Duration) -> Self {
        Self::new(delay, Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn jitter(&self) -> Duration {
        self.jitter
    }

    pub fn next_delay(&self) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return self.delay;
        }
        let extra = rand::rng().random_range(0..=jitter_ms);
        self.delay.saturating_add(Duration::from_millis(extra))
    }

    /// Expected wall time for `count` sends, delivery time excluded.
    /// Saturates at `Duration::MAX`.
    pub fn estimate(&self, count: usize) -> Duration {
        let per_send = self.delay.saturating_add(self.jitter / 2);
        u32::try_from(count)
            .ok()
            .and_then(|count| per_send.checked_mul(count))
            .unwrap_or(Duration::MAX)
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::fixed(DEFAULT_SEND_DELAY)
    }
}

pub struct SendLoop<C: DeliveryChannel> {
    channel: C,
    pacing: Pacing,
}

impl<C: DeliveryChannel> SendLoop<C> {
    pub fn new(channel: C, pacing: Pacing) -> Self {
        Self { channel, pacing }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Sends every contact once, in order, and returns the tally.
    ///
    /// Delivery errors are recorded against their contact and never stop the
    /// loop. Only a failure to open the session aborts the run, in which case
    /// `ctx` stays `NotStarted` and the reporter is never called. The session
    /// is closed after the last contact; a failed close is logged and ignored.
    pub async fn run<R: ProgressReporter + ?Sized>(
        &mut self,
        contacts: Vec<Contact>,
        ctx: &mut RunContext,
        reporter: &mut R,
    ) -> Result<RunSummary> {
        let total = contacts.len();
        tracing::info!("Opening {} session for {} contacts", self.channel.name(), total);
        self.channel.open_session().await?;

        if let Err(e) = ctx.begin(total) {
            self.close_quietly().await;
            return Err(e);
        }
        reporter.on_start(total);

        for (i, contact) in contacts.into_iter().enumerate() {
            tracing::info!("Sending to {}...", contact.label());
            let outcome = self.send_one(contact).await;

            let status_line = match &outcome.error {
                None => format!("Sent to {}", outcome.contact.label()),
                Some(error) => format!("Failed to send to {}: {}", outcome.contact.label(), error),
            };
            let success = outcome.success;
            ctx.record(outcome)?;

            reporter.on_progress(&ProgressUpdate {
                position: i + 1,
                total,
                fraction: ctx.fraction_complete(),
                status_line,
                success,
            });

            let pause = self.pacing.next_delay();
            tracing::debug!("Waiting {:?} before the next message", pause);
            tokio::time::sleep(pause).await;
        }

        self.close_quietly().await;

        let summary = ctx.finish()?;
        tracing::info!(
            "Run completed: {}/{} sent, {} failed in {:?}",
            summary.succeeded,
            summary.total,
            summary.failed,
            summary.elapsed
        );
        reporter.on_complete(&summary);
        Ok(summary)
    }

    async fn close_quietly(&mut self) {
        if let Err(e) = self.channel.close_session().await {
            tracing::warn!("Failed to close {} session: {}", self.channel.name(), e);
        }
    }

    async fn send_one(&mut self, contact: Contact) -> SendOutcome {
        let message = contact.render_message();
        tracing::debug!(
            "Row {}: delivering {} chars to {}",
            contact.row,
            message.len(),
            contact.phone
        );

        let result = match validate_phone(&contact.phone) {
            Ok(()) => self.channel.deliver(&contact.phone, &message).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => SendOutcome::sent(contact, message),
            Err(e) => {
                let mut error = e.to_string();
                if error.trim().is_empty() {
                    error = "unknown delivery error".to_string();
                }
                tracing::warn!(
                    "Row {}: failed to send to {}: {}",
                    contact.row,
                    contact.label(),
                    error
                );
                SendOutcome::failed(contact, message, error)
            }
        }
    }
}
