use crate::domain::model::{ProgressUpdate, RunSummary};
use crate::domain::ports::ProgressReporter;
use std::io::{self, Write};

const BAR_WIDTH: usize = 20;

/// Prints a progress line per contact and the final tally.
pub struct ConsoleReporter<W: Write + Send = io::Stdout> {
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn progress_bar(fraction: f64) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round()) as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

// Write errors on the console are not worth aborting a half-sent batch for.
impl<W: Write + Send> ProgressReporter for ConsoleReporter<W> {
    fn on_start(&mut self, total: usize) {
        let _ = writeln!(self.out, "📤 Sending {} messages", total);
    }

    fn on_progress(&mut self, update: &ProgressUpdate) {
        let width = update.total.to_string().len();
        let _ = writeln!(
            self.out,
            "[{:>width$}/{}] {} {:>3.0}% {}",
            update.position,
            update.total,
            progress_bar(update.fraction),
            update.fraction * 100.0,
            update.status_line,
            width = width
        );
        let _ = self.out.flush();
    }

    fn on_complete(&mut self, summary: &RunSummary) {
        let _ = writeln!(
            self.out,
            "✅ Sent {}/{} messages successfully!",
            summary.succeeded, summary.total
        );

        if summary.failed > 0 {
            let _ = writeln!(self.out, "❌ Failed to send {} messages:", summary.failed);
            for failed in &summary.failed_contacts {
                let who = if failed.name.is_empty() {
                    failed.raw_phone.clone()
                } else {
                    format!("{} ({})", failed.name, failed.raw_phone)
                };
                let _ = writeln!(self.out, "- {}: {}", who, failed.error);
            }
        }
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::FailedContact;
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn test_progress_line() {
        let mut reporter = ConsoleReporter::new(Vec::new());
        reporter.on_progress(&ProgressUpdate {
            position: 2,
            total: 10,
            fraction: 0.2,
            status_line: "Sent to John (911234567890)".to_string(),
            success: true,
        });

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(
            output,
            "[ 2/10] ####................  20% Sent to John (911234567890)\n"
        );
    }

    #[test]
    fn test_summary_lists_failed_contacts() {
        let mut reporter = ConsoleReporter::new(Vec::new());
        reporter.on_complete(&RunSummary {
            total: 3,
            succeeded: 1,
            failed: 2,
            failed_contacts: vec![
                FailedContact {
                    row: 2,
                    name: "Jane".to_string(),
                    raw_phone: "+91 1234567891".to_string(),
                    error: "Delivery failed: timeout".to_string(),
                },
                FailedContact {
                    row: 3,
                    name: String::new(),
                    raw_phone: "n/a".to_string(),
                    error: "Invalid phone number '': no digits".to_string(),
                },
            ],
            started_at: Utc::now(),
            finished_at: Utc::now(),
            elapsed: Duration::from_secs(6),
        });

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(output.contains("Sent 1/3 messages successfully!"));
        assert!(output.contains("Failed to send 2 messages:"));
        assert!(output.contains("- Jane (+91 1234567891): Delivery failed: timeout"));
        assert!(output.contains("- n/a: Invalid phone number"));
    }

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0.0), ".".repeat(BAR_WIDTH));
        assert_eq!(progress_bar(1.0), "#".repeat(BAR_WIDTH));
        assert_eq!(progress_bar(1.5), "#".repeat(BAR_WIDTH));
    }
}
