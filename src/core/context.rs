use crate::domain::model::{FailedContact, RunState, RunSummary, SendOutcome};
use crate::utils::error::{Result, SendError};
use chrono::{DateTime, Utc};
use std::time::Instant;

/// Progress and outcomes of one send run, passed explicitly into the loop.
#[derive(Debug)]
pub struct RunContext {
    state: RunState,
    total: usize,
    outcomes: Vec<SendOutcome>,
    started: Option<(Instant, DateTime<Utc>)>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            state: RunState::NotStarted,
            total: 0,
            outcomes: Vec::new(),
            started: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn outcomes(&self) -> &[SendOutcome] {
        &self.outcomes
    }

    pub fn begin(&mut self, total: usize) -> Result<()> {
        self.expect_state(RunState::NotStarted)?;
        self.state = RunState::Running;
        self.total = total;
        self.outcomes = Vec::with_capacity(total);
        self.started = Some((Instant::now(), Utc::now()));
        Ok(())
    }

    pub fn record(&mut self, outcome: SendOutcome) -> Result<()> {
        self.expect_state(RunState::Running)?;
        self.outcomes.push(outcome);
        Ok(())
    }

    /// 1.0 for an empty run.
    pub fn fraction_complete(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.outcomes.len() as f64 / self.total as f64
    }

    pub fn finish(&mut self) -> Result<RunSummary> {
        self.expect_state(RunState::Running)?;
        self.state = RunState::Completed;

        let (instant, started_at) = self.started.unwrap_or_else(|| (Instant::now(), Utc::now()));
        let failed_contacts: Vec<FailedContact> = self
            .outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| FailedContact {
                row: o.contact.row,
                name: o.contact.name.clone(),
                raw_phone: o.contact.raw_phone.clone(),
                error: o.error.clone().unwrap_or_default(),
            })
            .collect();

        Ok(RunSummary {
            total: self.outcomes.len(),
            succeeded: self.outcomes.len() - failed_contacts.len(),
            failed: failed_contacts.len(),
            failed_contacts,
            started_at,
            finished_at: Utc::now(),
            elapsed: instant.elapsed(),
        })
    }

    fn expect_state(&self, expected: RunState) -> Result<()> {
        if self.state != expected {
            return Err(SendError::InvalidState {
                expected: expected.to_string(),
                actual: self.state.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
