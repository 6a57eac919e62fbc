use chrono::{DateTime, Utc};
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

pub const NAME_PLACEHOLDER: &str = "{name}";

static NAME_PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\{\s*name\s*\}").expect("placeholder pattern is valid"));

/// One row of the contact file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// 1-based data row number, header excluded.
    pub row: usize,
    pub name: String,
    /// Digits only.
    pub phone: String,
    /// The phone cell as written in the file.
    pub raw_phone: String,
    pub message: String,
}

impl Contact {
    /// Substitutes `{name}` in the message template. Matching ignores case
    /// and whitespace inside the braces; templates without it pass through.
    pub fn render_message(&self) -> String {
        NAME_PLACEHOLDER_RE
            .replace_all(&self.message, NoExpand(&self.name))
            .into_owned()
    }

    pub fn label(&self) -> String {
        if self.name.is_empty() {
            self.raw_phone.clone()
        } else {
            format!("{} ({})", self.name, self.raw_phone)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
    pub contact: Contact,
    pub rendered_message: String,
    pub success: bool,
    pub error: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl SendOutcome {
    pub fn sent(contact: Contact, rendered_message: String) -> Self {
        Self {
            contact,
            rendered_message,
            success: true,
            error: None,
            attempted_at: Utc::now(),
        }
    }

    pub fn failed(contact: Contact, rendered_message: String, error: String) -> Self {
        Self {
            contact,
            rendered_message,
            success: false,
            error: Some(error),
            attempted_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::NotStarted => "not started",
            RunState::Running => "running",
            RunState::Completed => "completed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// 1-based position of the record just processed.
    pub position: usize,
    pub total: usize,
    pub fraction: f64,
    pub status_line: String,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedContact {
    pub row: usize,
    pub name: String,
    pub raw_phone: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_contacts: Vec<FailedContact>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone)]
pub struct Preview {
    pub contacts: Vec<Contact>,
    pub total: usize,
    pub estimated_duration: Duration,
}
