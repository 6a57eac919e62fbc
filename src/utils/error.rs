use thiserror::Error;

#[derive(Error, Debug)]
pub enum SendError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Spreadsheet parsing error: {message}")]
    SpreadsheetError { message: String },

    #[error("Unsupported input format: '{extension}' (expected csv, tsv or xlsx)")]
    UnsupportedFormat { extension: String },

    #[error("Missing required columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("WebDriver error ({error}): {message}")]
    WebDriverError { error: String, message: String },

    #[error("Delivery session is not open")]
    SessionNotOpen,

    #[error("Invalid phone number '{phone}': {reason}")]
    InvalidPhone { phone: String, reason: String },

    #[error("Delivery failed: {message}")]
    DeliveryError { message: String },

    #[error("Invalid run state: expected {expected}, found {actual}")]
    InvalidState { expected: String, actual: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Delivery,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl SendError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SendError::CsvError(_)
            | SendError::ZipError(_)
            | SendError::SpreadsheetError { .. }
            | SendError::UnsupportedFormat { .. }
            | SendError::MissingColumns { .. }
            | SendError::ValidationError { .. } => ErrorCategory::Input,
            SendError::ConfigError { .. }
            | SendError::InvalidConfigValueError { .. }
            | SendError::ConfigValidationError { .. }
            | SendError::UrlError(_) => ErrorCategory::Configuration,
            SendError::HttpError(_)
            | SendError::WebDriverError { .. }
            | SendError::SessionNotOpen
            | SendError::InvalidPhone { .. }
            | SendError::DeliveryError { .. } => ErrorCategory::Delivery,
            SendError::IoError(_)
            | SendError::SerializationError(_)
            | SendError::InvalidState { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Delivery => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SendError::MissingColumns { .. } => {
                "Add the missing columns to the header row (name, phone, message)"
            }
            SendError::ValidationError { .. } => {
                "Fill in the phone and message cells for the rows listed above"
            }
            SendError::UnsupportedFormat { .. } => "Save the contact list as .csv, .tsv or .xlsx",
            SendError::CsvError(_)
            | SendError::SpreadsheetError { .. }
            | SendError::ZipError(_) => {
                "Check that the file is a well-formed spreadsheet with one header row"
            }
            SendError::HttpError(_) | SendError::WebDriverError { .. } => {
                "Make sure the WebDriver server is running and the chat web client is logged in"
            }
            SendError::SessionNotOpen => "Open a delivery session before sending",
            SendError::InvalidPhone { .. } => {
                "Use digits with the country code, for example 911234567890"
            }
            SendError::DeliveryError { .. } => "Check the chat client window for details",
            SendError::ConfigError { .. }
            | SendError::InvalidConfigValueError { .. }
            | SendError::ConfigValidationError { .. }
            | SendError::UrlError(_) => "Review the configuration file and command-line flags",
            SendError::IoError(_) => "Check that the file exists and is readable",
            SendError::SerializationError(_) | SendError::InvalidState { .. } => {
                "Re-run the command; if the problem persists, report it with --verbose logs"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Could not read the contact file: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Delivery => format!("Could not deliver messages: {}", self),
            ErrorCategory::System => format!("Unexpected failure: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, SendError>;
