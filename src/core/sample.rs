use crate::domain::ports::Storage;
use crate::utils::error::{Result, SendError};

pub const DEFAULT_SAMPLE_PATH: &str = "contacts_sample.csv";

pub const SAMPLE_CSV: &str = "Name,Phone,Message
John Doe,911234567890,Hello {name}! This is a test message.
Jane Smith,911234567891,Hi {name}! Just checking in.
";

/// Writes the sample contact file. Refuses to overwrite unless `force`.
pub async fn write_sample<S: Storage>(storage: &S, path: &str, force: bool) -> Result<()> {
    if !force && storage.exists(path).await {
        return Err(SendError::ValidationError {
            message: format!("{} already exists (use --force to overwrite)", path),
        });
    }
    storage.write_file(path, SAMPLE_CSV.as_bytes()).await?;
    tracing::debug!("Sample contact file written to {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loader::{ContactLoader, InputFormat};

    #[test]
    fn test_sample_loads_cleanly() {
        let contacts = ContactLoader::new()
            .load(InputFormat::Csv, SAMPLE_CSV.as_bytes())
            .unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].render_message(), "Hello John Doe! This is a test message.");
        assert_eq!(contacts[1].phone, "911234567891");
    }
}
