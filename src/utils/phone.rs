use crate::utils::error::{Result, SendError};

/// Longest number allowed by E.164, country code included.
pub const MAX_PHONE_DIGITS: usize = 15;

/// Keeps only ASCII digits: `"+91-123 456"` becomes `"91123456"`.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Checks a normalized phone right before delivery.
pub fn validate_phone(phone: &str) -> Result<()> {
    if phone.is_empty() {
        return Err(SendError::InvalidPhone {
            phone: phone.to_string(),
            reason: "no digits".to_string(),
        });
    }

    if phone.len() > MAX_PHONE_DIGITS {
        return Err(SendError::InvalidPhone {
            phone: phone.to_string(),
            reason: format!("more than {} digits", MAX_PHONE_DIGITS),
        });
    }

    Ok(())
}
