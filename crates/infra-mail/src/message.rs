// Rendered export mail, shared by every transport

use playlist_export_core::port::DeliveryError;
use serde::{Deserialize, Serialize};

pub const EXPORT_SUBJECT: &str = "Playlist export";
pub const EXPORT_TEXT: &str = "Attached is the result of your playlist export.";
pub const EXPORT_ATTACHMENT_NAME: &str = "playlist.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl MailMessage {
    /// Export mail with `payload_json` attached as playlist.json
    pub fn export(from: &str, to: &str, payload_json: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject: EXPORT_SUBJECT.to_string(),
            text: EXPORT_TEXT.to_string(),
            attachments: vec![Attachment {
                filename: EXPORT_ATTACHMENT_NAME.to_string(),
                content_type: "application/json".to_string(),
                content: payload_json.to_string(),
            }],
        }
    }
}

/// Reject addresses no transport could ever deliver to.
///
/// Exactly one `@`, non-empty local part and domain, no whitespace.
/// Full syntax checks happen at the HTTP boundary.
pub fn validate_address(address: &str) -> Result<(), DeliveryError> {
    let invalid = || DeliveryError::Permanent(format!("Invalid recipient address: {:?}", address));

    if address.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let mut parts = address.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_message_shape() {
        let message = MailMessage::export("noreply@example.com", "a@b.com", "{\"id\":\"p\"}");
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["subject"], EXPORT_SUBJECT);
        assert_eq!(value["attachments"][0]["filename"], "playlist.json");
        assert_eq!(value["attachments"][0]["contentType"], "application/json");
        assert_eq!(value["attachments"][0]["content"], "{\"id\":\"p\"}");
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("a@b.com").is_ok());
        for bad in ["", "ab.com", "a@", "@b.com", "a@b@c", "a b@c.com"] {
            let err = validate_address(bad).unwrap_err();
            assert!(!err.is_retryable(), "{:?} should be permanent", bad);
        }
    }
}
