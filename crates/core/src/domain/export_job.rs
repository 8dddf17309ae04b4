// Export Job Domain Model
//
// Lives only as a message body inside the broker; never persisted in the
// library store.

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Request to export one playlist to one email address.
///
/// Wire format: `{"playlistId": "...", "userId": "...", "targetEmail": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportJob {
    pub playlist_id: String,
    /// Requester; already verified as the playlist owner when the job exists
    pub user_id: String,
    pub target_email: String,
}

impl ExportJob {
    pub fn new(
        playlist_id: impl Into<String>,
        user_id: impl Into<String>,
        target_email: impl Into<String>,
    ) -> Self {
        Self {
            playlist_id: playlist_id.into(),
            user_id: user_id.into(),
            target_email: target_email.into(),
        }
    }

    /// Canonical text encoding published to the broker
    pub fn to_message_body(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| DomainError::Internal(e.to_string()))
    }

    /// Decode a delivered message body.
    ///
    /// Missing fields and empty identifiers are malformed; retrying cannot fix them.
    pub fn from_message_body(body: &str) -> Result<Self> {
        let job: ExportJob =
            serde_json::from_str(body).map_err(|e| DomainError::MalformedJob(e.to_string()))?;

        if job.playlist_id.trim().is_empty() {
            return Err(DomainError::MalformedJob("playlistId is empty".to_string()));
        }
        if job.target_email.trim().is_empty() {
            return Err(DomainError::MalformedJob("targetEmail is empty".to_string()));
        }

        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_body_uses_wire_field_names() {
        let job = ExportJob::new("playlist-abc", "user-1", "a@b.com");
        let body = job.to_message_body().unwrap();

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["playlistId"], "playlist-abc");
        assert_eq!(value["userId"], "user-1");
        assert_eq!(value["targetEmail"], "a@b.com");
        assert_eq!(value.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_decode_identical_structure() {
        let body = r#"{"playlistId":"playlist-abc","userId":"user-1","targetEmail":"a@b.com"}"#;
        let job = ExportJob::from_message_body(body).unwrap();
        assert_eq!(job, ExportJob::new("playlist-abc", "user-1", "a@b.com"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = ExportJob::from_message_body("not json").unwrap_err();
        assert!(matches!(err, DomainError::MalformedJob(_)));
    }

    #[test]
    fn test_decode_rejects_missing_email() {
        let err = ExportJob::from_message_body(r#"{"playlistId":"p","userId":"u"}"#).unwrap_err();
        assert!(err.to_string().contains("targetEmail"));
    }

    #[test]
    fn test_decode_rejects_blank_playlist() {
        let body = r#"{"playlistId":"  ","userId":"u","targetEmail":"a@b.com"}"#;
        assert!(ExportJob::from_message_body(body).is_err());
    }
}
