//! Extract job state and the submission/status wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned identifier of an extract job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractId(pub String);

impl ExtractId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExtractId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Job state as reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RemoteState {
    Pending,
    Success,
    Failure,
    /// Intermediate worker states (`STARTED`, `RETRY`, ...) keep polling.
    #[serde(other)]
    Other,
}

/// Client-side phase of the tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobPhase {
    #[default]
    Idle,
    Submitting,
    WaitingForId,
    Polling,
    Succeeded,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Succeeded | JobPhase::Failed)
    }

    /// Submitted and not yet terminal.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            JobPhase::Submitting | JobPhase::WaitingForId | JobPhase::Polling
        )
    }
}

/// The one extract tracked by an [`ExtractJobClient`](crate::ExtractJobClient).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractJob {
    pub id: Option<ExtractId>,
    pub phase: JobPhase,
    /// Last state seen from the status endpoint.
    pub remote_state: Option<RemoteState>,
    /// Status requests issued so far.
    pub polls: u32,
    pub submitted_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl ExtractJob {
    /// A job that has just been sent to the server.
    pub fn submitting() -> Self {
        Self {
            phase: JobPhase::Submitting,
            submitted_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn download_ready(&self) -> bool {
        self.phase == JobPhase::Succeeded
    }

    pub(crate) fn finish(&mut self, phase: JobPhase, error: Option<String>) {
        self.phase = phase;
        self.error = error;
        self.finished_at = Some(Utc::now());
    }
}

/// Body of the submission request.
///
/// Both members are JSON documents encoded as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractRequest {
    pub criteria: String,
    pub data_slice: String,
}

/// Response to a submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractSubmitted {
    #[serde(default)]
    pub extract_id: Option<ExtractId>,
}

/// Response to a status poll.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractStatus {
    pub state: RemoteState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_states() {
        let status: ExtractStatus = serde_json::from_value(json!({"state": "SUCCESS"})).unwrap();
        assert_eq!(status.state, RemoteState::Success);

        let status: ExtractStatus = serde_json::from_value(json!({"state": "STARTED"})).unwrap();
        assert_eq!(status.state, RemoteState::Other);
    }

    #[test]
    fn test_submission_without_id() {
        let submitted: ExtractSubmitted = serde_json::from_value(json!({})).unwrap();
        assert!(submitted.extract_id.is_none());

        let submitted: ExtractSubmitted =
            serde_json::from_value(json!({"extract_id": "abc123"})).unwrap();
        assert_eq!(submitted.extract_id, Some(ExtractId::from("abc123")));
    }

    #[test]
    fn test_download_ready_only_when_succeeded() {
        let mut job = ExtractJob::submitting();
        assert!(!job.download_ready());
        assert!(job.phase.is_in_flight());

        job.finish(JobPhase::Failed, Some("FAILURE".into()));
        assert!(!job.download_ready());
        assert!(job.finished_at.is_some());

        job.phase = JobPhase::Succeeded;
        assert!(job.download_ready());
    }
}
