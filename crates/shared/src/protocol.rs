use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::Budget;

/// Body sent to the form endpoint, as JSON on the primary path and as
/// url-encoded form fields on the fallback path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub name: String,
    pub email: String,
    pub budget: Budget,
    pub message: String,
    /// Provenance tag naming the site the submission came from.
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    #[default]
    Idle,
    Sending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Success,
    RemoteRejected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    TransportError,
    SpamSuppressed,
    /// Handed to the conventional form post; the server decided where the visitor lands.
    FallbackSubmitted {
        location: Url,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ControllerEvent {
    StateChanged(ControllerState),
    Outcome(SubmissionOutcome),
    TransportDowngraded,
}
