use std::{sync::Arc, time::Duration};

use shared::{
    domain::{Field, FormInput},
    error::RemoteReplyBody,
    protocol::{ControllerEvent, ControllerState, SubmissionOutcome, SubmissionPayload},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

pub mod endpoint;
pub mod transport;
pub mod validation;

pub use endpoint::{EndpointError, EndpointPolicy};
pub use transport::{
    FallbackTransport, HttpTransport, MissingFallbackTransport, MissingPrimaryTransport,
    PrimaryTransport, RemoteReply, TransportError,
};
pub use validation::{validate, ValidationResult};

use validation::{validated_fields, CONSENT_REQUIRED};

pub const SENDING_LABEL: &str = "Sending…";
pub const SENT_LABEL: &str = "Sent ✓";
pub const RETRY_LABEL: &str = "Try again";
pub const GENERIC_FAILURE: &str =
    "Sorry, your message could not be sent. Please try again or email us directly.";
pub const DEFAULT_SOURCE_TAG: &str = "housesol.co — GitHub Pages";
pub const SUCCESS_RESET_DELAY: Duration = Duration::from_secs(2);

/// The page around the form. The controller is its only writer.
pub trait FormView: Send + Sync {
    fn hide_notices(&self);
    fn clear_field_errors(&self);
    fn show_field_error(&self, field: Field, message: &str);
    /// Blocking notice; consent has no error slot of its own.
    fn show_consent_notice(&self, message: &str);
    fn trigger_label(&self) -> String;
    fn set_trigger(&self, label: &str, disabled: bool);
    fn show_success(&self);
    fn show_failure(&self, message: &str);
    fn reset_fields(&self);
    fn navigate(&self, location: &Url);
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("submission has invalid fields")]
    Invalid(ValidationResult),
    #[error("privacy policy consent is required")]
    ConsentMissing,
    #[error("form endpoint misconfigured: {0}")]
    Configuration(#[from] EndpointError),
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub endpoint: String,
    pub policy: EndpointPolicy,
    pub source_tag: String,
    pub success_reset_delay: Duration,
    pub fallback_only: bool,
}

impl ControllerConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            policy: EndpointPolicy::formspree(),
            source_tag: DEFAULT_SOURCE_TAG.to_string(),
            success_reset_delay: SUCCESS_RESET_DELAY,
            fallback_only: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Primary,
    /// Sticky for the controller's lifetime once entered.
    FallbackOnly,
}

struct ControllerInner {
    state: ControllerState,
    mode: TransportMode,
    attempt_seq: u64,
}

pub struct SubmissionController {
    config: ControllerConfig,
    primary: Arc<dyn PrimaryTransport>,
    fallback: Arc<dyn FallbackTransport>,
    view: Arc<dyn FormView>,
    inner: Mutex<ControllerInner>,
    events: broadcast::Sender<ControllerEvent>,
}

impl SubmissionController {
    pub fn new(config: ControllerConfig, view: Arc<dyn FormView>) -> Arc<Self> {
        match HttpTransport::new() {
            Ok(http) => {
                let http = Arc::new(http);
                Self::new_with_transports(config, view, http.clone(), http)
            }
            Err(err) => {
                warn!(error = %err, "contact: http client unavailable, submissions cannot be sent");
                Self::new_with_transports(
                    config,
                    view,
                    Arc::new(MissingPrimaryTransport),
                    Arc::new(MissingFallbackTransport),
                )
            }
        }
    }

    pub fn new_with_transports(
        config: ControllerConfig,
        view: Arc<dyn FormView>,
        primary: Arc<dyn PrimaryTransport>,
        fallback: Arc<dyn FallbackTransport>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        let mode = if config.fallback_only {
            TransportMode::FallbackOnly
        } else {
            TransportMode::Primary
        };
        Arc::new(Self {
            config,
            primary,
            fallback,
            view,
            inner: Mutex::new(ControllerInner {
                state: ControllerState::Idle,
                mode,
                attempt_seq: 0,
            }),
            events,
        })
    }

    pub async fn state(&self) -> ControllerState {
        self.inner.lock().await.state
    }

    pub async fn transport_mode(&self) -> TransportMode {
        self.inner.lock().await.mode
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Runs one submit attempt. Callers keep the trigger disabled while the
    /// state is `Sending`; attempts are not serialized here.
    pub async fn submit(
        self: &Arc<Self>,
        input: FormInput,
    ) -> Result<SubmissionOutcome, SubmitError> {
        if input.honeypot_filled() {
            debug!("contact: submission dropped by spam guard");
            return Ok(SubmissionOutcome::SpamSuppressed);
        }

        self.view.hide_notices();
        self.view.clear_field_errors();

        let fields = match validated_fields(&input) {
            Ok(fields) => fields,
            Err(result) => {
                for (field, message) in result.field_errors() {
                    self.view.show_field_error(field, message);
                }
                if result.consent_missing() {
                    self.view.show_consent_notice(CONSENT_REQUIRED);
                }
                return Err(if result.has_field_errors() {
                    SubmitError::Invalid(result)
                } else {
                    SubmitError::ConsentMissing
                });
            }
        };

        let attempt = {
            let mut guard = self.inner.lock().await;
            guard.attempt_seq += 1;
            guard.attempt_seq
        };
        let attempt_id = Uuid::new_v4();
        self.set_state(ControllerState::Sending).await;
        let original_label = self.view.trigger_label();
        self.view.set_trigger(SENDING_LABEL, true);

        let endpoint = match self.config.policy.check(&self.config.endpoint) {
            Ok(endpoint) => endpoint,
            Err(err) => {
                error!(%attempt_id, error = %err, "contact: refusing to submit");
                self.view.set_trigger(&original_label, false);
                self.set_state(ControllerState::Idle).await;
                return Err(SubmitError::Configuration(err));
            }
        };

        let payload = SubmissionPayload {
            name: fields.name,
            email: fields.email,
            budget: fields.budget,
            message: fields.message,
            source: self.config.source_tag.clone(),
        };

        let mode = self.transport_mode().await;
        let outcome = match mode {
            TransportMode::Primary => {
                match self.primary.send_json(&endpoint, &payload).await {
                    Ok(reply) => {
                        info!(%attempt_id, status = reply.status, "contact: endpoint replied");
                        interpret_reply(&reply)
                    }
                    Err(err) => {
                        warn!(%attempt_id, error = %err, "contact: json submission failed, switching to form post");
                        self.downgrade().await;
                        self.post_fallback(attempt_id, &endpoint, &payload).await
                    }
                }
            }
            TransportMode::FallbackOnly => {
                self.post_fallback(attempt_id, &endpoint, &payload).await
            }
        };

        self.settle(attempt, &original_label, &outcome).await;
        info!(%attempt_id, outcome = outcome_name(&outcome), "contact: attempt settled");
        let _ = self.events.send(ControllerEvent::Outcome(outcome.clone()));
        Ok(outcome)
    }

    async fn post_fallback(
        &self,
        attempt_id: Uuid,
        endpoint: &Url,
        payload: &SubmissionPayload,
    ) -> SubmissionOutcome {
        match self.fallback.post_form(endpoint, payload).await {
            Ok(location) => SubmissionOutcome::FallbackSubmitted { location },
            Err(err) => {
                error!(%attempt_id, error = %err, "contact: form post fallback failed");
                SubmissionOutcome::TransportError
            }
        }
    }

    async fn downgrade(&self) {
        let changed = {
            let mut guard = self.inner.lock().await;
            let changed = guard.mode == TransportMode::Primary;
            guard.mode = TransportMode::FallbackOnly;
            changed
        };
        if changed {
            let _ = self.events.send(ControllerEvent::TransportDowngraded);
        }
    }

    async fn settle(
        self: &Arc<Self>,
        attempt: u64,
        original_label: &str,
        outcome: &SubmissionOutcome,
    ) {
        match outcome {
            SubmissionOutcome::Success => {
                self.view.reset_fields();
                self.set_state(ControllerState::Succeeded).await;
                self.view.show_success();
                self.view.set_trigger(SENT_LABEL, true);
                self.schedule_success_reset(attempt, original_label.to_string());
            }
            SubmissionOutcome::RemoteRejected { detail } => {
                let message = match detail {
                    Some(detail) => format!("Submission failed: {detail}"),
                    None => GENERIC_FAILURE.to_string(),
                };
                self.fail(&message).await;
            }
            SubmissionOutcome::TransportError => self.fail(GENERIC_FAILURE).await,
            SubmissionOutcome::FallbackSubmitted { location } => {
                self.view.navigate(location);
                self.view.set_trigger(original_label, false);
                self.set_state(ControllerState::Idle).await;
            }
            SubmissionOutcome::SpamSuppressed => {}
        }
    }

    async fn fail(&self, message: &str) {
        self.set_state(ControllerState::Failed).await;
        self.view.show_failure(message);
        self.view.set_trigger(RETRY_LABEL, false);
        self.set_state(ControllerState::Idle).await;
    }

    fn schedule_success_reset(self: &Arc<Self>, attempt: u64, original_label: String) {
        let controller = Arc::clone(self);
        let delay = self.config.success_reset_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            controller.finish_success(attempt, &original_label).await;
        });
    }

    async fn finish_success(&self, attempt: u64, original_label: &str) {
        {
            let mut guard = self.inner.lock().await;
            // A newer attempt owns the trigger now.
            if guard.attempt_seq != attempt || guard.state != ControllerState::Succeeded {
                return;
            }
            guard.state = ControllerState::Idle;
        }
        self.view.set_trigger(original_label, false);
        let _ = self
            .events
            .send(ControllerEvent::StateChanged(ControllerState::Idle));
    }

    async fn set_state(&self, state: ControllerState) {
        self.inner.lock().await.state = state;
        let _ = self.events.send(ControllerEvent::StateChanged(state));
    }
}

/// 2xx is success unless the body explicitly says `"ok": false`.
fn interpret_reply(reply: &RemoteReply) -> SubmissionOutcome {
    let body = RemoteReplyBody::parse(&reply.body);
    let flagged_not_ok = body.as_ref().and_then(|body| body.ok) == Some(false);
    if reply.is_success() && !flagged_not_ok {
        return SubmissionOutcome::Success;
    }
    SubmissionOutcome::RemoteRejected {
        detail: body.and_then(|body| body.detail_message()),
    }
}

fn outcome_name(outcome: &SubmissionOutcome) -> &'static str {
    match outcome {
        SubmissionOutcome::Success => "success",
        SubmissionOutcome::RemoteRejected { .. } => "remote_rejected",
        SubmissionOutcome::TransportError => "transport_error",
        SubmissionOutcome::SpamSuppressed => "spam_suppressed",
        SubmissionOutcome::FallbackSubmitted { .. } => "fallback_submitted",
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
