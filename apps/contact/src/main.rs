use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::{bail, Result};
use clap::Parser;
use client_core::{FormView, SubmissionController, SubmitError};
use shared::{
    domain::{Field, FormInput},
    protocol::{ControllerEvent, ControllerState, SubmissionOutcome},
};
use tracing::{debug, error};
use url::Url;

mod config;

use config::load_settings;

/// Send one contact form submission from the terminal.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "contact.toml")]
    config: PathBuf,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    email: String,
    /// One of: under-5k, 5k-10k, 10k-25k, 25k-50k, 50k-plus
    #[arg(long, default_value = "")]
    budget: String,
    #[arg(long, default_value = "")]
    message: String,
    /// Agree to the privacy policy.
    #[arg(long)]
    consent: bool,
    #[arg(long, default_value = "", hide = true)]
    company: String,
}

impl Args {
    fn form_input(&self) -> FormInput {
        FormInput {
            name: self.name.clone(),
            email: self.email.clone(),
            budget: self.budget.clone(),
            message: self.message.clone(),
            consent: self.consent,
            honeypot: self.company.clone(),
        }
    }
}

struct TerminalView {
    label: Mutex<String>,
}

impl TerminalView {
    fn new(label: &str) -> Self {
        Self {
            label: Mutex::new(label.to_string()),
        }
    }
}

impl FormView for TerminalView {
    fn hide_notices(&self) {}

    fn clear_field_errors(&self) {}

    fn show_field_error(&self, field: Field, message: &str) {
        eprintln!("  {field}: {message}");
    }

    fn show_consent_notice(&self, message: &str) {
        eprintln!("! {message}");
    }

    fn trigger_label(&self) -> String {
        self.label
            .lock()
            .map(|label| label.clone())
            .unwrap_or_default()
    }

    fn set_trigger(&self, label: &str, disabled: bool) {
        if let Ok(mut current) = self.label.lock() {
            *current = label.to_string();
        }
        let marker = if disabled { " (disabled)" } else { "" };
        println!("[{label}]{marker}");
    }

    fn show_success(&self) {
        println!("Thanks! Your message is on its way.");
    }

    fn show_failure(&self, message: &str) {
        eprintln!("{message}");
    }

    fn reset_fields(&self) {
        debug!("form fields cleared");
    }

    fn navigate(&self, location: &Url) {
        println!("Continue at {location}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = load_settings(&args.config)?;
    let config = settings.controller_config();
    if let Err(err) = config.policy.check(&config.endpoint) {
        error!(error = %err, "form endpoint misconfigured; set CONTACT_ENDPOINT or 'endpoint' in the settings file");
    }

    let view = Arc::new(TerminalView::new("Send message"));
    let controller = SubmissionController::new(config, view);

    let mut settled = controller.subscribe_events();
    let mut events = controller.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let Ok(line) = serde_json::to_string(&event) {
                debug!(event = %line, "contact: controller event");
            }
        }
    });

    let outcome = match controller.submit(args.form_input()).await {
        Ok(outcome) => outcome,
        Err(SubmitError::Invalid(_)) => bail!("the form has errors"),
        Err(SubmitError::ConsentMissing) => bail!("consent is required (--consent)"),
        Err(err @ SubmitError::Configuration(_)) => return Err(err.into()),
    };

    // Keep the process alive until the success display has been reset.
    if outcome == SubmissionOutcome::Success {
        while let Ok(event) = settled.recv().await {
            if event == ControllerEvent::StateChanged(ControllerState::Idle) {
                break;
            }
        }
    }

    match outcome {
        SubmissionOutcome::Success
        | SubmissionOutcome::SpamSuppressed
        | SubmissionOutcome::FallbackSubmitted { .. } => Ok(()),
        SubmissionOutcome::RemoteRejected { .. } | SubmissionOutcome::TransportError => {
            bail!("submission was not delivered")
        }
    }
}
