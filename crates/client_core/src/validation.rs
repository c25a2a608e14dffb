use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use shared::domain::{Budget, Field, FormInput};

pub const NAME_REQUIRED: &str = "Please enter your name.";
pub const EMAIL_INVALID: &str = "Enter a valid email.";
pub const BUDGET_REQUIRED: &str = "Select a budget.";
pub const MESSAGE_TOO_SHORT: &str = "Tell us a bit more (12+ chars).";
pub const CONSENT_REQUIRED: &str = "Please agree to the privacy policy.";

pub const MIN_MESSAGE_CHARS: usize = 12;

// Syntactic shape only: something@something.something with no whitespace.
static RE_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: BTreeMap<Field, &'static str>,
    consent_missing: bool,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && !self.consent_missing
    }

    pub fn error(&self, field: Field) -> Option<&'static str> {
        self.errors.get(&field).copied()
    }

    /// Field errors in display order. Consent is not part of this list.
    pub fn field_errors(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.errors.iter().map(|(field, message)| (*field, *message))
    }

    pub fn has_field_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn consent_missing(&self) -> bool {
        self.consent_missing
    }
}

/// Fields that passed validation, trimmed and typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFields {
    pub name: String,
    pub email: String,
    pub budget: Budget,
    pub message: String,
}

pub fn validate(input: &FormInput) -> ValidationResult {
    let mut errors = BTreeMap::new();

    if input.name.trim().is_empty() {
        errors.insert(Field::Name, NAME_REQUIRED);
    }
    if !is_plausible_email(input.email.trim()) {
        errors.insert(Field::Email, EMAIL_INVALID);
    }
    if input.budget.parse::<Budget>().is_err() {
        errors.insert(Field::Budget, BUDGET_REQUIRED);
    }
    if input.message.trim().chars().count() < MIN_MESSAGE_CHARS {
        errors.insert(Field::Message, MESSAGE_TOO_SHORT);
    }

    ValidationResult {
        errors,
        consent_missing: !input.consent,
    }
}

/// Returns the cleaned fields when `input` passes every rule.
pub fn validated_fields(input: &FormInput) -> Result<ValidFields, ValidationResult> {
    let result = validate(input);
    if !result.is_valid() {
        return Err(result);
    }
    let budget = input.budget.parse::<Budget>().map_err(|_| result.clone())?;
    Ok(ValidFields {
        name: input.name.trim().to_string(),
        email: input.email.trim().to_string(),
        budget,
        message: input.message.trim().to_string(),
    })
}

fn is_plausible_email(email: &str) -> bool {
    !email.is_empty() && RE_EMAIL.is_match(email)
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
