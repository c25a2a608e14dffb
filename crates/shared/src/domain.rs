use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw values as the visitor typed them. Nothing here is trimmed or checked yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    pub name: String,
    pub email: String,
    pub budget: String,
    pub message: String,
    pub consent: bool,
    /// Hidden `company` field. Humans never see it, so anything in it came from a bot.
    #[serde(default, rename = "company")]
    pub honeypot: String,
}

impl FormInput {
    /// Whitespace counts: a person never reaches the field, so any keystroke in it is a bot's.
    pub fn honeypot_filled(&self) -> bool {
        !self.honeypot.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Email,
    Budget,
    Message,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Name, Field::Email, Field::Budget, Field::Message];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Budget => "budget",
            Field::Message => "message",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Budget {
    #[serde(rename = "under-5k")]
    Under5k,
    #[serde(rename = "5k-10k")]
    From5kTo10k,
    #[serde(rename = "10k-25k")]
    From10kTo25k,
    #[serde(rename = "25k-50k")]
    From25kTo50k,
    #[serde(rename = "50k-plus")]
    Over50k,
}

impl Budget {
    pub const ALL: [Budget; 5] = [
        Budget::Under5k,
        Budget::From5kTo10k,
        Budget::From10kTo25k,
        Budget::From25kTo50k,
        Budget::Over50k,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Budget::Under5k => "under-5k",
            Budget::From5kTo10k => "5k-10k",
            Budget::From10kTo25k => "10k-25k",
            Budget::From25kTo50k => "25k-50k",
            Budget::Over50k => "50k-plus",
        }
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown budget choice '{0}'")]
pub struct UnknownBudget(pub String);

impl FromStr for Budget {
    type Err = UnknownBudget;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        Budget::ALL
            .into_iter()
            .find(|budget| budget.as_str() == raw)
            .ok_or_else(|| UnknownBudget(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_parses_wire_values_and_rejects_the_rest() {
        for budget in Budget::ALL {
            assert_eq!(budget.as_str().parse::<Budget>(), Ok(budget));
        }
        assert_eq!(" 5k-10k ".parse::<Budget>(), Ok(Budget::From5kTo10k));
        assert!("".parse::<Budget>().is_err());
        assert!("5K-10K".parse::<Budget>().is_err());
    }

    #[test]
    fn whitespace_only_honeypot_counts_as_filled() {
        let mut input = FormInput::default();
        assert!(!input.honeypot_filled());
        input.honeypot = "   ".to_string();
        assert!(input.honeypot_filled());
        input.honeypot = " acme ".to_string();
        assert!(input.honeypot_filled());
    }
}
