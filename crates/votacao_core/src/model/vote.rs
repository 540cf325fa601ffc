//! Vote records and the voter-facing value objects.
//!
//! # Invariants
//! - `VoterId` is exactly 11 ASCII decimal digits.
//! - `Choice` is a closed set parsed case-insensitively.
//! - A vote is unique per `(voter_id, agenda_id)` and never mutated.

use crate::model::agenda::AgendaId;
use crate::model::validation::ValidationError;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

static VOTER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{11}$").expect("valid voter id regex"));

/// Store-assigned numeric vote identifier.
pub type VoteId = i64;

/// Voter identifier ("CPF").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoterId(String);

impl VoterId {
    /// Parses a raw voter identifier.
    ///
    /// # Errors
    /// - `BlankVoterId` when the value is empty or whitespace only.
    /// - `MalformedVoterId` when the value is not exactly 11 digits.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::BlankVoterId);
        }
        if !VOTER_ID_RE.is_match(&value) {
            return Err(ValidationError::MalformedVoterId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Log-safe rendering keeping only the last two digits.
    pub fn masked(&self) -> String {
        let visible = &self.0[self.0.len() - 2..];
        format!("*********{visible}")
    }
}

impl TryFrom<String> for VoterId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<VoterId> for String {
    fn from(value: VoterId) -> Self {
        value.0
    }
}

impl Display for VoterId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ballot choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    #[serde(rename = "SIM")]
    Yes,
    #[serde(rename = "NAO")]
    No,
}

impl Choice {
    /// Parses external choice text, ignoring ASCII case.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        if value.eq_ignore_ascii_case("sim") {
            Ok(Self::Yes)
        } else if value.eq_ignore_ascii_case("nao") {
            Ok(Self::No)
        } else {
            Err(ValidationError::InvalidChoice(value.to_string()))
        }
    }

    /// Canonical external/storage label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "SIM",
            Self::No => "NAO",
        }
    }
}

impl Display for Choice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vote accepted by the registrar but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVote {
    pub voter_id: VoterId,
    pub choice: Choice,
    pub agenda_id: AgendaId,
    /// Registrar clock instant at acceptance.
    pub cast_at: DateTime<Utc>,
}

/// Persisted vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    id: VoteId,
    voter_id: VoterId,
    choice: Choice,
    agenda_id: AgendaId,
    cast_at: DateTime<Utc>,
}

impl Vote {
    /// Binds a store-assigned id to an accepted vote.
    pub fn from_new(id: VoteId, vote: NewVote) -> Self {
        Self {
            id,
            voter_id: vote.voter_id,
            choice: vote.choice,
            agenda_id: vote.agenda_id,
            cast_at: vote.cast_at,
        }
    }

    pub fn id(&self) -> VoteId {
        self.id
    }

    pub fn voter_id(&self) -> &VoterId {
        &self.voter_id
    }

    pub fn choice(&self) -> Choice {
        self.choice
    }

    pub fn agenda_id(&self) -> AgendaId {
        self.agenda_id
    }

    pub fn cast_at(&self) -> DateTime<Utc> {
        self.cast_at
    }
}

#[cfg(test)]
mod tests {
    use super::{Choice, VoterId};
    use crate::model::validation::ValidationError;

    #[test]
    fn voter_id_accepts_exactly_eleven_digits() {
        assert!(VoterId::parse("12345678901").is_ok());
        assert_eq!(VoterId::parse(""), Err(ValidationError::BlankVoterId));
        assert_eq!(
            VoterId::parse("1234567890"),
            Err(ValidationError::MalformedVoterId)
        );
        assert_eq!(
            VoterId::parse("123.456.789-01"),
            Err(ValidationError::MalformedVoterId)
        );
        assert_eq!(
            VoterId::parse(" 12345678901"),
            Err(ValidationError::MalformedVoterId)
        );
        assert_eq!(
            VoterId::parse("١٢٣٤٥٦٧٨٩٠١"),
            Err(ValidationError::MalformedVoterId)
        );
    }

    #[test]
    fn voter_id_masks_all_but_last_two_digits() {
        let voter = VoterId::parse("12345678901").unwrap();
        assert_eq!(voter.masked(), "*********01");
    }

    #[test]
    fn choice_parsing_ignores_case() {
        for raw in ["sim", "SIM", "Sim"] {
            assert_eq!(Choice::parse(raw).unwrap(), Choice::Yes);
        }
        for raw in ["nao", "NAO", "Nao"] {
            assert_eq!(Choice::parse(raw).unwrap(), Choice::No);
        }
        assert_eq!(
            Choice::parse("talvez"),
            Err(ValidationError::InvalidChoice("talvez".to_string()))
        );
    }

    #[test]
    fn choice_serializes_with_portuguese_labels() {
        assert_eq!(serde_json::to_string(&Choice::Yes).unwrap(), "\"SIM\"");
        assert_eq!(serde_json::to_string(&Choice::No).unwrap(), "\"NAO\"");
    }
}
