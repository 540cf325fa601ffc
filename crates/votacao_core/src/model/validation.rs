//! Field-level validation errors shared by value objects.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure raised while constructing a value object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Agenda title is empty or whitespace only.
    BlankTitle,
    /// Agenda title exceeds the maximum char count.
    TitleTooLong { max: usize, actual: usize },
    /// Voter identifier is empty or whitespace only.
    BlankVoterId,
    /// Voter identifier is not exactly 11 decimal digits.
    MalformedVoterId,
    /// Choice text is neither `SIM` nor `NAO`.
    InvalidChoice(String),
}

impl ValidationError {
    /// External field name the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::BlankTitle | Self::TitleTooLong { .. } => "titulo",
            Self::BlankVoterId | Self::MalformedVoterId => "associadoId",
            Self::InvalidChoice(_) => "escolha",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "agenda title must not be blank"),
            Self::TitleTooLong { max, actual } => {
                write!(f, "agenda title must have at most {max} chars, got {actual}")
            }
            Self::BlankVoterId => write!(f, "voter identifier must not be blank"),
            Self::MalformedVoterId => {
                write!(f, "voter identifier must contain exactly 11 decimal digits")
            }
            Self::InvalidChoice(value) => {
                write!(f, "invalid choice `{value}`; expected SIM or NAO")
            }
        }
    }
}

impl Error for ValidationError {}
