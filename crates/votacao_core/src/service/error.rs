//! Domain error taxonomy shared by agenda, session, vote and tally services.

use crate::eligibility::EligibilityError;
use crate::model::validation::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error returned by voting use-cases.
///
/// Domain variants are raised at the point of violation and reach the
/// boundary unchanged. `Eligibility` and `Repo` are infrastructure failures.
#[derive(Debug)]
pub enum VotingError {
    /// Create with an existing title.
    AgendaDuplicate(String),
    /// Open/vote/tally on an unknown title.
    AgendaNotFound(String),
    /// Second open on the same agenda item.
    SessionAlreadyOpen(String),
    /// Vote before any session was opened.
    SessionNotOpened(String),
    /// Vote after the window elapsed.
    SessionClosed(String),
    /// Same voter on the same agenda item twice.
    DuplicateVote { title: String, voter: String },
    /// Oracle answered with anything but the eligible token.
    VoterNotAuthorized { voter: String, status: String },
    /// Input rejected at a value object boundary.
    Validation(ValidationError),
    /// Oracle call failed.
    Eligibility(EligibilityError),
    /// Persistence failure.
    Repo(RepoError),
}

impl VotingError {
    /// Stable machine-readable code, also used as `error_code` in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AgendaDuplicate(_) => "agenda_duplicate",
            Self::AgendaNotFound(_) => "agenda_not_found",
            Self::SessionAlreadyOpen(_) => "session_already_open",
            Self::SessionNotOpened(_) => "session_not_opened",
            Self::SessionClosed(_) => "session_closed",
            Self::DuplicateVote { .. } => "duplicate_vote",
            Self::VoterNotAuthorized { .. } => "voter_not_authorized",
            Self::Validation(_) => "validation_failed",
            Self::Eligibility(_) => "eligibility_unavailable",
            Self::Repo(_) => "repo_failed",
        }
    }

    /// Returns whether this is an infrastructure failure rather than a rule
    /// violation.
    pub fn is_unexpected(&self) -> bool {
        matches!(self, Self::Eligibility(_) | Self::Repo(_))
    }
}

impl Display for VotingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AgendaDuplicate(title) => write!(f, "agenda already exists: `{title}`"),
            Self::AgendaNotFound(title) => write!(f, "agenda not found: `{title}`"),
            Self::SessionAlreadyOpen(title) => {
                write!(f, "voting session already opened for agenda `{title}`")
            }
            Self::SessionNotOpened(title) => {
                write!(f, "voting session was never opened for agenda `{title}`")
            }
            Self::SessionClosed(title) => {
                write!(f, "voting session is closed for agenda `{title}`")
            }
            Self::DuplicateVote { title, voter } => {
                write!(f, "voter {voter} already voted on agenda `{title}`")
            }
            Self::VoterNotAuthorized { voter, status } => {
                write!(f, "voter {voter} is not authorized to vote (status {status})")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Eligibility(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for VotingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Eligibility(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for VotingError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<EligibilityError> for VotingError {
    fn from(value: EligibilityError) -> Self {
        Self::Eligibility(value)
    }
}

impl From<RepoError> for VotingError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
