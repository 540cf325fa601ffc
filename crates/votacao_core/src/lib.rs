//! Core domain logic for assembly voting.
//! This crate is the single source of truth for session, vote and tally
//! invariants.

pub mod clock;
pub mod db;
pub mod eligibility;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use eligibility::{
    EligibilityError, EligibilityStatus, FixedIdentityValidator, IdentityValidator,
    RandomIdentityValidator, ABLE_TO_VOTE, UNABLE_TO_VOTE,
};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget,
};
pub use model::agenda::{
    effective_duration_minutes, AgendaId, AgendaItem, AgendaTitle, SessionState, VotingWindow,
    AGENDA_TITLE_MAX_CHARS, DEFAULT_SESSION_MINUTES,
};
pub use model::tally::{TallyOutcome, TallyResult};
pub use model::validation::ValidationError;
pub use model::vote::{Choice, NewVote, Vote, VoteId, VoterId};
pub use repo::agenda_repo::{AgendaRepository, SqliteAgendaRepository};
pub use repo::vote_repo::{SqliteVoteRepository, VoteRepository};
pub use repo::{ConflictKind, RepoError, RepoResult};
pub use service::agenda_service::AgendaService;
pub use service::error::VotingError;
pub use service::session_service::SessionService;
pub use service::tally_service::TallyService;
pub use service::vote_service::VoteService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
