//! Tally engine.
//!
//! # Responsibility
//! - Re-count an agenda item's votes on every call and classify the outcome.
//!
//! # Invariants
//! - No caching; the vote store is the source of truth.
//! - Read-only; safe to run concurrently and repeatedly.

use crate::model::tally::TallyResult;
use crate::model::vote::Choice;
use crate::repo::agenda_repo::AgendaRepository;
use crate::repo::vote_repo::VoteRepository;
use crate::service::agenda_service::resolve_agenda;
use crate::service::error::VotingError;
use log::info;

/// Result computation use-case.
pub struct TallyService<A: AgendaRepository, V: VoteRepository> {
    agendas: A,
    votes: V,
}

impl<A: AgendaRepository, V: VoteRepository> TallyService<A, V> {
    pub fn new(agendas: A, votes: V) -> Self {
        Self { agendas, votes }
    }

    /// Computes the current result for the agenda item titled `raw_title`.
    ///
    /// # Errors
    /// - `AgendaNotFound` for unknown titles.
    pub fn tally(&self, raw_title: &str) -> Result<TallyResult, VotingError> {
        let item = resolve_agenda(&self.agendas, raw_title)?;
        let yes_votes = self.votes.count_votes(item.id(), Choice::Yes)?;
        let no_votes = self.votes.count_votes(item.id(), Choice::No)?;

        let result = TallyResult::from_counts(item.title().clone(), yes_votes, no_votes);
        info!(
            "event=tally module=service status=ok agenda_id={} yes={} no={} outcome={:?}",
            item.id(),
            yes_votes,
            no_votes,
            result.outcome
        );
        Ok(result)
    }
}
