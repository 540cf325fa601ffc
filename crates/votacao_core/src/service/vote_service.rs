//! Vote registrar.
//!
//! # Responsibility
//! - Accept at most one vote per `(voter, agenda item)` while a session is
//!   open.
//!
//! # Invariants
//! - Check order: voter id, agenda lookup, session state, duplicate,
//!   eligibility, choice. Every check only reads, so a failure leaves no
//!   state behind.
//! - The duplicate pre-check runs before the oracle call; the store's unique
//!   constraint stays the authoritative guard and a lost race is reported as
//!   `DuplicateVote`.
//! - Exactly one insert on success, zero on any failure.
//! - Session state is read once per call via `AgendaItem::session_state_at`,
//!   the predicate behind `SessionService::state`; `now` is also the
//!   vote's `cast_at`.

use crate::clock::Clock;
use crate::eligibility::IdentityValidator;
use crate::model::agenda::{AgendaItem, SessionState};
use crate::model::vote::{Choice, NewVote, Vote, VoterId};
use crate::repo::agenda_repo::AgendaRepository;
use crate::repo::vote_repo::VoteRepository;
use crate::repo::{ConflictKind, RepoError};
use crate::service::agenda_service::resolve_agenda;
use crate::service::error::VotingError;
use chrono::SubsecRound;
use log::{error, info, warn};
use std::sync::Arc;

/// Vote registration use-case.
pub struct VoteService<A: AgendaRepository, V: VoteRepository> {
    agendas: A,
    votes: V,
    validator: Arc<dyn IdentityValidator>,
    clock: Arc<dyn Clock>,
}

impl<A: AgendaRepository, V: VoteRepository> VoteService<A, V> {
    pub fn new(
        agendas: A,
        votes: V,
        validator: Arc<dyn IdentityValidator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            agendas,
            votes,
            validator,
            clock,
        }
    }

    /// Registers one vote on the agenda item titled `raw_title`.
    ///
    /// # Errors
    /// - `Validation` for a malformed title, voter id or choice.
    /// - `AgendaNotFound`, `SessionNotOpened`, `SessionClosed`,
    ///   `DuplicateVote`, `VoterNotAuthorized` per the check order above.
    /// - `Eligibility`/`Repo` for collaborator failures; never retried.
    pub fn register_vote(
        &self,
        raw_title: &str,
        raw_voter_id: &str,
        raw_choice: &str,
    ) -> Result<Vote, VotingError> {
        let voter_id = VoterId::parse(raw_voter_id)?;
        let item = resolve_agenda(&self.agendas, raw_title)?;

        let now = self.clock.now();
        match item.session_state_at(now) {
            SessionState::Open => {}
            SessionState::NoSession => {
                return Err(self.rejected(
                    &item,
                    &voter_id,
                    VotingError::SessionNotOpened(item.title().to_string()),
                ));
            }
            SessionState::Closed => {
                return Err(self.rejected(
                    &item,
                    &voter_id,
                    VotingError::SessionClosed(item.title().to_string()),
                ));
            }
        }

        if self.votes.vote_exists(&voter_id, item.id())? {
            return Err(self.rejected(&item, &voter_id, duplicate_vote(&item, &voter_id)));
        }

        let status = self.validator.check_eligibility(&voter_id).map_err(|err| {
            error!(
                "event=vote_register module=service status=error agenda_id={} voter={} error_code=eligibility_unavailable error={}",
                item.id(),
                voter_id.masked(),
                err
            );
            VotingError::from(err)
        })?;
        if !status.is_eligible() {
            return Err(self.rejected(
                &item,
                &voter_id,
                VotingError::VoterNotAuthorized {
                    voter: voter_id.masked(),
                    status: status.as_str().to_string(),
                },
            ));
        }

        let choice = Choice::parse(raw_choice)
            .map_err(|err| self.rejected(&item, &voter_id, err.into()))?;

        let vote = NewVote {
            voter_id: voter_id.clone(),
            choice,
            agenda_id: item.id(),
            cast_at: now.trunc_subsecs(3),
        };
        let vote = match self.votes.insert_vote(vote) {
            Ok(vote) => vote,
            Err(RepoError::Conflict(ConflictKind::VoterAgenda)) => {
                return Err(self.rejected(&item, &voter_id, duplicate_vote(&item, &voter_id)));
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            "event=vote_register module=service status=ok agenda_id={} vote_id={} voter={} choice={}",
            item.id(),
            vote.id(),
            voter_id.masked(),
            vote.choice()
        );
        Ok(vote)
    }

    fn rejected(&self, item: &AgendaItem, voter_id: &VoterId, err: VotingError) -> VotingError {
        warn!(
            "event=vote_register module=service status=rejected agenda_id={} voter={} error_code={}",
            item.id(),
            voter_id.masked(),
            err.code()
        );
        err
    }
}

fn duplicate_vote(item: &AgendaItem, voter_id: &VoterId) -> VotingError {
    VotingError::DuplicateVote {
        title: item.title().to_string(),
        voter: voter_id.masked(),
    }
}
