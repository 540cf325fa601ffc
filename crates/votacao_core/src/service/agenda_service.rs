//! Agenda use-case service.
//!
//! # Responsibility
//! - Create agenda items with unique titles.
//! - Resolve agenda items by title for the other use-cases.
//!
//! # Invariants
//! - A taken title fails with `AgendaDuplicate`, whether caught by the
//!   pre-check or by the store's unique constraint.

use crate::model::agenda::{AgendaItem, AgendaTitle};
use crate::repo::agenda_repo::AgendaRepository;
use crate::repo::{ConflictKind, RepoError};
use crate::service::error::VotingError;
use log::{info, warn};

/// Use-case service for agenda items.
pub struct AgendaService<A: AgendaRepository> {
    agendas: A,
}

impl<A: AgendaRepository> AgendaService<A> {
    pub fn new(agendas: A) -> Self {
        Self { agendas }
    }

    /// Creates one agenda item from a raw title.
    ///
    /// # Errors
    /// - `Validation` for blank or oversized titles.
    /// - `AgendaDuplicate` when the title is taken.
    pub fn create_agenda(&self, raw_title: &str) -> Result<AgendaItem, VotingError> {
        let title = AgendaTitle::parse(raw_title)?;
        if self.agendas.agenda_exists(&title)? {
            warn!("event=agenda_create module=service status=rejected error_code=agenda_duplicate");
            return Err(VotingError::AgendaDuplicate(title.into()));
        }

        let item = match self.agendas.create_agenda(&title) {
            Ok(item) => item,
            Err(RepoError::Conflict(ConflictKind::AgendaTitle)) => {
                warn!(
                    "event=agenda_create module=service status=rejected error_code=agenda_duplicate race=true"
                );
                return Err(VotingError::AgendaDuplicate(title.into()));
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            "event=agenda_create module=service status=ok agenda_id={}",
            item.id()
        );
        Ok(item)
    }

    /// Resolves one agenda item by raw title.
    ///
    /// # Errors
    /// - `Validation` for malformed titles.
    /// - `AgendaNotFound` when no item carries the title.
    pub fn get_agenda(&self, raw_title: &str) -> Result<AgendaItem, VotingError> {
        resolve_agenda(&self.agendas, raw_title)
    }
}

/// Title lookup shared by the session, vote and tally services.
pub(crate) fn resolve_agenda<A: AgendaRepository>(
    agendas: &A,
    raw_title: &str,
) -> Result<AgendaItem, VotingError> {
    let title = AgendaTitle::parse(raw_title)?;
    agendas
        .get_agenda_by_title(&title)?
        .ok_or_else(|| VotingError::AgendaNotFound(title.into()))
}
