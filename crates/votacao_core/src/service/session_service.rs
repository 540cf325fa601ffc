//! Voting session engine.
//!
//! # Responsibility
//! - Open the single voting window of an agenda item.
//! - Answer open/closed/never-opened at the injected clock's "now".
//!
//! # Invariants
//! - `NoSession -> Open` happens once per item; a second open fails with
//!   `SessionAlreadyOpen`, including the loser of a concurrent race.
//! - `Open -> Closed` is a pure function of time; nothing is stored.

use crate::clock::Clock;
use crate::model::agenda::{AgendaItem, SessionState, VotingWindow};
use crate::repo::agenda_repo::AgendaRepository;
use crate::service::agenda_service::resolve_agenda;
use crate::service::error::VotingError;
use log::{info, warn};
use std::sync::Arc;

/// Session engine over an agenda repository and a clock.
pub struct SessionService<A: AgendaRepository> {
    agendas: A,
    clock: Arc<dyn Clock>,
}

impl<A: AgendaRepository> SessionService<A> {
    pub fn new(agendas: A, clock: Arc<dyn Clock>) -> Self {
        Self { agendas, clock }
    }

    /// Opens the voting window of `item`.
    ///
    /// # Contract
    /// - Effective duration is `requested_minutes` when `>= 1`, else 1.
    /// - Window opens at the clock's "now".
    /// - Returns the item carrying its new window.
    pub fn open(
        &self,
        item: &AgendaItem,
        requested_minutes: Option<i32>,
    ) -> Result<AgendaItem, VotingError> {
        if item.has_window() {
            warn!(
                "event=session_open module=service status=rejected agenda_id={} error_code=session_already_open",
                item.id()
            );
            return Err(VotingError::SessionAlreadyOpen(item.title().to_string()));
        }

        let window = VotingWindow::open(self.clock.now(), requested_minutes);
        if !self.agendas.attach_window(item.id(), &window)? {
            warn!(
                "event=session_open module=service status=rejected agenda_id={} error_code=session_already_open race=true",
                item.id()
            );
            return Err(VotingError::SessionAlreadyOpen(item.title().to_string()));
        }

        info!(
            "event=session_open module=service status=ok agenda_id={} duration_minutes={} closes_at_ms={}",
            item.id(),
            window.duration_minutes(),
            window.closes_at().timestamp_millis()
        );
        Ok(item.with_window(window))
    }

    /// Resolves the item by raw title, then opens its window.
    pub fn open_session(
        &self,
        raw_title: &str,
        requested_minutes: Option<i32>,
    ) -> Result<AgendaItem, VotingError> {
        let item = resolve_agenda(&self.agendas, raw_title)?;
        self.open(&item, requested_minutes)
    }

    /// Returns whether `item` accepts votes now.
    pub fn is_open(&self, item: &AgendaItem) -> bool {
        item.is_open_at(self.clock.now())
    }

    /// Returns whether a window was ever opened for `item`.
    pub fn has_window(&self, item: &AgendaItem) -> bool {
        item.has_window()
    }

    /// Classifies `item`'s session now.
    pub fn state(&self, item: &AgendaItem) -> SessionState {
        item.session_state_at(self.clock.now())
    }
}
