//! Agenda item ("pauta") aggregate and its voting window.
//!
//! # Responsibility
//! - Validate agenda titles at construction time.
//! - Model the single voting window and its time predicate.
//!
//! # Invariants
//! - Titles are non-blank and at most 500 chars.
//! - `duration_minutes >= 1` and `closes_at == opens_at + duration_minutes`.
//! - A window is open on `[opens_at, closes_at]`, inclusive on both ends.
//! - Closing is never stored; every read re-evaluates the time predicate.

use crate::model::validation::ValidationError;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned numeric agenda identifier.
pub type AgendaId = i64;

/// Maximum title length, in chars.
pub const AGENDA_TITLE_MAX_CHARS: usize = 500;

/// Duration applied when the requested one is absent or below one minute.
pub const DEFAULT_SESSION_MINUTES: u32 = 1;

/// Validated agenda title. Identity of an agenda item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgendaTitle(String);

impl AgendaTitle {
    /// Parses a raw title.
    ///
    /// # Errors
    /// - `BlankTitle` when the value is empty or whitespace only.
    /// - `TitleTooLong` when the value exceeds 500 chars.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::BlankTitle);
        }
        let actual = value.chars().count();
        if actual > AGENDA_TITLE_MAX_CHARS {
            return Err(ValidationError::TitleTooLong {
                max: AGENDA_TITLE_MAX_CHARS,
                actual,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AgendaTitle {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AgendaTitle> for String {
    fn from(value: AgendaTitle) -> Self {
        value.0
    }
}

impl Display for AgendaTitle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coerces a requested session duration into the effective one.
///
/// `None`, zero and negative values all map to `DEFAULT_SESSION_MINUTES`.
pub fn effective_duration_minutes(requested: Option<i32>) -> u32 {
    match requested {
        Some(value) if value >= 1 => value.unsigned_abs(),
        _ => DEFAULT_SESSION_MINUTES,
    }
}

/// Time interval during which one agenda item accepts votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingWindow {
    opens_at: DateTime<Utc>,
    closes_at: DateTime<Utc>,
    duration_minutes: u32,
}

impl VotingWindow {
    /// Opens a window at `now` for the coerced duration.
    ///
    /// `now` is truncated to millisecond precision so the window survives a
    /// storage round-trip unchanged.
    pub fn open(now: DateTime<Utc>, requested_minutes: Option<i32>) -> Self {
        let duration_minutes = effective_duration_minutes(requested_minutes);
        let opens_at = now.trunc_subsecs(3);
        Self {
            opens_at,
            closes_at: opens_at + Duration::minutes(i64::from(duration_minutes)),
            duration_minutes,
        }
    }

    /// Rebuilds a window from persisted parts.
    ///
    /// Returns `None` when the parts violate the window invariants.
    pub fn from_parts(
        opens_at: DateTime<Utc>,
        closes_at: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Option<Self> {
        if duration_minutes < 1 {
            return None;
        }
        if closes_at != opens_at + Duration::minutes(i64::from(duration_minutes)) {
            return None;
        }
        Some(Self {
            opens_at,
            closes_at,
            duration_minutes,
        })
    }

    pub fn opens_at(&self) -> DateTime<Utc> {
        self.opens_at
    }

    pub fn closes_at(&self) -> DateTime<Utc> {
        self.closes_at
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// Returns whether `now` falls inside `[opens_at, closes_at]`.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.opens_at && now <= self.closes_at
    }
}

/// Derived session state of an agenda item at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// No window was ever opened.
    NoSession,
    /// Window exists and the instant is inside it.
    Open,
    /// Window exists and the instant is outside it. Terminal.
    Closed,
}

/// Agenda item aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaItem {
    id: AgendaId,
    title: AgendaTitle,
    window: Option<VotingWindow>,
}

impl AgendaItem {
    /// Builds an item from store-owned parts.
    pub fn from_parts(id: AgendaId, title: AgendaTitle, window: Option<VotingWindow>) -> Self {
        Self { id, title, window }
    }

    pub fn id(&self) -> AgendaId {
        self.id
    }

    pub fn title(&self) -> &AgendaTitle {
        &self.title
    }

    pub fn window(&self) -> Option<&VotingWindow> {
        self.window.as_ref()
    }

    /// Returns whether a window was ever attached.
    pub fn has_window(&self) -> bool {
        self.window.is_some()
    }

    /// Returns whether the item accepts votes at `now`.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.window.is_some_and(|window| window.is_open_at(now))
    }

    /// Classifies the item's session at `now`.
    pub fn session_state_at(&self, now: DateTime<Utc>) -> SessionState {
        match self.window {
            None => SessionState::NoSession,
            Some(window) if window.is_open_at(now) => SessionState::Open,
            Some(_) => SessionState::Closed,
        }
    }

    /// Returns a copy carrying `window`. Callers must check `has_window` first.
    pub(crate) fn with_window(&self, window: VotingWindow) -> Self {
        Self {
            id: self.id,
            title: self.title.clone(),
            window: Some(window),
        }
    }
}
