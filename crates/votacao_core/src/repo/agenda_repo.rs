//! Agenda store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist agenda items keyed by unique title.
//! - Attach the voting window exactly once per item.
//!
//! # Invariants
//! - Title uniqueness is enforced by `uk_agendas_title`.
//! - `attach_window` is a conditional update on "no window yet", so only one
//!   of several concurrent attaches for the same item can succeed.

use crate::model::agenda::{AgendaId, AgendaItem, AgendaTitle, VotingWindow};
use crate::repo::{
    ensure_connection_ready, map_write_error, parse_epoch_ms, ConflictKind, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const AGENDA_SELECT_SQL: &str = "SELECT
    id,
    title,
    session_opens_at,
    session_closes_at,
    session_duration_minutes
FROM agendas";

/// Repository interface for agenda items.
pub trait AgendaRepository {
    /// Inserts a new item. Fails with `Conflict(AgendaTitle)` on a taken title.
    fn create_agenda(&self, title: &AgendaTitle) -> RepoResult<AgendaItem>;
    /// Looks up one item by exact title.
    fn get_agenda_by_title(&self, title: &AgendaTitle) -> RepoResult<Option<AgendaItem>>;
    /// Returns whether an item with this title exists.
    fn agenda_exists(&self, title: &AgendaTitle) -> RepoResult<bool>;
    /// Attaches `window` when the item has none. Returns `false` otherwise.
    fn attach_window(&self, id: AgendaId, window: &VotingWindow) -> RepoResult<bool>;
}

/// SQLite-backed agenda repository.
pub struct SqliteAgendaRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAgendaRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["agendas"])?;
        Ok(Self { conn })
    }
}

impl AgendaRepository for SqliteAgendaRepository<'_> {
    fn create_agenda(&self, title: &AgendaTitle) -> RepoResult<AgendaItem> {
        self.conn
            .execute(
                "INSERT INTO agendas (title) VALUES (?1);",
                [title.as_str()],
            )
            .map_err(|err| map_write_error(err, ConflictKind::AgendaTitle))?;

        let id = self.conn.last_insert_rowid();
        Ok(AgendaItem::from_parts(id, title.clone(), None))
    }

    fn get_agenda_by_title(&self, title: &AgendaTitle) -> RepoResult<Option<AgendaItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{AGENDA_SELECT_SQL} WHERE title = ?1;"))?;
        let mut rows = stmt.query([title.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_agenda_row(row)?));
        }

        Ok(None)
    }

    fn agenda_exists(&self, title: &AgendaTitle) -> RepoResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM agendas WHERE title = ?1;",
                [title.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn attach_window(&self, id: AgendaId, window: &VotingWindow) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE agendas
             SET
                session_opens_at = ?2,
                session_closes_at = ?3,
                session_duration_minutes = ?4
             WHERE id = ?1
               AND session_opens_at IS NULL;",
            params![
                id,
                window.opens_at().timestamp_millis(),
                window.closes_at().timestamp_millis(),
                window.duration_minutes(),
            ],
        )?;

        Ok(changed == 1)
    }
}

fn parse_agenda_row(row: &Row<'_>) -> RepoResult<AgendaItem> {
    let id: AgendaId = row.get("id")?;
    let title_text: String = row.get("title")?;
    let title = AgendaTitle::parse(title_text.as_str()).map_err(|err| {
        RepoError::InvalidData(format!("invalid title `{title_text}` in agendas.title: {err}"))
    })?;

    let opens_at: Option<i64> = row.get("session_opens_at")?;
    let closes_at: Option<i64> = row.get("session_closes_at")?;
    let duration: Option<u32> = row.get("session_duration_minutes")?;

    let window = match (opens_at, closes_at, duration) {
        (None, None, None) => None,
        (Some(opens_at), Some(closes_at), Some(duration)) => {
            let opens_at = parse_epoch_ms(opens_at, "agendas.session_opens_at")?;
            let closes_at = parse_epoch_ms(closes_at, "agendas.session_closes_at")?;
            let window = VotingWindow::from_parts(opens_at, closes_at, duration).ok_or_else(
                || RepoError::InvalidData(format!("inconsistent voting window for agenda {id}")),
            )?;
            Some(window)
        }
        _ => {
            return Err(RepoError::InvalidData(format!(
                "partial voting window columns for agenda {id}"
            )));
        }
    };

    Ok(AgendaItem::from_parts(id, title, window))
}
