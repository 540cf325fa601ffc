//! Vote store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist votes and answer existence/count queries.
//!
//! # Invariants
//! - `uk_votes_voter_agenda` is the authoritative one-vote guard; an insert
//!   losing a race surfaces as `Conflict(VoterAgenda)`.
//! - Counts are computed in SQL; the store is the source of truth.

use crate::model::agenda::AgendaId;
use crate::model::vote::{Choice, NewVote, Vote, VoterId};
use crate::repo::{ensure_connection_ready, map_write_error, ConflictKind, RepoError, RepoResult};
use rusqlite::{params, Connection};

/// Repository interface for votes.
pub trait VoteRepository {
    /// Returns whether `voter_id` already voted on `agenda_id`.
    fn vote_exists(&self, voter_id: &VoterId, agenda_id: AgendaId) -> RepoResult<bool>;
    /// Persists one vote and returns it with its assigned id.
    fn insert_vote(&self, vote: NewVote) -> RepoResult<Vote>;
    /// Counts votes for `agenda_id` with the given choice.
    fn count_votes(&self, agenda_id: AgendaId, choice: Choice) -> RepoResult<u64>;
}

/// SQLite-backed vote repository.
pub struct SqliteVoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["agendas", "votes"])?;
        Ok(Self { conn })
    }
}

impl VoteRepository for SqliteVoteRepository<'_> {
    fn vote_exists(&self, voter_id: &VoterId, agenda_id: AgendaId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM votes
                WHERE voter_id = ?1 AND agenda_id = ?2
            );",
            params![voter_id.as_str(), agenda_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn insert_vote(&self, vote: NewVote) -> RepoResult<Vote> {
        self.conn
            .execute(
                "INSERT INTO votes (agenda_id, voter_id, choice, cast_at)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    vote.agenda_id,
                    vote.voter_id.as_str(),
                    vote.choice.as_str(),
                    vote.cast_at.timestamp_millis(),
                ],
            )
            .map_err(|err| map_write_error(err, ConflictKind::VoterAgenda))?;

        let id = self.conn.last_insert_rowid();
        Ok(Vote::from_new(id, vote))
    }

    fn count_votes(&self, agenda_id: AgendaId, choice: Choice) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM votes WHERE agenda_id = ?1 AND choice = ?2;",
            params![agenda_id, choice.as_str()],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative vote count `{count}`")))
    }
}
