//! Tally result value object.
//!
//! # Invariants
//! - Percentages are truncated independently; their sum may be below 100.
//! - A zero-vote tally carries no percentages and outcome `NoVotes`.

use crate::model::agenda::AgendaTitle;
use serde::{Deserialize, Serialize};

/// Outcome classification of a tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TallyOutcome {
    /// Strictly more YES than NO.
    Approved,
    /// Strictly more NO than YES.
    Rejected,
    /// Same non-zero count on both sides.
    Tie,
    /// Nothing was cast.
    NoVotes,
}

/// Snapshot of an agenda item's result at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    pub title: AgendaTitle,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub total_votes: u64,
    /// `None` when no votes were cast.
    pub percent_yes: Option<u64>,
    /// `None` when no votes were cast.
    pub percent_no: Option<u64>,
    pub outcome: TallyOutcome,
}

impl TallyResult {
    /// Derives the result from raw counts.
    pub fn from_counts(title: AgendaTitle, yes_votes: u64, no_votes: u64) -> Self {
        let total_votes = yes_votes + no_votes;
        if total_votes == 0 {
            return Self {
                title,
                yes_votes,
                no_votes,
                total_votes,
                percent_yes: None,
                percent_no: None,
                outcome: TallyOutcome::NoVotes,
            };
        }

        let outcome = match yes_votes.cmp(&no_votes) {
            std::cmp::Ordering::Greater => TallyOutcome::Approved,
            std::cmp::Ordering::Less => TallyOutcome::Rejected,
            std::cmp::Ordering::Equal => TallyOutcome::Tie,
        };

        Self {
            title,
            yes_votes,
            no_votes,
            total_votes,
            percent_yes: Some(truncated_percent(yes_votes, total_votes)),
            percent_no: Some(truncated_percent(no_votes, total_votes)),
            outcome,
        }
    }
}

fn truncated_percent(part: u64, total: u64) -> u64 {
    // u128 keeps `part * 100` exact for any u64 count.
    (u128::from(part) * 100 / u128::from(total)) as u64
}
