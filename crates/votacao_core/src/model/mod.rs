//! Voting domain model.
//!
//! # Responsibility
//! - Define value objects validated at their construction boundary.
//! - Keep the agenda aggregate free of back-references to its votes.
//!
//! # Invariants
//! - An `AgendaItem` owns at most one `VotingWindow`, attached once.
//! - A `Vote` references its agenda by id only.

pub mod agenda;
pub mod tally;
pub mod validation;
pub mod vote;
