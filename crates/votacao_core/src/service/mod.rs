//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into agenda, session, vote and tally
//!   use-cases.
//! - Keep the HTTP layer decoupled from storage details.
//!
//! # Invariants
//! - Collaborators (repositories, clock, eligibility oracle) are supplied
//!   explicitly at construction.

pub mod agenda_service;
pub mod error;
pub mod session_service;
pub mod tally_service;
pub mod vote_service;
