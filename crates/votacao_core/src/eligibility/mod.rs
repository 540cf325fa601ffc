//! Voter eligibility oracle.
//!
//! # Responsibility
//! - Define the contract of the external "may this voter vote" check.
//! - Provide the randomized stand-in and a fixed-answer validator.
//!
//! # Invariants
//! - Only `ABLE_TO_VOTE` means eligible; any other token is not eligible.
//! - Validators never retry; failures surface as `EligibilityError`.

use crate::model::vote::VoterId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Mutex;

/// Sentinel token meaning the voter may vote.
pub const ABLE_TO_VOTE: &str = "ABLE_TO_VOTE";
/// Token returned by the bundled validators for ineligible voters.
pub const UNABLE_TO_VOTE: &str = "UNABLE_TO_VOTE";

/// Opaque status token returned by the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityStatus(String);

impl EligibilityStatus {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fail-closed check against the single eligible sentinel.
    pub fn is_eligible(&self) -> bool {
        self.0.eq_ignore_ascii_case(ABLE_TO_VOTE)
    }
}

/// Oracle call failed without producing a status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityError {
    message: String,
}

impl EligibilityError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for EligibilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "eligibility check failed: {}", self.message)
    }
}

impl Error for EligibilityError {}

/// External identity validator contract.
pub trait IdentityValidator: Send + Sync + Debug {
    fn check_eligibility(&self, voter_id: &VoterId) -> Result<EligibilityStatus, EligibilityError>;
}

/// Answers eligible/ineligible with equal probability.
#[derive(Debug)]
pub struct RandomIdentityValidator {
    rng: Mutex<StdRng>,
}

impl RandomIdentityValidator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomIdentityValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityValidator for RandomIdentityValidator {
    fn check_eligibility(&self, _voter_id: &VoterId) -> Result<EligibilityStatus, EligibilityError> {
        let able = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .gen_bool(0.5);
        let token = if able { ABLE_TO_VOTE } else { UNABLE_TO_VOTE };
        Ok(EligibilityStatus::new(token))
    }
}

/// Always answers with the same token.
#[derive(Debug, Clone)]
pub struct FixedIdentityValidator {
    status: EligibilityStatus,
}

impl FixedIdentityValidator {
    pub fn with_status(token: impl Into<String>) -> Self {
        Self {
            status: EligibilityStatus::new(token),
        }
    }

    pub fn eligible() -> Self {
        Self::with_status(ABLE_TO_VOTE)
    }

    pub fn ineligible() -> Self {
        Self::with_status(UNABLE_TO_VOTE)
    }
}

impl IdentityValidator for FixedIdentityValidator {
    fn check_eligibility(&self, _voter_id: &VoterId) -> Result<EligibilityStatus, EligibilityError> {
        Ok(self.status.clone())
    }
}
