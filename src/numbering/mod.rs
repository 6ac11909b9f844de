//! Business document numbering (`INT-2025-0001`, `DEV-2025-0012`, ...).
//!
//! The sequential policy reads the highest reference of the current year and
//! adds one. Nothing here reserves the value: two concurrent callers can
//! compute the same number, and the store's `(kind, reference)` uniqueness
//! constraint is what finally rejects the loser. The daily-random policy does
//! not read the store at all and may collide within a day.

pub mod reference;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::StoreResult;
use crate::models::EntityKind;
use crate::store::ReferenceLookup;

pub use reference::{Reference, compare_references, format_sequence, sequence_of};

/// Document kinds that carry a generated reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Mission,
    Devis,
    Facture,
}

impl DocumentKind {
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Mission => "INT",
            Self::Devis => "DEV",
            Self::Facture => "FAC",
        }
    }

    pub const fn entity_kind(self) -> EntityKind {
        match self {
            Self::Mission => EntityKind::Mission,
            Self::Devis => EntityKind::Devis,
            Self::Facture => EntityKind::Facture,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entity_kind().as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberingPolicy {
    /// `<PREFIX>-<YYYY>-<NNNN>`, one more than the highest of the year.
    #[default]
    Sequential,
    /// `<PREFIX>-<YYYYMMDD>-<NNNN>` with a random suffix. Not unique.
    DailyRandom,
}

impl FromStr for NumberingPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sequential" | "sequentiel" => Ok(Self::Sequential),
            "daily-random" | "daily_random" | "random" => Ok(Self::DailyRandom),
            other => Err(format!(
                "numbering policy must be one of: sequential, daily-random (got '{other}')"
            )),
        }
    }
}

/// Policy per document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NumberingPolicies {
    pub mission: NumberingPolicy,
    pub devis: NumberingPolicy,
    pub facture: NumberingPolicy,
}

impl NumberingPolicies {
    pub fn policy_for(&self, kind: DocumentKind) -> NumberingPolicy {
        match kind {
            DocumentKind::Mission => self.mission,
            DocumentKind::Devis => self.devis,
            DocumentKind::Facture => self.facture,
        }
    }

    pub fn with(mut self, kind: DocumentKind, policy: NumberingPolicy) -> Self {
        match kind {
            DocumentKind::Mission => self.mission = policy,
            DocumentKind::Devis => self.devis = policy,
            DocumentKind::Facture => self.facture = policy,
        }
        self
    }
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub fn sequential_prefix(kind: DocumentKind, date: NaiveDate) -> String {
    format!("{}-{}-", kind.prefix(), date.year())
}

pub fn daily_prefix(kind: DocumentKind, date: NaiveDate) -> String {
    format!("{}-{}-", kind.prefix(), date.format("%Y%m%d"))
}

/// Next reference after `last`; a missing or malformed `last` restarts at 1.
pub fn next_in_sequence(prefix: &str, last: Option<&str>) -> Reference {
    let current = last.map(sequence_of).unwrap_or(0);
    format_sequence(prefix, current.saturating_add(1))
}

pub fn daily_random<R: Rng>(kind: DocumentKind, date: NaiveDate, rng: &mut R) -> Reference {
    let suffix: u32 = rng.gen_range(0..=9999);
    format_sequence(&daily_prefix(kind, date), suffix)
}

fn random_reference(kind: DocumentKind, date: NaiveDate) -> Reference {
    daily_random(kind, date, &mut rand::thread_rng())
}

#[derive(Clone)]
pub struct NumberGenerator {
    lookup: Arc<dyn ReferenceLookup>,
    clock: Arc<dyn Clock>,
    policies: NumberingPolicies,
}

impl NumberGenerator {
    pub fn new(lookup: Arc<dyn ReferenceLookup>, policies: NumberingPolicies) -> Self {
        Self {
            lookup,
            clock: Arc::new(SystemClock),
            policies,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Computes the next reference for `kind`. Store failures are returned as-is.
    pub async fn generate(&self, kind: DocumentKind) -> StoreResult<Reference> {
        let today = self.clock.today();

        let reference = match self.policies.policy_for(kind) {
            NumberingPolicy::Sequential => {
                let prefix = sequential_prefix(kind, today);
                let last = self
                    .lookup
                    .last_reference(kind.entity_kind(), &prefix)
                    .await?;
                next_in_sequence(&prefix, last.as_deref())
            }
            NumberingPolicy::DailyRandom => random_reference(kind, today),
        };

        debug!(kind = %kind, reference = %reference, "generated document reference");
        Ok(reference)
    }
}
