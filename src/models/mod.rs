//! Domain records persisted by the store.
//!
//! Every record serializes to a JSON body and exposes a small [`RecordIndex`]
//! so stores can filter without understanding the body.

pub mod client;
pub mod devis;
pub mod facture;
pub mod mission;
pub mod rapport;
pub mod technicien;
pub mod validation;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use uuid::Uuid;

pub use client::{Client, ClientInput};
pub use devis::{Devis, DevisInput, DevisPatch, DevisStatut};
pub use facture::{Facture, FactureInput, FacturePatch, FactureStatut};
pub use mission::{Mission, MissionInput, MissionPatch, MissionStatut};
pub use rapport::{Rapport, RapportInput};
pub use technicien::{Technicien, TechnicienInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Client,
    Technicien,
    Mission,
    Devis,
    Facture,
    Rapport,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        Self::Client,
        Self::Technicien,
        Self::Mission,
        Self::Devis,
        Self::Facture,
        Self::Rapport,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Technicien => "technicien",
            Self::Mission => "mission",
            Self::Devis => "devis",
            Self::Facture => "facture",
            Self::Rapport => "rapport",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| format!("unknown entity kind '{raw}'"))
    }
}

/// Filterable columns extracted from a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordIndex {
    pub reference: Option<String>,
    pub client_id: Option<Uuid>,
    pub technicien_id: Option<Uuid>,
    pub mission_id: Option<Uuid>,
    pub statut: Option<String>,
    /// Lowercased free text matched by `search` filters.
    pub search: String,
}

pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
    fn index(&self) -> RecordIndex;
}

/// A billable line shared by quotes and invoices. Prices are in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LigneDocument {
    pub designation: String,
    pub quantite: u32,
    pub prix_unitaire: i64,
}

impl LigneDocument {
    pub fn total(&self) -> i64 {
        i64::from(self.quantite).saturating_mul(self.prix_unitaire)
    }
}

/// Standard French VAT rate, in basis points.
pub const DEFAULT_TAUX_TVA: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Montants {
    pub montant_ht: i64,
    pub montant_tva: i64,
    pub montant_ttc: i64,
}

impl Montants {
    pub fn compute(lignes: &[LigneDocument], taux_tva: u32) -> Self {
        let montant_ht = lignes
            .iter()
            .fold(0_i64, |acc, ligne| acc.saturating_add(ligne.total()));
        let montant_tva = round_div(
            i128::from(montant_ht) * i128::from(taux_tva),
            10_000,
        );
        Self {
            montant_ht,
            montant_tva,
            montant_ttc: montant_ht.saturating_add(montant_tva),
        }
    }
}

/// Integer division rounding half away from zero.
fn round_div(numerator: i128, denominator: i128) -> i64 {
    let half = denominator / 2;
    let rounded = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    };
    rounded.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

pub(crate) fn search_text<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> String {
    parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Distinguishes an explicit `null` (clear the field) from an absent key.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
