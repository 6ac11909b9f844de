use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    DEFAULT_TAUX_TVA, Entity, EntityKind, LigneDocument, Montants, RecordIndex, double_option,
    search_text, trimmed, validation,
};
use crate::numbering::Reference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DevisStatut {
    #[default]
    Brouillon,
    Envoye,
    Accepte,
    Refuse,
}

impl DevisStatut {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Brouillon => "brouillon",
            Self::Envoye => "envoye",
            Self::Accepte => "accepte",
            Self::Refuse => "refuse",
        }
    }

    /// Accepted quotes are final; a refused one may be reworked as a draft.
    pub const fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Brouillon, _)
                | (Self::Envoye, _)
                | (Self::Refuse, Self::Refuse | Self::Brouillon)
                | (Self::Accepte, Self::Accepte)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Devis {
    pub id: Uuid,
    pub numero: Reference,
    pub client_id: Uuid,
    pub mission_id: Option<Uuid>,
    pub objet: Option<String>,
    pub statut: DevisStatut,
    pub lignes: Vec<LigneDocument>,
    pub taux_tva: u32,
    #[serde(flatten)]
    pub montants: Montants,
    pub date_validite: Option<NaiveDate>,
    /// Invoice created from this quote, once converted.
    pub facture_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevisInput {
    pub client_id: Uuid,
    pub mission_id: Option<Uuid>,
    pub objet: Option<String>,
    pub statut: Option<DevisStatut>,
    #[serde(default)]
    pub lignes: Vec<LigneDocument>,
    pub taux_tva: Option<u32>,
    pub date_validite: Option<NaiveDate>,
}

impl DevisInput {
    pub fn validate(&self) -> Result<(), String> {
        validation::max_len("objet", self.objet.as_deref(), validation::MAX_NAME_LEN)?;
        validation::lignes(&self.lignes)?;
        validation::taux_tva(self.taux_tva)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevisPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub objet: Option<Option<String>>,
    pub statut: Option<DevisStatut>,
    pub lignes: Option<Vec<LigneDocument>>,
    pub taux_tva: Option<u32>,
    #[serde(default, deserialize_with = "double_option")]
    pub date_validite: Option<Option<NaiveDate>>,
}

impl DevisPatch {
    pub fn has_changes(&self) -> bool {
        self.objet.is_some()
            || self.statut.is_some()
            || self.lignes.is_some()
            || self.taux_tva.is_some()
            || self.date_validite.is_some()
    }

    pub fn touches_amounts(&self) -> bool {
        self.lignes.is_some() || self.taux_tva.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        validation::max_len(
            "objet",
            self.objet.as_ref().and_then(Option::as_deref),
            validation::MAX_NAME_LEN,
        )?;
        if let Some(lignes) = self.lignes.as_deref() {
            validation::lignes(lignes)?;
        }
        validation::taux_tva(self.taux_tva)?;
        Ok(())
    }
}

impl Devis {
    pub fn create(numero: Reference, input: DevisInput, now: DateTime<Utc>) -> Self {
        let taux_tva = input.taux_tva.unwrap_or(DEFAULT_TAUX_TVA);
        Self {
            id: Uuid::new_v4(),
            numero,
            client_id: input.client_id,
            mission_id: input.mission_id,
            objet: trimmed(input.objet),
            statut: input.statut.unwrap_or_default(),
            montants: Montants::compute(&input.lignes, taux_tva),
            lignes: input.lignes,
            taux_tva,
            date_validite: input.date_validite,
            facture_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: DevisPatch, now: DateTime<Utc>) {
        if let Some(objet) = patch.objet {
            self.objet = trimmed(objet);
        }
        if let Some(statut) = patch.statut {
            self.statut = statut;
        }
        if let Some(lignes) = patch.lignes {
            self.lignes = lignes;
        }
        if let Some(taux_tva) = patch.taux_tva {
            self.taux_tva = taux_tva;
        }
        if let Some(date_validite) = patch.date_validite {
            self.date_validite = date_validite;
        }
        self.montants = Montants::compute(&self.lignes, self.taux_tva);
        self.updated_at = now;
    }
}

impl Entity for Devis {
    const KIND: EntityKind = EntityKind::Devis;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn index(&self) -> RecordIndex {
        RecordIndex {
            reference: Some(self.numero.to_string()),
            client_id: Some(self.client_id),
            technicien_id: None,
            mission_id: self.mission_id,
            statut: Some(self.statut.as_str().to_string()),
            search: search_text([Some(self.numero.as_str()), self.objet.as_deref()]),
        }
    }
}
