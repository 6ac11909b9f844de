use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    DEFAULT_TAUX_TVA, Devis, Entity, EntityKind, LigneDocument, Montants, RecordIndex,
    double_option, search_text, trimmed, validation,
};
use crate::numbering::Reference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FactureStatut {
    #[default]
    Brouillon,
    Emise,
    Payee,
    Annulee,
}

impl FactureStatut {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Brouillon => "brouillon",
            Self::Emise => "emise",
            Self::Payee => "payee",
            Self::Annulee => "annulee",
        }
    }

    /// Paid and cancelled invoices are final; an issued one never returns to draft.
    pub const fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Brouillon, _)
                | (Self::Emise, Self::Emise | Self::Payee | Self::Annulee)
                | (Self::Payee, Self::Payee)
                | (Self::Annulee, Self::Annulee)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facture {
    pub id: Uuid,
    pub numero: Reference,
    pub client_id: Uuid,
    pub devis_id: Option<Uuid>,
    pub mission_id: Option<Uuid>,
    pub objet: Option<String>,
    pub statut: FactureStatut,
    pub lignes: Vec<LigneDocument>,
    pub taux_tva: u32,
    #[serde(flatten)]
    pub montants: Montants,
    pub date_echeance: Option<NaiveDate>,
    pub date_paiement: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactureInput {
    pub client_id: Uuid,
    pub devis_id: Option<Uuid>,
    pub mission_id: Option<Uuid>,
    pub objet: Option<String>,
    #[serde(default)]
    pub lignes: Vec<LigneDocument>,
    pub taux_tva: Option<u32>,
    pub date_echeance: Option<NaiveDate>,
}

impl FactureInput {
    pub fn validate(&self) -> Result<(), String> {
        validation::max_len("objet", self.objet.as_deref(), validation::MAX_NAME_LEN)?;
        validation::lignes(&self.lignes)?;
        validation::taux_tva(self.taux_tva)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacturePatch {
    #[serde(default, deserialize_with = "double_option")]
    pub objet: Option<Option<String>>,
    pub statut: Option<FactureStatut>,
    pub lignes: Option<Vec<LigneDocument>>,
    pub taux_tva: Option<u32>,
    #[serde(default, deserialize_with = "double_option")]
    pub date_echeance: Option<Option<NaiveDate>>,
}

impl FacturePatch {
    pub fn has_changes(&self) -> bool {
        self.objet.is_some()
            || self.statut.is_some()
            || self.lignes.is_some()
            || self.taux_tva.is_some()
            || self.date_echeance.is_some()
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

impl Facture {
    pub fn create(numero: Reference, input: FactureInput, now: DateTime<Utc>) -> Self {
        let taux_tva = input.taux_tva.unwrap_or(DEFAULT_TAUX_TVA);
        Self {
            id: Uuid::new_v4(),
            numero,
            client_id: input.client_id,
            devis_id: input.devis_id,
            mission_id: input.mission_id,
            objet: trimmed(input.objet),
            statut: FactureStatut::Brouillon,
            montants: Montants::compute(&input.lignes, taux_tva),
            lignes: input.lignes,
            taux_tva,
            date_echeance: input.date_echeance,
            date_paiement: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Invoice carrying over the client, mission, lines and VAT of a quote.
    pub fn from_devis(numero: Reference, devis: &Devis, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            numero,
            client_id: devis.client_id,
            devis_id: Some(devis.id),
            mission_id: devis.mission_id,
            objet: devis.objet.clone(),
            statut: FactureStatut::Brouillon,
            lignes: devis.lignes.clone(),
            taux_tva: devis.taux_tva,
            montants: Montants::compute(&devis.lignes, devis.taux_tva),
            date_echeance: None,
            date_paiement: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: FacturePatch, now: DateTime<Utc>) {
        if let Some(objet) = patch.objet {
            self.objet = trimmed(objet);
        }
        if let Some(statut) = patch.statut {
            if statut == FactureStatut::Payee && self.statut != FactureStatut::Payee {
                self.date_paiement = Some(now);
            } else if statut != FactureStatut::Payee {
                self.date_paiement = None;
            }
            self.statut = statut;
        }
        if let Some(lignes) = patch.lignes {
            self.lignes = lignes;
        }
        if let Some(taux_tva) = patch.taux_tva {
            self.taux_tva = taux_tva;
        }
        if let Some(date_echeance) = patch.date_echeance {
            self.date_echeance = date_echeance;
        }
        self.montants = Montants::compute(&self.lignes, self.taux_tva);
        self.updated_at = now;
    }
}

impl Entity for Facture {
    const KIND: EntityKind = EntityKind::Facture;

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
