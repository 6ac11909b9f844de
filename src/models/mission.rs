use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Entity, EntityKind, RecordIndex, double_option, search_text, trimmed, validation};
use crate::numbering::Reference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatut {
    #[default]
    Planifiee,
    EnCours,
    Terminee,
    Annulee,
}

impl MissionStatut {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planifiee => "planifiee",
            Self::EnCours => "en_cours",
            Self::Terminee => "terminee",
            Self::Annulee => "annulee",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: Uuid,
    pub numero: Reference,
    pub titre: String,
    pub description: Option<String>,
    pub statut: MissionStatut,
    pub priorite: i16,
    pub client_id: Uuid,
    pub technicien_id: Option<Uuid>,
    pub date_prevue: Option<DateTime<Utc>>,
    pub adresse_intervention: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionInput {
    pub titre: String,
    pub description: Option<String>,
    pub statut: Option<MissionStatut>,
    pub priorite: Option<i16>,
    pub client_id: Uuid,
    pub technicien_id: Option<Uuid>,
    pub date_prevue: Option<DateTime<Utc>>,
    pub adresse_intervention: Option<String>,
}

impl MissionInput {
    pub fn validate(&self) -> Result<(), String> {
        validation::required("titre", &self.titre)?;
        validation::max_len(
            "description",
            self.description.as_deref(),
            validation::MAX_TEXT_LEN,
        )?;
        validation::priorite(self.priorite)?;
        validation::max_len(
            "adresseIntervention",
            self.adresse_intervention.as_deref(),
            validation::MAX_NAME_LEN,
        )?;
        Ok(())
    }
}

/// Partial update; `null` clears nullable fields, absent keys are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionPatch {
    pub titre: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub statut: Option<MissionStatut>,
    pub priorite: Option<i16>,
    #[serde(default, deserialize_with = "double_option")]
    pub technicien_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub date_prevue: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub adresse_intervention: Option<Option<String>>,
}

impl MissionPatch {
    pub fn has_changes(&self) -> bool {
        self.titre.is_some()
            || self.description.is_some()
            || self.statut.is_some()
            || self.priorite.is_some()
            || self.technicien_id.is_some()
            || self.date_prevue.is_some()
            || self.adresse_intervention.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(titre) = self.titre.as_deref() {
            validation::required("titre", titre)?;
        }
        validation::max_len(
            "description",
            self.description.as_ref().and_then(Option::as_deref),
            validation::MAX_TEXT_LEN,
        )?;
        validation::priorite(self.priorite)?;
        validation::max_len(
            "adresseIntervention",
            self.adresse_intervention.as_ref().and_then(Option::as_deref),
            validation::MAX_NAME_LEN,
        )?;
        Ok(())
    }
}

impl Mission {
    pub fn create(numero: Reference, input: MissionInput, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            numero,
            titre: input.titre.trim().to_string(),
            description: trimmed(input.description),
            statut: input.statut.unwrap_or_default(),
            priorite: input.priorite.unwrap_or(3),
            client_id: input.client_id,
            technicien_id: input.technicien_id,
            date_prevue: input.date_prevue,
            adresse_intervention: trimmed(input.adresse_intervention),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: MissionPatch, now: DateTime<Utc>) {
        if let Some(titre) = patch.titre {
            self.titre = titre.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = trimmed(description);
        }
        if let Some(statut) = patch.statut {
            self.statut = statut;
        }
        if let Some(priorite) = patch.priorite {
            self.priorite = priorite;
        }
        if let Some(technicien_id) = patch.technicien_id {
            self.technicien_id = technicien_id;
        }
        if let Some(date_prevue) = patch.date_prevue {
            self.date_prevue = date_prevue;
        }
        if let Some(adresse) = patch.adresse_intervention {
            self.adresse_intervention = trimmed(adresse);
        }
        self.updated_at = now;
    }
}

impl Entity for Mission {
    const KIND: EntityKind = EntityKind::Mission;

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
            technicien_id: self.technicien_id,
            mission_id: None,
            statut: Some(self.statut.as_str().to_string()),
            search: search_text([
                Some(self.numero.as_str()),
                Some(self.titre.as_str()),
                self.adresse_intervention.as_deref(),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch: MissionPatch =
            serde_json::from_value(json!({ "technicienId": null, "titre": "Relevé" })).unwrap();
        assert_eq!(patch.technicien_id, Some(None));
        assert_eq!(patch.description, None);
        assert!(patch.has_changes());

        let empty: MissionPatch = serde_json::from_value(json!({})).unwrap();
        assert!(!empty.has_changes());
    }

    #[test]
    fn statut_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(MissionStatut::EnCours).unwrap(),
            json!("en_cours")
        );
        assert_eq!(MissionStatut::EnCours.as_str(), "en_cours");
    }
}
