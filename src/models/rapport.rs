use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Entity, EntityKind, RecordIndex, search_text, validation};

/// Technician-authored account of the work performed on a mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rapport {
    pub id: Uuid,
    pub mission_id: Uuid,
    pub technicien_id: Uuid,
    pub contenu: String,
    pub duree_minutes: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RapportInput {
    pub mission_id: Uuid,
    pub technicien_id: Uuid,
    pub contenu: String,
    pub duree_minutes: Option<u32>,
}

impl RapportInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.contenu.trim().is_empty() {
            return Err("contenu must not be blank".to_string());
        }
        validation::max_len("contenu", Some(&self.contenu), validation::MAX_TEXT_LEN)?;
        if let Some(duree) = self.duree_minutes
            && duree > 24 * 60
        {
            return Err("dureeMinutes must not exceed one day".to_string());
        }
        Ok(())
    }
}

impl Rapport {
    pub fn create(input: RapportInput, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            mission_id: input.mission_id,
            technicien_id: input.technicien_id,
            contenu: input.contenu.trim().to_string(),
            duree_minutes: input.duree_minutes,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Rapport {
    const KIND: EntityKind = EntityKind::Rapport;

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
            mission_id: Some(self.mission_id),
            technicien_id: Some(self.technicien_id),
            search: search_text([Some(self.contenu.as_str())]),
            ..RecordIndex::default()
        }
    }
}
