use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Entity, EntityKind, RecordIndex, search_text, trimmed, validation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technicien {
    pub id: Uuid,
    pub nom: String,
    pub prenom: String,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub specialite: Option<String>,
    pub actif: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicienInput {
    pub nom: String,
    pub prenom: String,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub specialite: Option<String>,
    pub actif: Option<bool>,
}

impl TechnicienInput {
    pub fn validate(&self) -> Result<(), String> {
        validation::required("nom", &self.nom)?;
        validation::required("prenom", &self.prenom)?;
        validation::email(self.email.as_deref())?;
        validation::telephone(self.telephone.as_deref())?;
        validation::max_len(
            "specialite",
            self.specialite.as_deref(),
            validation::MAX_NAME_LEN,
        )?;
        Ok(())
    }
}

impl Technicien {
    pub fn create(input: TechnicienInput, now: DateTime<Utc>) -> Self {
        let mut technicien = Self {
            id: Uuid::new_v4(),
            nom: String::new(),
            prenom: String::new(),
            email: None,
            telephone: None,
            specialite: None,
            actif: true,
            created_at: now,
            updated_at: now,
        };
        technicien.apply(input, now);
        technicien
    }

    pub fn apply(&mut self, input: TechnicienInput, now: DateTime<Utc>) {
        self.nom = input.nom.trim().to_string();
        self.prenom = input.prenom.trim().to_string();
        self.email = trimmed(input.email);
        self.telephone = trimmed(input.telephone);
        self.specialite = trimmed(input.specialite);
        self.actif = input.actif.unwrap_or(true);
        self.updated_at = now;
    }

    pub fn statut(&self) -> &'static str {
        if self.actif { "actif" } else { "inactif" }
    }
}

impl Entity for Technicien {
    const KIND: EntityKind = EntityKind::Technicien;

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
            statut: Some(self.statut().to_string()),
            search: search_text([
                Some(self.nom.as_str()),
                Some(self.prenom.as_str()),
                self.specialite.as_deref(),
            ]),
            ..RecordIndex::default()
        }
    }
}
