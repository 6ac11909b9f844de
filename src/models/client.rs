use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Entity, EntityKind, RecordIndex, search_text, trimmed, validation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub nom: String,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub adresse: Option<String>,
    pub ville: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/clients` and `PUT /api/clients/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
    pub nom: String,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub adresse: Option<String>,
    pub ville: Option<String>,
}

impl ClientInput {
    pub fn validate(&self) -> Result<(), String> {
        validation::required("nom", &self.nom)?;
        validation::email(self.email.as_deref())?;
        validation::telephone(self.telephone.as_deref())?;
        validation::max_len("adresse", self.adresse.as_deref(), validation::MAX_NAME_LEN)?;
        validation::max_len("ville", self.ville.as_deref(), validation::MAX_NAME_LEN)?;
        Ok(())
    }
}

impl Client {
    pub fn create(input: ClientInput, now: DateTime<Utc>) -> Self {
        let mut client = Self {
            id: Uuid::new_v4(),
            nom: String::new(),
            email: None,
            telephone: None,
            adresse: None,
            ville: None,
            created_at: now,
            updated_at: now,
        };
        client.apply(input, now);
        client
    }

    pub fn apply(&mut self, input: ClientInput, now: DateTime<Utc>) {
        self.nom = input.nom.trim().to_string();
        self.email = trimmed(input.email);
        self.telephone = trimmed(input.telephone);
        self.adresse = trimmed(input.adresse);
        self.ville = trimmed(input.ville);
        self.updated_at = now;
    }
}

impl Entity for Client {
    const KIND: EntityKind = EntityKind::Client;

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
            search: search_text([
                Some(self.nom.as_str()),
                self.email.as_deref(),
                self.ville.as_deref(),
            ]),
            ..RecordIndex::default()
        }
    }
}
