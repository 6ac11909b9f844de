use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{FieldService, ServiceError, ServiceResult};
use crate::models::{Client, ClientInput, Devis, Facture, Mission, Rapport, Technicien, TechnicienInput};
use crate::store::RecordFilter;

impl FieldService {
    pub async fn create_client(&self, input: ClientInput) -> ServiceResult<Client> {
        input.validate().map_err(ServiceError::Validation)?;

        let client = Client::create(input, Utc::now());
        self.collection::<Client>().insert(&client).await?;
        info!(id = %client.id, "client created");
        Ok(client)
    }

    pub async fn replace_client(&self, id: Uuid, input: ClientInput) -> ServiceResult<Client> {
        input.validate().map_err(ServiceError::Validation)?;

        let mut client = self.get::<Client>(id).await?;
        client.apply(input, Utc::now());
        self.save(&client).await?;
        Ok(client)
    }

    pub async fn delete_client(&self, id: Uuid) -> ServiceResult<()> {
        self.get::<Client>(id).await?;

        let filter = RecordFilter::by_client(id);
        self.ensure_unreferenced::<Mission>(&filter, "client").await?;
        self.ensure_unreferenced::<Devis>(&filter, "client").await?;
        self.ensure_unreferenced::<Facture>(&filter, "client").await?;

        self.remove::<Client>(id).await
    }

    pub async fn create_technicien(&self, input: TechnicienInput) -> ServiceResult<Technicien> {
        input.validate().map_err(ServiceError::Validation)?;

        let technicien = Technicien::create(input, Utc::now());
        self.collection::<Technicien>().insert(&technicien).await?;
        info!(id = %technicien.id, "technicien created");
        Ok(technicien)
    }

    pub async fn replace_technicien(
        &self,
        id: Uuid,
        input: TechnicienInput,
    ) -> ServiceResult<Technicien> {
        input.validate().map_err(ServiceError::Validation)?;

        let mut technicien = self.get::<Technicien>(id).await?;
        technicien.apply(input, Utc::now());
        self.save(&technicien).await?;
        Ok(technicien)
    }

    pub async fn delete_technicien(&self, id: Uuid) -> ServiceResult<()> {
        self.get::<Technicien>(id).await?;

        let filter = RecordFilter::by_technicien(id);
        self.ensure_unreferenced::<Mission>(&filter, "technicien").await?;
        self.ensure_unreferenced::<Rapport>(&filter, "technicien").await?;

        self.remove::<Technicien>(id).await
    }

    /// Assignable technician: exists and is active.
    pub(super) async fn require_active_technicien(
        &self,
        field: &str,
        id: Uuid,
    ) -> ServiceResult<Technicien> {
        let technicien = self.require::<Technicien>(field, id).await?;
        if !technicien.actif {
            return Err(ServiceError::validation(format!(
                "{field} refers to inactive technicien {id}"
            )));
        }
        Ok(technicien)
    }
}
