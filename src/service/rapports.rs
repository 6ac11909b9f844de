use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{FieldService, ServiceError, ServiceResult};
use crate::models::{Mission, Rapport, RapportInput, Technicien};

impl FieldService {
    pub async fn create_rapport(&self, input: RapportInput) -> ServiceResult<Rapport> {
        input.validate().map_err(ServiceError::Validation)?;

        let (mission, _technicien) = futures::try_join!(
            self.require::<Mission>("missionId", input.mission_id),
            self.require::<Technicien>("technicienId", input.technicien_id),
        )?;

        let rapport = Rapport::create(input, Utc::now());
        self.collection::<Rapport>().insert(&rapport).await?;
        info!(id = %rapport.id, mission = %mission.numero, "rapport filed");
        Ok(rapport)
    }

    pub async fn delete_rapport(&self, id: Uuid) -> ServiceResult<()> {
        self.remove::<Rapport>(id).await
    }
}
