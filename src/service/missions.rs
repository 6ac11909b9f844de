use chrono::Utc;
use uuid::Uuid;

use super::{FieldService, ServiceError, ServiceResult};
use crate::models::{Client, Devis, Facture, Mission, MissionInput, MissionPatch, Rapport};
use crate::numbering::DocumentKind;
use crate::store::RecordFilter;

impl FieldService {
    pub async fn create_mission(&self, input: MissionInput) -> ServiceResult<Mission> {
        input.validate().map_err(ServiceError::Validation)?;

        self.require::<Client>("clientId", input.client_id).await?;
        if let Some(technicien_id) = input.technicien_id {
            self.require_active_technicien("technicienId", technicien_id)
                .await?;
        }

        self.insert_numbered(DocumentKind::Mission, |numero, now| {
            Mission::create(numero, input.clone(), now)
        })
        .await
    }

    pub async fn patch_mission(&self, id: Uuid, patch: MissionPatch) -> ServiceResult<Mission> {
        if !patch.has_changes() {
            return Err(ServiceError::validation(
                "at least one field must be provided for PATCH",
            ));
        }
        patch.validate().map_err(ServiceError::Validation)?;

        let mut mission = self.get::<Mission>(id).await?;
        if let Some(Some(technicien_id)) = patch.technicien_id {
            self.require_active_technicien("technicienId", technicien_id)
                .await?;
        }

        mission.apply(patch, Utc::now());
        self.save(&mission).await?;
        Ok(mission)
    }

    pub async fn delete_mission(&self, id: Uuid) -> ServiceResult<()> {
        self.get::<Mission>(id).await?;

        let filter = RecordFilter::by_mission(id);
        self.ensure_unreferenced::<Rapport>(&filter, "mission").await?;
        self.ensure_unreferenced::<Devis>(&filter, "mission").await?;
        self.ensure_unreferenced::<Facture>(&filter, "mission").await?;

        self.remove::<Mission>(id).await
    }

    /// The mission exists and belongs to `client_id`.
    pub(super) async fn require_client_mission(
        &self,
        mission_id: Uuid,
        client_id: Uuid,
    ) -> ServiceResult<Mission> {
        let mission = self.require::<Mission>("missionId", mission_id).await?;
        if mission.client_id != client_id {
            return Err(ServiceError::validation(format!(
                "mission {} belongs to another client",
                mission.numero
            )));
        }
        Ok(mission)
    }
}
