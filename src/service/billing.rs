use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{FieldService, ServiceError, ServiceResult};
use crate::models::{
    Client, Devis, DevisInput, DevisPatch, DevisStatut, Facture, FactureInput, FacturePatch,
    FactureStatut,
};
use crate::numbering::DocumentKind;

impl FieldService {
    pub async fn create_devis(&self, input: DevisInput) -> ServiceResult<Devis> {
        input.validate().map_err(ServiceError::Validation)?;

        self.require::<Client>("clientId", input.client_id).await?;
        if let Some(mission_id) = input.mission_id {
            self.require_client_mission(mission_id, input.client_id)
                .await?;
        }

        self.insert_numbered(DocumentKind::Devis, |numero, now| {
            Devis::create(numero, input.clone(), now)
        })
        .await
    }

    pub async fn patch_devis(&self, id: Uuid, patch: DevisPatch) -> ServiceResult<Devis> {
        if !patch.has_changes() {
            return Err(ServiceError::validation(
                "at least one field must be provided for PATCH",
            ));
        }
        patch.validate().map_err(ServiceError::Validation)?;

        let _link = self.invoicing.lock().await;
        let mut devis = self.get::<Devis>(id).await?;
        if devis.facture_id.is_some() {
            return Err(ServiceError::conflict(format!(
                "devis {} has already been invoiced",
                devis.numero
            )));
        }
        if devis.statut == DevisStatut::Accepte && patch.touches_amounts() {
            return Err(ServiceError::conflict(format!(
                "lines of accepted devis {} cannot change",
                devis.numero
            )));
        }
        if let Some(statut) = patch.statut
            && !devis.statut.can_become(statut)
        {
            return Err(ServiceError::conflict(format!(
                "devis {} cannot go from {} to {}",
                devis.numero,
                devis.statut.as_str(),
                statut.as_str()
            )));
        }

        devis.apply(patch, Utc::now());
        self.save(&devis).await?;
        Ok(devis)
    }

    pub async fn delete_devis(&self, id: Uuid) -> ServiceResult<()> {
        let _link = self.invoicing.lock().await;
        let devis = self.get::<Devis>(id).await?;
        if devis.statut == DevisStatut::Accepte || devis.facture_id.is_some() {
            return Err(ServiceError::conflict(format!(
                "accepted devis {} must be kept",
                devis.numero
            )));
        }
        self.remove::<Devis>(id).await
    }

    /// Invoices an accepted quote. A quote is linked to at most one invoice
    /// at a time; deleting that invoice makes the quote invoiceable again.
    pub async fn invoice_devis(&self, id: Uuid) -> ServiceResult<Facture> {
        let _link = self.invoicing.lock().await;
        let mut devis = self.get::<Devis>(id).await?;
        if devis.statut != DevisStatut::Accepte {
            return Err(ServiceError::conflict(format!(
                "devis {} must be accepted before invoicing (statut: {})",
                devis.numero,
                devis.statut.as_str()
            )));
        }
        if let Some(facture_id) = devis.facture_id {
            return Err(ServiceError::conflict(format!(
                "devis {} is already invoiced by facture {facture_id}",
                devis.numero
            )));
        }

        let facture = self
            .insert_numbered(DocumentKind::Facture, |numero, now| {
                Facture::from_devis(numero, &devis, now)
            })
            .await?;

        devis.facture_id = Some(facture.id);
        devis.updated_at = facture.created_at;
        if let Err(err) = self.save(&devis).await {
            warn!(devis = %devis.numero, facture = %facture.numero, "linking devis failed, dropping facture");
            if let Err(cleanup) = self.collection::<Facture>().remove(facture.id).await {
                error!(facture = %facture.numero, error = %cleanup, "orphan facture left behind");
            }
            return Err(err);
        }

        info!(devis = %devis.numero, facture = %facture.numero, "devis invoiced");
        Ok(facture)
    }

    pub async fn create_facture(&self, input: FactureInput) -> ServiceResult<Facture> {
        input.validate().map_err(ServiceError::Validation)?;

        self.require::<Client>("clientId", input.client_id).await?;
        if let Some(mission_id) = input.mission_id {
            self.require_client_mission(mission_id, input.client_id)
                .await?;
        }
        if let Some(devis_id) = input.devis_id {
            let devis = self.require::<Devis>("devisId", devis_id).await?;
            if devis.client_id != input.client_id {
                return Err(ServiceError::validation(format!(
                    "devis {} belongs to another client",
                    devis.numero
                )));
            }
        }

        self.insert_numbered(DocumentKind::Facture, |numero, now| {
            Facture::create(numero, input.clone(), now)
        })
        .await
    }

    pub async fn patch_facture(&self, id: Uuid, patch: FacturePatch) -> ServiceResult<Facture> {
        if !patch.has_changes() {
            return Err(ServiceError::validation(
                "at least one field must be provided for PATCH",
            ));
        }
        patch.validate().map_err(ServiceError::Validation)?;

        let mut facture = self.get::<Facture>(id).await?;
        if let Some(statut) = patch.statut
            && !facture.statut.can_become(statut)
        {
            return Err(ServiceError::conflict(format!(
                "facture {} cannot go from {} to {}",
                facture.numero,
                facture.statut.as_str(),
                statut.as_str()
            )));
        }
        if facture.statut != FactureStatut::Brouillon && patch.touches_amounts() {
            return Err(ServiceError::conflict(format!(
                "facture {} is {} and its lines cannot change",
                facture.numero,
                facture.statut.as_str()
            )));
        }

        facture.apply(patch, Utc::now());
        self.save(&facture).await?;
        Ok(facture)
    }

    pub async fn delete_facture(&self, id: Uuid) -> ServiceResult<()> {
        let _link = self.invoicing.lock().await;
        let facture = self.get::<Facture>(id).await?;
        if !matches!(
            facture.statut,
            FactureStatut::Brouillon | FactureStatut::Annulee
        ) {
            return Err(ServiceError::conflict(format!(
                "facture {} is {}; only draft or cancelled invoices can be deleted",
                facture.numero,
                facture.statut.as_str()
            )));
        }

        let released = match facture.devis_id {
            Some(devis_id) => self.release_devis(devis_id, facture.id).await?,
            None => None,
        };
        if let Err(err) = self.remove::<Facture>(id).await {
            if let Some(mut devis) = released {
                devis.facture_id = Some(facture.id);
                if let Err(relink) = self.save(&devis).await {
                    error!(devis = %devis.numero, error = %relink, "could not restore devis link");
                }
            }
            return Err(err);
        }
        Ok(())
    }

    /// Clears the devis link to `facture_id`, returning the devis as it was.
    async fn release_devis(&self, devis_id: Uuid, facture_id: Uuid) -> ServiceResult<Option<Devis>> {
        let Some(devis) = self.collection::<Devis>().get(devis_id).await? else {
            return Ok(None);
        };
        if devis.facture_id != Some(facture_id) {
            return Ok(None);
        }

        let mut released = devis.clone();
        released.facture_id = None;
        released.updated_at = Utc::now();
        self.save(&released).await?;
        info!(devis = %devis.numero, "devis invoiceable again");
        Ok(Some(devis))
    }
}
