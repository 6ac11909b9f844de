//! Demo data for local runs (`fieldops seed`).

use tracing::info;

use crate::models::{
    ClientInput, DevisInput, DevisPatch, DevisStatut, LigneDocument, MissionInput, MissionStatut,
    RapportInput, TechnicienInput,
};
use crate::service::{FieldService, ServiceResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub clients: usize,
    pub techniciens: usize,
    pub missions: usize,
    pub devis: usize,
    pub factures: usize,
    pub rapports: usize,
}

pub async fn seed(service: &FieldService) -> ServiceResult<SeedSummary> {
    let mut summary = SeedSummary::default();

    let boulangerie = service
        .create_client(ClientInput {
            nom: "Boulangerie Martin".to_string(),
            email: Some("contact@boulangerie-martin.fr".to_string()),
            telephone: Some("01 42 00 00 01".to_string()),
            adresse: Some("12 rue des Lilas".to_string()),
            ville: Some("Lyon".to_string()),
        })
        .await?;
    let syndic = service
        .create_client(ClientInput {
            nom: "Syndic Les Terrasses".to_string(),
            email: Some("gestion@terrasses.fr".to_string()),
            ville: Some("Villeurbanne".to_string()),
            ..ClientInput::default()
        })
        .await?;
    summary.clients = 2;

    let technicien = service
        .create_technicien(TechnicienInput {
            nom: "Durand".to_string(),
            prenom: "Lucie".to_string(),
            email: Some("lucie.durand@fieldops.local".to_string()),
            specialite: Some("chauffage".to_string()),
            ..TechnicienInput::default()
        })
        .await?;
    summary.techniciens = 1;

    let entretien = service
        .create_mission(MissionInput {
            titre: "Entretien annuel chaudière".to_string(),
            description: Some("Contrôle et nettoyage du brûleur".to_string()),
            statut: Some(MissionStatut::Terminee),
            priorite: Some(2),
            client_id: boulangerie.id,
            technicien_id: Some(technicien.id),
            date_prevue: None,
            adresse_intervention: boulangerie.adresse.clone(),
        })
        .await?;
    service
        .create_mission(MissionInput {
            titre: "Fuite colonne d'eau".to_string(),
            description: None,
            statut: None,
            priorite: Some(5),
            client_id: syndic.id,
            technicien_id: None,
            date_prevue: None,
            adresse_intervention: None,
        })
        .await?;
    summary.missions = 2;

    service
        .create_rapport(RapportInput {
            mission_id: entretien.id,
            technicien_id: technicien.id,
            contenu: "Chaudière nettoyée, joint de porte remplacé.".to_string(),
            duree_minutes: Some(90),
        })
        .await?;
    summary.rapports = 1;

    let devis = service
        .create_devis(DevisInput {
            client_id: boulangerie.id,
            mission_id: Some(entretien.id),
            objet: Some("Remplacement joint et entretien".to_string()),
            statut: None,
            lignes: vec![
                LigneDocument {
                    designation: "Entretien chaudière".to_string(),
                    quantite: 1,
                    prix_unitaire: 12_000,
                },
                LigneDocument {
                    designation: "Joint de porte".to_string(),
                    quantite: 1,
                    prix_unitaire: 2_450,
                },
            ],
            taux_tva: None,
            date_validite: None,
        })
        .await?;
    service
        .patch_devis(
            devis.id,
            DevisPatch {
                statut: Some(DevisStatut::Accepte),
                ..DevisPatch::default()
            },
        )
        .await?;
    summary.devis = 1;

    let facture = service.invoice_devis(devis.id).await?;
    summary.factures = 1;

    info!(
        devis = %devis.numero,
        facture = %facture.numero,
        "demo data seeded"
    );
    Ok(summary)
}
