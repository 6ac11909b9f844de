use std::sync::Arc;

use chrono::{Datelike, Local};
use fieldops::{
    FieldService, PgStore, StoreError,
    models::{Client, ClientInput, Devis, DevisInput, EntityKind, LigneDocument, Mission, MissionInput},
    numbering::{NumberGenerator, NumberingPolicies},
    pagination::{PageRequest, normalize},
    store::{DocumentStore, RecordFilter, ReferenceLookup},
};
use sqlx::{PgPool, postgres::PgPoolOptions};

async fn maybe_pool() -> Option<PgPool> {
    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()?;

    PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .ok()
}

async fn fresh_service() -> Option<(Arc<PgStore>, FieldService)> {
    let pool = maybe_pool().await?;
    let store = Arc::new(PgStore::new(pool.clone()));
    store.init().await.expect("migrations should run");

    sqlx::query("TRUNCATE TABLE documents")
        .execute(&pool)
        .await
        .expect("truncate should succeed");

    let numbers = NumberGenerator::new(store.clone(), NumberingPolicies::default());
    let service = FieldService::new(store.clone(), numbers);
    Some((store, service))
}

#[tokio::test]
async fn postgres_store_numbering_and_listing() {
    let Some((store, service)) = fresh_service().await else {
        eprintln!(
            "Skipping postgres_store_numbering_and_listing: TEST_DATABASE_URL/DATABASE_URL is not set or database is unreachable."
        );
        return;
    };
    let year = Local::now().year();

    let client = service
        .create_client(ClientInput {
            nom: "Atelier Moreau".to_string(),
            ville: Some("Nantes".to_string()),
            ..ClientInput::default()
        })
        .await
        .expect("client should be created");

    for titre in ["Chaudière", "Ballon d'eau chaude", "Radiateurs"] {
        service
            .create_mission(MissionInput {
                titre: titre.to_string(),
                description: None,
                statut: None,
                priorite: None,
                client_id: client.id,
                technicien_id: None,
                date_prevue: None,
                adresse_intervention: None,
            })
            .await
            .expect("mission should be created");
    }

    let page = normalize(&PageRequest::new(Some(1), Some(2)));
    let listing = service
        .list::<Mission>(&RecordFilter::by_client(client.id), page)
        .await
        .expect("list should succeed");
    assert_eq!(listing.meta.total, 3);
    assert_eq!(listing.meta.total_pages, 2);
    assert_eq!(listing.items.len(), 2);

    let last = store
        .last_reference(EntityKind::Mission, &format!("INT-{year}-"))
        .await
        .expect("lookup should succeed");
    assert_eq!(last.as_deref(), Some(format!("INT-{year}-0003").as_str()));

    let search = RecordFilter {
        search: Some("BALLON".to_string()),
        ..RecordFilter::default()
    };
    let found = service
        .list::<Mission>(&search, normalize(&PageRequest::default()))
        .await
        .expect("search should succeed");
    assert_eq!(found.meta.total, 1);
}

#[tokio::test]
async fn postgres_store_rejects_duplicate_references() {
    let Some((_store, service)) = fresh_service().await else {
        eprintln!(
            "Skipping postgres_store_rejects_duplicate_references: TEST_DATABASE_URL/DATABASE_URL is not set or database is unreachable."
        );
        return;
    };

    let client: Client = service
        .create_client(ClientInput {
            nom: "Cabinet Petit".to_string(),
            ..ClientInput::default()
        })
        .await
        .expect("client should be created");

    let devis = service
        .create_devis(DevisInput {
            client_id: client.id,
            mission_id: None,
            objet: None,
            statut: None,
            lignes: vec![LigneDocument {
                designation: "Diagnostic".to_string(),
                quantite: 1,
                prix_unitaire: 6_000,
            }],
            taux_tva: None,
            date_validite: None,
        })
        .await
        .expect("devis should be created");

    let mut copy = devis.clone();
    copy.id = uuid::Uuid::new_v4();
    let err = service
        .collection::<Devis>()
        .insert(&copy)
        .await
        .expect_err("same numero must be rejected");
    assert!(
        matches!(err, StoreError::DuplicateReference { .. }),
        "{err:?}"
    );
}
