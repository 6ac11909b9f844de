use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use chrono::NaiveDate;
use fieldops::{
    AppState, FieldService, MemoryStore, build_router,
    numbering::{FixedClock, NumberGenerator, NumberingPolicies},
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> axum::Router {
    let store = Arc::new(MemoryStore::new());
    let today = NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date");
    let numbers = NumberGenerator::new(store.clone(), NumberingPolicies::default())
        .with_clock(Arc::new(FixedClock(today)));
    build_router(AppState::new(FieldService::new(store, numbers)))
}

async fn send_json(
    app: &axum::Router,
    method: Method,
    uri: &str,
    payload: Value,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request should build");
    dispatch(app, request).await
}

async fn send_empty(app: &axum::Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    dispatch(app, request).await
}

async fn dispatch(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("response expected");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should be readable");

    if body.is_empty() {
        return (status, Value::Null);
    }

    let json = serde_json::from_slice::<Value>(&body).expect("body should be valid JSON");
    (status, json)
}

async fn create(app: &axum::Router, uri: &str, payload: Value) -> Value {
    let (status, body) = send_json(app, Method::POST, uri, payload).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
    assert_eq!(body["success"], true);
    body["data"].clone()
}

fn id_of(record: &Value) -> String {
    record["id"].as_str().expect("record id").to_string()
}

async fn seed_client(app: &axum::Router, nom: &str) -> String {
    id_of(&create(app, "/api/clients", json!({ "nom": nom, "ville": "Lyon" })).await)
}

#[tokio::test]
async fn healthcheck_reports_ok() {
    let app = app();
    let (status, body) = send_empty(&app, Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "data": { "message": "ok" } }));
}

#[tokio::test]
async fn client_crud_round_trip() {
    let app = app();

    let client = create(
        &app,
        "/api/clients",
        json!({ "nom": "  Boulangerie Martin ", "email": "contact@martin.fr" }),
    )
    .await;
    let id = id_of(&client);
    assert_eq!(client["nom"], "Boulangerie Martin");

    let (status, body) = send_empty(&app, Method::GET, &format!("/api/clients/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "contact@martin.fr");

    let (status, body) = send_json(
        &app,
        Method::PUT,
        &format!("/api/clients/{id}"),
        json!({ "nom": "Boulangerie Martin & Fils", "ville": "Lyon" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nom"], "Boulangerie Martin & Fils");
    assert_eq!(body["data"]["email"], Value::Null);

    let (status, body) = send_empty(&app, Method::DELETE, &format!("/api/clients/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "data": { "id": id } }));

    let (status, body) = send_empty(&app, Method::GET, &format!("/api/clients/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn list_is_paginated_with_meta() {
    let app = app();
    for index in 0..25 {
        seed_client(&app, &format!("Client {index:02}")).await;
    }

    let (status, body) = send_empty(&app, Method::GET, "/api/clients?page=3&limit=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(
        body["meta"],
        json!({ "total": 25, "page": 3, "limit": 10, "totalPages": 3 })
    );

    // out-of-range and garbage values are normalized, never rejected
    let (status, body) =
        send_empty(&app, Method::GET, "/api/clients?page=-4&limit=abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["limit"], 10);

    let (_, body) = send_empty(&app, Method::GET, "/api/clients?limit=1000").await;
    assert_eq!(body["meta"]["limit"], 100);
    assert_eq!(body["meta"]["totalPages"], 1);
}

#[tokio::test]
async fn search_filter_is_case_insensitive() {
    let app = app();
    seed_client(&app, "Plomberie Dubois").await;
    seed_client(&app, "Garage Central").await;

    let (status, body) = send_empty(&app, Method::GET, "/api/clients?search=DUBOIS").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["nom"], "Plomberie Dubois");
}

#[tokio::test]
async fn missions_are_numbered_sequentially() {
    let app = app();
    let client_id = seed_client(&app, "Syndic Les Terrasses").await;

    let first = create(
        &app,
        "/api/missions",
        json!({ "titre": "Fuite colonne", "clientId": client_id }),
    )
    .await;
    let second = create(
        &app,
        "/api/missions",
        json!({ "titre": "Remplacement vanne", "clientId": client_id, "priorite": 4 }),
    )
    .await;

    assert_eq!(first["numero"], "INT-2025-0001");
    assert_eq!(second["numero"], "INT-2025-0002");
    assert_eq!(first["statut"], "planifiee");
    assert_eq!(second["priorite"], 4);

    let (_, body) = send_empty(
        &app,
        Method::GET,
        &format!("/api/missions?clientId={client_id}&statut=planifiee"),
    )
    .await;
    assert_eq!(body["meta"]["total"], 2);
}

#[tokio::test]
async fn mission_patch_updates_fields_but_not_numero() {
    let app = app();
    let client_id = seed_client(&app, "Hôtel du Parc").await;
    let mission = create(
        &app,
        "/api/missions",
        json!({ "titre": "Climatisation", "clientId": client_id }),
    )
    .await;
    let id = id_of(&mission);

    let (status, body) = send_json(
        &app,
        Method::PATCH,
        &format!("/api/missions/{id}"),
        json!({ "statut": "en_cours", "numero": "INT-1999-9999" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["statut"], "en_cours");
    assert_eq!(body["data"]["numero"], mission["numero"]);

    let (status, body) =
        send_json(&app, Method::PATCH, &format!("/api/missions/{id}"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "input_error");
}

#[tokio::test]
async fn invalid_input_is_rejected_with_error_envelope() {
    let app = app();

    let (status, body) = send_json(&app, Method::POST, "/api/clients", json!({ "nom": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "input_error");

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/missions",
        json!({ "titre": "Orpheline", "clientId": uuid::Uuid::new_v4() }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "input_error");

    let (status, body) = send_empty(&app, Method::GET, "/api/missions/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "input_error");

    let (status, body) = send_empty(&app, Method::GET, "/api/missions?clientId=42").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "input_error");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/clients")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .expect("request should build");
    let (status, body) = dispatch(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn inactive_technicien_cannot_be_assigned() {
    let app = app();
    let client_id = seed_client(&app, "Mairie").await;
    let technicien = create(
        &app,
        "/api/techniciens",
        json!({ "nom": "Roux", "prenom": "Paul", "actif": false }),
    )
    .await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/missions",
        json!({ "titre": "Éclairage", "clientId": client_id, "technicienId": technicien["id"] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("inactive"));
}

#[tokio::test]
async fn referenced_client_cannot_be_deleted() {
    let app = app();
    let client_id = seed_client(&app, "Copropriété Bellevue").await;
    create(
        &app,
        "/api/missions",
        json!({ "titre": "Interphone", "clientId": client_id }),
    )
    .await;

    let (status, body) =
        send_empty(&app, Method::DELETE, &format!("/api/clients/{client_id}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
}

#[tokio::test]
async fn accepted_devis_converts_to_facture_once() {
    let app = app();
    let client_id = seed_client(&app, "Restaurant Le Zinc").await;

    let devis = create(
        &app,
        "/api/devis",
        json!({
            "clientId": client_id,
            "objet": "Hotte aspirante",
            "lignes": [
                { "designation": "Moteur", "quantite": 1, "prixUnitaire": 45000 },
                { "designation": "Main d'oeuvre", "quantite": 3, "prixUnitaire": 5500 }
            ]
        }),
    )
    .await;
    let devis_id = id_of(&devis);
    assert_eq!(devis["numero"], "DEV-2025-0001");
    assert_eq!(devis["statut"], "brouillon");
    assert_eq!(devis["montantHt"], 61500);
    assert_eq!(devis["montantTva"], 12300);
    assert_eq!(devis["montantTtc"], 73800);

    // draft quotes are not invoiceable
    let (status, _) =
        send_empty(&app, Method::POST, &format!("/api/devis/{devis_id}/facture")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send_json(
        &app,
        Method::PATCH,
        &format!("/api/devis/{devis_id}"),
        json!({ "statut": "accepte" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        send_empty(&app, Method::POST, &format!("/api/devis/{devis_id}/facture")).await;
    assert_eq!(status, StatusCode::CREATED);
    let facture = &body["data"];
    assert_eq!(facture["numero"], "FAC-2025-0001");
    assert_eq!(facture["devisId"], devis_id);
    assert_eq!(facture["clientId"], client_id);
    assert_eq!(facture["montantTtc"], 73800);
    assert_eq!(facture["statut"], "brouillon");

    let (status, _) =
        send_empty(&app, Method::POST, &format!("/api/devis/{devis_id}/facture")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send_empty(&app, Method::GET, &format!("/api/devis/{devis_id}")).await;
    assert_eq!(body["data"]["factureId"], facture["id"]);

    let (status, _) = send_empty(&app, Method::DELETE, &format!("/api/devis/{devis_id}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn paid_facture_is_locked() {
    let app = app();
    let client_id = seed_client(&app, "Pharmacie Centrale").await;
    let facture = create(
        &app,
        "/api/factures",
        json!({
            "clientId": client_id,
            "lignes": [{ "designation": "Dépannage", "quantite": 1, "prixUnitaire": 9000 }]
        }),
    )
    .await;
    let id = id_of(&facture);

    let (status, body) = send_json(
        &app,
        Method::PATCH,
        &format!("/api/factures/{id}"),
        json!({ "statut": "payee" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["datePaiement"].is_string());

    let (status, _) = send_json(
        &app,
        Method::PATCH,
        &format!("/api/factures/{id}"),
        json!({ "tauxTva": 550 }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send_empty(&app, Method::DELETE, &format!("/api/factures/{id}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn rapports_are_filed_against_missions() {
    let app = app();
    let client_id = seed_client(&app, "Gymnase Municipal").await;
    let technicien = create(
        &app,
        "/api/techniciens",
        json!({ "nom": "Leroy", "prenom": "Anne", "specialite": "électricité" }),
    )
    .await;
    let mission = create(
        &app,
        "/api/missions",
        json!({ "titre": "Tableau électrique", "clientId": client_id, "technicienId": technicien["id"] }),
    )
    .await;
    let mission_id = id_of(&mission);

    let rapport = create(
        &app,
        "/api/rapports",
        json!({
            "missionId": mission_id,
            "technicienId": technicien["id"],
            "contenu": "Disjoncteur différentiel remplacé",
            "dureeMinutes": 45
        }),
    )
    .await;

    let (_, body) = send_empty(
        &app,
        Method::GET,
        &format!("/api/rapports?missionId={mission_id}"),
    )
    .await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["id"], rapport["id"]);

    let (status, _) =
        send_empty(&app, Method::DELETE, &format!("/api/missions/{mission_id}")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send_empty(
        &app,
        Method::DELETE,
        &format!("/api/rapports/{}", id_of(&rapport)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
        send_empty(&app, Method::DELETE, &format!("/api/missions/{mission_id}")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unparsable_query_keeps_error_envelope() {
    let app = app();

    let (status, body) = send_empty(&app, Method::GET, "/api/clients?page=1&page=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "input_error");
}

async fn accepted_devis(app: &axum::Router, client_id: &str) -> String {
    let devis = create(
        app,
        "/api/devis",
        json!({
            "clientId": client_id,
            "lignes": [{ "designation": "Ramonage", "quantite": 1, "prixUnitaire": 8000 }]
        }),
    )
    .await;
    let id = id_of(&devis);
    let (status, _) = send_json(
        app,
        Method::PATCH,
        &format!("/api/devis/{id}"),
        json!({ "statut": "accepte" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    id
}

#[tokio::test]
async fn deleting_draft_facture_releases_its_devis() {
    let app = app();
    let client_id = seed_client(&app, "Crèche Les Petits Loups").await;
    let devis_id = accepted_devis(&app, &client_id).await;

    let (status, body) =
        send_empty(&app, Method::POST, &format!("/api/devis/{devis_id}/facture")).await;
    assert_eq!(status, StatusCode::CREATED);
    let facture_id = id_of(&body["data"]);

    let (status, _) =
        send_empty(&app, Method::DELETE, &format!("/api/factures/{facture_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send_empty(&app, Method::GET, &format!("/api/devis/{devis_id}")).await;
    assert_eq!(body["data"]["factureId"], Value::Null);

    let (status, body) =
        send_empty(&app, Method::POST, &format!("/api/devis/{devis_id}/facture")).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
    assert_eq!(body["data"]["devisId"], devis_id);

    let (_, body) = send_empty(&app, Method::GET, &format!("/api/devis/{devis_id}")).await;
    assert!(body["data"]["factureId"].is_string());
    assert_ne!(body["data"]["factureId"], facture_id.as_str());
}

#[tokio::test]
async fn settled_statuts_cannot_be_reopened() {
    let app = app();
    let client_id = seed_client(&app, "Librairie du Port").await;

    let facture = create(
        &app,
        "/api/factures",
        json!({
            "clientId": client_id,
            "lignes": [{ "designation": "Serrure", "quantite": 1, "prixUnitaire": 15000 }]
        }),
    )
    .await;
    let facture_id = id_of(&facture);
    let uri = format!("/api/factures/{facture_id}");

    let (status, _) = send_json(&app, Method::PATCH, &uri, json!({ "statut": "payee" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        send_json(&app, Method::PATCH, &uri, json!({ "statut": "brouillon" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let (_, body) = send_empty(&app, Method::GET, &uri).await;
    assert_eq!(body["data"]["statut"], "payee");
    assert_eq!(body["data"]["montantTtc"], 18000);

    let (status, _) = send_empty(&app, Method::DELETE, &uri).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let devis_id = accepted_devis(&app, &client_id).await;
    let (status, _) = send_json(
        &app,
        Method::PATCH,
        &format!("/api/devis/{devis_id}"),
        json!({ "statut": "brouillon" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send_empty(&app, Method::GET, &format!("/api/devis/{devis_id}")).await;
    assert_eq!(body["data"]["statut"], "accepte");
}
