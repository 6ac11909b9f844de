use std::sync::Arc;

use fieldops::{
    AppState, FieldService, MemoryStore, build_router,
    client::{ApiClient, ClientError, ListQuery},
    models::{Client, Mission},
    numbering::{NumberGenerator, NumberingPolicies},
};
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

async fn spawn_server() -> ApiClient {
    let store = Arc::new(MemoryStore::new());
    let numbers = NumberGenerator::new(store.clone(), NumberingPolicies::default());
    let app = build_router(AppState::new(FieldService::new(store, numbers)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server should run");
    });

    ApiClient::new(&format!("http://{addr}")).expect("client should build")
}

#[tokio::test]
async fn client_creates_lists_and_deletes() {
    let api = spawn_server().await;

    let client: Client = api
        .create("clients", &json!({ "nom": "Fromagerie Blanc", "ville": "Annecy" }))
        .await
        .expect("create should succeed");

    for titre in ["Chambre froide", "Groupe froid"] {
        let _: Mission = api
            .create(
                "missions",
                &json!({ "titre": titre, "clientId": client.id }),
            )
            .await
            .expect("mission should be created");
    }

    let page = api
        .list::<Mission>("missions", &ListQuery::default().client(client.id).limit(1))
        .await
        .expect("list should succeed");
    assert_eq!(page.items.len(), 1);
    let meta = page.meta.expect("list carries meta");
    assert_eq!(meta.total, 2);
    assert_eq!(meta.total_pages, 2);

    let fetched: Client = api.get("clients", client.id).await.expect("get should succeed");
    assert_eq!(fetched.nom, "Fromagerie Blanc");

    let err = api
        .delete("clients", client.id)
        .await
        .expect_err("client still has missions");
    match err {
        ClientError::Api { status, code, .. } => {
            assert_eq!(status, StatusCode::CONFLICT);
            assert_eq!(code, "conflict");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn client_surfaces_not_found() {
    let api = spawn_server().await;

    let err = api
        .get::<Client>("clients", Uuid::new_v4())
        .await
        .expect_err("unknown id");
    assert!(matches!(
        err,
        ClientError::Api { status, .. } if status == StatusCode::NOT_FOUND
    ));

    let id = Uuid::new_v4();
    let err = api.delete("rapports", id).await.expect_err("unknown id");
    assert!(matches!(err, ClientError::Api { ref code, .. } if code == "not_found"));
}
