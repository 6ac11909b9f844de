//! HTTP surface: routing, JSON envelope and error mapping.
//!
//! Every response body is an [`ApiResponse`] on success or an
//! [`ErrorResponse`] on failure, including malformed JSON bodies and ids.

mod envelope;
mod error;
mod handlers;
mod params;

use axum::Router;
use axum::http::Method;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::models::{Client, Devis, Facture, Mission, Rapport, Technicien};
use crate::state::AppState;

pub use envelope::{ApiMessage, ApiResponse, Deleted};
pub use error::{ErrorResponse, WebError, WebResult};
pub use params::ListParams;

use handlers::*;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route(
            "/api/clients",
            get(list_records::<Client>).post(create_client),
        )
        .route(
            "/api/clients/:id",
            get(get_record::<Client>)
                .put(replace_client)
                .delete(delete_client),
        )
        .route(
            "/api/techniciens",
            get(list_records::<Technicien>).post(create_technicien),
        )
        .route(
            "/api/techniciens/:id",
            get(get_record::<Technicien>)
                .put(replace_technicien)
                .delete(delete_technicien),
        )
        .route(
            "/api/missions",
            get(list_records::<Mission>).post(create_mission),
        )
        .route(
            "/api/missions/:id",
            get(get_record::<Mission>)
                .patch(patch_mission)
                .delete(delete_mission),
        )
        .route("/api/devis", get(list_records::<Devis>).post(create_devis))
        .route(
            "/api/devis/:id",
            get(get_record::<Devis>)
                .patch(patch_devis)
                .delete(delete_devis),
        )
        .route("/api/devis/:id/facture", post(invoice_devis))
        .route(
            "/api/factures",
            get(list_records::<Facture>).post(create_facture),
        )
        .route(
            "/api/factures/:id",
            get(get_record::<Facture>)
                .patch(patch_facture)
                .delete(delete_facture),
        )
        .route(
            "/api/rapports",
            get(list_records::<Rapport>).post(create_rapport),
        )
        .route(
            "/api/rapports/:id",
            get(get_record::<Rapport>).delete(delete_rapport),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_headers(Any)
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::PATCH,
                            Method::DELETE,
                            Method::OPTIONS,
                        ]),
                ),
        )
        .with_state(state)
}
