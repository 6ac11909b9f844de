use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::de::DeserializeOwned;

use super::envelope::{ApiMessage, ApiResponse, Deleted};
use super::error::{WebError, WebResult};
use super::params::{ListParams, parse_id};
use crate::models::{
    Client, ClientInput, Devis, DevisInput, DevisPatch, Entity, Facture, FactureInput,
    FacturePatch, Mission, MissionInput, MissionPatch, Rapport, RapportInput, Technicien,
    TechnicienInput,
};
use crate::pagination::normalize;
use crate::state::AppState;

type Created<T> = (StatusCode, Json<ApiResponse<T>>);

pub async fn healthcheck() -> Json<ApiResponse<ApiMessage>> {
    Json(ApiResponse::ok(ApiMessage {
        message: "ok".to_string(),
    }))
}

fn body<T: DeserializeOwned>(payload: Result<Json<T>, JsonRejection>) -> WebResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| WebError::Input(rejection.body_text()))
}

fn created<T>(data: T) -> Created<T> {
    (StatusCode::CREATED, Json(ApiResponse::ok(data)))
}

pub async fn list_records<E: Entity>(
    State(state): State<AppState>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> WebResult<Json<ApiResponse<Vec<E>>>> {
    let Query(params) = query.map_err(|rejection| WebError::Input(rejection.body_text()))?;
    let filter = params.filter()?;
    let page = normalize(&params.page_request());
    let listing = state.service.list::<E>(&filter, page).await?;
    Ok(Json(ApiResponse::paginated(listing.items, listing.meta)))
}

pub async fn get_record<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Json<ApiResponse<E>>> {
    let record = state.service.get::<E>(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::ok(record)))
}

pub async fn create_client(
    State(state): State<AppState>,
    payload: Result<Json<ClientInput>, JsonRejection>,
) -> WebResult<Created<Client>> {
    let client = state.service.create_client(body(payload)?).await?;
    Ok(created(client))
}

pub async fn replace_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ClientInput>, JsonRejection>,
) -> WebResult<Json<ApiResponse<Client>>> {
    let id = parse_id(&id)?;
    let client = state.service.replace_client(id, body(payload)?).await?;
    Ok(Json(ApiResponse::ok(client)))
}

pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Json<ApiResponse<Deleted>>> {
    let id = parse_id(&id)?;
    state.service.delete_client(id).await?;
    Ok(Json(ApiResponse::ok(Deleted { id })))
}

pub async fn create_technicien(
    State(state): State<AppState>,
    payload: Result<Json<TechnicienInput>, JsonRejection>,
) -> WebResult<Created<Technicien>> {
    let technicien = state.service.create_technicien(body(payload)?).await?;
    Ok(created(technicien))
}

pub async fn replace_technicien(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TechnicienInput>, JsonRejection>,
) -> WebResult<Json<ApiResponse<Technicien>>> {
    let id = parse_id(&id)?;
    let technicien = state.service.replace_technicien(id, body(payload)?).await?;
    Ok(Json(ApiResponse::ok(technicien)))
}

pub async fn delete_technicien(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Json<ApiResponse<Deleted>>> {
    let id = parse_id(&id)?;
    state.service.delete_technicien(id).await?;
    Ok(Json(ApiResponse::ok(Deleted { id })))
}

pub async fn create_mission(
    State(state): State<AppState>,
    payload: Result<Json<MissionInput>, JsonRejection>,
) -> WebResult<Created<Mission>> {
    let mission = state.service.create_mission(body(payload)?).await?;
    Ok(created(mission))
}

pub async fn patch_mission(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<MissionPatch>, JsonRejection>,
) -> WebResult<Json<ApiResponse<Mission>>> {
    let id = parse_id(&id)?;
    let mission = state.service.patch_mission(id, body(payload)?).await?;
    Ok(Json(ApiResponse::ok(mission)))
}

pub async fn delete_mission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Json<ApiResponse<Deleted>>> {
    let id = parse_id(&id)?;
    state.service.delete_mission(id).await?;
    Ok(Json(ApiResponse::ok(Deleted { id })))
}

pub async fn create_devis(
    State(state): State<AppState>,
    payload: Result<Json<DevisInput>, JsonRejection>,
) -> WebResult<Created<Devis>> {
    let devis = state.service.create_devis(body(payload)?).await?;
    Ok(created(devis))
}

pub async fn patch_devis(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<DevisPatch>, JsonRejection>,
) -> WebResult<Json<ApiResponse<Devis>>> {
    let id = parse_id(&id)?;
    let devis = state.service.patch_devis(id, body(payload)?).await?;
    Ok(Json(ApiResponse::ok(devis)))
}

pub async fn delete_devis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Json<ApiResponse<Deleted>>> {
    let id = parse_id(&id)?;
    state.service.delete_devis(id).await?;
    Ok(Json(ApiResponse::ok(Deleted { id })))
}

pub async fn invoice_devis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Created<Facture>> {
    let facture = state.service.invoice_devis(parse_id(&id)?).await?;
    Ok(created(facture))
}

pub async fn create_facture(
    State(state): State<AppState>,
    payload: Result<Json<FactureInput>, JsonRejection>,
) -> WebResult<Created<Facture>> {
    let facture = state.service.create_facture(body(payload)?).await?;
    Ok(created(facture))
}

pub async fn patch_facture(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<FacturePatch>, JsonRejection>,
) -> WebResult<Json<ApiResponse<Facture>>> {
    let id = parse_id(&id)?;
    let facture = state.service.patch_facture(id, body(payload)?).await?;
    Ok(Json(ApiResponse::ok(facture)))
}

pub async fn delete_facture(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Json<ApiResponse<Deleted>>> {
    let id = parse_id(&id)?;
    state.service.delete_facture(id).await?;
    Ok(Json(ApiResponse::ok(Deleted { id })))
}

pub async fn create_rapport(
    State(state): State<AppState>,
    payload: Result<Json<RapportInput>, JsonRejection>,
) -> WebResult<Created<Rapport>> {
    let rapport = state.service.create_rapport(body(payload)?).await?;
    Ok(created(rapport))
}

pub async fn delete_rapport(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Json<ApiResponse<Deleted>>> {
    let id = parse_id(&id)?;
    state.service.delete_rapport(id).await?;
    Ok(Json(ApiResponse::ok(Deleted { id })))
}
