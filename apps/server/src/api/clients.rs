use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use advisordesk_core::clients::{ClientSummary, NewClient};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

async fn list_clients(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<ClientSummary>>> {
    let clients = state.client_service.list_clients()?;
    Ok(Json(clients))
}

async fn create_client(
    State(state): State<Arc<AppState>>,
    Json(new_client): Json<NewClient>,
) -> ApiResult<(StatusCode, Json<ClientSummary>)> {
    let client = state.client_service.create_client(new_client).await?;
    Ok((StatusCode::CREATED, Json(ClientSummary::from(&client))))
}

async fn get_client(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ClientSummary>> {
    let client = state.client_service.get_client(&id)?;
    Ok(Json(ClientSummary::from(&client)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route("/clients/{id}", get(get_client))
}
