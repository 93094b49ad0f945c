//! Volume (inventory) endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::JsonBody,
    error::AppResult,
    models::volume::{Volume, VolumeInput},
};

/// List all volumes
#[utoipa::path(
    get,
    path = "/volumes",
    tag = "volumes",
    responses(
        (status = 200, description = "List of volumes", body = Vec<Volume>)
    )
)]
pub async fn list_volumes(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Volume>>> {
    let volumes = state.services.inventory.find_all().await?;
    Ok(Json(volumes))
}

/// List volumes of a material
#[utoipa::path(
    get,
    path = "/materials/{id}/volumes",
    tag = "volumes",
    params(
        ("id" = i32, Path, description = "Material ID")
    ),
    responses(
        (status = 200, description = "Volumes of the material", body = Vec<Volume>)
    )
)]
pub async fn list_material_volumes(
    State(state): State<crate::AppState>,
    Path(material_id): Path<i32>,
) -> AppResult<Json<Vec<Volume>>> {
    let volumes = state
        .services
        .inventory
        .find_volumes_for_material(material_id)
        .await?;
    Ok(Json(volumes))
}

/// Get volume details by ID
#[utoipa::path(
    get,
    path = "/volumes/{id}",
    tag = "volumes",
    params(
        ("id" = i32, Path, description = "Volume ID")
    ),
    responses(
        (status = 200, description = "Volume details", body = Volume),
        (status = 404, description = "Volume not found")
    )
)]
pub async fn get_volume(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Volume>> {
    let volume = state.services.inventory.find_by_id(id).await?;
    Ok(Json(volume))
}

/// Create a new volume
#[utoipa::path(
    post,
    path = "/volumes",
    tag = "volumes",
    request_body = VolumeInput,
    responses(
        (status = 201, description = "Volume created", body = Volume),
        (status = 404, description = "Material or location not found")
    )
)]
pub async fn create_volume(
    State(state): State<crate::AppState>,
    JsonBody(input): JsonBody<VolumeInput>,
) -> AppResult<(StatusCode, Json<Volume>)> {
    let created = state.services.inventory.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Replace a volume (not supported)
#[utoipa::path(
    put,
    path = "/volumes/{id}",
    tag = "volumes",
    params(
        ("id" = i32, Path, description = "Volume ID")
    ),
    request_body = VolumeInput,
    responses(
        (status = 501, description = "Volume update is not supported")
    )
)]
pub async fn update_volume(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    JsonBody(input): JsonBody<VolumeInput>,
) -> AppResult<Json<Volume>> {
    let volume = state.services.inventory.update(id, input).await?;
    Ok(Json(volume))
}

/// Delete a volume (not supported)
#[utoipa::path(
    delete,
    path = "/volumes/{id}",
    tag = "volumes",
    params(
        ("id" = i32, Path, description = "Volume ID")
    ),
    responses(
        (status = 501, description = "Volume delete is not supported")
    )
)]
pub async fn delete_volume(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.inventory.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
