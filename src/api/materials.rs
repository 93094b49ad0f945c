//! Material (catalog) endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::JsonBody,
    error::AppResult,
    models::{
        material::{Material, MaterialInput, MaterialType},
        subject::Subject,
    },
};

/// List all materials
#[utoipa::path(
    get,
    path = "/materials",
    tag = "materials",
    responses(
        (status = 200, description = "List of materials", body = Vec<Material>)
    )
)]
pub async fn list_materials(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Material>>> {
    let materials = state.services.catalog.find_all().await?;
    Ok(Json(materials))
}

/// Get material details by ID
#[utoipa::path(
    get,
    path = "/materials/{id}",
    tag = "materials",
    params(
        ("id" = i32, Path, description = "Material ID")
    ),
    responses(
        (status = 200, description = "Material details", body = Material),
        (status = 404, description = "Material not found")
    )
)]
pub async fn get_material(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Material>> {
    let material = state.services.catalog.find_by_id(id).await?;
    Ok(Json(material))
}

/// Create a new material
#[utoipa::path(
    post,
    path = "/materials",
    tag = "materials",
    request_body = MaterialInput,
    responses(
        (status = 201, description = "Material created", body = Material),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Material type not found")
    )
)]
pub async fn create_material(
    State(state): State<crate::AppState>,
    JsonBody(input): JsonBody<MaterialInput>,
) -> AppResult<(StatusCode, Json<Material>)> {
    let created = state.services.catalog.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Replace an existing material, including its author and subject sets
#[utoipa::path(
    put,
    path = "/materials/{id}",
    tag = "materials",
    params(
        ("id" = i32, Path, description = "Material ID")
    ),
    request_body = MaterialInput,
    responses(
        (status = 200, description = "Material updated", body = Material),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Material not found")
    )
)]
pub async fn update_material(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    JsonBody(input): JsonBody<MaterialInput>,
) -> AppResult<Json<Material>> {
    state.services.catalog.update(id, input).await?;
    let updated = state.services.catalog.find_by_id(id).await?;
    Ok(Json(updated))
}

/// Delete a material
#[utoipa::path(
    delete,
    path = "/materials/{id}",
    tag = "materials",
    params(
        ("id" = i32, Path, description = "Material ID")
    ),
    responses(
        (status = 204, description = "Material deleted"),
        (status = 404, description = "Material not found"),
        (status = 409, description = "Material still has volumes")
    )
)]
pub async fn delete_material(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the subject vocabulary
#[utoipa::path(
    get,
    path = "/subjects",
    tag = "materials",
    responses(
        (status = 200, description = "Available subjects", body = Vec<Subject>)
    )
)]
pub async fn list_subjects(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Subject>>> {
    let subjects = state.services.catalog.list_subjects().await?;
    Ok(Json(subjects))
}

/// List the material type vocabulary
#[utoipa::path(
    get,
    path = "/material-types",
    tag = "materials",
    responses(
        (status = 200, description = "Available material types", body = Vec<MaterialType>)
    )
)]
pub async fn list_material_types(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<MaterialType>>> {
    let types = state.services.catalog.list_types().await?;
    Ok(Json(types))
}
