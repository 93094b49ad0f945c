//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, materials, volumes};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "GTL Catalog API",
        version = "1.0.0",
        description = "Library catalog and inventory REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Materials
        materials::list_materials,
        materials::get_material,
        materials::create_material,
        materials::update_material,
        materials::delete_material,
        materials::list_subjects,
        materials::list_material_types,
        // Volumes
        volumes::list_volumes,
        volumes::list_material_volumes,
        volumes::get_volume,
        volumes::create_volume,
        volumes::update_volume,
        volumes::delete_volume,
    ),
    components(
        schemas(
            // Materials
            crate::models::material::Material,
            crate::models::material::MaterialInput,
            crate::models::material::MaterialType,
            crate::models::material::MaterialTypeRef,
            crate::models::author::Author,
            crate::models::author::AuthorRef,
            crate::models::subject::Subject,
            crate::models::subject::SubjectRef,
            // Volumes
            crate::models::volume::Volume,
            crate::models::volume::VolumeInput,
            crate::models::address::Address,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "materials", description = "Catalog material management"),
        (name = "volumes", description = "Volume inventory")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
