use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(utoipa::ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// `admin` requires an admin token
    pub role: Option<String>,
}

#[derive(utoipa::ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(utoipa::ToSchema)]
pub struct CreateServiceDoc {
    pub name: String,
    pub description: Option<String>,
    /// One of the known application codes
    pub application: Option<String>,
}

#[derive(utoipa::ToSchema)]
pub struct UpdateServiceDoc {
    pub name: Option<String>,
    pub description: Option<String>,
    pub application: Option<String>,
}

#[derive(utoipa::ToSchema)]
#[allow(non_snake_case)]
pub struct CreateDeploymentDoc {
    pub serviceId: Uuid,
    pub version: String,
    pub changes: Option<String>,
    pub branchName: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::users::list,
        crate::routes::users::get,
        crate::routes::users::delete,
        crate::routes::services::list,
        crate::routes::services::create,
        crate::routes::services::get,
        crate::routes::services::update,
        crate::routes::services::delete,
        crate::routes::deployments::list,
        crate::routes::deployments::list_by_service,
        crate::routes::deployments::get,
        crate::routes::deployments::create,
        crate::routes::deployments::create_with_file,
        crate::routes::deployments::upload_file,
        crate::routes::deployments::download_file,
        crate::routes::deployments::delete,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            CreateServiceDoc,
            UpdateServiceDoc,
            CreateDeploymentDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "users"),
        (name = "services"),
        (name = "deployments")
    )
)]
pub struct ApiDoc;
