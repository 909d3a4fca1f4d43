use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request, State},
    http::{request::Parts, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use shared::{Task, TaskId};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{require_auth, require_role, AccessGuard, Role};
use crate::error::ApiError;
use crate::service::{ServiceError, TaskService};

/// JSON body whose rejections become field errors under `body`.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::field("body", rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// The `{id}` path segment.
pub struct TaskPath(pub TaskId);

#[async_trait]
impl<S> FromRequestParts<S> for TaskPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<TaskId>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::field("id", rejection.body_text()))?;
        Ok(Self(id))
    }
}

/// Raw text body; non-UTF-8 input becomes a field error under `body`.
pub struct TextBody(pub String);

#[async_trait]
impl<S> FromRequest<S> for TextBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = String::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::field("body", rejection.body_text()))?;
        Ok(Self(body))
    }
}

pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";

/// OpenAPI document built from the `#[utoipa::path]` annotations below.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Task Management API",
        description = "API for managing tasks"
    ),
    paths(
        hi_user,
        hi_admin,
        get_all_tasks,
        get_task_by_id,
        create_task,
        update_task,
        update_description,
        delete_task
    ),
    components(schemas(Task)),
    tags((name = "Task Management", description = "API for managing tasks")),
    modifiers(&BasicAuth),
    security(("basic_auth" = []))
)]
pub struct ApiDoc;

struct BasicAuth;

impl Modify for BasicAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
            );
        }
    }
}

pub fn app(service: TaskService, guard: AccessGuard) -> Router {
    let admin = Router::new()
        .route("/api/tasks/admin", get(hi_admin))
        .route_layer(middleware::from_fn_with_state(Role::Admin, require_role));
    let user = Router::new()
        .route("/api/tasks/user", get(hi_user))
        .route_layer(middleware::from_fn_with_state(Role::User, require_role));

    Router::new()
        .route("/api/tasks", get(get_all_tasks).post(create_task))
        .route("/api/tasks/", get(get_all_tasks).post(create_task))
        .route("/api/tasks/:id", get(get_task_by_id).delete(delete_task))
        .route("/api/tasks/completed/:id", patch(update_task))
        .route("/api/tasks/desc/:id", put(update_description))
        .merge(admin)
        .merge(user)
        .merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_JSON, ApiDoc::openapi()))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(guard, require_auth))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Greet the user
#[utoipa::path(
    get,
    path = "/api/tasks/user",
    tag = "Task Management",
    responses(
        (status = 200, description = "Greeting for the user role", body = String),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not a user")
    )
)]
async fn hi_user() -> &'static str {
    tracing::info!("Greeting user");
    "Hello from user"
}

/// Greet the admin
#[utoipa::path(
    get,
    path = "/api/tasks/admin",
    tag = "Task Management",
    responses(
        (status = 200, description = "Greeting for the admin role", body = String),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not an admin")
    )
)]
async fn hi_admin() -> &'static str {
    tracing::info!("Greeting admin");
    "Hello from Admin"
}

/// Get all tasks
#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "Task Management",
    responses((status = 200, description = "Successfully retrieved all tasks", body = Vec<Task>))
)]
async fn get_all_tasks(State(service): State<TaskService>) -> Result<Json<Vec<Task>>, ApiError> {
    tracing::info!("Fetching all tasks");
    Ok(Json(service.get_all_tasks()?))
}

/// Get a task by ID
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "Task Management",
    params(("id" = i64, Path, description = "ID of the task", example = 1)),
    responses(
        (status = 200, description = "Successfully retrieved the task", body = Task),
        (status = 404, description = "Task not found")
    )
)]
async fn get_task_by_id(
    State(service): State<TaskService>,
    TaskPath(id): TaskPath,
) -> Result<Json<Task>, ApiError> {
    tracing::info!(id, "Fetching task");
    service
        .get_task_by_id(id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("{id} not found")))
}

/// Create a new task
#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "Task Management",
    request_body(content = Task, description = "Task to create; any id is ignored"),
    responses(
        (status = 200, description = "Successfully created the task", body = Task),
        (status = 400, description = "Field name to violation message")
    )
)]
async fn create_task(
    State(service): State<TaskService>,
    ApiJson(mut task): ApiJson<Task>,
) -> Result<Json<Task>, ApiError> {
    tracing::info!(?task, "Creating a new task");
    task.validate().map_err(ApiError::Validation)?;
    // Ids are always assigned by the store.
    task.id = None;
    Ok(Json(service.create_task(task)?))
}

/// Update task completion
#[utoipa::path(
    patch,
    path = "/api/tasks/completed/{id}",
    tag = "Task Management",
    params(("id" = i64, Path, description = "ID of the task", example = 1)),
    request_body(content = bool, description = "Completion status of the task", example = json!(true)),
    responses(
        (status = 200, description = "Successfully updated the task", body = Task),
        (status = 404, description = "Task not found")
    )
)]
async fn update_task(
    State(service): State<TaskService>,
    TaskPath(id): TaskPath,
    ApiJson(completed): ApiJson<bool>,
) -> Result<Response, ApiError> {
    tracing::info!(id, completed, "Updating task completion status");
    updated(service.update_task(id, completed))
}

/// Update task description
#[utoipa::path(
    put,
    path = "/api/tasks/desc/{id}",
    tag = "Task Management",
    params(("id" = i64, Path, description = "ID of the task", example = 1)),
    request_body(
        content = String,
        content_type = "text/plain",
        description = "New description, plain or as a JSON string",
        example = json!("Updated task description")
    ),
    responses(
        (status = 200, description = "Successfully updated the task", body = Task),
        (status = 404, description = "Task not found")
    )
)]
async fn update_description(
    State(service): State<TaskService>,
    TaskPath(id): TaskPath,
    TextBody(body): TextBody,
) -> Result<Response, ApiError> {
    tracing::info!(id, "Updating task description");
    updated(service.update_description(id, description_from_body(body)))
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "Task Management",
    params(("id" = i64, Path, description = "ID of the task", example = 1)),
    responses((status = 204, description = "Deleted, or nothing to delete"))
)]
async fn delete_task(
    State(service): State<TaskService>,
    TaskPath(id): TaskPath,
) -> Result<StatusCode, ApiError> {
    tracing::info!(id, "Deleting task");
    service.delete_task_by_id(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Resource not found" })),
    )
}

// Missing tasks on the update paths answer with a bare 404.
fn updated(result: Result<Task, ServiceError>) -> Result<Response, ApiError> {
    match result {
        Ok(task) => Ok(Json(task).into_response()),
        Err(ServiceError::NotFound(_)) => Ok(StatusCode::NOT_FOUND.into_response()),
        Err(ServiceError::Store(error)) => Err(error.into()),
    }
}

/// Accepts either a JSON string literal or plain text.
fn description_from_body(body: String) -> String {
    match serde_json::from_str::<String>(&body) {
        Ok(description) => description,
        Err(_) => body,
    }
}
