use utoipa::OpenApi;

use crate::api::handlers::{Address, NewUser, UserResponse};
use crate::errors::{ErrorBody, ErrorDetails, ErrorKind, ErrorPayload};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HTTP Error Kit",
        version = "0.1.0",
        description = "Demo service for the structured error taxonomy, required-field guards and the error responder.",
    ),
    paths(
        crate::api::handlers::health,
        crate::api::handlers::create_user,
        crate::api::handlers::get_user,
        crate::api::handlers::search_users,
        crate::api::handlers::session,
    ),
    components(
        schemas(
            ErrorBody,
            ErrorPayload,
            ErrorDetails,
            ErrorKind,
            NewUser,
            Address,
            UserResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Demo endpoints exercising guards and error responses"),
    )
)]
pub struct ApiDoc;
