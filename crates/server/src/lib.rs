use api_types::error::{ErrorBody, ValidationBody};
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use server::{AccountContext, ServerState, app, run, run_with_listener, spawn_with_listener};

mod categories;
mod contacts;
mod labels;
mod ledger;
mod paging;
mod server;
mod views;

/// Message returned for every failed query, whatever the cause.
pub const QUERY_ERROR_MESSAGE: &str = "There was an error. Please contact help@skyclerk.com for help.";

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

fn error_body(status: StatusCode, error: String) -> axum::response::Response {
    (status, Json(ErrorBody { error })).into_response()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServerError::Engine(EngineError::Validation(errors)) => {
                let errors = errors
                    .iter()
                    .map(|(field, message)| (field.to_string(), message.to_string()))
                    .collect();
                (StatusCode::BAD_REQUEST, Json(ValidationBody { errors })).into_response()
            }
            ServerError::Engine(EngineError::NotFound(message)) => {
                error_body(StatusCode::NOT_FOUND, message)
            }
            ServerError::Engine(err) => {
                tracing::error!("query failed: {err}");
                error_body(StatusCode::NOT_FOUND, QUERY_ERROR_MESSAGE.to_string())
            }
            ServerError::Generic(err) => error_body(StatusCode::BAD_REQUEST, err),
        }
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use engine::ValidationErrors;
    use sea_orm::DbErr;

    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "Label name is already in use.");
        let res = ServerError::from(EngineError::Validation(errors)).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let res = ServerError::from(EngineError::NotFound("Contact not found.".to_string()))
            .into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn bad_parameter_and_database_failure_look_the_same() {
        let bad_order =
            ServerError::from(EngineError::InvalidParameter("order".to_string())).into_response();
        let db = ServerError::from(EngineError::Database(DbErr::Custom("boom".to_string())))
            .into_response();
        assert_eq!(bad_order.status(), StatusCode::NOT_FOUND);
        assert_eq!(db.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
