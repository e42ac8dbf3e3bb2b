use std::str::FromStr;

use axum::{http::StatusCode, response::IntoResponse};
use tracing::warn;
use uuid::Uuid;

use crate::{doc::ApiOperation, store::StoreError};

/// stateless forecasts
pub mod v1;
/// forecasts backed by the in memory store
pub mod v2;

/// every operation mounted by the router, in route order
pub fn operations() -> Vec<ApiOperation> {
    v1::OPERATIONS.iter().chain(v2::OPERATIONS).copied().collect()
}

impl IntoResponse for StoreError {
    fn into_response(self) -> axum::response::Response {
        match self {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
        .into_response()
    }
}

// ids come as raw strings so a malformed one is answered like any other bad request
fn parse_id(path: &str) -> Result<Uuid, StoreError> {
    Uuid::from_str(path).map_err(|err| {
        warn!("request with invalid uuid {path}");
        StoreError::BadRequest(err.to_string())
    })
}

#[cfg(test)]
mod test {
    use axum::{http::StatusCode, response::IntoResponse};
    use uuid::Uuid;

    use super::parse_id;
    use crate::{doc::ApiOperation, store::StoreError};

    #[test]
    fn status_mapping() {
        assert_eq!(
            StoreError::NotFound(Uuid::new_v4()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            StoreError::BadRequest(String::new()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
    #[test]
    fn malformed_id() {
        assert!(matches!(parse_id("abc"), Err(StoreError::BadRequest(_))));
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()), Ok(id));
    }
}
