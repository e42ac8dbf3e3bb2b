use axum::{
    extract::{Path, State},
    http::{header::LOCATION, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::debug;

use super::parse_id;
use crate::{
    doc::{ApiOperation, HttpMethod},
    forecast::{CreateWeatherForecast, EditWeatherForecast},
    store::StoreError,
    AppState,
};

pub const ROUTE: &str = "/v2/weatherforecast";

const UNAUTHORIZED: (u16, &str) = (401, "If the request is not authorized.");

pub const OPERATIONS: &[ApiOperation] = &[
    ApiOperation {
        version: "2",
        method: HttpMethod::Get,
        path: ROUTE,
        operation_id: "WeatherForecastV2_List",
        summary: "Lists weather forecasts.",
        responses: &[
            (200, "An array consisting of zero or more weather forecasts."),
            UNAUTHORIZED,
        ],
        deprecated: false,
    },
    ApiOperation {
        version: "2",
        method: HttpMethod::Post,
        path: ROUTE,
        operation_id: "WeatherForecastV2_Create",
        summary: "Creates a weather forecast.",
        responses: &[(201, "Location of the new weather forecast."), UNAUTHORIZED],
        deprecated: false,
    },
    ApiOperation {
        version: "2",
        method: HttpMethod::Get,
        path: "/v2/weatherforecast/{id}",
        operation_id: "WeatherForecastV2_GetById",
        summary: "Finds a weather forecast by its ID.",
        responses: &[
            (200, "The requested weather forecast, if it was found."),
            (400, "If the ID is empty or malformed."),
            UNAUTHORIZED,
            (404, "If the weather forecast was not found."),
        ],
        deprecated: false,
    },
    ApiOperation {
        version: "2",
        method: HttpMethod::Put,
        path: "/v2/weatherforecast/{id}",
        operation_id: "WeatherForecastV2_Edit",
        summary: "Edits a weather forecast.",
        responses: &[
            (204, "The weather forecast was edited."),
            (400, "If the ID in the path does not match the body."),
            UNAUTHORIZED,
            (404, "If the weather forecast was not found."),
        ],
        deprecated: false,
    },
    ApiOperation {
        version: "2",
        method: HttpMethod::Delete,
        path: "/v2/weatherforecast/{id}",
        operation_id: "WeatherForecastV2_Delete",
        summary: "Deletes a weather forecast.",
        responses: &[
            (204, "The weather forecast was deleted."),
            UNAUTHORIZED,
            (404, "If the weather forecast was not found."),
        ],
        deprecated: false,
    },
];

// handle list endpoint
pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    debug!("new request to list forecasts");
    Json(state.store.list().await)
}

// handle get endpoint
// nil id is a bad request, unknown id is not found.
pub async fn get_by_id(
    Path(path): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, StoreError> {
    debug!("new request to get a forecast");
    let id = parse_id(&path)?;
    Ok(Json(state.store.get(id).await?))
}

// handle create endpoint
// respond with the location of the new forecast, without body.
pub async fn create(
    State(state): State<AppState>,
    Json(forecast): Json<CreateWeatherForecast>,
) -> impl IntoResponse {
    debug!("new request to create a forecast");
    let forecast = state.store.create(forecast).await;
    (
        StatusCode::CREATED,
        [(LOCATION, format!("{ROUTE}/{}", forecast.id))],
    )
}

// handle edit endpoint
pub async fn update(
    Path(path): Path<String>,
    State(state): State<AppState>,
    Json(forecast): Json<EditWeatherForecast>,
) -> Result<StatusCode, StoreError> {
    debug!("new request to edit a forecast");
    let id = parse_id(&path)?;
    state.store.update(id, forecast).await?;
    Ok(StatusCode::NO_CONTENT)
}

// handle delete endpoint
pub async fn delete(
    Path(path): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, StoreError> {
    debug!("new request to delete a forecast");
    let id = parse_id(&path)?;
    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
