use axum::{response::IntoResponse, Json};
use chrono::Utc;
use tracing::debug;

use crate::{
    doc::{ApiOperation, HttpMethod},
    forecast::{generate, SUMMARIES_V1},
};

pub const OPERATIONS: &[ApiOperation] = &[ApiOperation {
    version: "1",
    method: HttpMethod::Get,
    path: "/v1/weatherforecast",
    operation_id: "WeatherForecastV1_Get",
    summary: "Lists freshly generated weather forecasts.",
    responses: &[(200, "An array of five weather forecasts.")],
    deprecated: false,
}];

// handle list endpoint, a new set is generated for every request
pub async fn list() -> impl IntoResponse {
    debug!("new request to list v1 forecasts");
    Json(generate(Utc::now(), &SUMMARIES_V1))
}
