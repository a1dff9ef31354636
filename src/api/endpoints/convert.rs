//! Dose unit conversion utility.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiResponse, ConvertRequest};
use crate::clinical::dose::{convert_dose, format_amount};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub original: String,
    pub amount: f64,
    pub unit: &'static str,
    pub formatted: String,
}

/// `POST /api/doses/convert`: `{ dose: "500 mg", toUnit: "g" }`.
pub async fn convert(
    payload: Result<Json<ConvertRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ConvertResponse>>, ApiError> {
    let Json(req) = payload?;

    let converted = convert_dose(&req.dose, &req.to_unit).map_err(ApiError::from_conversion)?;

    Ok(Json(ApiResponse::ok(ConvertResponse {
        original: req.dose,
        amount: converted.amount,
        unit: converted.unit.as_str(),
        formatted: format!("{} {}", format_amount(converted.amount), converted.unit),
    })))
}
