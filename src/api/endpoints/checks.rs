//! Clinical check endpoints.
//!
//! - `POST /api/checks/interactions`
//! - `POST /api/checks/allergies`
//! - `POST /api/checks/contraindications`
//! - `POST /api/checks/doses`
//! - `POST /api/checks/all`

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse, CheckRequest};
use crate::clinical::{
    AllergyCheckResult, CombinedReport, ContraindicationResult, DoseValidationResult,
    InteractionResult,
};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub async fn interactions(
    State(ctx): State<ApiContext>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> ApiResult<InteractionResult> {
    let Json(req) = payload?;
    let result = ctx.service.check_interactions(req.medication_refs()).await?;
    Ok(Json(ApiResponse::ok(result)))
}

pub async fn allergies(
    State(ctx): State<ApiContext>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> ApiResult<AllergyCheckResult> {
    let Json(req) = payload?;
    let medications = req.medication_refs();
    let result = ctx
        .service
        .check_allergies(
            medications,
            req.patient_context.allergies,
            req.patient_context.patient_id,
        )
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

pub async fn contraindications(
    State(ctx): State<ApiContext>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> ApiResult<ContraindicationResult> {
    let Json(req) = payload?;
    let medications = req.medication_refs();
    let result = ctx
        .service
        .check_contraindications(medications, req.patient_context.conditions)
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

pub async fn doses(
    State(ctx): State<ApiContext>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> ApiResult<DoseValidationResult> {
    let Json(req) = payload?;
    let prescriptions = req.prescriptions()?;
    let result = ctx
        .service
        .validate_doses(prescriptions, req.patient_context.profile)
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

pub async fn all(
    State(ctx): State<ApiContext>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> ApiResult<CombinedReport> {
    let Json(req) = payload?;
    let report = ctx.service.check_all(req.into_full_check()).await?;
    Ok(Json(ApiResponse::ok(report)))
}
