//! Mapping from engine, validation and port failures to domain [`Error`]s.

use serde_json::json;
use tracing::warn;

use super::ports::ReportGatewayError;
use super::{
    Error, GamificationError, LifecycleError, LoginValidationError, MediaValidationError,
    ReportValidationError,
};

pub(crate) fn report_invalid(error: ReportValidationError) -> Error {
    let err = Error::invalid_request(error.to_string());
    match error.field() {
        Some(field) => err.with_details(json!({ "field": field, "code": "invalid_report" })),
        None => err,
    }
}

pub(crate) fn login_invalid(error: LoginValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({
        "field": error.field(),
        "code": "invalid_login",
    }))
}

pub(crate) fn media_invalid(error: MediaValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({
        "field": "data",
        "code": "invalid_media",
    }))
}

pub(crate) fn lifecycle_rejected(error: LifecycleError) -> Error {
    match error {
        LifecycleError::NotPersisted { .. } => Error::conflict(error.to_string()),
        LifecycleError::UnknownWorker { .. } => Error::not_found(error.to_string()),
    }
}

pub(crate) fn gamification_rejected(error: GamificationError) -> Error {
    match &error {
        GamificationError::InsufficientPoints { balance, required } => {
            Error::conflict(error.to_string()).with_details(json!({
                "code": "insufficient_points",
                "balance": balance,
                "required": required,
            }))
        }
        GamificationError::AlreadyRedeemed { reward_id } => Error::conflict(error.to_string())
            .with_details(json!({ "code": "already_redeemed", "rewardId": reward_id })),
        GamificationError::UnknownReward { .. } => Error::not_found(error.to_string()),
    }
}

pub(crate) fn store_failed(error: ReportGatewayError) -> Error {
    warn!(%error, "report store call failed");
    match error {
        ReportGatewayError::Connection { message } => {
            Error::service_unavailable(format!("report store unavailable: {message}"))
        }
        ReportGatewayError::PermissionDenied { message } => Error::forbidden(format!(
            "report store denied access: {message}. Check the store's security rules \
             allow this service account to read and write reports."
        )),
        ReportGatewayError::Missing { store_id } => {
            Error::not_found(format!("report document {store_id} no longer exists"))
        }
        ReportGatewayError::Decode { message } | ReportGatewayError::Query { message } => {
            Error::internal(format!("report store error: {message}"))
        }
    }
}
