//! Report handlers.
//!
//! ```text
//! POST /api/v1/reports
//! GET /api/v1/reports?status=NEW
//! GET /api/v1/reports/mine
//! GET /api/v1/reports/INC-4F2A9C
//! PUT /api/v1/reports/INC-4F2A9C/status {"status":"RESOLVED"}
//! PUT /api/v1/reports/INC-4F2A9C/worker {"workerId":"W101"}
//! GET /api/v1/clusters?threshold=0.012
//! ```
//!
//! Reads answer from the synchronised cache, so a report filed a moment ago
//! appears in listings once the store's next snapshot arrives.

use actix_web::{HttpResponse, get, post, put, web};
use tracing::info;

use crate::domain::{Error, NewReport, Report, ReportRecord};
use crate::inbound::http::ApiResult;
use crate::inbound::http::reports_dto::{
    ClusterDto, ClusterQuery, NewReportRequest, ReportListQuery, StatusUpdateRequest,
    SubmittedReportResponse, WorkerAssignmentRequest,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_optional_status, parse_report_id, parse_status, parse_worker_id,
};

/// File a new report and credit the dispatch reward.
#[utoipa::path(
    post,
    path = "/api/v1/reports",
    request_body = NewReportRequest,
    responses(
        (status = 201, description = "Report filed", body = SubmittedReportResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Report store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["reports"],
    operation_id = "submitReport"
)]
#[post("/reports")]
pub async fn submit_report(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<NewReportRequest>,
) -> ApiResult<HttpResponse> {
    let reporter = session.require_user_id()?;
    let input = NewReport::try_from(payload.into_inner())?;
    let submitted = state.reports.submit_report(&reporter, input).await?;
    info!(report_id = %submitted.report.id(), reporter = %reporter, "report filed over http");
    Ok(HttpResponse::Created().json(SubmittedReportResponse::from(submitted)))
}

/// Every report, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    params(ReportListQuery),
    responses(
        (status = 200, description = "Reports", body = [ReportRecord]),
        (status = 400, description = "Unknown status", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["reports"],
    operation_id = "listReports"
)]
#[get("/reports")]
pub async fn list_reports(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ReportListQuery>,
) -> ApiResult<web::Json<Vec<Report>>> {
    session.require_user_id()?;
    let status = parse_optional_status(query.status.as_deref(), FieldName::new("status"))?;
    let reports = state.reports_query.list_reports(status).await?;
    Ok(web::Json(reports))
}

/// Reports filed by the signed-in citizen.
#[utoipa::path(
    get,
    path = "/api/v1/reports/mine",
    responses(
        (status = 200, description = "Reports", body = [ReportRecord]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["reports"],
    operation_id = "listMyReports"
)]
#[get("/reports/mine")]
pub async fn my_reports(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Report>>> {
    let reporter = session.require_user_id()?;
    let reports = state.reports_query.reports_filed_by(&reporter).await?;
    Ok(web::Json(reports))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}",
    params(("id" = String, Path, description = "Report reference, e.g. INC-4F2A9C")),
    responses(
        (status = 200, description = "Report", body = ReportRecord),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["reports"],
    operation_id = "getReport"
)]
#[get("/reports/{id}")]
pub async fn get_report(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Report>> {
    session.require_user_id()?;
    let report_id = parse_report_id(&path, FieldName::new("id"))?;
    let report = state.reports_query.get_report(&report_id).await?;
    Ok(web::Json(report))
}

/// Move a report through the workflow. Admin only.
#[utoipa::path(
    put,
    path = "/api/v1/reports/{id}/status",
    params(("id" = String, Path, description = "Report reference")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Updated report", body = ReportRecord),
        (status = 400, description = "Unknown status", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Report not yet stored", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["reports"],
    operation_id = "updateReportStatus"
)]
#[put("/reports/{id}/status")]
pub async fn update_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<StatusUpdateRequest>,
) -> ApiResult<web::Json<Report>> {
    let admin = session.require_admin()?;
    let report_id = parse_report_id(&path, FieldName::new("id"))?;
    let status = parse_status(&payload.status, FieldName::new("status"))?;
    let report = state.reports.update_status(&report_id, status).await?;
    info!(%report_id, %status, admin = %admin, "status changed over http");
    Ok(web::Json(report))
}

/// Dispatch a field worker. Admin only.
#[utoipa::path(
    put,
    path = "/api/v1/reports/{id}/worker",
    params(("id" = String, Path, description = "Report reference")),
    request_body = WorkerAssignmentRequest,
    responses(
        (status = 200, description = "Updated report", body = ReportRecord),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 404, description = "Unknown report or worker", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["reports"],
    operation_id = "assignWorker"
)]
#[put("/reports/{id}/worker")]
pub async fn assign_worker(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<WorkerAssignmentRequest>,
) -> ApiResult<web::Json<Report>> {
    session.require_admin()?;
    let report_id = parse_report_id(&path, FieldName::new("id"))?;
    let worker_id = parse_worker_id(&payload.worker_id, FieldName::new("workerId"))?;
    let report = state.reports.assign_worker(&report_id, &worker_id).await?;
    Ok(web::Json(report))
}

/// Proximity clusters for the map.
#[utoipa::path(
    get,
    path = "/api/v1/clusters",
    params(ClusterQuery),
    responses(
        (status = 200, description = "Clusters", body = [ClusterDto]),
        (status = 400, description = "Invalid threshold", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["reports"],
    operation_id = "listClusters"
)]
#[get("/clusters")]
pub async fn clusters(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ClusterQuery>,
) -> ApiResult<web::Json<Vec<ClusterDto>>> {
    session.require_user_id()?;
    let clusters = state.reports_query.clusters(query.threshold).await?;
    Ok(web::Json(clusters.into_iter().map(ClusterDto::from).collect()))
}

#[cfg(test)]
#[path = "reports_tests.rs"]
mod tests;
