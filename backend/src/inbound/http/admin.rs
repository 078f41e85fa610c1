//! Command-centre handlers. Every route requires the admin role.
//!
//! ```text
//! GET /api/v1/workers?department=Electricity&available=true
//! GET /api/v1/admin/board
//! GET /api/v1/admin/analytics
//! ```

use actix_web::{get, web};

use crate::domain::ports::{AnalyticsOverview, WorkerFilter};
use crate::domain::{Error, Worker};
use crate::inbound::http::ApiResult;
use crate::inbound::http::reports_dto::{BoardColumnDto, WorkerQuery};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_optional_department};

/// Field roster, optionally narrowed to one department or to free workers.
#[utoipa::path(
    get,
    path = "/api/v1/workers",
    params(WorkerQuery),
    responses(
        (status = 200, description = "Workers", body = [Worker]),
        (status = 400, description = "Unknown department", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["admin"],
    operation_id = "listWorkers"
)]
#[get("/workers")]
pub async fn list_workers(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<WorkerQuery>,
) -> ApiResult<web::Json<Vec<Worker>>> {
    session.require_admin()?;
    let filter = WorkerFilter {
        department: parse_optional_department(
            query.department.as_deref(),
            FieldName::new("department"),
        )?,
        available_only: query.available.unwrap_or(false),
    };
    let workers = state.reports_query.workers(filter).await?;
    Ok(web::Json(workers))
}

/// Kanban columns in workflow order.
#[utoipa::path(
    get,
    path = "/api/v1/admin/board",
    responses(
        (status = 200, description = "Board", body = [BoardColumnDto]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["admin"],
    operation_id = "board"
)]
#[get("/admin/board")]
pub async fn board(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<BoardColumnDto>>> {
    session.require_admin()?;
    let columns = state.reports_query.board().await?;
    Ok(web::Json(
        columns.into_iter().map(BoardColumnDto::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/analytics",
    responses(
        (status = 200, description = "Analytics", body = AnalyticsOverview),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["admin"],
    operation_id = "analytics"
)]
#[get("/admin/analytics")]
pub async fn analytics(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AnalyticsOverview>> {
    session.require_admin()?;
    let overview = state.reports_query.analytics().await?;
    Ok(web::Json(overview))
}
