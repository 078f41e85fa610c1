//! Read models for the admin dashboard.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{Department, Report, ReportStatus};

/// Statuses shown as board columns, in display order.
pub const BOARD_COLUMNS: [ReportStatus; 4] = [
    ReportStatus::New,
    ReportStatus::InProgress,
    ReportStatus::Resolved,
    ReportStatus::Verified,
];

/// Reports grouped by status column.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardColumn {
    pub status: ReportStatus,
    pub reports: Vec<Report>,
}

/// Partition reports into the board columns, keeping snapshot order.
///
/// Reports in statuses without a column (closed, escalated) are left out.
pub fn board(reports: &[Report]) -> Vec<BoardColumn> {
    BOARD_COLUMNS
        .into_iter()
        .map(|status| BoardColumn {
            status,
            reports: reports
                .iter()
                .filter(|report| report.status() == status)
                .cloned()
                .collect(),
        })
        .collect()
}

/// Resolution figures for one department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPerformance {
    pub department: Department,
    pub total: usize,
    pub resolved: usize,
    pub active: usize,
}

/// Per-department totals, one row per department.
pub fn department_performance(reports: &[Report]) -> Vec<DepartmentPerformance> {
    Department::ALL
        .into_iter()
        .map(|department| {
            let own = reports.iter().filter(|report| report.category() == department);
            let (mut total, mut resolved, mut active) = (0, 0, 0);
            for report in own {
                total += 1;
                if report.status().is_resolved() {
                    resolved += 1;
                }
                if report.status().is_active() {
                    active += 1;
                }
            }
            DepartmentPerformance {
                department,
                total,
                resolved,
                active,
            }
        })
        .collect()
}

/// Reports filed on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyVolume {
    pub date: NaiveDate,
    pub count: usize,
}

/// Reports created on each of the last `days` days, oldest first, ending
/// with the day of `now`.
pub fn volume_trend(reports: &[Report], now: DateTime<Utc>, days: u64) -> Vec<DailyVolume> {
    let today = now.date_naive();
    (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|date| DailyVolume {
            date,
            count: reports
                .iter()
                .filter(|report| report.created_at().date_naive() == date)
                .count(),
        })
        .collect()
}

/// Headline counts shown above the analytics charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total: usize,
    pub active: usize,
    pub resolved: usize,
    pub escalated: usize,
}

/// Count `reports` by lifecycle stage.
pub fn summary(reports: &[Report]) -> ReportSummary {
    ReportSummary {
        total: reports.len(),
        active: reports.iter().filter(|r| r.status().is_active()).count(),
        resolved: reports.iter().filter(|r| r.status().is_resolved()).count(),
        escalated: reports
            .iter()
            .filter(|r| r.status() == ReportStatus::Escalated)
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::test_support::{fixed_now, persisted_report};
    use chrono::TimeDelta;
    use rstest::{fixture, rstest};

    #[fixture]
    fn reports() -> Vec<Report> {
        let reporter = UserId::for_email("stats@example.org");
        [
            ReportStatus::New,
            ReportStatus::InProgress,
            ReportStatus::Resolved,
            ReportStatus::Verified,
            ReportStatus::Closed,
            ReportStatus::Escalated,
        ]
        .into_iter()
        .zip(1_u128..)
        .map(|(status, n)| persisted_report(&reporter, n, status))
        .collect()
    }

    #[rstest]
    fn board_has_four_columns_and_skips_side_branches(reports: Vec<Report>) {
        let columns = board(&reports);
        let counts: Vec<_> = columns.iter().map(|c| (c.status, c.reports.len())).collect();
        assert_eq!(
            counts,
            [
                (ReportStatus::New, 1),
                (ReportStatus::InProgress, 1),
                (ReportStatus::Resolved, 1),
                (ReportStatus::Verified, 1),
            ]
        );
    }

    #[rstest]
    fn performance_counts_resolved_and_active(reports: Vec<Report>) {
        let rows = department_performance(&reports);
        let roads = rows
            .iter()
            .find(|row| row.department == Department::Roads)
            .expect("roads row");
        assert_eq!((roads.total, roads.resolved, roads.active), (6, 2, 2));
        assert_eq!(rows.len(), Department::ALL.len());
    }

    #[rstest]
    fn trend_covers_seven_days_ending_today(reports: Vec<Report>) {
        let now = fixed_now() + TimeDelta::days(1);
        let trend = volume_trend(&reports, now, 7);

        assert_eq!(trend.len(), 7);
        assert_eq!(trend.last().map(|day| day.date), Some(now.date_naive()));
        let counts: Vec<_> = trend.iter().map(|day| day.count).collect();
        assert_eq!(counts, [0, 0, 0, 0, 0, 6, 0]);
    }

    #[rstest]
    fn summary_totals(reports: Vec<Report>) {
        let totals = summary(&reports);
        assert_eq!(
            totals,
            ReportSummary {
                total: 6,
                active: 2,
                resolved: 2,
                escalated: 1
            }
        );
    }
}
