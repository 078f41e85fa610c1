//! Validation and record round-trip coverage for reports.

use super::*;
use crate::test_support::{fixed_now, persisted_report, report_input};
use rstest::rstest;
use serde_json::json;

fn reporter() -> UserId {
    UserId::for_email("reports@example.org")
}

#[rstest]
#[case::blank_title(NewReport { title: "  ".into(), ..report_input("x", 1.0, 1.0) }, ReportValidationError::MissingTitle)]
#[case::blank_description(NewReport { description: String::new(), ..report_input("x", 1.0, 1.0) }, ReportValidationError::MissingDescription)]
#[case::no_category(NewReport { category: None, ..report_input("x", 1.0, 1.0) }, ReportValidationError::MissingCategory)]
#[case::no_location(NewReport { location: None, ..report_input("x", 1.0, 1.0) }, ReportValidationError::MissingLocation)]
fn validation_rejects_incomplete_input(
    #[case] input: NewReport,
    #[case] expected: ReportValidationError,
) {
    assert_eq!(input.validate().expect_err("invalid input"), expected);
}

#[rstest]
fn overlong_title_is_rejected() {
    let input = NewReport {
        title: "t".repeat(TITLE_MAX + 1),
        ..report_input("x", 1.0, 1.0)
    };
    let err = input.validate().expect_err("too long");
    assert_eq!(err, ReportValidationError::TitleTooLong { max: TITLE_MAX });
    assert_eq!(err.field(), Some("title"));
}

#[rstest]
fn oversized_image_is_rejected() {
    let input = NewReport {
        image: Some("a".repeat(IMAGE_MAX + 1)),
        ..report_input("x", 1.0, 1.0)
    };
    assert_eq!(
        input.validate().expect_err("too large"),
        ReportValidationError::ImageTooLarge { max: IMAGE_MAX }
    );
}

#[rstest]
fn blank_address_and_issue_type_are_defaulted() {
    let input = NewReport {
        address: Some("   ".into()),
        issue_type: None,
        ..report_input("Broken light", 12.5, 77.25)
    };
    let fields = input.validate().expect("valid input");
    assert_eq!(fields.location.address, "Location: 12.500000, 77.250000");
    assert_eq!(fields.issue_type, UNCLASSIFIED_ISSUE);
}

#[rstest]
fn open_starts_with_genesis_entry() {
    let fields = report_input("Pothole", 1.0, 2.0)
        .validate()
        .expect("valid input");
    let report = Report::open(
        ReportId::new("INC-ABCDEF").expect("id"),
        fields,
        reporter(),
        fixed_now(),
        "received",
    );

    assert_eq!(report.status(), ReportStatus::New);
    assert_eq!(report.priority(), Priority::Medium);
    assert_eq!(report.impact_score(), INITIAL_IMPACT_SCORE);
    assert!(report.store_id().is_none());
    assert_eq!(report.status_history().len(), 1);
    assert_eq!(report.status_history()[0].note, "received");
    assert_eq!(report.created_at(), report.updated_at());
}

#[rstest]
fn record_round_trips_through_json() {
    let report = persisted_report(&reporter(), 7, ReportStatus::InProgress);
    let value = serde_json::to_value(&report).expect("serialise");

    assert_eq!(value["id"], "INC-000007");
    assert_eq!(value["storeId"], "doc-7");
    assert_eq!(value["status"], "IN_PROGRESS");
    assert_eq!(value["category"], "Roads & Infrastructure");
    assert_eq!(value["location"]["address"], "Market Road");

    let back: Report = serde_json::from_value(value).expect("deserialise");
    assert_eq!(back, report);
}

#[rstest]
fn record_with_history_out_of_step_is_rejected() {
    let report = persisted_report(&reporter(), 1, ReportStatus::Resolved);
    let mut value = serde_json::to_value(&report).expect("serialise");
    value["status"] = json!("NEW");

    let record: ReportRecord = serde_json::from_value(value).expect("record shape");
    assert_eq!(
        Report::try_from(record).expect_err("out of step"),
        ReportValidationError::HistoryOutOfStep
    );
}

#[rstest]
fn record_with_empty_history_is_rejected() {
    let report = persisted_report(&reporter(), 1, ReportStatus::New);
    let mut record = ReportRecord::from(report);
    record.status_history.clear();
    assert_eq!(
        Report::try_from(record).expect_err("empty"),
        ReportValidationError::EmptyHistory
    );
}

#[rstest]
fn verification_is_remembered_after_closing() {
    let mut report = persisted_report(&reporter(), 1, ReportStatus::Verified);
    report.record_status(ReportStatus::Closed, "closed", fixed_now());
    assert!(report.was_ever_verified());
    assert_eq!(
        report.status_history().last().map(|entry| entry.status),
        Some(ReportStatus::Closed)
    );
}

#[rstest]
fn lifecycle_patch_mirrors_mutable_fields() {
    let mut report = persisted_report(&reporter(), 3, ReportStatus::New);
    report.set_worker(Some(WorkerId::new("W101").expect("worker")));
    let patch = report.lifecycle_patch();
    let value = serde_json::to_value(&patch).expect("serialise");

    assert_eq!(value["workerId"], "W101");
    assert_eq!(value["statusHistory"].as_array().map(Vec::len), Some(1));
    assert_eq!(patch.status, ReportStatus::New);
}

#[rstest]
fn patch_with_inconsistent_history_is_refused() {
    let report = persisted_report(&reporter(), 4, ReportStatus::New);
    let mut patch = report.lifecycle_patch();
    patch.status = ReportStatus::Closed;
    assert_eq!(
        report.patched(&patch).expect_err("out of step"),
        ReportValidationError::HistoryOutOfStep
    );
}
