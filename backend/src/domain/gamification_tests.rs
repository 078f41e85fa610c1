//! Tests for the gamification engine.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::catalog::{self, REWARDS};
use crate::domain::ports::SequentialIdGenerator;
use crate::domain::{Role, UserId};
use crate::test_support::{MutableClock, fixed_now, persisted_report};

#[fixture]
fn engine() -> GamificationEngine {
    GamificationEngine::new(
        Arc::new(SequentialIdGenerator::default()),
        Arc::new(MutableClock::new(fixed_now())),
    )
}

fn citizen_with(engine: &GamificationEngine, points: i64) -> User {
    let opening = (points != 0).then(|| engine.ledger_entry(points, "Starting balance"));
    User::new(
        UserId::for_email("citizen@example.org"),
        "Casey Citizen",
        "citizen@example.org",
        Role::Citizen,
        opening,
    )
}

fn ledger_total(user: &User) -> i64 {
    user.point_history().iter().map(|entry| entry.amount).sum()
}

#[rstest]
fn credit_appends_entry_and_keeps_ledger_balanced(engine: GamificationEngine) {
    let user = citizen_with(&engine, 200);
    let user = engine
        .credit_points(user, 50, "Report dispatch reward")
        .expect("credit succeeds");

    assert_eq!(user.points(), 250);
    assert_eq!(user.level(), 2);
    assert_eq!(user.point_history().len(), 2);
    assert_eq!(ledger_total(&user), user.points());
}

#[rstest]
fn debit_beyond_balance_is_rejected(engine: GamificationEngine) {
    let user = citizen_with(&engine, 100);
    let err = engine
        .credit_points(user, -150, "overdraw")
        .expect_err("overdraw rejected");

    assert_eq!(
        err,
        GamificationError::InsufficientPoints {
            balance: 100,
            required: 150
        }
    );
}

#[rstest]
#[case(1_250, -1, 1_249, 5)]
#[case(250, -1, 249, 1)]
#[case(1_000, -1, 999, 4)]
#[case(1_300, -300, 1_000, 5)]
fn debit_recomputes_level(
    engine: GamificationEngine,
    #[case] start: i64,
    #[case] amount: i64,
    #[case] points: i64,
    #[case] level: i64,
) {
    let user = citizen_with(&engine, start);
    let user = engine.credit_points(user, amount, "debit").expect("debit succeeds");
    assert_eq!(user.points(), points);
    assert_eq!(user.level(), level);
}

#[rstest]
fn first_report_unlocks_first_steps_once(engine: GamificationEngine) {
    let user = citizen_with(&engine, 0);
    let reports = vec![persisted_report(user.id(), 1, ReportStatus::New)];

    let first = engine.evaluate_badges(user, &reports);
    let ids: Vec<_> = first.unlocked.iter().map(|badge| badge.id).collect();
    assert_eq!(ids, ["b1"]);

    let second = engine.evaluate_badges(first.user, &reports);
    assert!(second.unlocked.is_empty());
    assert_eq!(second.user.earned_badge_ids(), ["b1".to_owned()]);
}

#[rstest]
fn only_own_reports_count(engine: GamificationEngine) {
    let user = citizen_with(&engine, 0);
    let stranger = UserId::for_email("someone-else@example.org");
    let reports: Vec<_> = (1..=5)
        .map(|n| persisted_report(&stranger, n, ReportStatus::Verified))
        .collect();

    let evaluation = engine.evaluate_badges(user, &reports);
    assert!(evaluation.unlocked.is_empty());
}

#[rstest]
fn five_reports_three_verified_unlock_in_catalog_order(engine: GamificationEngine) {
    let user = citizen_with(&engine, 0);
    let reports: Vec<_> = (1..=5)
        .map(|n| {
            let status = if n <= 3 {
                ReportStatus::Verified
            } else {
                ReportStatus::New
            };
            persisted_report(user.id(), n, status)
        })
        .collect();

    let evaluation = engine.evaluate_badges(user, &reports);
    let ids: Vec<_> = evaluation.unlocked.iter().map(|badge| badge.id).collect();
    assert_eq!(ids, ["b1", "b2", "b3"]);
}

#[rstest]
fn centurion_follows_points(engine: GamificationEngine) {
    let user = citizen_with(&engine, 950);
    let user = engine
        .credit_points(user, VERIFICATION_REWARD, "verified")
        .expect("credit succeeds");

    let evaluation = engine.evaluate_badges(user, &[]);
    let ids: Vec<_> = evaluation.unlocked.iter().map(|badge| badge.id).collect();
    assert_eq!(ids, ["b4"]);
    assert_eq!(evaluation.user.points(), 1_050);
    assert_eq!(evaluation.user.level(), 5);
}

#[rstest]
fn badges_are_not_revoked_when_points_drop(engine: GamificationEngine) {
    let user = citizen_with(&engine, 1_000);
    let user = engine.evaluate_badges(user, &[]).user;
    let user = engine.credit_points(user, -500, "spent").expect("debit succeeds");

    let evaluation = engine.evaluate_badges(user, &[]);
    assert!(evaluation.user.has_badge("b4"));
    assert!(evaluation.unlocked.is_empty());
}

#[rstest]
fn redeem_debits_and_records(engine: GamificationEngine) {
    let user = citizen_with(&engine, 600);
    let reward = catalog::reward("r1").expect("bus pass in catalog");

    let user = engine.redeem_reward(user, reward).expect("redemption succeeds");

    assert_eq!(user.points(), 100);
    assert!(user.has_redeemed("r1"));
    let last = user.point_history().last().expect("ledger entry");
    assert_eq!(last.amount, -500);
    assert_eq!(last.reason, "Reward redemption: 50% Off Bus Pass");
}

#[rstest]
fn redeem_with_insufficient_balance_changes_nothing(engine: GamificationEngine) {
    let user = citizen_with(&engine, 200);
    let reward = catalog::reward("r3").expect("voucher in catalog");

    let err = engine
        .redeem_reward(user.clone(), reward)
        .expect_err("insufficient balance");

    assert_eq!(
        err,
        GamificationError::InsufficientPoints {
            balance: 200,
            required: 300
        }
    );
    assert_eq!(user.point_history().len(), 1);
    assert!(user.redeemed_reward_ids().is_empty());
}

#[rstest]
fn repeat_redemption_is_rejected(engine: GamificationEngine) {
    let user = citizen_with(&engine, 1_000);
    let reward = &REWARDS[1];

    let user = engine.redeem_reward(user, reward).expect("first redemption");
    let err = engine
        .redeem_reward(user, reward)
        .expect_err("second redemption rejected");

    assert!(matches!(err, GamificationError::AlreadyRedeemed { .. }));
}
