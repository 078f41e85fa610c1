//! Static reward, badge and roster catalogs.

use serde::Serialize;
use utoipa::ToSchema;

use super::{Department, Worker, WorkerId, WorkerStatus};

/// Kind of benefit a reward grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    Coupon,
    Credit,
}

/// Redeemable reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub cost: i64,
    pub icon: &'static str,
    pub kind: RewardKind,
}

/// Condition that unlocks a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum BadgeRule {
    /// At least this many reports filed by the user.
    ReportsFiled(usize),
    /// At least this many of the user's reports verified.
    ReportsVerified(usize),
    /// A point balance of at least this much.
    PointsReached(i64),
}

/// Achievement badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub requirement: &'static str,
    pub icon: &'static str,
    pub rule: BadgeRule,
}

pub const REWARDS: [Reward; 4] = [
    Reward {
        id: "r1",
        title: "50% Off Bus Pass",
        description: "One month of unlimited travel across the city",
        cost: 500,
        icon: "🚌",
        kind: RewardKind::Coupon,
    },
    Reward {
        id: "r2",
        title: "Library Premium",
        description: "Borrow up to 10 books and access the e-archives",
        cost: 200,
        icon: "📚",
        kind: RewardKind::Credit,
    },
    Reward {
        id: "r3",
        title: "Brew & Co. Voucher",
        description: "$10 credit at participating cafes",
        cost: 300,
        icon: "☕",
        kind: RewardKind::Coupon,
    },
    Reward {
        id: "r4",
        title: "Property Tax Rebate",
        description: "5% deduction on the next tax assessment",
        cost: 2_000,
        icon: "🏠",
        kind: RewardKind::Credit,
    },
];

pub const BADGES: [Badge; 4] = [
    Badge {
        id: "b1",
        title: "First Steps",
        description: "Welcome to the force!",
        requirement: "Submit your first report",
        icon: "🌱",
        rule: BadgeRule::ReportsFiled(1),
    },
    Badge {
        id: "b2",
        title: "Eagle Eye",
        description: "Nothing escapes your gaze.",
        requirement: "Submit 5 reports",
        icon: "🦅",
        rule: BadgeRule::ReportsFiled(5),
    },
    Badge {
        id: "b3",
        title: "City Hero",
        description: "A pillar of the community.",
        requirement: "Get 3 reports verified",
        icon: "🦸",
        rule: BadgeRule::ReportsVerified(3),
    },
    Badge {
        id: "b4",
        title: "Centurion",
        description: "Dedicated and consistent.",
        requirement: "Reach 1000 impact points",
        icon: "💯",
        rule: BadgeRule::PointsReached(1_000),
    },
];

/// Catalogue reward with the given id.
pub fn reward(id: &str) -> Option<&'static Reward> {
    REWARDS.iter().find(|reward| reward.id == id)
}

/// Catalogue badge with the given id.
pub fn badge(id: &str) -> Option<&'static Badge> {
    BADGES.iter().find(|badge| badge.id == id)
}

const STANDARD_WORKERS: [(&str, &str, Department); 5] = [
    ("W101", "Officer Arjun", Department::Roads),
    ("W102", "Sanitation Lead Priya", Department::Sanitation),
    ("W103", "Grid Tech Rohan", Department::Electricity),
    ("W104", "Water Marshal Zara", Department::Water),
    ("W105", "Parks Warden Vikram", Department::Parks),
];

pub(crate) fn standard_workers() -> Vec<Worker> {
    STANDARD_WORKERS
        .iter()
        .filter_map(|(id, name, department)| {
            WorkerId::new(*id).ok().map(|id| Worker {
                id,
                name: (*name).to_owned(),
                department: *department,
                status: WorkerStatus::Available,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("r3", Some(300))]
    #[case("r9", None)]
    fn reward_lookup(#[case] id: &str, #[case] cost: Option<i64>) {
        assert_eq!(reward(id).map(|reward| reward.cost), cost);
    }

    #[rstest]
    fn badge_ids_are_unique() {
        let mut ids: Vec<_> = BADGES.iter().map(|badge| badge.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), BADGES.len());
    }

    #[rstest]
    fn standard_roster_covers_every_department() {
        let workers = standard_workers();
        for department in Department::ALL {
            assert!(workers.iter().any(|worker| worker.department == department));
        }
    }
}
