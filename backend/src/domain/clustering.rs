//! Greedy threshold clustering of reports for map display.

use super::{GeoPoint, Report};

/// Default join distance in raw degrees (roughly 1.3 km of latitude).
pub const DEFAULT_CLUSTER_THRESHOLD: f64 = 0.012;

/// Reports drawn as one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Coordinates of the first member. Not updated as others join.
    pub center: GeoPoint,
    pub reports: Vec<Report>,
}

/// Group reports in one pass over the input.
///
/// Each report joins the first cluster whose center lies strictly closer
/// than `threshold` (planar distance in degrees) or starts a new one. The
/// result depends on input order.
pub fn cluster(reports: &[Report], threshold: f64) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();
    for report in reports {
        let point = report.location().point;
        match clusters
            .iter_mut()
            .find(|cluster| cluster.center.degree_distance(&point) < threshold)
        {
            Some(existing) => existing.reports.push(report.clone()),
            None => clusters.push(Cluster {
                center: point,
                reports: vec![report.clone()],
            }),
        }
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReportId, UserId};
    use crate::test_support::{fixed_now, report_input};
    use rstest::rstest;
    use uuid::Uuid;

    fn at(n: u128, lat: f64, lng: f64) -> Report {
        let fields = report_input("Streetlight", lat, lng)
            .validate()
            .expect("valid input");
        Report::open(
            ReportId::from_uuid(&Uuid::from_u128(n)),
            fields,
            UserId::for_email("map@example.org"),
            fixed_now(),
            "opened",
        )
    }

    #[rstest]
    #[case(0.005, 1)]
    #[case(0.02, 2)]
    fn separation_against_default_threshold(#[case] offset: f64, #[case] expected: usize) {
        let reports = [at(1, 10.0, 20.0), at(2, 10.0 + offset, 20.0)];
        assert_eq!(cluster(&reports, DEFAULT_CLUSTER_THRESHOLD).len(), expected);
    }

    #[rstest]
    fn center_stays_on_first_member() {
        let reports = [at(1, 10.0, 20.0), at(2, 10.008, 20.0), at(3, 10.016, 20.0)];
        let clusters = cluster(&reports, DEFAULT_CLUSTER_THRESHOLD);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].center.lat(), 10.0);
        assert_eq!(clusters[0].reports.len(), 2);
        assert_eq!(clusters[1].reports[0].id().as_str(), "INC-000003");
    }

    #[rstest]
    fn result_depends_on_input_order() {
        let a = at(1, 10.0, 20.0);
        let b = at(2, 10.008, 20.0);
        let c = at(3, 10.016, 20.0);

        let forward = cluster(&[a.clone(), b.clone(), c.clone()], DEFAULT_CLUSTER_THRESHOLD);
        let middle_first = cluster(&[b, a, c], DEFAULT_CLUSTER_THRESHOLD);

        assert_eq!(forward.len(), 2);
        assert_eq!(middle_first.len(), 1);
    }

    #[rstest]
    fn empty_input_yields_no_clusters() {
        assert!(cluster(&[], DEFAULT_CLUSTER_THRESHOLD).is_empty());
    }
}
