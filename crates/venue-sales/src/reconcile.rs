//! Cross-checks on a finished report: revenue conservation across every
//! breakdown and exact cost additivity.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::report::SalesReport;

/// A failed check with the value it should have had.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Discrepancy {
    /// Name of the failed check.
    pub check: &'static str,
    pub expected: Decimal,
    pub actual: Decimal,
}

/// Outcome of [`reconcile`].
#[derive(Clone, Debug, PartialEq)]
pub enum ReconciliationResult {
    Balanced,
    Discrepancies(Vec<Discrepancy>),
}

impl ReconciliationResult {
    /// `true` when every check passed.
    pub fn is_balanced(&self) -> bool {
        matches!(self, ReconciliationResult::Balanced)
    }
}

/// Re-check a finished report: every revenue breakdown sums to total
/// revenue, the six variable-cost parts sum to total variable cost, each
/// cost breakdown sums to its total and net profit matches.
pub fn reconcile(report: &SalesReport) -> ReconciliationResult {
    let mut found = Vec::new();
    let mut check = |name: &'static str, expected: Decimal, actual: Decimal| {
        if expected != actual {
            found.push(Discrepancy {
                check: name,
                expected,
                actual,
            });
        }
    };

    let revenue = report.total_revenue;
    check(
        "store ranking revenue",
        revenue,
        report.store_ranking.iter().map(|r| r.revenue).sum(),
    );
    check(
        "event list revenue",
        revenue,
        report.event_list.iter().map(|r| r.revenue).sum(),
    );
    check("chart revenue", revenue, report.chart.iter().map(|p| p.revenue).sum());
    check(
        "monthly revenue",
        revenue,
        report.monthly_revenue.iter().map(|m| m.revenue).sum(),
    );
    check(
        "event count",
        Decimal::from(report.total_events),
        Decimal::from(report.event_list.len()),
    );

    let components = report.total_license_cost
        + report.total_gm_cost
        + report.total_transport_cost
        + report.total_franchise_fee
        + report.total_production_cost
        + report.total_props_cost;
    check("variable cost components", components, report.total_variable_cost);
    check(
        "variable cost breakdown",
        report.total_variable_cost,
        report.variable_cost_breakdown.iter().map(|l| l.amount).sum(),
    );
    check(
        "fixed cost breakdown",
        report.total_fixed_cost,
        report.fixed_cost_breakdown.iter().map(|l| l.amount).sum(),
    );
    check(
        "production cost breakdown",
        report.total_production_cost,
        report.production_cost_breakdown.iter().map(|l| l.amount).sum(),
    );
    check(
        "props cost breakdown",
        report.total_props_cost,
        report.props_cost_breakdown.iter().map(|l| l.amount).sum(),
    );
    check(
        "franchise fee",
        report.total_franchise_fee,
        report.store_ranking.iter().map(|r| r.franchise_fee).sum(),
    );
    check(
        "net profit",
        report.total_revenue - report.total_variable_cost - report.total_fixed_cost,
        report.net_profit,
    );

    if found.is_empty() {
        ReconciliationResult::Balanced
    } else {
        ReconciliationResult::Discrepancies(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{fold, Contribution};
    use crate::allocation::PeriodicCosts;
    use crate::cost_rules::EventCosts;
    use crate::report::assemble;
    use crate::settlement::Settlement;
    use chrono::NaiveDate;
    use venue_core::{Event, EventCategory, EventId, ReportPeriod, StoreId};

    fn report() -> SalesReport {
        let event = Event {
            id: EventId("e".into()),
            date: NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
            store_id: StoreId("s".into()),
            scenario: None,
            category: EventCategory::Normal,
            revenue: Decimal::new(8000, 0),
            gms: vec![],
            gm_roles: Default::default(),
            start_time: None,
            end_time: None,
            participant_count: 0,
            max_participants: None,
            venue_rental_fee: None,
        };
        let contributions = vec![Contribution {
            event: &event,
            settlement: Settlement::Settled,
            costs: EventCosts::ZERO,
            franchise_fee: Decimal::ZERO,
        }];
        let acc = fold(&contributions);
        let period = ReportPeriod::new(
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        )
        .unwrap();
        assemble(
            period,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            &[],
            &contributions,
            &acc,
            PeriodicCosts::default(),
        )
    }

    #[test]
    fn assembled_report_balances() {
        assert!(reconcile(&report()).is_balanced());
    }

    #[test]
    fn tampered_totals_reported() {
        let mut r = report();
        r.total_revenue += Decimal::ONE;
        r.total_gm_cost = Decimal::new(10, 0);
        let ReconciliationResult::Discrepancies(found) = reconcile(&r) else {
            panic!("expected discrepancies");
        };
        let checks: Vec<&str> = found.iter().map(|d| d.check).collect();
        assert!(checks.contains(&"store ranking revenue"));
        assert!(checks.contains(&"variable cost components"));
        assert!(checks.contains(&"net profit"));
    }
}
