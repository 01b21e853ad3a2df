use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use venue_core::{validate_bundle, InputBundle, ReportPeriod, SalarySettings, StoreId};
use venue_sales::report::{VariableCostCategory, UNASSIGNED_SCENARIO};
use venue_sales::{compute_from_bundle, reconcile, SalesReport};

const JUNE_BUNDLE: &str = include_str!("fixtures/june_bundle.json");

fn dec(v: i64) -> Decimal {
    Decimal::new(v, 0)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn load() -> InputBundle {
    let bundle: InputBundle = serde_json::from_str(JUNE_BUNDLE).unwrap();
    validate_bundle(&bundle).unwrap();
    bundle
}

fn june_report(bundle: &InputBundle) -> SalesReport {
    let period = ReportPeriod::new(day(1), day(30)).unwrap();
    compute_from_bundle(bundle, period, day(21), &SalarySettings::default())
}

#[test]
fn june_totals() {
    let report = june_report(&load());
    assert_eq!(report.total_revenue, dec(50000));
    assert_eq!(report.total_events, 4);
    assert_eq!(report.average_revenue, dec(12500));
    assert_eq!(report.total_license_cost, dec(5500));
    assert_eq!(report.total_gm_cost, dec(13100));
    assert_eq!(report.total_transport_cost, dec(1000));
    assert_eq!(report.total_franchise_fee, dec(5000));
    assert_eq!(report.total_production_cost, dec(22000));
    assert_eq!(report.total_props_cost, dec(3500));
    assert_eq!(report.total_variable_cost, dec(50100));
    assert_eq!(report.total_fixed_cost, dec(255000));
    assert_eq!(report.net_profit, dec(-255100));
    assert!(reconcile(&report).is_balanced());
}

#[test]
fn june_breakdowns() {
    let report = june_report(&load());
    let production: Vec<(&str, &str)> = report
        .production_cost_breakdown
        .iter()
        .map(|l| (l.item.as_str(), l.scenario.as_str()))
        .collect();
    assert_eq!(
        production,
        vec![
            ("print run", "Tidewater"),
            ("printing", "Tidewater"),
            ("cleaning", "common"),
        ]
    );
    let fixed: Vec<(&str, Decimal)> = report
        .fixed_cost_breakdown
        .iter()
        .map(|l| (l.item.as_str(), l.amount))
        .collect();
    assert_eq!(
        fixed,
        vec![("rent", dec(200000)), ("insurance", dec(10000)), ("signage", dec(45000))]
    );
    let transport = report
        .variable_cost_breakdown
        .iter()
        .find(|l| l.category == VariableCostCategory::Transport)
        .map(|l| l.amount);
    assert_eq!(transport, Some(dec(1000)));
}

#[test]
fn june_rankings() {
    let report = june_report(&load());
    let stores: Vec<&str> = report.store_ranking.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(stores, vec!["Shibuya", "Sendai"]);
    let sendai = &report.store_ranking[1];
    assert_eq!(sendai.franchise_fee, dec(5000));
    assert_eq!(sendai.net_profit, dec(8000));

    let scenarios: Vec<&str> = report.scenario_ranking.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(scenarios, vec!["Tidewater", UNASSIGNED_SCENARIO, "Lantern Street"]);
    let tide = &report.scenario_ranking[0];
    assert_eq!(tide.events, 2);
    assert_eq!(tide.net_profit, dec(25500));
}

#[test]
fn june_event_list() {
    let report = june_report(&load());
    let first = &report.event_list[0];
    assert_eq!(first.id.0, "ev-1");
    assert_eq!(first.end_time, NaiveTime::from_hms_opt(16, 0, 0));
    assert!(first.settled);
    let rental = &report.event_list[3];
    assert_eq!(rental.id.0, "ev-4");
    assert!(!rental.settled);
    assert_eq!(rental.net_profit, dec(8000));
    let franchise_row = &report.event_list[1];
    assert_eq!(franchise_row.franchise_fee, dec(5000));
    assert_eq!(franchise_row.net_profit, dec(12000 - 2000 - 4000 - 1000 - 5000));
    assert_eq!(report.chart.len(), 4);
    assert_eq!(report.monthly_revenue.len(), 1);
}

#[test]
fn store_filter_narrows_report() {
    let only_sendai: BTreeSet<StoreId> = [StoreId("sendai".into())].into_iter().collect();
    let report = june_report(&load().restrict_to_stores(&only_sendai));
    assert_eq!(report.total_revenue, dec(20000));
    assert_eq!(report.total_fixed_cost, Decimal::ZERO);
    // Shared ledger expenses stay with every selection.
    assert_eq!(report.total_production_cost, dec(20000 + 1200 + 800));
    assert!(reconcile(&report).is_balanced());
}

#[test]
fn report_is_deterministic() {
    let bundle = load();
    let a = serde_json::to_string(&june_report(&bundle)).unwrap();
    let b = serde_json::to_string(&june_report(&bundle)).unwrap();
    assert_eq!(a, b);
}
