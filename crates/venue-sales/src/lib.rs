#![deny(warnings)]

//! Sales aggregation engine for the venue operations dashboard.
//!
//! Turns booked events, store configuration, scenario pricing and ledger
//! expenses into a [`SalesReport`]:
//! - Per-event license, wage and transport costs, recognized only for
//!   settled events
//! - Period-based fixed, production and prop costs
//! - Store and scenario rankings, a daily chart series and an itemized
//!   event list
//!
//! The computation is pure and deterministic. The reference day for
//! settlement is always passed in explicitly.

pub mod aggregate;
pub mod allocation;
pub mod cost_rules;
pub mod reconcile;
pub mod report;
pub mod settlement;

pub use aggregate::{Accumulators, Contribution, Tally};
pub use cost_rules::{CostRuleResolver, EventCosts};
pub use reconcile::{reconcile, Discrepancy, ReconciliationResult};
pub use report::SalesReport;
pub use settlement::Settlement;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{info, warn};
use venue_core::{
    Event, InputBundle, MiscTransaction, ReportPeriod, SalarySettings, ScenarioId,
    StaffHomeStoreIndex, Store, StoreId,
};

/// Compute the sales report for `period`.
///
/// Every event in `events` is counted; callers select the events for the
/// period. Costs are recognized only for events dated before `today`.
/// Amounts are expected to have passed `venue_core::validate_bundle`, which
/// bounds them so the sums cannot overflow.
pub fn compute_sales_report(
    events: &[Event],
    stores: &[Store],
    period: ReportPeriod,
    misc_transactions: &[MiscTransaction],
    salary_settings: &SalarySettings,
    staff_home_stores: &StaffHomeStoreIndex,
    today: NaiveDate,
) -> SalesReport {
    let store_index: BTreeMap<&StoreId, &Store> = stores.iter().map(|s| (&s.id, s)).collect();
    let resolver = CostRuleResolver::new(salary_settings, staff_home_stores);
    let carriers = aggregate::franchise_fee_carriers(events, stores);

    let contributions: Vec<Contribution<'_>> = events
        .iter()
        .map(|event| {
            let store = store_index.get(&event.store_id).copied();
            if store.is_none() {
                warn!(event = %event.id.0, store = %event.store_id.0, "event references unknown store");
            }
            let settlement = Settlement::classify(event.date, today);
            Contribution {
                event,
                settlement,
                costs: settlement.gate(resolver.resolve(event, store)),
                franchise_fee: carriers.get(&event.id).copied().unwrap_or(Decimal::ZERO),
            }
        })
        .collect();
    let acc = aggregate::fold(&contributions);

    let scenario_titles: BTreeMap<ScenarioId, String> = events
        .iter()
        .filter_map(|e| e.scenario.as_ref())
        .map(|s| (s.id.clone(), s.title.clone()))
        .collect();
    let periodic = allocation::allocate(stores, events, misc_transactions, &period, &scenario_titles);

    let report = report::assemble(period, today, stores, &contributions, &acc, periodic);
    info!(
        start = %period.start,
        end = %period.end,
        events = report.total_events,
        revenue = %report.total_revenue,
        variable_cost = %report.total_variable_cost,
        fixed_cost = %report.total_fixed_cost,
        net_profit = %report.net_profit,
        "computed sales report"
    );
    report
}

/// Compute from a loaded bundle, keeping only events dated inside `period`.
/// A bundle without wage settings falls back to `default_salary`.
pub fn compute_from_bundle(
    bundle: &InputBundle,
    period: ReportPeriod,
    today: NaiveDate,
    default_salary: &SalarySettings,
) -> SalesReport {
    let events: Vec<Event> = bundle
        .events
        .iter()
        .filter(|e| period.contains(e.date))
        .cloned()
        .collect();
    compute_sales_report(
        &events,
        &bundle.stores,
        period,
        &bundle.misc_transactions,
        bundle.salary_settings.as_ref().unwrap_or(default_salary),
        &bundle.staff_home_stores,
        today,
    )
}
