//! The assembled sales report and the assembly step.
//!
//! Rankings sort by revenue descending; the chart, monthly series and event
//! list sort ascending by date.

use chrono::{Duration, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use venue_core::{EventCategory, EventId, OwnershipType, ReportPeriod, ScenarioId, Store, StoreId, YearMonth};

use crate::aggregate::{Accumulators, Contribution, Tally};
use crate::allocation::PeriodicCosts;

/// Name shown for events whose store is missing from the store list.
pub const UNKNOWN_STORE: &str = "unknown";
/// Title shown for the row of events booked without a scenario.
pub const UNASSIGNED_SCENARIO: &str = "unassigned";

/// The six components of total variable cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VariableCostCategory {
    License,
    GmWage,
    /// Allowance paid to GMs working away from their home store.
    Transport,
    FranchiseFee,
    /// Production runs plus ledger expenses.
    Production,
    Props,
}

/// One entry of `variableCostBreakdown`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VariableCostLine {
    pub category: VariableCostCategory,
    pub amount: Decimal,
}

/// A store fixed cost recognized in the period.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FixedCostLine {
    pub item: String,
    pub amount: Decimal,
    /// Store name.
    pub store: String,
}

/// Production, prop or ledger expense line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioCostLine {
    pub item: String,
    pub amount: Decimal,
    /// Scenario title, or `common` for unlinked ledger expenses.
    pub scenario: String,
}

/// Per-store totals. Net profit deducts the franchise fee.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRankingRow {
    pub id: StoreId,
    /// `unknown` when the store is missing from the store list.
    pub name: String,
    /// `None` for an unknown store.
    pub ownership_type: Option<OwnershipType>,
    pub revenue: Decimal,
    pub events: u32,
    pub average_revenue: Decimal,
    pub license_cost: Decimal,
    pub gm_cost: Decimal,
    pub transport_cost: Decimal,
    pub franchise_fee: Decimal,
    pub net_profit: Decimal,
}

/// Per-scenario totals. Never carries the franchise fee.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRankingRow {
    /// `None` for the row of events booked without a scenario.
    pub id: Option<ScenarioId>,
    pub title: String,
    pub author: String,
    pub revenue: Decimal,
    pub events: u32,
    pub average_revenue: Decimal,
    pub license_cost: Decimal,
    pub gm_cost: Decimal,
    pub transport_cost: Decimal,
    pub net_profit: Decimal,
}

/// One day of the chart series.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub events: u32,
    /// License, wage and transport costs plus any franchise fee booked that day.
    pub cost: Decimal,
    pub net_profit: Decimal,
}

/// Revenue and event count for one calendar month.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthlyRevenueRow {
    pub month: YearMonth,
    pub revenue: Decimal,
    pub events: u32,
}

/// One itemized event with its recognized costs.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRow {
    pub id: EventId,
    pub date: NaiveDate,
    pub store_id: StoreId,
    pub store_name: String,
    pub scenario_title: Option<String>,
    pub category: EventCategory,
    pub start_time: Option<NaiveTime>,
    /// Explicit, or derived from the start time and scenario run time.
    pub end_time: Option<NaiveTime>,
    pub participant_count: u32,
    pub max_participants: Option<u32>,
    pub gms: Vec<String>,
    pub revenue: Decimal,
    pub license_cost: Decimal,
    pub gm_cost: Decimal,
    pub transport_cost: Decimal,
    pub franchise_fee: Decimal,
    pub net_profit: Decimal,
    /// Costs on this row are recognized only when settled.
    pub settled: bool,
}

/// Financial report for one period and store selection.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub period: ReportPeriod,
    /// Day used for the settlement cut-off.
    pub reference_date: NaiveDate,
    pub total_revenue: Decimal,
    pub total_events: u32,
    pub average_revenue: Decimal,
    pub total_license_cost: Decimal,
    pub total_gm_cost: Decimal,
    pub total_transport_cost: Decimal,
    pub total_franchise_fee: Decimal,
    pub total_production_cost: Decimal,
    pub total_props_cost: Decimal,
    pub total_fixed_cost: Decimal,
    /// License, wage, transport, franchise fee, production and props.
    pub total_variable_cost: Decimal,
    /// Revenue less variable and fixed cost.
    pub net_profit: Decimal,
    pub variable_cost_breakdown: Vec<VariableCostLine>,
    pub fixed_cost_breakdown: Vec<FixedCostLine>,
    pub production_cost_breakdown: Vec<ScenarioCostLine>,
    pub props_cost_breakdown: Vec<ScenarioCostLine>,
    pub store_ranking: Vec<StoreRankingRow>,
    pub scenario_ranking: Vec<ScenarioRankingRow>,
    pub chart: Vec<ChartPoint>,
    pub monthly_revenue: Vec<MonthlyRevenueRow>,
    pub event_list: Vec<EventRow>,
}

/// Explicit end time, or start time plus the scenario run time. Wraps past
/// midnight.
pub fn derive_end_time(c: &Contribution<'_>) -> Option<NaiveTime> {
    if c.event.end_time.is_some() {
        return c.event.end_time;
    }
    let start = c.event.start_time?;
    let minutes = c.event.scenario.as_ref().map(|s| s.duration).filter(|d| *d > 0)?;
    Some(start.overflowing_add_signed(Duration::minutes(i64::from(minutes))).0)
}

fn store_ranking(acc: &Accumulators, stores: &BTreeMap<&StoreId, &Store>) -> Vec<StoreRankingRow> {
    let mut rows: Vec<StoreRankingRow> = acc
        .by_store
        .iter()
        .map(|(id, t)| {
            let store = stores.get(id);
            StoreRankingRow {
                id: id.clone(),
                name: store.map_or_else(|| UNKNOWN_STORE.to_string(), |s| s.name.clone()),
                ownership_type: store.map(|s| s.ownership_type),
                revenue: t.revenue,
                events: t.events,
                average_revenue: t.average_revenue(),
                license_cost: t.license_cost,
                gm_cost: t.gm_cost,
                transport_cost: t.transport_cost,
                franchise_fee: t.franchise_fee,
                net_profit: t.net_profit(),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.id.cmp(&b.id)));
    rows
}

fn scenario_ranking(acc: &Accumulators, contributions: &[Contribution<'_>]) -> Vec<ScenarioRankingRow> {
    let mut labels: BTreeMap<ScenarioId, (&str, &str)> = BTreeMap::new();
    for scenario in contributions.iter().filter_map(|c| c.event.scenario.as_ref()) {
        labels
            .entry(scenario.id.clone())
            .or_insert((scenario.title.as_str(), scenario.author.as_str()));
    }
    let mut rows: Vec<ScenarioRankingRow> = acc
        .by_scenario
        .iter()
        .map(|(id, t)| {
            let (title, author) = id
                .as_ref()
                .and_then(|id| labels.get(id).copied())
                .unwrap_or((UNASSIGNED_SCENARIO, ""));
            ScenarioRankingRow {
                id: id.clone(),
                title: title.to_string(),
                author: author.to_string(),
                revenue: t.revenue,
                events: t.events,
                average_revenue: t.average_revenue(),
                license_cost: t.license_cost,
                gm_cost: t.gm_cost,
                transport_cost: t.transport_cost,
                net_profit: t.net_profit(),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.id.cmp(&b.id)));
    rows
}

fn chart(acc: &Accumulators) -> Vec<ChartPoint> {
    acc.by_day
        .iter()
        .map(|(date, t)| ChartPoint {
            date: *date,
            revenue: t.revenue,
            events: t.events,
            cost: t.cost(),
            net_profit: t.net_profit(),
        })
        .collect()
}

fn monthly_revenue(acc: &Accumulators) -> Vec<MonthlyRevenueRow> {
    acc.by_month
        .iter()
        .map(|(month, t)| MonthlyRevenueRow {
            month: *month,
            revenue: t.revenue,
            events: t.events,
        })
        .collect()
}

fn event_list(contributions: &[Contribution<'_>], stores: &BTreeMap<&StoreId, &Store>) -> Vec<EventRow> {
    let mut rows: Vec<EventRow> = contributions
        .iter()
        .map(|c| {
            let e = c.event;
            EventRow {
                id: e.id.clone(),
                date: e.date,
                store_id: e.store_id.clone(),
                store_name: stores
                    .get(&e.store_id)
                    .map_or_else(|| UNKNOWN_STORE.to_string(), |s| s.name.clone()),
                scenario_title: e.scenario.as_ref().map(|s| s.title.clone()),
                category: e.category,
                start_time: e.start_time,
                end_time: derive_end_time(c),
                participant_count: e.participant_count,
                max_participants: e.max_participants,
                gms: e.gms.clone(),
                revenue: e.revenue,
                license_cost: c.costs.license_cost,
                gm_cost: c.costs.gm_cost,
                transport_cost: c.costs.transport_cost,
                franchise_fee: c.franchise_fee,
                net_profit: c.net_profit(),
                settled: c.settlement.is_settled(),
            }
        })
        .collect();
    rows.sort_by(|a, b| (a.date, a.start_time, &a.id).cmp(&(b.date, b.start_time, &b.id)));
    rows
}

fn variable_breakdown(totals: &Tally, periodic: &PeriodicCosts) -> Vec<VariableCostLine> {
    use VariableCostCategory::*;
    [
        (License, totals.license_cost),
        (GmWage, totals.gm_cost),
        (Transport, totals.transport_cost),
        (FranchiseFee, totals.franchise_fee),
        (Production, periodic.total_production()),
        (Props, periodic.total_props()),
    ]
    .into_iter()
    .map(|(category, amount)| VariableCostLine { category, amount })
    .collect()
}

/// Build the final report from folded accumulators and periodic costs.
pub fn assemble(
    period: ReportPeriod,
    today: NaiveDate,
    stores: &[Store],
    contributions: &[Contribution<'_>],
    acc: &Accumulators,
    periodic: PeriodicCosts,
) -> SalesReport {
    let store_index: BTreeMap<&StoreId, &Store> = stores.iter().map(|s| (&s.id, s)).collect();
    let totals = acc.totals;
    let total_production_cost = periodic.total_production();
    let total_props_cost = periodic.total_props();
    let total_fixed_cost = periodic.total_fixed();
    let total_variable_cost = totals.license_cost
        + totals.gm_cost
        + totals.transport_cost
        + totals.franchise_fee
        + total_production_cost
        + total_props_cost;
    SalesReport {
        period,
        reference_date: today,
        total_revenue: totals.revenue,
        total_events: totals.events,
        average_revenue: totals.average_revenue(),
        total_license_cost: totals.license_cost,
        total_gm_cost: totals.gm_cost,
        total_transport_cost: totals.transport_cost,
        total_franchise_fee: totals.franchise_fee,
        total_production_cost,
        total_props_cost,
        total_fixed_cost,
        total_variable_cost,
        net_profit: totals.revenue - total_variable_cost - total_fixed_cost,
        variable_cost_breakdown: variable_breakdown(&totals, &periodic),
        store_ranking: store_ranking(acc, &store_index),
        scenario_ranking: scenario_ranking(acc, contributions),
        chart: chart(acc),
        monthly_revenue: monthly_revenue(acc),
        event_list: event_list(contributions, &store_index),
        fixed_cost_breakdown: periodic.fixed,
        production_cost_breakdown: periodic.production,
        props_cost_breakdown: periodic.props,
    }
}
