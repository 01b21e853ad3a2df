//! Period-based cost recognition: store fixed costs, scenario production
//! and prop purchases, and ad-hoc ledger expenses.

use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;
use venue_core::{
    CostFrequency, EffectiveDate, Event, FixedCost, MiscTransaction, ReportPeriod, ScenarioCost,
    ScenarioId, Store, TransactionKind, YearMonth,
};

use crate::report::{FixedCostLine, ScenarioCostLine};

/// Label for ledger expenses with no scenario link.
pub const COMMON_LABEL: &str = "common";

/// Everything recognized per period rather than per event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PeriodicCosts {
    pub fixed: Vec<FixedCostLine>,
    pub production: Vec<ScenarioCostLine>,
    pub props: Vec<ScenarioCostLine>,
}

impl PeriodicCosts {
    /// Sum of the fixed-cost lines.
    pub fn total_fixed(&self) -> Decimal {
        self.fixed.iter().map(|l| l.amount).sum()
    }

    /// Sum of production lines, ledger expenses included.
    pub fn total_production(&self) -> Decimal {
        self.production.iter().map(|l| l.amount).sum()
    }

    /// Sum of the prop lines.
    pub fn total_props(&self) -> Decimal {
        self.props.iter().map(|l| l.amount).sum()
    }
}

/// Amount of one fixed cost recognized in `period`.
///
/// Recurring costs are charged per calendar month shared by the period and
/// the cost's active window; yearly costs at a twelfth per month. One-time
/// costs are charged in full when their month lies in the period.
pub fn fixed_cost_amount(cost: &FixedCost, period: &ReportPeriod) -> Decimal {
    if !cost.status.is_billable() {
        return Decimal::ZERO;
    }
    match cost.frequency {
        CostFrequency::Monthly => {
            let months = period.overlap_months(cost.start_date, cost.end_date);
            cost.amount * Decimal::from(months)
        }
        CostFrequency::Yearly => {
            let months = period.overlap_months(cost.start_date, cost.end_date);
            (cost.amount * Decimal::from(months) / Decimal::from(12u32))
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        }
        CostFrequency::OneTime => match cost.start_date {
            Some(month) if period.contains_month(month) => cost.amount,
            _ => Decimal::ZERO,
        },
    }
}

/// Fixed-cost lines for every store, skipping entries that amount to zero.
pub fn allocate_fixed_costs(stores: &[Store], period: &ReportPeriod) -> Vec<FixedCostLine> {
    let mut lines = Vec::new();
    for store in stores {
        for cost in &store.fixed_costs {
            let amount = fixed_cost_amount(cost, period);
            if amount.is_zero() {
                continue;
            }
            lines.push(FixedCostLine {
                item: cost.item.clone(),
                amount,
                store: store.name.clone(),
            });
        }
    }
    lines
}

type DedupKey = (ScenarioId, String, EffectiveDate);

/// Recognize active scenario costs dated inside the period, once per
/// `(scenario, item, effective date)` however often the scenario was booked.
fn recognize_once(
    scenario_id: &ScenarioId,
    title: &str,
    costs: &[ScenarioCost],
    period: &ReportPeriod,
    seen: &mut BTreeSet<DedupKey>,
    out: &mut Vec<ScenarioCostLine>,
) {
    for cost in costs {
        if cost.status != venue_core::CostStatus::Active {
            continue;
        }
        let Some(effective) = cost.start_date else {
            continue;
        };
        if !period.contains_month(effective.month()) {
            continue;
        }
        if !seen.insert((scenario_id.clone(), cost.item.clone(), effective)) {
            debug!(scenario = %scenario_id.0, item = %cost.item, %effective, "cost already recognized");
            continue;
        }
        out.push(ScenarioCostLine {
            item: cost.item.clone(),
            amount: cost.amount,
            scenario: title.to_string(),
        });
    }
}

/// Production and prop lines for every scenario booked in `events`.
pub fn allocate_scenario_costs(
    events: &[Event],
    period: &ReportPeriod,
) -> (Vec<ScenarioCostLine>, Vec<ScenarioCostLine>) {
    let mut ordered: Vec<&Event> = events.iter().collect();
    ordered.sort_by(|a, b| (a.date, &a.id).cmp(&(b.date, &b.id)));

    let mut seen_production = BTreeSet::new();
    let mut seen_props = BTreeSet::new();
    let mut production = Vec::new();
    let mut props = Vec::new();
    for scenario in ordered.iter().filter_map(|e| e.scenario.as_ref()) {
        recognize_once(
            &scenario.id,
            &scenario.title,
            &scenario.production_costs,
            period,
            &mut seen_production,
            &mut production,
        );
        recognize_once(
            &scenario.id,
            &scenario.title,
            &scenario.required_props,
            period,
            &mut seen_props,
            &mut props,
        );
    }
    (production, props)
}

/// Ledger expenses whose month falls in the period, once per transaction id.
/// Income entries are ignored.
pub fn allocate_misc_expenses(
    transactions: &[MiscTransaction],
    period: &ReportPeriod,
    scenario_titles: &BTreeMap<ScenarioId, String>,
) -> Vec<ScenarioCostLine> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut lines = Vec::new();
    for tx in transactions {
        if tx.kind != TransactionKind::Expense || !period.contains_month(YearMonth::of(tx.date)) {
            continue;
        }
        if !seen.insert(tx.id.as_str()) {
            continue;
        }
        let label = tx
            .scenario_id
            .as_ref()
            .and_then(|id| scenario_titles.get(id))
            .map(String::as_str)
            .unwrap_or(COMMON_LABEL);
        lines.push(ScenarioCostLine {
            item: tx.category.clone(),
            amount: tx.amount,
            scenario: label.to_string(),
        });
    }
    lines
}

/// Run every period-based allocation. Ledger expenses are reported with
/// production costs.
pub fn allocate(
    stores: &[Store],
    events: &[Event],
    transactions: &[MiscTransaction],
    period: &ReportPeriod,
    scenario_titles: &BTreeMap<ScenarioId, String>,
) -> PeriodicCosts {
    let fixed = allocate_fixed_costs(stores, period);
    let (mut production, props) = allocate_scenario_costs(events, period);
    production.extend(allocate_misc_expenses(transactions, period, scenario_titles));
    let costs = PeriodicCosts {
        fixed,
        production,
        props,
    };
    debug!(
        fixed = %costs.total_fixed(),
        production = %costs.total_production(),
        props = %costs.total_props(),
        "allocated periodic costs"
    );
    costs
}
