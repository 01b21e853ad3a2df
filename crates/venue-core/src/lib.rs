#![deny(warnings)]

//! Core domain models and input-boundary checks for the venue operations
//! dashboard.
//!
//! This crate defines the serializable records the data-access layer hands
//! to the sales engine, the calendar types every date is parsed into, and
//! validation helpers that reject malformed input before any computation
//! runs.

pub mod bundle;
pub mod calendar;
pub mod model;

pub use bundle::InputBundle;
pub use calendar::{EffectiveDate, PeriodPreset, ReportPeriod, YearMonth};
pub use model::*;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use thiserror::Error;

/// Validation errors raised at the input boundary.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Period end precedes its start.
    #[error("period end {end} precedes start {start}")]
    PeriodOrder { start: NaiveDate, end: NaiveDate },
    /// A year/month string could not be parsed.
    #[error("malformed year/month: {0}")]
    MalformedYearMonth(String),
    /// Unrecognized period preset name.
    #[error("unknown period preset: {0}")]
    UnknownPreset(String),
    /// A preset could not be resolved around the reference date.
    #[error("period preset out of range around {0}")]
    PresetOutOfRange(NaiveDate),
    /// Monetary amounts on configured costs and wages must be non-negative.
    #[error("negative amount on {0}")]
    NegativeMoney(String),
    /// A cost window ends before it starts.
    #[error("cost window for {item} ends ({end}) before it starts ({start})")]
    CostWindow {
        item: String,
        start: YearMonth,
        end: YearMonth,
    },
    /// An amount is too large for the engine's sums to stay exact.
    #[error("amount out of range on {0}")]
    MoneyOutOfRange(String),
    /// Two records share an id.
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
}

/// Largest magnitude accepted for any single amount. Sums and products over
/// any realistic number of events stay far below `Decimal::MAX`.
pub const MAX_MONEY: Decimal = Decimal::from_parts(0xA4C6_8000, 0x38D7E, 0, false, 0);

fn bounded(amount: Decimal, what: impl FnOnce() -> String) -> Result<(), ValidationError> {
    if amount.abs() > MAX_MONEY {
        return Err(ValidationError::MoneyOutOfRange(what()));
    }
    Ok(())
}

fn non_negative(amount: Decimal, what: impl FnOnce() -> String) -> Result<(), ValidationError> {
    if amount < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney(what()));
    }
    bounded(amount, what)
}

/// Validate a store and its fixed-cost table.
pub fn validate_store(store: &Store) -> Result<(), ValidationError> {
    non_negative(store.franchise_fee.unwrap_or_default(), || {
        format!("franchise fee of store {}", store.id.0)
    })?;
    non_negative(store.transport_allowance.unwrap_or_default(), || {
        format!("transport allowance of store {}", store.id.0)
    })?;
    for cost in &store.fixed_costs {
        non_negative(cost.amount, || format!("fixed cost {}", cost.item))?;
        if let (Some(start), Some(end)) = (cost.start_date, cost.end_date) {
            if end < start {
                return Err(ValidationError::CostWindow {
                    item: cost.item.clone(),
                    start,
                    end,
                });
            }
        }
    }
    Ok(())
}

/// Validate a scenario's pricing configuration.
pub fn validate_scenario(scenario: &Scenario) -> Result<(), ValidationError> {
    let fees = [
        scenario.license_amount,
        scenario.gm_test_license_amount,
        scenario.fc_receive_license_amount,
        scenario.fc_receive_gm_test_license_amount,
        scenario.external_license_amount,
        scenario.external_gm_test_license_amount,
    ];
    for fee in fees.into_iter().flatten() {
        non_negative(fee, || format!("license fee of scenario {}", scenario.id.0))?;
    }
    for gm in &scenario.gm_costs {
        non_negative(gm.reward, || format!("{} reward of scenario {}", gm.role, scenario.id.0))?;
    }
    for cost in scenario.production_costs.iter().chain(&scenario.required_props) {
        non_negative(cost.amount, || format!("scenario cost {}", cost.item))?;
    }
    Ok(())
}

/// Validate wage settings.
pub fn validate_salary_settings(s: &SalarySettings) -> Result<(), ValidationError> {
    let flat = [
        ("gm_base_pay", s.gm_base_pay),
        ("gm_hourly_rate", s.gm_hourly_rate),
        ("gm_test_base_pay", s.gm_test_base_pay),
        ("gm_test_hourly_rate", s.gm_test_hourly_rate),
        ("reception_fixed_pay", s.reception_fixed_pay),
    ];
    for (name, value) in flat {
        non_negative(value, || name.to_string())?;
    }
    for rate in s.hourly_rates.iter().chain(&s.gm_test_hourly_rates) {
        non_negative(rate.amount, || format!("hourly table row {}h", rate.hours))?;
    }
    Ok(())
}

/// Validate the whole bundle, including id uniqueness across events and
/// stores.
pub fn validate_bundle(bundle: &InputBundle) -> Result<(), ValidationError> {
    let mut store_ids: BTreeSet<&StoreId> = BTreeSet::new();
    for store in &bundle.stores {
        validate_store(store)?;
        if !store_ids.insert(&store.id) {
            return Err(ValidationError::DuplicateId {
                kind: "store",
                id: store.id.0.clone(),
            });
        }
    }
    let mut event_ids: BTreeSet<&EventId> = BTreeSet::new();
    for event in &bundle.events {
        if !event_ids.insert(&event.id) {
            return Err(ValidationError::DuplicateId {
                kind: "event",
                id: event.id.0.clone(),
            });
        }
        bounded(event.revenue, || format!("revenue of event {}", event.id.0))?;
        bounded(event.venue_rental_fee.unwrap_or_default(), || {
            format!("venue rental fee of event {}", event.id.0)
        })?;
        if let Some(scenario) = &event.scenario {
            validate_scenario(scenario)?;
        }
    }
    let mut tx_ids: BTreeSet<&str> = BTreeSet::new();
    for tx in &bundle.misc_transactions {
        bounded(tx.amount, || format!("transaction {}", tx.id))?;
        if !tx_ids.insert(tx.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                kind: "transaction",
                id: tx.id.clone(),
            });
        }
    }
    if let Some(settings) = &bundle.salary_settings {
        validate_salary_settings(settings)?;
    }
    Ok(())
}
