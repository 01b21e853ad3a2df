//! Input records as delivered by the data-access layer.
//!
//! Events arrive already joined with their scenario. Every optional numeric
//! field defaults to zero so the engine never has to distinguish "missing"
//! from "free".

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::calendar::{EffectiveDate, YearMonth};

/// Identifier of a store (venue).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(pub String);

/// Identifier of a scenario (licensed script).
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(pub String);

/// Identifier of a scheduled event.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

/// Event category; test runs are priced and paid differently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    #[default]
    Normal,
    #[serde(rename = "gmtest")]
    GmTest,
}

impl EventCategory {
    pub fn is_test(self) -> bool {
        matches!(self, EventCategory::GmTest)
    }
}

/// Role a staff member plays at an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GmRole {
    Main,
    Sub,
    Reception,
    /// Staff joining as a player.
    Staff,
    Observer,
}

/// A booked event joined with its scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub date: NaiveDate,
    pub store_id: StoreId,
    /// Joined scenario; `None` for bookings such as plain venue rental.
    #[serde(default)]
    pub scenario: Option<Scenario>,
    #[serde(default)]
    pub category: EventCategory,
    /// Revenue computed upstream from reservations.
    #[serde(default)]
    pub revenue: Decimal,
    /// Assigned GM names in assignment order.
    #[serde(default)]
    pub gms: Vec<String>,
    /// Explicit roles keyed by GM name.
    #[serde(default)]
    pub gm_roles: BTreeMap<String, GmRole>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub participant_count: u32,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub venue_rental_fee: Option<Decimal>,
}

impl Event {
    /// Role of the GM at `index`: explicit if recorded, otherwise `main` for
    /// the first assignee and `sub` for the rest.
    pub fn role_of(&self, index: usize, name: &str) -> GmRole {
        match self.gm_roles.get(name) {
            Some(role) => *role,
            None if index == 0 => GmRole::Main,
            None => GmRole::Sub,
        }
    }
}

/// How a store is owned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnershipType {
    #[default]
    Corporate,
    Franchise,
    Office,
}

/// Billing frequency of a store fixed cost.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CostFrequency {
    #[default]
    Monthly,
    Yearly,
    OneTime,
}

/// Lifecycle status shared by configured cost entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostStatus {
    #[default]
    Active,
    Legacy,
    Unused,
    Ready,
}

impl CostStatus {
    /// Legacy and unused entries are kept for history only.
    pub fn is_billable(self) -> bool {
        matches!(self, CostStatus::Active | CostStatus::Ready)
    }
}

/// A recurring or one-off store expense.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixedCost {
    pub item: String,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub frequency: CostFrequency,
    /// First billed month; the billing month for one-time costs.
    #[serde(default, rename = "startDate")]
    pub start_date: Option<YearMonth>,
    /// Last billed month, inclusive.
    #[serde(default, rename = "endDate")]
    pub end_date: Option<YearMonth>,
    #[serde(default)]
    pub status: CostStatus,
}

/// A venue.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    #[serde(default)]
    pub ownership_type: OwnershipType,
    /// Per-period administrative fee owed by a franchise store.
    #[serde(default)]
    pub franchise_fee: Option<Decimal>,
    /// Allowance paid to each visiting GM per event.
    #[serde(default)]
    pub transport_allowance: Option<Decimal>,
    #[serde(default)]
    pub fixed_costs: Vec<FixedCost>,
}

impl Store {
    pub fn is_franchise(&self) -> bool {
        self.ownership_type == OwnershipType::Franchise
    }
}

/// Configured reward for one GM slot of a scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GmCost {
    /// Slot name: `main`, `sub`, `gm3`, `gm4`.
    pub role: String,
    #[serde(default)]
    pub reward: Decimal,
    #[serde(default)]
    pub category: EventCategory,
    #[serde(default)]
    pub status: CostStatus,
}

impl GmCost {
    /// Sort key for slot order; unknown slots sort last.
    pub fn slot_priority(&self) -> u8 {
        match self.role.as_str() {
            "main" => 0,
            "sub" => 1,
            "gm3" => 2,
            "gm4" => 3,
            _ => 4,
        }
    }
}

/// A dated one-off scenario expense (production run or prop purchase).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioCost {
    pub item: String,
    #[serde(default)]
    pub amount: Decimal,
    /// Kept at the recorded precision; two entries for the same item are
    /// distinct when their dates differ.
    #[serde(default, rename = "startDate")]
    pub start_date: Option<EffectiveDate>,
    #[serde(default)]
    pub status: CostStatus,
}

/// A licensed script with its pricing configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    /// Run time in minutes.
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub license_amount: Option<Decimal>,
    #[serde(default)]
    pub gm_test_license_amount: Option<Decimal>,
    /// Fee when a franchise store runs a script it receives from the parent.
    #[serde(default)]
    pub fc_receive_license_amount: Option<Decimal>,
    #[serde(default)]
    pub fc_receive_gm_test_license_amount: Option<Decimal>,
    /// Fee when the script is licensed from an outside rights holder.
    #[serde(default)]
    pub external_license_amount: Option<Decimal>,
    #[serde(default)]
    pub external_gm_test_license_amount: Option<Decimal>,
    #[serde(default)]
    pub gm_costs: Vec<GmCost>,
    #[serde(default)]
    pub production_costs: Vec<ScenarioCost>,
    #[serde(default)]
    pub required_props: Vec<ScenarioCost>,
}

/// One row of the hourly wage table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HourlyRate {
    /// Duration in hours, in half-hour steps.
    pub hours: Decimal,
    pub amount: Decimal,
}

impl HourlyRate {
    fn new(half_hours: i64, amount: i64) -> Self {
        Self {
            hours: Decimal::new(half_hours * 5, 1),
            amount: Decimal::new(amount, 0),
        }
    }
}

/// Organisation-wide wage settings for GMs and reception staff.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalarySettings {
    pub gm_base_pay: Decimal,
    pub gm_hourly_rate: Decimal,
    pub gm_test_base_pay: Decimal,
    pub gm_test_hourly_rate: Decimal,
    pub reception_fixed_pay: Decimal,
    /// Use the lookup tables instead of `base + rate * hours`.
    pub use_hourly_table: bool,
    pub hourly_rates: Vec<HourlyRate>,
    pub gm_test_hourly_rates: Vec<HourlyRate>,
}

impl Default for SalarySettings {
    fn default() -> Self {
        Self {
            gm_base_pay: Decimal::new(2000, 0),
            gm_hourly_rate: Decimal::new(1300, 0),
            gm_test_base_pay: Decimal::ZERO,
            gm_test_hourly_rate: Decimal::new(1300, 0),
            reception_fixed_pay: Decimal::new(2000, 0),
            use_hourly_table: false,
            hourly_rates: vec![
                HourlyRate::new(2, 3300),
                HourlyRate::new(3, 3950),
                HourlyRate::new(4, 4600),
                HourlyRate::new(5, 5250),
                HourlyRate::new(6, 5900),
                HourlyRate::new(7, 6550),
                HourlyRate::new(8, 7200),
            ],
            gm_test_hourly_rates: vec![
                HourlyRate::new(2, 1300),
                HourlyRate::new(3, 1950),
                HourlyRate::new(4, 2600),
                HourlyRate::new(5, 3250),
                HourlyRate::new(6, 3900),
                HourlyRate::new(7, 4550),
                HourlyRate::new(8, 5200),
            ],
        }
    }
}

/// Direction of a ledger entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// Ad-hoc ledger entry recorded outside event bookings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MiscTransaction {
    pub id: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub store_id: Option<StoreId>,
    #[serde(default)]
    pub scenario_id: Option<ScenarioId>,
}

/// Staff name to the stores they are based at.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffHomeStoreIndex(pub BTreeMap<String, BTreeSet<StoreId>>);

impl StaffHomeStoreIndex {
    /// `Some(true)` when `store` is one of the staff member's home stores,
    /// `None` when the name has no staff record.
    pub fn is_home(&self, name: &str, store: &StoreId) -> Option<bool> {
        self.0.get(name).map(|stores| stores.contains(store))
    }

    pub fn insert(&mut self, name: impl Into<String>, store: StoreId) {
        self.0.entry(name.into()).or_default().insert(store);
    }
}
