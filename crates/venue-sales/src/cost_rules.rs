//! Per-occurrence cost rules: license fee, GM wages and transport allowance.
//!
//! Everything here is a pure function of one event and its joined store,
//! scenario and settings.

use rust_decimal::{Decimal, RoundingStrategy};
use venue_core::{
    Event, EventCategory, GmCost, GmRole, HourlyRate, OwnershipType, SalarySettings, Scenario,
    StaffHomeStoreIndex, Store,
};

/// Wage duration used when a scenario has no run time recorded.
pub const DEFAULT_DURATION_MINUTES: u32 = 180;

/// Costs owed for a single event occurrence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventCosts {
    pub license_cost: Decimal,
    pub gm_cost: Decimal,
    pub transport_cost: Decimal,
}

impl EventCosts {
    pub const ZERO: EventCosts = EventCosts {
        license_cost: Decimal::ZERO,
        gm_cost: Decimal::ZERO,
        transport_cost: Decimal::ZERO,
    };

    /// Sum of the three components.
    pub fn total(&self) -> Decimal {
        self.license_cost + self.gm_cost + self.transport_cost
    }
}

#[derive(Clone, Copy, Debug)]
struct LicenseContext {
    franchise: bool,
    test: bool,
}

/// One link of the license fee chain.
struct LicenseRule {
    source: &'static str,
    applies: fn(LicenseContext) -> bool,
    amount: fn(&Scenario) -> Option<Decimal>,
}

fn franchise_normal(c: LicenseContext) -> bool {
    c.franchise && !c.test
}

fn franchise_test(c: LicenseContext) -> bool {
    c.franchise && c.test
}

fn corporate_normal(c: LicenseContext) -> bool {
    !c.franchise && !c.test
}

fn corporate_test(c: LicenseContext) -> bool {
    !c.franchise && c.test
}

/// Evaluated top to bottom; the first applicable rule with a non-zero amount
/// wins. Corporate and office stores never see the franchise variants.
const LICENSE_CHAIN: &[LicenseRule] = &[
    LicenseRule {
        source: "fc_receive_license_amount",
        applies: franchise_normal,
        amount: |s| s.fc_receive_license_amount,
    },
    LicenseRule {
        source: "external_license_amount",
        applies: franchise_normal,
        amount: |s| s.external_license_amount,
    },
    LicenseRule {
        source: "license_amount",
        applies: franchise_normal,
        amount: |s| s.license_amount,
    },
    LicenseRule {
        source: "fc_receive_gm_test_license_amount",
        applies: franchise_test,
        amount: |s| s.fc_receive_gm_test_license_amount,
    },
    LicenseRule {
        source: "external_gm_test_license_amount",
        applies: franchise_test,
        amount: |s| s.external_gm_test_license_amount,
    },
    LicenseRule {
        source: "gm_test_license_amount",
        applies: franchise_test,
        amount: |s| s.gm_test_license_amount,
    },
    LicenseRule {
        source: "license_amount",
        applies: franchise_test,
        amount: |s| s.license_amount,
    },
    LicenseRule {
        source: "license_amount",
        applies: corporate_normal,
        amount: |s| s.license_amount,
    },
    LicenseRule {
        source: "gm_test_license_amount",
        applies: corporate_test,
        amount: |s| s.gm_test_license_amount,
    },
];

/// License fee owed for running `scenario` once, with the field it came from.
pub fn resolve_license(
    scenario: &Scenario,
    ownership: OwnershipType,
    category: EventCategory,
) -> Option<(&'static str, Decimal)> {
    let ctx = LicenseContext {
        franchise: ownership == OwnershipType::Franchise,
        test: category.is_test(),
    };
    LICENSE_CHAIN
        .iter()
        .filter(|rule| (rule.applies)(ctx))
        .find_map(|rule| {
            (rule.amount)(scenario)
                .filter(|amount| !amount.is_zero())
                .map(|amount| (rule.source, amount))
        })
}

/// License fee amount only; zero when no rule applies.
pub fn license_fee(scenario: &Scenario, ownership: OwnershipType, category: EventCategory) -> Decimal {
    resolve_license(scenario, ownership, category)
        .map(|(_, amount)| amount)
        .unwrap_or(Decimal::ZERO)
}

fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Lookup in an hourly table. The duration is rounded up to the next half
/// hour; without an exact row the next longer row applies, and beyond the
/// longest row the excess is paid at `fallback_rate`.
fn table_wage(
    hours: Decimal,
    rates: &[HourlyRate],
    fallback_rate: Decimal,
    fallback_base: Decimal,
) -> Decimal {
    let two = Decimal::from(2u32);
    let rounded = (hours * two).ceil() / two;
    if let Some(exact) = rates.iter().find(|r| r.hours == rounded) {
        return exact.amount;
    }
    let mut sorted: Vec<&HourlyRate> = rates.iter().collect();
    sorted.sort_by(|a, b| a.hours.cmp(&b.hours));
    if let Some(longer) = sorted.iter().find(|r| r.hours >= rounded) {
        return longer.amount;
    }
    match sorted.last() {
        Some(max) => max.amount + round_whole(fallback_rate * (rounded - max.hours)),
        None => fallback_base + round_whole(fallback_rate * hours),
    }
}

/// Duration-based GM wage from the organisation's settings.
pub fn hourly_wage(duration_minutes: u32, is_test: bool, settings: &SalarySettings) -> Decimal {
    let hours = Decimal::from(duration_minutes) / Decimal::from(60u32);
    let (base, rate, table) = if is_test {
        (
            settings.gm_test_base_pay,
            settings.gm_test_hourly_rate,
            &settings.gm_test_hourly_rates,
        )
    } else {
        (settings.gm_base_pay, settings.gm_hourly_rate, &settings.hourly_rates)
    };
    if settings.use_hourly_table {
        return table_wage(hours, table, rate, base);
    }
    base + round_whole(rate * hours)
}

/// Billable `gm_costs` slots for a category, in slot order.
pub fn applicable_slots(scenario: &Scenario, category: EventCategory) -> Vec<&GmCost> {
    let mut slots: Vec<&GmCost> = scenario
        .gm_costs
        .iter()
        .filter(|c| c.category == category && c.status.is_billable())
        .collect();
    slots.sort_by_key(|c| c.slot_priority());
    slots
}

/// Total GM wages for one event.
///
/// Paid GMs (main/sub) consume configured slots in assignment order; a
/// `sub` takes the explicit `sub` slot when one exists. A paid GM with no
/// slot left, or a scenario with no slots, is paid by the hourly settings.
/// With slots configured but nobody assigned, the full staffing cost is
/// still owed.
pub fn gm_cost(event: &Event, scenario: &Scenario, settings: &SalarySettings) -> Decimal {
    let slots = applicable_slots(scenario, event.category);
    if event.gms.is_empty() {
        return slots.iter().map(|c| c.reward).sum();
    }
    let duration = match scenario.duration {
        0 => DEFAULT_DURATION_MINUTES,
        d => d,
    };
    let mut next_slot = 0usize;
    let mut total = Decimal::ZERO;
    for (index, name) in event.gms.iter().enumerate() {
        let pay = match event.role_of(index, name) {
            GmRole::Reception => settings.reception_fixed_pay,
            GmRole::Staff | GmRole::Observer => Decimal::ZERO,
            role @ (GmRole::Main | GmRole::Sub) => {
                let slot = if role == GmRole::Sub {
                    slots
                        .iter()
                        .find(|c| c.role == "sub")
                        .or_else(|| slots.get(next_slot))
                } else {
                    slots.get(next_slot)
                };
                next_slot += 1;
                match slot {
                    Some(c) => c.reward,
                    None => hourly_wage(duration, event.category.is_test(), settings),
                }
            }
        };
        total += pay;
    }
    total
}

/// Transport allowance: once per assigned GM who is not based at the
/// event's store. Staff with no home-store record count as based there.
pub fn transport_cost(event: &Event, store: &Store, staff: &StaffHomeStoreIndex) -> Decimal {
    let allowance = store.transport_allowance.unwrap_or_default();
    if allowance <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let visiting = event
        .gms
        .iter()
        .filter(|name| staff.is_home(name, &store.id) == Some(false))
        .count();
    allowance * Decimal::from(visiting)
}

/// Resolves the per-occurrence cost triple for events.
#[derive(Clone, Copy, Debug)]
pub struct CostRuleResolver<'a> {
    settings: &'a SalarySettings,
    staff: &'a StaffHomeStoreIndex,
}

impl<'a> CostRuleResolver<'a> {
    /// Resolver over the organisation's wage settings and staff index.
    pub fn new(settings: &'a SalarySettings, staff: &'a StaffHomeStoreIndex) -> Self {
        Self { settings, staff }
    }

    /// Costs for one occurrence. Events without a scenario cost nothing; an
    /// unknown store is priced as corporate with no allowance.
    pub fn resolve(&self, event: &Event, store: Option<&Store>) -> EventCosts {
        let Some(scenario) = event.scenario.as_ref() else {
            return EventCosts::ZERO;
        };
        let ownership = store.map(|s| s.ownership_type).unwrap_or_default();
        let license = resolve_license(scenario, ownership, event.category);
        let costs = EventCosts {
            license_cost: license.map(|(_, a)| a).unwrap_or(Decimal::ZERO),
            gm_cost: gm_cost(event, scenario, self.settings),
            transport_cost: store
                .map(|s| transport_cost(event, s, self.staff))
                .unwrap_or(Decimal::ZERO),
        };
        tracing::debug!(
            event = %event.id.0,
            license_source = license.map(|(src, _)| src).unwrap_or("none"),
            license = %costs.license_cost,
            gm = %costs.gm_cost,
            transport = %costs.transport_cost,
            "resolved event costs"
        );
        costs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use venue_core::{CostStatus, EventId, ScenarioId, StoreId};

    fn dec(v: i64) -> Decimal {
        Decimal::new(v, 0)
    }

    fn scenario() -> Scenario {
        Scenario {
            id: ScenarioId("sc".into()),
            title: "Clockwork Manor".into(),
            duration: 180,
            license_amount: Some(dec(3000)),
            ..Default::default()
        }
    }

    fn slot(role: &str, reward: i64, category: EventCategory) -> GmCost {
        GmCost {
            role: role.into(),
            reward: dec(reward),
            category,
            status: CostStatus::Active,
        }
    }

    fn event(gms: &[&str]) -> Event {
        Event {
            id: EventId("e".into()),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            store_id: StoreId("s".into()),
            scenario: Some(scenario()),
            category: EventCategory::Normal,
            revenue: dec(12000),
            gms: gms.iter().map(|g| g.to_string()).collect(),
            gm_roles: Default::default(),
            start_time: None,
            end_time: None,
            participant_count: 6,
            max_participants: Some(6),
            venue_rental_fee: None,
        }
    }

    fn store(ownership: OwnershipType, allowance: Option<i64>) -> Store {
        Store {
            id: StoreId("s".into()),
            name: "Ikebukuro".into(),
            ownership_type: ownership,
            franchise_fee: None,
            transport_allowance: allowance.map(dec),
            fixed_costs: vec![],
        }
    }

    #[test]
    fn franchise_normal_chain_prefers_fc_receive() {
        let mut s = scenario();
        s.fc_receive_license_amount = Some(dec(2000));
        s.external_license_amount = Some(dec(2500));
        assert_eq!(
            resolve_license(&s, OwnershipType::Franchise, EventCategory::Normal),
            Some(("fc_receive_license_amount", dec(2000)))
        );
        s.fc_receive_license_amount = Some(Decimal::ZERO);
        assert_eq!(
            license_fee(&s, OwnershipType::Franchise, EventCategory::Normal),
            dec(2500)
        );
        s.external_license_amount = None;
        assert_eq!(
            license_fee(&s, OwnershipType::Franchise, EventCategory::Normal),
            dec(3000)
        );
    }

    #[test]
    fn franchise_test_chain_falls_back_to_normal_fee() {
        let mut s = scenario();
        assert_eq!(
            resolve_license(&s, OwnershipType::Franchise, EventCategory::GmTest),
            Some(("license_amount", dec(3000)))
        );
        s.gm_test_license_amount = Some(dec(1000));
        assert_eq!(
            license_fee(&s, OwnershipType::Franchise, EventCategory::GmTest),
            dec(1000)
        );
        s.external_gm_test_license_amount = Some(dec(1200));
        s.fc_receive_gm_test_license_amount = Some(dec(800));
        assert_eq!(
            license_fee(&s, OwnershipType::Franchise, EventCategory::GmTest),
            dec(800)
        );
    }

    #[test]
    fn corporate_ignores_franchise_variants() {
        let mut s = scenario();
        s.fc_receive_license_amount = Some(dec(100));
        s.external_license_amount = Some(dec(200));
        assert_eq!(
            license_fee(&s, OwnershipType::Corporate, EventCategory::Normal),
            dec(3000)
        );
        assert_eq!(
            license_fee(&s, OwnershipType::Office, EventCategory::GmTest),
            Decimal::ZERO
        );
        s.gm_test_license_amount = Some(dec(500));
        assert_eq!(
            license_fee(&s, OwnershipType::Corporate, EventCategory::GmTest),
            dec(500)
        );
    }

    #[test]
    fn hourly_formula_rounds_rate_times_hours() {
        let settings = SalarySettings::default();
        // 2000 + 1300 * 3
        assert_eq!(hourly_wage(180, false, &settings), dec(5900));
        // 0 + 1300 * 1.5
        assert_eq!(hourly_wage(90, true, &settings), dec(1950));
        // 2000 + round(1300 * 2.1666..) = 2000 + 2817
        assert_eq!(hourly_wage(130, false, &settings), dec(4817));
    }

    #[test]
    fn hourly_table_rounds_up_to_half_hours() {
        let settings = SalarySettings {
            use_hourly_table: true,
            ..Default::default()
        };
        assert_eq!(hourly_wage(120, false, &settings), dec(4600));
        // 2h10m rounds to 2.5h.
        assert_eq!(hourly_wage(130, false, &settings), dec(5250));
        // 5h exceeds the 4h row: 7200 + 1300 * 1
        assert_eq!(hourly_wage(300, false, &settings), dec(8500));
        assert_eq!(hourly_wage(60, true, &settings), dec(1300));
    }

    #[test]
    fn hourly_table_picks_next_longer_row_and_handles_empty_table() {
        let mut settings = SalarySettings {
            use_hourly_table: true,
            ..Default::default()
        };
        settings.hourly_rates = vec![
            HourlyRate { hours: dec(3), amount: dec(6000) },
            HourlyRate { hours: dec(1), amount: dec(3000) },
        ];
        assert_eq!(hourly_wage(120, false, &settings), dec(6000));
        settings.hourly_rates.clear();
        assert_eq!(hourly_wage(120, false, &settings), dec(2000 + 2600));
    }

    #[test]
    fn configured_slots_pay_in_assignment_order() {
        let mut s = scenario();
        s.gm_costs = vec![
            slot("sub", 3000, EventCategory::Normal),
            slot("main", 4000, EventCategory::Normal),
            slot("main", 1500, EventCategory::GmTest),
        ];
        let settings = SalarySettings::default();
        let ev = event(&["Aki"]);
        assert_eq!(gm_cost(&ev, &s, &settings), dec(4000));
        let ev = event(&["Aki", "Ren"]);
        assert_eq!(gm_cost(&ev, &s, &settings), dec(7000));
        let mut ev = event(&["Aki"]);
        ev.category = EventCategory::GmTest;
        assert_eq!(gm_cost(&ev, &s, &settings), dec(1500));
    }

    #[test]
    fn sub_role_takes_sub_slot() {
        let mut s = scenario();
        s.gm_costs = vec![
            slot("main", 4000, EventCategory::Normal),
            slot("gm3", 1000, EventCategory::Normal),
            slot("sub", 3000, EventCategory::Normal),
        ];
        let mut ev = event(&["Aki", "Ren", "Mio"]);
        ev.gm_roles.insert("Aki".into(), GmRole::Sub);
        ev.gm_roles.insert("Ren".into(), GmRole::Main);
        ev.gm_roles.insert("Mio".into(), GmRole::Main);
        // Aki: sub slot 3000; Ren: position 1 (sub) 3000; Mio: position 2 (gm3) 1000.
        assert_eq!(gm_cost(&ev, &s, &SalarySettings::default()), dec(7000));
    }

    #[test]
    fn reception_staff_and_observer_roles() {
        let mut s = scenario();
        s.gm_costs = vec![slot("main", 4000, EventCategory::Normal)];
        let mut ev = event(&["Aki", "Ren", "Mio", "Sora"]);
        ev.gm_roles.insert("Ren".into(), GmRole::Reception);
        ev.gm_roles.insert("Mio".into(), GmRole::Staff);
        ev.gm_roles.insert("Sora".into(), GmRole::Observer);
        assert_eq!(gm_cost(&ev, &s, &SalarySettings::default()), dec(6000));
    }

    #[test]
    fn overflow_gm_is_paid_hourly() {
        let mut s = scenario();
        s.gm_costs = vec![slot("main", 4000, EventCategory::Normal)];
        let ev = event(&["Aki", "Ren"]);
        assert_eq!(gm_cost(&ev, &s, &SalarySettings::default()), dec(4000 + 5900));
    }

    #[test]
    fn no_slots_means_hourly_wage_with_default_duration() {
        let mut s = scenario();
        s.duration = 0;
        let ev = event(&["Aki"]);
        assert_eq!(gm_cost(&ev, &s, &SalarySettings::default()), dec(5900));
    }

    #[test]
    fn unstaffed_event_still_owes_configured_slots() {
        let mut s = scenario();
        s.gm_costs = vec![
            slot("main", 4000, EventCategory::Normal),
            slot("sub", 2500, EventCategory::Normal),
            slot("main", 900, EventCategory::GmTest),
            GmCost {
                status: CostStatus::Legacy,
                ..slot("gm3", 700, EventCategory::Normal)
            },
        ];
        let ev = event(&[]);
        assert_eq!(gm_cost(&ev, &s, &SalarySettings::default()), dec(6500));
        let bare = scenario();
        assert_eq!(gm_cost(&ev, &bare, &SalarySettings::default()), Decimal::ZERO);
    }

    #[test]
    fn transport_charged_per_visiting_gm() {
        let st = store(OwnershipType::Corporate, Some(800));
        let mut staff = StaffHomeStoreIndex::default();
        staff.insert("Aki", StoreId("s".into()));
        staff.insert("Ren", StoreId("other".into()));
        staff.insert("Mio", StoreId("other".into()));
        let ev = event(&["Aki", "Ren", "Mio", "Guest"]);
        // Ren and Mio visit; Guest has no record and counts as home.
        assert_eq!(transport_cost(&ev, &st, &staff), dec(1600));
        let none = store(OwnershipType::Corporate, None);
        assert_eq!(transport_cost(&ev, &none, &staff), Decimal::ZERO);
    }

    #[test]
    fn resolver_zeroes_scenarioless_events() {
        let settings = SalarySettings::default();
        let staff = StaffHomeStoreIndex::default();
        let resolver = CostRuleResolver::new(&settings, &staff);
        let mut ev = event(&["Aki"]);
        ev.scenario = None;
        let st = store(OwnershipType::Franchise, Some(500));
        assert_eq!(resolver.resolve(&ev, Some(&st)), EventCosts::ZERO);
    }

    #[test]
    fn resolver_prices_unknown_store_as_corporate() {
        let settings = SalarySettings::default();
        let staff = StaffHomeStoreIndex::default();
        let resolver = CostRuleResolver::new(&settings, &staff);
        let mut ev = event(&["Aki"]);
        if let Some(s) = ev.scenario.as_mut() {
            s.fc_receive_license_amount = Some(dec(100));
            s.gm_costs = vec![slot("main", 4000, EventCategory::Normal)];
        }
        let costs = resolver.resolve(&ev, None);
        assert_eq!(costs.license_cost, dec(3000));
        assert_eq!(costs.gm_cost, dec(4000));
        assert_eq!(costs.transport_cost, Decimal::ZERO);
        assert_eq!(costs.total(), dec(7000));
    }
}
