//! Per-event contributions folded into store, scenario, day and month tallies.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use venue_core::{Event, EventId, ScenarioId, Store, StoreId, YearMonth};

use crate::cost_rules::EventCosts;
use crate::settlement::Settlement;

/// Running totals for one grouping key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub revenue: Decimal,
    pub events: u32,
    pub license_cost: Decimal,
    pub gm_cost: Decimal,
    pub transport_cost: Decimal,
    pub franchise_fee: Decimal,
}

impl Tally {
    pub const ZERO: Tally = Tally {
        revenue: Decimal::ZERO,
        events: 0,
        license_cost: Decimal::ZERO,
        gm_cost: Decimal::ZERO,
        transport_cost: Decimal::ZERO,
        franchise_fee: Decimal::ZERO,
    };

    /// Add one event's contribution.
    pub fn absorb(&mut self, c: &Contribution<'_>) {
        self.revenue += c.event.revenue;
        self.events += 1;
        self.license_cost += c.costs.license_cost;
        self.gm_cost += c.costs.gm_cost;
        self.transport_cost += c.costs.transport_cost;
        self.franchise_fee += c.franchise_fee;
    }

    /// Combine two tallies over disjoint event sets.
    pub fn merge(&mut self, other: &Tally) {
        self.revenue += other.revenue;
        self.events += other.events;
        self.license_cost += other.license_cost;
        self.gm_cost += other.gm_cost;
        self.transport_cost += other.transport_cost;
        self.franchise_fee += other.franchise_fee;
    }

    /// Per-event costs plus the franchise fee carried by this tally.
    pub fn cost(&self) -> Decimal {
        self.license_cost + self.gm_cost + self.transport_cost + self.franchise_fee
    }

    /// Revenue less [`Tally::cost`].
    pub fn net_profit(&self) -> Decimal {
        self.revenue - self.cost()
    }

    /// Revenue per event, zero for an empty tally.
    pub fn average_revenue(&self) -> Decimal {
        if self.events == 0 {
            return Decimal::ZERO;
        }
        (self.revenue / Decimal::from(self.events))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// One event's recognized amounts.
#[derive(Clone, Copy, Debug)]
pub struct Contribution<'a> {
    pub event: &'a Event,
    pub settlement: Settlement,
    /// Already gated by `settlement`.
    pub costs: EventCosts,
    pub franchise_fee: Decimal,
}

impl<'a> Contribution<'a> {
    /// Revenue less recognized costs and any franchise fee carried.
    pub fn net_profit(&self) -> Decimal {
        self.event.revenue - self.costs.total() - self.franchise_fee
    }

    /// Grouping key for the scenario tallies.
    pub fn scenario_key(&self) -> Option<ScenarioId> {
        self.event.scenario.as_ref().map(|s| s.id.clone())
    }
}

/// Parallel tallies keyed by store, scenario, day and month, plus the
/// grand total. Scenario tallies never carry the franchise fee.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Accumulators {
    pub by_store: BTreeMap<StoreId, Tally>,
    /// `None` collects events booked without a scenario.
    pub by_scenario: BTreeMap<Option<ScenarioId>, Tally>,
    pub by_day: BTreeMap<NaiveDate, Tally>,
    pub by_month: BTreeMap<YearMonth, Tally>,
    pub totals: Tally,
}

impl Accumulators {
    /// Add one event to every tally; the scenario tally gets it without
    /// the franchise fee.
    pub fn absorb(&mut self, c: &Contribution<'_>) {
        self.by_store
            .entry(c.event.store_id.clone())
            .or_default()
            .absorb(c);
        let scenario_share = Contribution {
            franchise_fee: Decimal::ZERO,
            ..*c
        };
        self.by_scenario
            .entry(c.scenario_key())
            .or_default()
            .absorb(&scenario_share);
        self.by_day.entry(c.event.date).or_default().absorb(c);
        self.by_month
            .entry(YearMonth::of(c.event.date))
            .or_default()
            .absorb(c);
        self.totals.absorb(c);
    }

    /// Merge accumulators folded over disjoint shards of the input.
    pub fn merge(mut self, other: Accumulators) -> Accumulators {
        fn merge_map<K: Ord>(into: &mut BTreeMap<K, Tally>, from: BTreeMap<K, Tally>) {
            for (key, tally) in from {
                into.entry(key).or_default().merge(&tally);
            }
        }
        merge_map(&mut self.by_store, other.by_store);
        merge_map(&mut self.by_scenario, other.by_scenario);
        merge_map(&mut self.by_day, other.by_day);
        merge_map(&mut self.by_month, other.by_month);
        self.totals.merge(&other.totals);
        self
    }
}

/// Fold contributions into fresh accumulators.
pub fn fold<'a, I>(contributions: I) -> Accumulators
where
    I: IntoIterator<Item = &'a Contribution<'a>>,
{
    contributions
        .into_iter()
        .fold(Accumulators::default(), |mut acc, c| {
            acc.absorb(c);
            acc
        })
}

/// The event that carries each franchise store's administrative fee: the
/// earliest (by date, then id) event of every franchise store with a
/// positive fee. Stores with no events carry nothing.
pub fn franchise_fee_carriers(events: &[Event], stores: &[Store]) -> BTreeMap<EventId, Decimal> {
    let mut earliest: BTreeMap<&StoreId, &Event> = BTreeMap::new();
    for event in events {
        earliest
            .entry(&event.store_id)
            .and_modify(|cur| {
                if (event.date, &event.id) < (cur.date, &cur.id) {
                    *cur = event;
                }
            })
            .or_insert(event);
    }
    stores
        .iter()
        .filter(|s| s.is_franchise())
        .filter_map(|s| {
            let fee = s.franchise_fee.unwrap_or_default();
            if fee <= Decimal::ZERO {
                return None;
            }
            earliest.get(&s.id).map(|e| (e.id.clone(), fee))
        })
        .collect()
}
