//! Cost recognition gate.
//!
//! Revenue is recognized as soon as an event is booked; wages, license fees
//! and allowances only once the event date is strictly before the reference
//! day. Same-day and future events therefore carry revenue with zero cost.

use chrono::NaiveDate;

use crate::cost_rules::EventCosts;

/// Whether an event's costs are recognized yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settlement {
    /// The event took place before the reference day.
    Settled,
    /// Today or later.
    Pending,
}

impl Settlement {
    /// Settled when `event_date` is strictly before `today`.
    pub fn classify(event_date: NaiveDate, today: NaiveDate) -> Self {
        if event_date < today {
            Settlement::Settled
        } else {
            Settlement::Pending
        }
    }

    /// `true` for [`Settlement::Settled`].
    pub fn is_settled(self) -> bool {
        self == Settlement::Settled
    }

    /// Costs as recognized under this settlement state.
    pub fn gate(self, costs: EventCosts) -> EventCosts {
        match self {
            Settlement::Settled => costs,
            Settlement::Pending => EventCosts::ZERO,
        }
    }
}
