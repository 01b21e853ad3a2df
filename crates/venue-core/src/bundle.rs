//! Envelope for everything the data-access layer hands to the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::{Event, MiscTransaction, SalarySettings, StaffHomeStoreIndex, Store, StoreId};

/// Pre-fetched, pre-joined input for one report computation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InputBundle {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub stores: Vec<Store>,
    #[serde(default)]
    pub misc_transactions: Vec<MiscTransaction>,
    /// Absent when the organisation has never saved wage settings.
    #[serde(default)]
    pub salary_settings: Option<SalarySettings>,
    #[serde(default)]
    pub staff_home_stores: StaffHomeStoreIndex,
}

impl InputBundle {
    /// Narrow the bundle to a store selection. Misc transactions without a
    /// store link are shared and always kept.
    pub fn restrict_to_stores(mut self, selection: &BTreeSet<StoreId>) -> Self {
        if selection.is_empty() {
            return self;
        }
        self.events.retain(|e| selection.contains(&e.store_id));
        self.stores.retain(|s| selection.contains(&s.id));
        self.misc_transactions.retain(|t| match &t.store_id {
            Some(id) => selection.contains(id),
            None => true,
        });
        tracing::debug!(
            stores = selection.len(),
            events = self.events.len(),
            "restricted input to store selection"
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"{
        "events": [
            {"id": "e1", "date": "2024-05-01", "store_id": "a", "revenue": 1000},
            {"id": "e2", "date": "2024-05-02", "store_id": "b", "revenue": 2000}
        ],
        "stores": [{"id": "a", "name": "A"}, {"id": "b", "name": "B"}],
        "misc_transactions": [
            {"id": "t1", "date": "2024-05-03", "type": "expense", "amount": 10, "store_id": "b"},
            {"id": "t2", "date": "2024-05-03", "type": "expense", "amount": 20}
        ]
    }"#;

    #[test]
    fn restrict_keeps_shared_transactions() {
        let bundle: InputBundle = serde_json::from_str(BUNDLE).unwrap();
        let only_a: BTreeSet<StoreId> = [StoreId("a".into())].into_iter().collect();
        let narrowed = bundle.restrict_to_stores(&only_a);
        assert_eq!(narrowed.events.len(), 1);
        assert_eq!(narrowed.stores.len(), 1);
        assert_eq!(narrowed.misc_transactions.len(), 1);
        assert_eq!(narrowed.misc_transactions[0].id, "t2");
    }

    #[test]
    fn empty_selection_means_all_stores() {
        let bundle: InputBundle = serde_json::from_str(BUNDLE).unwrap();
        let all = bundle.restrict_to_stores(&BTreeSet::new());
        assert_eq!(all.events.len(), 2);
        assert!(all.salary_settings.is_none());
    }
}
