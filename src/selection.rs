use std::collections::{BTreeMap, HashMap};

use crate::data::Category;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionKey {
    pub restaurant_id: String,
    pub category: Category,
}

impl SelectionKey {
    pub fn new(restaurant_id: &str, category: Category) -> Self {
        Self {
            restaurant_id: restaurant_id.to_string(),
            category,
        }
    }
}

/// Unsaved rating picks of the current page session.
///
/// Shared by every popup; each operation is scoped to one restaurant so that
/// closing one popup and opening another never loses or leaks picks.
#[derive(Debug, Default, Clone)]
pub struct SelectionCache {
    picks: HashMap<SelectionKey, u8>,
}

impl SelectionCache {
    pub fn get(&self, restaurant_id: &str, category: Category) -> Option<u8> {
        self.picks
            .get(&SelectionKey::new(restaurant_id, category))
            .copied()
    }

    /// Pick `value`, or drop the pick if `value` was already chosen.
    /// Returns the resulting state of the key.
    pub fn toggle(&mut self, restaurant_id: &str, category: Category, value: u8) -> Option<u8> {
        let key = SelectionKey::new(restaurant_id, category);
        if self.picks.get(&key) == Some(&value) {
            self.picks.remove(&key);
            None
        } else {
            self.picks.insert(key, value);
            Some(value)
        }
    }

    pub fn clear_restaurant(&mut self, restaurant_id: &str) {
        self.picks.retain(|k, _| k.restaurant_id != restaurant_id);
    }

    pub fn picks_for(&self, restaurant_id: &str) -> BTreeMap<Category, u8> {
        self.picks
            .iter()
            .filter(|(k, _)| k.restaurant_id == restaurant_id)
            .map(|(k, v)| (k.category, *v))
            .collect()
    }

    pub fn is_empty_for(&self, restaurant_id: &str) -> bool {
        !self.picks.keys().any(|k| k.restaurant_id == restaurant_id)
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }
}
