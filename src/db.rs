use std::collections::{BTreeMap, HashMap};

use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::data::Category;

pub const STORAGE_KEY: &str = "zoo_ratings_v1";

/// A string key-value medium, shaped after the browser's `localStorage`.
pub trait Storage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}

impl<T: Storage + ?Sized> Storage for Box<T> {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).set_item(key, value)
    }
}

/// Session-only medium. Used by tests and as the fallback when the browser
/// refuses to hand out `localStorage`.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Votes of one restaurant, keyed by category label.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RestaurantRatings(BTreeMap<String, Vec<f64>>);

// A damaged restaurant entry is repaired in place rather than failing the
// whole table: non-objects become empty, non-list categories become `[]` and
// entries that are not valid votes are dropped.
impl<'de> Deserialize<'de> for RestaurantRatings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Value::Object(categories) = Value::deserialize(deserializer)? else {
            tracing::debug!("resetting restaurant entry that is not an object");
            return Ok(Self::default());
        };

        let votes = categories
            .into_iter()
            .map(|(label, votes)| {
                let votes = match votes {
                    Value::Array(items) => items
                        .iter()
                        .filter_map(|v| RawVote::Number(v.as_f64()?).coerce())
                        .collect(),
                    _ => {
                        tracing::debug!(label = label.as_str(), "resetting category that is not a list");
                        Vec::new()
                    }
                };
                (label, votes)
            })
            .collect();
        Ok(Self(votes))
    }
}

impl RestaurantRatings {
    pub fn votes(&self, category: Category) -> &[f64] {
        self.0
            .get(category.label())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn votes_mut(&mut self, category: Category) -> &mut Vec<f64> {
        self.0.entry(category.label().to_string()).or_default()
    }
}

/// The whole persisted blob: restaurant id -> category label -> votes.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingsTable(BTreeMap<String, RestaurantRatings>);

impl RatingsTable {
    pub fn restaurant(&self, id: &str) -> Option<&RestaurantRatings> {
        self.0.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Make sure `id` and all of its categories exist as (possibly empty) lists.
    pub fn ensure_restaurant(&mut self, id: &str) -> &mut RestaurantRatings {
        let entry = self.0.entry(id.to_string()).or_default();
        for category in Category::ALL {
            entry.votes_mut(category);
        }
        entry
    }
}

/// A vote as it arrives from the outside world, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawVote {
    Number(f64),
    Text(String),
}

impl RawVote {
    /// The numeric vote, if it is finite and within [1, 5].
    pub fn coerce(&self) -> Option<f64> {
        let num = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (num.is_finite() && (1.0..=5.0).contains(&num)).then_some(num)
    }
}

impl From<u8> for RawVote {
    fn from(v: u8) -> Self {
        Self::Number(v.into())
    }
}

impl From<i32> for RawVote {
    fn from(v: i32) -> Self {
        Self::Number(v.into())
    }
}

impl From<f64> for RawVote {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for RawVote {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for RawVote {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Mean of `votes` rounded half-up to one decimal, `None` when there is nothing to average.
pub fn average(votes: &[f64]) -> Option<f64> {
    if votes.is_empty() {
        return None;
    }
    let mean = votes.iter().sum::<f64>() / votes.len() as f64;
    Some((mean * 10.0 + 0.5).floor() / 10.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryStats {
    pub avg: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RestaurantStats(BTreeMap<Category, CategoryStats>);

impl RestaurantStats {
    pub fn get(&self, category: Category) -> CategoryStats {
        self.0.get(&category).copied().unwrap_or(CategoryStats {
            avg: None,
            count: 0,
        })
    }

    /// Stats in category display order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, CategoryStats)> + '_ {
        self.0.iter().map(|(c, s)| (*c, *s))
    }
}

/// Ratings persisted as a single JSON blob under one key.
///
/// Every write replaces the whole blob. Reads never fail: a blob that is not a
/// JSON object is treated as "no ratings yet", damaged entries inside one are
/// repaired.
pub struct RatingsStore<S> {
    storage: S,
    key: String,
}

impl<S: Storage> RatingsStore<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn load(&self) -> RatingsTable {
        match self.try_load() {
            Ok(table) => table,
            Err(e) => {
                tracing::debug!("discarding stored ratings: {e:#}");
                RatingsTable::default()
            }
        }
    }

    fn try_load(&self) -> anyhow::Result<RatingsTable> {
        let Some(text) = self
            .storage
            .get_item(&self.key)
            .with_context(|| format!("fail to read {}", self.key))?
        else {
            return Ok(RatingsTable::default());
        };
        if text.is_empty() {
            return Ok(RatingsTable::default());
        }

        let table = serde_json::from_str(&text)
            .with_context(|| format!("malformed ratings under {}", self.key))?;
        Ok(table)
    }

    pub fn save(&mut self, table: &RatingsTable) {
        if let Err(e) = self.try_save(table) {
            tracing::error!("fail to save ratings: {e:#}")
        }
    }

    fn try_save(&mut self, table: &RatingsTable) -> anyhow::Result<()> {
        let text = serde_json::to_string(table)?;
        self.storage
            .set_item(&self.key, &text)
            .with_context(|| format!("fail to write {}", self.key))
    }

    /// Append every valid vote and persist the table. Invalid votes are
    /// dropped; the return value is how many were kept.
    pub fn add_ratings<I, V>(&mut self, restaurant_id: &str, ratings: I) -> usize
    where
        I: IntoIterator<Item = (Category, V)>,
        V: Into<RawVote>,
    {
        let mut table = self.load();
        let entry = table.ensure_restaurant(restaurant_id);

        let mut accepted = 0;
        for (category, raw) in ratings {
            let raw: RawVote = raw.into();
            match raw.coerce() {
                Some(vote) => {
                    entry.votes_mut(category).push(vote);
                    accepted += 1;
                }
                None => tracing::debug!(restaurant_id, %category, ?raw, "dropping invalid vote"),
            }
        }

        self.save(&table);
        accepted
    }

    pub fn stats_for(&self, restaurant_id: &str) -> RestaurantStats {
        let mut table = self.load();
        let entry = table.ensure_restaurant(restaurant_id);
        let stats = Category::ALL
            .into_iter()
            .map(|c| {
                let votes = entry.votes(c);
                let stats = CategoryStats {
                    avg: average(votes),
                    count: votes.len(),
                };
                (c, stats)
            })
            .collect();
        RestaurantStats(stats)
    }
}
