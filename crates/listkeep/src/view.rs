//! Derived views: the visible, ordered subset of a collection.
//!
//! `derive` is recomputed in full on every call. Collections are small (tens
//! to low hundreds of records), so there is no caching and no incremental
//! maintenance.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::{FieldValue, Record};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  #[default]
  Ascending,
  Descending,
}

impl Direction {
  pub fn reversed(self) -> Self {
    match self {
      Direction::Ascending => Direction::Descending,
      Direction::Descending => Direction::Ascending,
    }
  }

  fn apply(self, ordering: Ordering) -> Ordering {
    match self {
      Direction::Ascending => ordering,
      Direction::Descending => ordering.reverse(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
  pub key: String,
  pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
  All,
  Equals(String),
}

impl FilterValue {
  /// "all" (any case) or an empty string means no filter.
  pub fn parse(raw: &str) -> Self {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
      FilterValue::All
    } else {
      FilterValue::Equals(raw.to_string())
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Filter {
  field: String,
  value: String,
}

/// Transient display state; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
  search: String,
  filters: Vec<Filter>,
  sort: Option<SortSpec>,
}

impl ViewState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn search(&self) -> &str {
    &self.search
  }

  pub fn sort(&self) -> Option<&SortSpec> {
    self.sort.as_ref()
  }

  /// Active equality filters as (field, value) pairs.
  pub fn filters(&self) -> impl Iterator<Item = (&str, &str)> {
    self.filters.iter().map(|filter| (filter.field.as_str(), filter.value.as_str()))
  }

  pub fn set_search(&mut self, search: &str) {
    self.search = search.to_string();
  }

  /// Set or clear (`FilterValue::All`) the equality filter on `field`.
  pub fn set_filter(&mut self, field: &str, value: FilterValue) {
    self.filters.retain(|filter| filter.field != field);
    if let FilterValue::Equals(value) = value {
      self.filters.push(Filter { field: field.to_string(), value });
    }
  }

  pub fn clear_filters(&mut self) {
    self.filters.clear();
  }

  pub fn set_sort(&mut self, key: &str, direction: Direction) {
    self.sort = Some(SortSpec { key: key.to_string(), direction });
  }

  /// Header-click behaviour: the same key flips direction, a new key starts ascending.
  pub fn toggle_sort(&mut self, key: &str) {
    let direction = match &self.sort {
      Some(current) if current.key == key => current.direction.reversed(),
      _ => Direction::Ascending,
    };
    self.set_sort(key, direction);
  }

  pub fn clear_sort(&mut self) {
    self.sort = None;
  }
}

/// Filter then stable-sort `records` for display. The input is never touched.
pub fn derive<'a, R: Record>(records: &'a [R], state: &ViewState) -> Vec<&'a R> {
  let needle = state.search.trim().to_lowercase();

  let visible = records
    .iter()
    .filter(|record| passes_filters(*record, &state.filters) && contains_needle(*record, &needle));

  let Some(sort) = &state.sort else {
    return visible.collect();
  };

  let mut keyed: Vec<(FieldValue, &R)> =
    visible.map(|record| (record.sort_value(&sort.key), record)).collect();
  keyed.sort_by(|(a, _), (b, _)| sort.direction.apply(a.compare(b)));
  keyed.into_iter().map(|(_, record)| record).collect()
}

/// Case-insensitive substring match over the record's searchable fields.
pub fn matches_search<R: Record>(record: &R, search: &str) -> bool {
  contains_needle(record, &search.trim().to_lowercase())
}

fn contains_needle<R: Record>(record: &R, needle: &str) -> bool {
  needle.is_empty() || record.search_text().iter().any(|text| text.to_lowercase().contains(needle))
}

fn passes_filters<R: Record>(record: &R, filters: &[Filter]) -> bool {
  filters.iter().all(|filter| {
    record
      .field(&filter.field)
      .as_filter_text()
      .is_some_and(|text| text.trim().to_lowercase() == filter.value.trim().to_lowercase())
  })
}

/// Count records per value of `field`; records without one count as "(none)".
pub fn tally<'a, R, I>(records: I, field: &str) -> BTreeMap<String, usize>
where
  R: Record + 'a,
  I: IntoIterator<Item = &'a R>,
{
  let mut counts = BTreeMap::new();
  for record in records {
    let label = record.field(field).as_filter_text().unwrap_or_else(|| "(none)".to_string());
    *counts.entry(label).or_insert(0) += 1;
  }
  counts
}

/// Sum a numeric field, skipping records where it isn't a number.
pub fn total<'a, R, I>(records: I, field: &str) -> f64
where
  R: Record + 'a,
  I: IntoIterator<Item = &'a R>,
{
  records
    .into_iter()
    .filter_map(|record| match record.field(field) {
      FieldValue::Number(number) => Some(number),
      _ => None,
    })
    .sum()
}
