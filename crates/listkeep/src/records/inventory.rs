use serde::{Deserialize, Serialize};

use super::lenient;
use crate::form::Draft;
use crate::record::{FieldValue, Record};
use crate::validation::{Rule, RuleSet};

/// A stock line in an inventory tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
  #[serde(default)]
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub category: String,
  #[serde(deserialize_with = "lenient::whole_number")]
  pub quantity: u32,
  #[serde(default)]
  pub unit: String,
  #[serde(default, deserialize_with = "lenient::number")]
  pub unit_price: f64,
}

impl InventoryItem {
  pub fn new(name: &str, category: &str, quantity: u32, unit_price: f64) -> Self {
    Self {
      id: String::new(),
      name: name.to_string(),
      category: category.to_string(),
      quantity,
      unit: String::new(),
      unit_price,
    }
  }

  /// Stock value at the recorded unit price.
  pub fn value(&self) -> f64 {
    f64::from(self.quantity) * self.unit_price
  }
}

impl Record for InventoryItem {
  const COLLECTION: &'static str = "inventory";

  fn id(&self) -> &str {
    &self.id
  }

  fn set_id(&mut self, id: String) {
    self.id = id;
  }

  fn search_text(&self) -> Vec<&str> {
    vec![&self.name, &self.category]
  }

  fn field(&self, key: &str) -> FieldValue {
    match key {
      "id" => FieldValue::text(&self.id),
      "name" => FieldValue::text(&self.name),
      "category" => FieldValue::text(&self.category),
      "quantity" => FieldValue::from(self.quantity),
      "unit" => FieldValue::text(&self.unit),
      "unitPrice" => FieldValue::from(self.unit_price),
      "value" => FieldValue::from(self.value()),
      _ => FieldValue::Missing,
    }
  }

  fn sort_keys() -> &'static [&'static str] {
    &["name", "category", "quantity", "unitPrice", "value"]
  }

  fn rules() -> RuleSet {
    RuleSet::new()
      .field("name", [Rule::Required, Rule::MaxLength(120)])
      .field("quantity", [Rule::Required, Rule::Positive, Rule::Integer])
      .field("unitPrice", [Rule::Min(0.0)])
  }

  fn seed() -> Vec<Self> {
    vec![
      InventoryItem {
        id: "1".to_string(),
        unit: "bags".to_string(),
        ..InventoryItem::new("Cement", "Building Materials", 50, 7.5)
      },
      InventoryItem {
        id: "2".to_string(),
        unit: "pcs".to_string(),
        ..InventoryItem::new("Bricks", "Building Materials", 1000, 0.45)
      },
    ]
  }

  fn draft_defaults() -> Draft {
    Draft::new()
      .with("name", "")
      .with("category", "General")
      .with("quantity", "1")
      .with("unit", "")
      .with("unitPrice", "0")
  }
}
