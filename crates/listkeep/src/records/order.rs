use serde::{Deserialize, Serialize};

use super::lenient;
use crate::form::Draft;
use crate::record::{normalize_optional, FieldValue, Record};
use crate::validation::{Rule, RuleSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  #[default]
  Pending,
  Approved,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Approved,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Approved => "approved",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
  pub description: String,
  #[serde(deserialize_with = "lenient::whole_number")]
  pub quantity: u32,
  #[serde(default, deserialize_with = "lenient::number")]
  pub unit_price: f64,
}

impl LineItem {
  pub fn new(description: &str, quantity: u32, unit_price: f64) -> Self {
    Self { description: description.to_string(), quantity, unit_price }
  }

  pub fn subtotal(&self) -> f64 {
    f64::from(self.quantity) * self.unit_price
  }
}

/// A purchase order with its line items, as kept by a procurement tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcurementOrder {
  #[serde(default)]
  pub id: String,
  pub supplier: String,
  pub order_date: String,
  #[serde(default, deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
  pub expected_delivery: Option<String>,
  #[serde(default)]
  pub status: OrderStatus,
  #[serde(default)]
  pub items: Vec<LineItem>,
  #[serde(default)]
  pub notes: String,
}

impl ProcurementOrder {
  pub fn new(supplier: &str, order_date: &str, items: Vec<LineItem>) -> Self {
    Self {
      id: String::new(),
      supplier: supplier.to_string(),
      order_date: order_date.to_string(),
      expected_delivery: None,
      status: OrderStatus::default(),
      items,
      notes: String::new(),
    }
  }

  pub fn total(&self) -> f64 {
    self.items.iter().map(LineItem::subtotal).sum()
  }
}

impl Record for ProcurementOrder {
  const COLLECTION: &'static str = "orders";

  fn id(&self) -> &str {
    &self.id
  }

  fn set_id(&mut self, id: String) {
    self.id = id;
  }

  fn search_text(&self) -> Vec<&str> {
    let mut text = vec![self.supplier.as_str(), self.notes.as_str()];
    text.extend(self.items.iter().map(|item| item.description.as_str()));
    text
  }

  fn field(&self, key: &str) -> FieldValue {
    match key {
      "id" => FieldValue::text(&self.id),
      "supplier" => FieldValue::text(&self.supplier),
      "status" => FieldValue::from(self.status.as_str()),
      "orderDate" => FieldValue::date(&self.order_date),
      "expectedDelivery" => FieldValue::optional_date(self.expected_delivery.as_deref()),
      "items" => FieldValue::Number(self.items.len() as f64),
      "total" => FieldValue::from(self.total()),
      _ => FieldValue::Missing,
    }
  }

  fn sort_keys() -> &'static [&'static str] {
    &["supplier", "status", "orderDate", "expectedDelivery", "total", "items"]
  }

  fn rules() -> RuleSet {
    let statuses = OrderStatus::ALL.iter().map(|status| status.as_str());
    RuleSet::new()
      .field("supplier", [Rule::Required, Rule::MaxLength(120)])
      .field(
        "orderDate",
        [
          Rule::Required,
          Rule::pattern(r"^\d{4}-\d{2}-\d{2}$", "must look like YYYY-MM-DD"),
          Rule::Date,
        ],
      )
      .field("expectedDelivery", [Rule::Date])
      .field("status", [Rule::one_of(statuses)])
      .field("items", [Rule::MinItems(1)])
  }

  fn normalize(&mut self) {
    normalize_optional(&mut self.expected_delivery);
  }

  fn draft_defaults() -> Draft {
    Draft::new()
      .with("supplier", "")
      .with("orderDate", chrono::Local::now().format("%Y-%m-%d").to_string())
      .with("status", OrderStatus::default().as_str())
      .with("items", Vec::<serde_json::Value>::new())
      .with("notes", "")
  }
}
