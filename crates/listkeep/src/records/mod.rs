//! Record types for the lists this tool keeps.

mod inventory;
mod order;
mod task;

pub use inventory::InventoryItem;
pub use order::{LineItem, OrderStatus, ProcurementOrder};
pub use task::{Priority, Task, TaskStatus};

/// Deserializers that accept numbers typed into a form as strings.
pub(crate) mod lenient {
  use serde::de::Error;
  use serde::{Deserialize, Deserializer};

  #[derive(Deserialize)]
  #[serde(untagged)]
  enum NumberOrText {
    Number(f64),
    Text(String),
  }

  pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
  where
    D: Deserializer<'de>,
  {
    match NumberOrText::deserialize(deserializer)? {
      NumberOrText::Number(number) => Ok(number),
      NumberOrText::Text(text) => text
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| D::Error::custom(format!("expected a number, got {text:?}"))),
    }
  }

  pub fn whole_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
  where
    D: Deserializer<'de>,
  {
    let number = number(deserializer)?;
    if number.fract() != 0.0 || number < 0.0 || number > f64::from(u32::MAX) {
      return Err(D::Error::custom(format!("expected a non-negative whole number, got {number}")));
    }
    Ok(number as u32)
  }

  /// Blank strings become `None` so an untouched optional input stays unset.
  pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
  where
    D: Deserializer<'de>,
  {
    let mut text = Option::<String>::deserialize(deserializer)?;
    crate::record::normalize_optional(&mut text);
    Ok(text)
  }
}
