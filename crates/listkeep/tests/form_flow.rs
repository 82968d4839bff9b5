use serde_json::json;

use listkeep::records::{OrderStatus, ProcurementOrder};
use listkeep::{FormError, FormEvent, FormState, ListApp, MemoryStorage, StoreError, StoreOptions, Submitted};

fn orders() -> ListApp<ProcurementOrder, MemoryStorage> {
  ListApp::open(MemoryStorage::new(), StoreOptions::default())
}

#[test]
fn order_needs_a_line_item() {
  let mut app = orders();
  app.open_add().unwrap();
  app.set_field("supplier", "Acme Supplies").unwrap();

  match app.submit() {
    Err(FormError::Invalid(errors)) => assert!(errors.contains("items")),
    other => panic!("expected validation failure, got {other:?}"),
  }
  assert_eq!(app.form().state(), &FormState::Adding);
  assert!(app.store().is_empty());
}

#[test]
fn order_with_items_is_added_and_totalled() {
  let mut app = orders();
  app.open_add().unwrap();
  app.set_field("supplier", "Acme Supplies").unwrap();
  app.set_field("orderDate", "2024-04-02").unwrap();
  app
    .set_field(
      "items",
      json!([
        {"description": "Cement bags", "quantity": "10", "unitPrice": "7.5"},
        {"description": "Rebar", "quantity": 4, "unitPrice": 12}
      ]),
    )
    .unwrap();

  let Submitted::Added(id) = app.submit().unwrap() else { panic!("expected an add") };
  let order = app.store().get(&id).unwrap();
  assert_eq!(order.total(), 123.0);
  assert_eq!(order.status, OrderStatus::Pending);
  assert!(!app.form().is_open());
}

#[test]
fn bad_order_date_reports_field_error() {
  let mut app = orders();
  app.open_add().unwrap();
  app.set_field("supplier", "Acme").unwrap();
  app.set_field("orderDate", "02/04/2024").unwrap();
  app.set_field("items", json!([{"description": "Sand", "quantity": 1}])).unwrap();

  let Err(FormError::Invalid(errors)) = app.submit() else { panic!("expected validation failure") };
  assert!(errors.contains("orderDate"));
  assert!(!errors.contains("supplier"));

  app.set_field("orderDate", "2024-04-02").unwrap();
  assert!(app.form().errors().is_empty());
  assert!(app.submit().is_ok());
}

#[test]
fn stale_edit_closes_the_form() {
  let mut app = orders();
  let id = app
    .add(ProcurementOrder::new("Acme", "2024-04-02", vec![listkeep::records::LineItem::new("Sand", 1, 2.0)]))
    .unwrap();

  app.open_edit(&id).unwrap();
  app.set_field("notes", "call first").unwrap();
  app.remove(&id);

  let err = app.submit().unwrap_err();
  assert!(matches!(err, FormError::Store(StoreError::NotFound { .. })));
  assert!(!app.form().is_open());
  assert!(app.store().is_empty());
}

#[test]
fn dismissing_discards_the_draft() {
  let mut app = orders();
  app.open_add().unwrap();
  app.set_field("supplier", "Half typed").unwrap();

  app.handle(FormEvent::BackdropClick);
  assert_eq!(app.form().state(), &FormState::Closed);
  assert!(app.store().is_empty());

  app.open_add().unwrap();
  assert_eq!(app.form().draft().get("supplier"), Some(&json!("")));
}
