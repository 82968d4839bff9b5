use anyhow::{anyhow, bail, Context as _, Result};
use colored::*;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::debug;

use super::display;
use super::{Action, Context, ListArgs};
use crate::app::ListApp;
use crate::config::CONFIG_FILE;
use crate::error::FormError;
use crate::record::Record;
use crate::storage::{self, FileStorage};
use crate::store::StoreEvent;
use crate::view::{self, Direction, FilterValue};

type App<R> = ListApp<R, FileStorage>;

/// Run one action against the collection of `R`.
pub fn run<R: Record>(ctx: &Context, action: Action) -> Result<()> {
  let mut app = ctx.app::<R>();
  display::load_banner(R::COLLECTION, app.store().load_status());
  app.subscribe(|event| {
    if let StoreEvent::PersistFailed(message) = event {
      display::persist_warning(message);
    }
  });

  debug!(collection = R::COLLECTION, records = app.store().len(), "opened collection");

  match action {
    Action::Add { set } => add(&mut app, &set),
    Action::List(args) => list(&mut app, &args),
    Action::Get { id } => get(&app, &id),
    Action::Update { id, set } => update(&mut app, &id, &set),
    Action::Delete { id, force } => delete(ctx, &mut app, &id, force),
    Action::Clear { force } => clear(ctx, &mut app, force),
    Action::Summary { by, sum } => summary(&app, &by, sum.as_deref()),
  }
}

/// Split `field=value`. Values stay text unless they look like a JSON array
/// or object, which is how line items are passed.
pub fn parse_assignment(raw: &str) -> Result<(String, Value)> {
  let (field, value) =
    raw.split_once('=').ok_or_else(|| anyhow!("expected FIELD=VALUE, got '{raw}'"))?;
  let field = field.trim();
  if field.is_empty() {
    bail!("missing field name in '{raw}'");
  }

  let trimmed = value.trim_start();
  let value = if trimmed.starts_with('[') || trimmed.starts_with('{') {
    serde_json::from_str(value).with_context(|| format!("invalid JSON for field '{field}'"))?
  } else {
    Value::String(value.to_string())
  };

  Ok((field.to_string(), value))
}

pub fn parse_filter(raw: &str) -> Result<(String, FilterValue)> {
  let (field, value) =
    raw.split_once('=').ok_or_else(|| anyhow!("expected FIELD=VALUE, got '{raw}'"))?;
  Ok((field.trim().to_string(), FilterValue::parse(value)))
}

fn fill_form<R: Record>(app: &mut App<R>, assignments: &[String]) -> Result<()> {
  for raw in assignments {
    let (field, value) = parse_assignment(raw)?;
    app.set_field(&field, value)?;
  }
  Ok(())
}

fn submit<R: Record>(app: &mut App<R>) -> Result<String> {
  match app.submit() {
    Ok(submitted) => Ok(submitted.id().to_string()),
    Err(FormError::Invalid(errors)) => {
      display::validation_errors(&errors);
      Err(FormError::Invalid(errors).into())
    }
    Err(err) => Err(err.into()),
  }
}

fn add<R: Record>(app: &mut App<R>, assignments: &[String]) -> Result<()> {
  app.open_add()?;
  fill_form(app, assignments)?;
  let id = submit(app)?;

  println!("{} Added {} record {}", "✓".green(), R::COLLECTION.cyan(), id.yellow());
  Ok(())
}

fn update<R: Record>(app: &mut App<R>, id: &str, assignments: &[String]) -> Result<()> {
  app.open_edit(id)?;
  fill_form(app, assignments)?;
  submit(app)?;

  println!("{} Updated {} record {}", "✓".green(), R::COLLECTION.cyan(), id.yellow());
  Ok(())
}

fn list<R: Record>(app: &mut App<R>, args: &ListArgs) -> Result<()> {
  if let Some(key) = &args.sort {
    if !R::sort_keys().contains(&key.as_str()) {
      bail!("cannot sort {} by '{key}' (choose from: {})", R::COLLECTION, R::sort_keys().join(", "));
    }
    let direction = if args.desc { Direction::Descending } else { Direction::Ascending };
    app.set_sort(key, direction);
  }

  for raw in &args.filters {
    let (field, value) = parse_filter(raw)?;
    app.set_filter(&field, value);
  }

  let search = args.search.as_deref().map(str::trim).filter(|term| !term.is_empty());
  if let Some(term) = search {
    app.set_search(term);
  }

  let visible = app.visible();

  if args.json {
    println!("{}", serde_json::to_string_pretty(&visible)?);
    return Ok(());
  }

  if visible.is_empty() {
    println!("No {} records found", R::COLLECTION);
    return Ok(());
  }

  let details = args.details || storage::read_flag(app.store().storage(), &preference_key("details"));
  for record in &visible {
    println!("{}", display::record_line(*record, search));
    if details {
      for line in display::record_details(*record) {
        println!("{line}");
      }
    }
  }

  println!("{}", format!("{} of {} shown", visible.len(), app.store().len()).dimmed());
  Ok(())
}

fn get<R: Record>(app: &App<R>, id: &str) -> Result<()> {
  let record = app.store().get(id).ok_or_else(|| anyhow!("no {} record with id '{id}'", R::COLLECTION))?;
  println!("{}", serde_json::to_string_pretty(record)?);
  Ok(())
}

fn confirm(prompt: String) -> Result<bool> {
  print!("{prompt} [y/N] ");
  std::io::stdout().flush()?;

  let mut input = String::new();
  std::io::stdin().read_line(&mut input)?;
  Ok(input.trim().to_lowercase().starts_with('y'))
}

fn delete<R: Record>(ctx: &Context, app: &mut App<R>, id: &str, force: bool) -> Result<()> {
  if !app.store().contains(id) {
    bail!("no {} record with id '{id}'", R::COLLECTION);
  }

  if !force
    && ctx.config.confirm_delete
    && !confirm(format!("Are you sure you want to delete {} {}?", R::COLLECTION.cyan(), id.yellow()))?
  {
    println!("Deletion cancelled");
    return Ok(());
  }

  app.remove(id);
  println!("{} Deleted {} record {}", "✓".green(), R::COLLECTION.cyan(), id.yellow());
  Ok(())
}

fn clear<R: Record>(ctx: &Context, app: &mut App<R>, force: bool) -> Result<()> {
  let count = app.store().len();

  if !force
    && ctx.config.confirm_delete
    && !confirm(format!("Remove all {count} {} records?", R::COLLECTION.cyan()))?
  {
    println!("Clear cancelled");
    return Ok(());
  }

  app.store_mut().clear()?;
  println!("{} Removed {count} {} records", "✓".green(), R::COLLECTION.cyan());
  Ok(())
}

fn summary<R: Record>(app: &App<R>, by: &str, sum: Option<&str>) -> Result<()> {
  let records = app.store().records();
  let counts = view::tally(records, by);

  if counts.is_empty() {
    println!("No {} records found", R::COLLECTION);
    return Ok(());
  }

  let mut groups: BTreeMap<&str, Vec<&R>> = BTreeMap::new();
  for record in records {
    let label = record.field(by).as_filter_text();
    if let Some((key, _)) = counts.get_key_value(label.as_deref().unwrap_or("(none)")) {
      groups.entry(key.as_str()).or_default().push(record);
    }
  }

  for (label, count) in &counts {
    let mut line = format!("{} {}", label.cyan(), count);
    if let (Some(field), Some(members)) = (sum, groups.get(label.as_str())) {
      line.push_str(&format!("  {}={}", field.dimmed(), view::total(members.iter().copied(), field)));
    }
    println!("{line}");
  }

  if let Some(field) = sum {
    println!("{} {}={}", "total".bold(), field.dimmed(), view::total(records, field));
  }
  Ok(())
}

pub fn show_config(ctx: &Context) -> Result<()> {
  println!("{} {}", "root:".dimmed(), ctx.root.display());
  println!("{} {}", "file:".dimmed(), ctx.root.join(CONFIG_FILE).display());
  print!("{}", ctx.config.to_yaml()?);
  Ok(())
}

fn preference_key(name: &str) -> String {
  format!("pref.{name}")
}

/// Preference names become file names, so keep them to a plain word.
fn check_preference_name(name: &str) -> Result<()> {
  let plain = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
  if !plain {
    bail!("invalid preference name '{name}' (use letters, digits, '-' or '_')");
  }
  Ok(())
}

/// Show or set a persisted on/off display preference.
pub fn preference(ctx: &Context, name: &str, value: Option<&str>) -> Result<()> {
  check_preference_name(name)?;
  let storage = ctx.storage();
  let key = preference_key(name);

  let Some(raw) = value else {
    let state = if storage::read_flag(&storage, &key) { "on".green() } else { "off".dimmed() };
    println!("{name}: {state}");
    return Ok(());
  };

  let enabled = match raw.trim().to_lowercase().as_str() {
    "on" | "true" | "1" | "yes" => true,
    "off" | "false" | "0" | "no" => false,
    other => bail!("expected on or off, got '{other}'"),
  };

  storage::write_flag(&storage, &key, enabled)?;
  debug!(key = %key, enabled, path = %storage.path_for(&key).display(), "saved preference");
  println!("{} {name} is now {}", "✓".green(), if enabled { "on" } else { "off" });
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn assignment_keeps_plain_values_as_text() {
    let (field, value) = parse_assignment("quantity=60").unwrap();
    assert_eq!(field, "quantity");
    assert_eq!(value, Value::String("60".to_string()));

    let (_, value) = parse_assignment("notes=a=b").unwrap();
    assert_eq!(value, "a=b");
  }

  #[test]
  fn assignment_parses_json_collections() {
    let (_, value) = parse_assignment(r#"items=[{"description":"Sand","quantity":3}]"#).unwrap();
    assert_eq!(value[0]["quantity"], 3);

    assert!(parse_assignment("items=[oops").is_err());
  }

  #[test]
  fn assignment_needs_a_field() {
    assert!(parse_assignment("no equals sign").is_err());
    assert!(parse_assignment("=value").is_err());
  }

  #[test]
  fn preference_names_cannot_leave_the_data_dir() {
    assert!(check_preference_name("details").is_ok());
    assert!(check_preference_name("wide_rows-2").is_ok());

    for name in ["", "../escape", "a/b", "a\\b", "..", "dot.ted"] {
      assert!(check_preference_name(name).is_err(), "{name:?} should be rejected");
    }
  }

  #[test]
  fn filter_all_clears() {
    let (field, value) = parse_filter("category=all").unwrap();
    assert_eq!(field, "category");
    assert_eq!(value, FilterValue::All);
  }
}
