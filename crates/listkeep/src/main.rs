use anyhow::Result;
use clap::{Parser, Subcommand};

use listkeep::cli::{commands, Action, Context};
use listkeep::logging;
use listkeep::records::{InventoryItem, ProcurementOrder, Task};

#[derive(Parser)]
#[command(name = "listkeep")]
#[command(about = "Listkeep - Local-first Record Lists\nInventory, tasks and purchase orders kept as JSON snapshots")]
#[command(version)]
struct Cli {
  /// Log debug output to stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Stock lines with quantities and unit prices
  Inventory {
    #[command(subcommand)]
    action: Action,
  },
  /// To-do items with status, priority and due date
  Tasks {
    #[command(subcommand)]
    action: Action,
  },
  /// Purchase orders and their line items
  Orders {
    #[command(subcommand)]
    action: Action,
  },
  /// Show where data lives and the active settings
  Config,
  /// Show or toggle a display preference, e.g. `pref details on`
  Pref {
    /// Preference name
    name: String,
    /// "on" or "off"; omit to show the current value
    value: Option<String>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  logging::init(cli.verbose);

  let ctx = Context::load()?;

  match cli.command {
    Commands::Inventory { action } => commands::run::<InventoryItem>(&ctx, action)?,
    Commands::Tasks { action } => commands::run::<Task>(&ctx, action)?,
    Commands::Orders { action } => commands::run::<ProcurementOrder>(&ctx, action)?,
    Commands::Config => commands::show_config(&ctx)?,
    Commands::Pref { name, value } => commands::preference(&ctx, &name, value.as_deref())?,
  }

  Ok(())
}
