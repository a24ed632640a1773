// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use inventory_counts::{
    adjust_line, create_list, delete_all_lists, delete_list, format_cents, list_summaries,
    load_all_lists, load_list, logging, lookup_for_list, open_database, record_scan, resolve,
    write_all_lists_csv, write_list_csv, Catalogue, Config, InventoryList, ManualDetails, Price,
};

const ACTOR: &str = "cli";

#[derive(Parser)]
#[command(name = "inventory-counts", version, about = "Barcode inventory counts")]
struct Cli {
    /// List database (overrides INVENTORY_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Master item CSV (overrides INVENTORY_ITEM_CSV)
    #[arg(long, global = true)]
    items: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show all lists with line counts and totals
    Lists,
    /// Create an empty list
    Create { name: String },
    /// Print one list
    Show { name: String },
    /// Count a scanned or typed code into a list
    Scan {
        list: String,
        code: String,
        /// Quantity change (negative to take items off)
        #[arg(long, short, default_value_t = 1, allow_hyphen_values = true)]
        qty: i64,
        /// Brand, used only when the catalogue does not know the item
        #[arg(long)]
        brand: Option<String>,
        /// Description, used only when the catalogue does not know the item
        #[arg(long)]
        description: Option<String>,
        /// Price, used only when neither catalogue nor scale label provides one
        #[arg(long)]
        price: Option<Price>,
    },
    /// Change the quantity of one line by its storage key
    Adjust {
        list: String,
        key: String,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// Resolve a code against the catalogue (and a list's earlier entries)
    Lookup {
        code: String,
        #[arg(long)]
        list: Option<String>,
    },
    /// Delete one list
    Delete { name: String },
    /// Delete every list
    DeleteAll {
        #[arg(long)]
        yes: bool,
    },
    /// Export one list as CSV (stdout unless --out)
    Export {
        name: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export all lists as one CSV (stdout unless --out)
    ExportAll {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Interactive counting screen (default)
    Ui,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env().context("Invalid configuration")?;
    if let Some(db) = cli.db {
        config.database = db;
    }
    if let Some(items) = cli.items {
        config.item_csv = items;
    }
    logging::init_tracing(&config)?;

    let catalogue = load_catalogue(&config);
    let mut conn = open_database(&config.database)
        .with_context(|| format!("Failed to open list database {:?}", config.database))?;

    match cli.command.unwrap_or(Command::Ui) {
        Command::Lists => print_lists(&conn)?,
        Command::Create { name } => {
            let list = create_list(&conn, &name)?;
            println!("✓ Created list {:?}", list.name);
        }
        Command::Show { name } => {
            let list = find_list(&conn, &name)?;
            print_list(&list);
        }
        Command::Scan {
            list,
            code,
            qty,
            brand,
            description,
            price,
        } => {
            let manual = ManualDetails::new(brand, description, price);
            let (resolved, outcome) =
                record_scan(&mut conn, &catalogue, &list, &code, &manual, qty, ACTOR)?;

            if resolved.shape.is_ambiguous() {
                println!("⚠️  {:?} is not a standard code length, check it against the label", code.trim());
            }
            if resolved.entry.is_none() && manual.brand.is_none() && manual.description.is_none() {
                println!("⚠️  {} is not in the catalogue, no brand/description given", resolved.code);
            }
            if outcome.removed {
                println!("✓ {} removed from {:?}", outcome.key, list);
            } else {
                println!(
                    "✓ {}  {} {}  qty {}  @ {}",
                    outcome.key,
                    outcome.item.brand,
                    outcome.item.description,
                    outcome.item.qty,
                    outcome.item.price
                );
            }
        }
        Command::Adjust { list, key, delta } => {
            let outcome = adjust_line(&mut conn, &list, &key, delta, ACTOR)?;
            if outcome.removed {
                println!("✓ {} removed", outcome.key);
            } else {
                println!("✓ {} qty {}", outcome.key, outcome.item.qty);
            }
        }
        Command::Lookup { code, list } => {
            let (resolved, previous) = match list {
                Some(list) => {
                    let lookup = lookup_for_list(&conn, &catalogue, &list, &code)?;
                    (lookup.resolved, lookup.previous)
                }
                None => (resolve(&code, &catalogue)?, None),
            };

            println!("Code:   {} ({})", resolved.code, resolved.shape.as_str());
            match (&resolved.entry, &previous) {
                (Some(entry), _) => {
                    println!("Brand:  {}", entry.brand);
                    println!("Desc:   {}", entry.description);
                    println!("Price:  {}", entry.price);
                    if !entry.subdept.is_empty() {
                        println!("Dept:   {}", entry.subdept);
                    }
                }
                (None, Some(prev)) => {
                    println!("Not in catalogue, earlier entry on this list:");
                    println!("Brand:  {}", prev.brand);
                    println!("Desc:   {}", prev.description);
                    println!("Price:  {}", prev.price);
                }
                (None, None) => println!("Not in catalogue"),
            }
            if let Some(price) = resolved.override_price {
                println!("Label price: {}", price);
            }
        }
        Command::Delete { name } => {
            let lines = delete_list(&mut conn, &name, ACTOR)?;
            println!("✓ Deleted {:?} ({} lines)", name, lines);
        }
        Command::DeleteAll { yes } => {
            if !yes {
                anyhow::bail!("refusing to delete every list without --yes");
            }
            let lists = delete_all_lists(&mut conn, ACTOR)?;
            println!("✓ Deleted {} lists", lists);
        }
        Command::Export { name, out } => {
            let list = find_list(&conn, &name)?;
            match out {
                Some(path) => {
                    write_list_csv(create_file(&path)?, &list)?;
                    println!("✓ Exported {:?} to {:?}", name, path);
                }
                None => write_list_csv(io::stdout().lock(), &list)?,
            }
        }
        Command::ExportAll { out } => {
            let lists = load_all_lists(&conn)?;
            match out {
                Some(path) => {
                    write_all_lists_csv(create_file(&path)?, &lists)?;
                    println!("✓ Exported {} lists to {:?}", lists.len(), path);
                }
                None => write_all_lists_csv(io::stdout().lock(), &lists)?,
            }
        }
        Command::Ui => run_ui_mode(conn, catalogue)?,
    }

    Ok(())
}

/// Missing or unreadable item list is not fatal: counting still works with
/// manual details.
fn load_catalogue(config: &Config) -> Catalogue {
    match Catalogue::from_path(&config.item_csv) {
        Ok((catalogue, report)) => {
            for rejected in &report.rejected {
                tracing::warn!(line = rejected.line, reason = %rejected.reason, "item list row skipped");
            }
            catalogue
        }
        Err(e) => {
            tracing::error!(path = ?config.item_csv, error = ?e, "failed to load item list");
            Catalogue::new()
        }
    }
}

fn find_list(conn: &Connection, name: &str) -> Result<InventoryList> {
    load_list(conn, name)?.with_context(|| format!("List not found: {:?}", name))
}

fn create_file(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("Failed to create {:?}", path))
}

fn print_lists(conn: &Connection) -> Result<()> {
    let summaries = list_summaries(conn)?;
    if summaries.is_empty() {
        println!("No lists yet. Create one with: inventory-counts create <name>");
        return Ok(());
    }

    println!("{:<24} {:>6} {:>8} {:>12}  {}", "List", "Lines", "Qty", "Total", "Created");
    for s in summaries {
        println!(
            "{:<24} {:>6} {:>8} {:>12}  {}",
            s.name,
            s.lines,
            s.total_qty,
            format_cents(s.grand_total_cents),
            s.created.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn print_list(list: &InventoryList) {
    println!("📋 {} ({} lines)", list.name, list.len());
    println!(
        "{:<22} {:<16} {:<30} {:>8} {:>6} {:>10}",
        "Key", "Brand", "Description", "Price", "Qty", "Total"
    );
    for (key, item) in list.lines() {
        println!(
            "{:<22} {:<16} {:<30} {:>8} {:>6} {:>10}",
            key,
            truncate(&item.brand, 16),
            truncate(&item.description, 30),
            item.price.to_string(),
            item.qty,
            format_cents(item.total_cents())
        );
    }
    println!("Grand Total: ${}", format_cents(list.grand_total_cents()));
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(width.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(conn: Connection, catalogue: Catalogue) -> Result<()> {
    let mut app = ui::App::new(conn, catalogue)?;
    ui::run_ui(&mut app)?;
    println!("✅ UI closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_conn: Connection, _catalogue: Catalogue) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web UI: cargo run --bin inventory-server --features server");
    std::process::exit(1);
}
