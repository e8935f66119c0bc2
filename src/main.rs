// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

use coffee_payer::{
    export_ledger, init_tracing, parse_price, payer_odds, process_trip, record_purchase, Config,
    LedgerStore, OrderSlot, SqliteLedger, MAX_PARTICIPANTS,
};

const USAGE: &str = "\
Usage: coffee-payer [COMMAND]

Commands:
  ui                       Browse the ledger (default)
  list                     Print everyone's lifetime spending
  record <name> <price>    Add one coffee to someone's total
  trip <name=price>...     Record up to 7 orders and pick who pays
  export [path]            Write the ledger to CSV";

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = Config::load()?;

    match args.first().map(String::as_str) {
        None | Some("ui") => run_ui_mode(&config),
        Some("list") => run_list(&config),
        Some("record") => run_record(&config, &args[1..]),
        Some("trip") => run_trip(&config, &args[1..]),
        Some("export") => run_export(&config, args.get(1).map(String::as_str)),
        Some("help") | Some("-h") | Some("--help") => {
            println!("{}", USAGE);
            Ok(())
        }
        Some(other) => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }
}

fn open_ledger(config: &Config) -> Result<SqliteLedger> {
    SqliteLedger::open(&config.database_path)
        .with_context(|| format!("Failed to open ledger at {:?}", config.database_path))
}

fn run_list(config: &Config) -> Result<()> {
    let ledger = open_ledger(config)?;
    let entries = ledger.entries()?;

    if entries.is_empty() {
        println!("Nobody has bought coffee yet.");
        return Ok(());
    }

    let total: f64 = entries.iter().map(|e| e.spend).sum();
    println!("{} people in the ledger\n", ledger.count()?);
    println!("{:<24} {:>10} {:>8}", "Name", "Spent", "Share");
    println!("{}", "━".repeat(44));
    for entry in &entries {
        let share = if total > 0.0 { entry.spend / total * 100.0 } else { 0.0 };
        println!("{:<24} {:>10.2} {:>7.1}%", entry.name, entry.spend, share);
    }
    println!("{}", "━".repeat(44));
    println!("{:<24} {:>10.2}", "Total", total);

    Ok(())
}

fn run_record(config: &Config, args: &[String]) -> Result<()> {
    let [name, price] = args else {
        bail!("record takes exactly <name> <price>");
    };
    let price = parse_price(price)
        .with_context(|| format!("Not a valid price: {:?}", price))?;

    let mut ledger = open_ledger(config)?;
    let total = record_purchase(&mut ledger, name, price)?;
    println!("✓ {} has now spent {:.2} on coffee", name.trim(), total);

    Ok(())
}

fn run_trip(config: &Config, args: &[String]) -> Result<()> {
    if args.len() > MAX_PARTICIPANTS {
        bail!("A trip holds at most {} people, got {}", MAX_PARTICIPANTS, args.len());
    }
    let slots: Vec<OrderSlot> = args.iter().map(|pair| OrderSlot::from_pair(pair)).collect();

    let mut ledger = open_ledger(config)?;
    let outcome = process_trip(&mut ledger, &slots, &mut rand::thread_rng())?;

    for skipped in &outcome.skipped {
        println!("  skipped #{}: {:?}", skipped.slot, skipped.reason);
    }
    for (participant, odds) in payer_odds(&ledger, &outcome.participants())? {
        println!("  {:<20} {:>5.1}% chance", participant.display_name, odds * 100.0);
    }
    println!("\n☕ {} pays ({:.2})", outcome.payer, outcome.trip_total());
    println!("   drawn at {}", outcome.drawn_at_display());

    Ok(())
}

fn run_export(config: &Config, path: Option<&str>) -> Result<()> {
    let path = path.map(PathBuf::from).unwrap_or_else(|| config.export_path.clone());
    let ledger = open_ledger(config)?;

    let rows = export_ledger(&ledger, &path)
        .with_context(|| format!("Failed to export ledger to {:?}", path))?;
    println!("✓ Exported {} people to {:?}", rows, path);

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    let ledger = open_ledger(config)?;
    let mut app = ui::App::new(ledger.entries()?);
    ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: coffee-payer list");
    std::process::exit(1);
}
