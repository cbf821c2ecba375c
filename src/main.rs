//! vrows - Entry Point
//!
//! Drives an inventory panel on the headless host for a number of frames and
//! reports what the engine did.

use clap::Parser;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{info, warn};
use vrows::config::{CliOverrides, ResolvedConfig};
use vrows::engine::{AggregationPool, EngineStats, SubjectPanel};
use vrows::host::{EntityQueryExt, ScrollContainer};
use vrows::model::{FrameTick, RowKey, Vec2};
use vrows::sim::{
    Inventory, InventoryBinder, PlainFormatter, SimContainer, SimFactory, StorageBin, StoredItem,
};

const ORES: [&str; 6] = ["iron", "copper", "coal", "stone", "sand", "gold"];

/// vrows - virtualized row list engine demo
#[derive(Parser, Debug)]
#[command(name = "vrows")]
#[command(version)]
#[command(about = "Scroll a virtualized inventory panel on a headless host")]
pub struct Args {
    /// Frames to simulate
    #[arg(short, long, default_value = "240", value_parser = clap::value_parser!(u64).range(1..))]
    pub frames: u64,

    /// Items in the simulated storage bin
    #[arg(short, long, default_value = "500")]
    pub rows: usize,

    /// Pixels scrolled per frame
    #[arg(long, default_value = "16")]
    pub scroll_step: f32,

    /// Culling margin as a multiple of the largest row
    #[arg(long)]
    pub margin_factor: Option<f32>,

    /// Pooled rows kept before inactive ones are destroyed
    #[arg(long)]
    pub high_water: Option<usize>,

    /// Keep the live layout between rebuilds
    #[arg(long)]
    pub no_freeze: bool,

    /// Aggregation worker threads
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub workers: Option<u64>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Settings given on the command line.
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            margin_factor: self.margin_factor,
            pool_high_water: self.high_water,
            // Only override if the flag was explicitly set
            freeze_layout: if self.no_freeze { Some(false) } else { None },
            aggregation_workers: self.workers.map(|w| w as usize),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration with full precedence chain:
    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        // 1. Load config file (or None if missing)
        let config_file = vrows::config::load_config_with_precedence(args.config.clone())?;

        // 2. Merge with defaults
        let merged = vrows::config::merge_config(config_file);

        // 3. Apply environment variable overrides
        let with_env = vrows::config::apply_env_overrides(merged);

        // 4. Apply CLI argument overrides
        vrows::config::apply_cli_overrides(with_env, &args.overrides())
    };
    config.validate()?;

    vrows::logging::init(&config.log_file_path)?;

    info!(
        config = ?config,
        "Configuration loaded and resolved"
    );

    let stats = run(&args, &config)?;

    println!("frames            {}", args.frames);
    println!("rows created      {}", stats.rows_created);
    println!("rows reused       {}", stats.rows_reused);
    println!("rows destroyed    {}", stats.rows_destroyed);
    println!("rebuilds          {}", stats.rebuilds);
    println!("coalesced         {}", stats.coalesced_requests);
    println!("visibility passes {}", stats.visibility_passes);
    println!("toggles           {}", stats.toggles);
    println!("unchanged content {}", stats.unchanged_content);

    Ok(())
}

fn inventory(name: &str, items: usize) -> Rc<Inventory> {
    let stock = (0..items)
        .map(|i| {
            let ore = ORES[i % ORES.len()];
            StoredItem::new(format!("{ore}-{i}"), 5.0 + (i % 40) as f64)
        })
        .collect();
    Rc::new(
        Inventory::new(name)
            .with_storage(50_000.0, stock)
            .with_sweep(false)
            .with_description("Bulk ore storage"),
    )
}

/// Scroll through a warehouse with the status row pinned, wrapping at the
/// bottom, then switch to a smaller crate halfway through. Every 60 frames one
/// stack changes mass and the stock is totalled in the background.
fn run(args: &Args, config: &ResolvedConfig) -> Result<EngineStats, Box<dyn std::error::Error>> {
    let container = SimContainer::new(Vec2::new(320.0, 480.0));
    let mut panel = SubjectPanel::new(
        InventoryBinder::new(PlainFormatter::new().with_string("SWEEP_ONLY", "Sweep only")),
        SimFactory::new(&container),
        &config.engine(),
    );
    panel.initialize(container.clone())?;
    let pool = AggregationPool::new(config.aggregation_workers, config.aggregation_timeout());

    let warehouse = inventory("Warehouse", args.rows);
    let small = inventory("Crate", args.rows / 4);
    let mut subject = Rc::clone(&warehouse);
    panel.on_select(Some(&subject));
    panel.pin(RowKey::new("status")?);

    for frame in 1..=args.frames {
        if frame == args.frames / 2 {
            subject = Rc::clone(&small);
            let change = panel.on_select(Some(&subject));
            info!(frame, ?change, subject = subject.name(), "switched subject");
        }
        panel.on_tick(FrameTick::new(frame))?;
        container.layout();

        if container.content_height() > 0.0 {
            container.scroll_by(args.scroll_step);
            if container.scroll_offset().y + 480.0 > container.content_height() {
                container.scroll_to(Vec2::ZERO);
            }
            panel.on_scroll()?;
        }

        if frame % 60 == 0 {
            let Some(storage) = subject.try_get::<StorageBin>() else {
                continue;
            };
            let items: Arc<[StoredItem]> = {
                let mut items = storage.items.borrow_mut();
                if let Some(first) = items.first_mut() {
                    first.mass_kg += 1.0;
                }
                items.iter().cloned().collect()
            };

            match pool.sum_by(items, |i: &StoredItem| ore_of(&i.name), |i| i.mass_kg) {
                Ok(totals) => {
                    let total: f64 = totals.values().sum();
                    info!(frame, kinds = totals.len(), total_kg = total, "stock totals");
                }
                Err(err) => warn!(frame, error = %err, "stock totals unavailable"),
            }
        }
    }

    let stats = panel.scroll().stats();
    panel.dispose();
    Ok(stats)
}

/// `"iron-12"` → `"iron"`.
fn ore_of(name: &str) -> String {
    name.split('-').next().unwrap_or(name).to_string()
}
