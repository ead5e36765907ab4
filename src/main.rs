use clap::{Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use seating_chart::config::{Config, DEFAULT_BIND, DEFAULT_DATA_DIR, DEFAULT_PORT, DEFAULT_STATIC_DIR};
use seating_chart::display::{print_chart, write_chart_to_file};
use seating_chart::parser::load_roster_csv;
use seating_chart::roster::NO_GROUPING;
use seating_chart::seating::{generate, generate_with_rng, Grouping, GroupingType};
use seating_chart::store::JsonStore;
use seating_chart::web;

#[derive(Parser)]
#[command(name = "seating-chart", version, about = "Classroom seating chart generator")]
struct Cli {
    /// Directory holding saved rosters and preferences
    #[arg(long, global = true, env = "SEATING_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server
    Serve {
        #[arg(long, env = "SEATING_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
        #[arg(long, env = "SEATING_BIND", default_value = DEFAULT_BIND)]
        bind: String,
        #[arg(long, default_value = DEFAULT_STATIC_DIR)]
        static_dir: PathBuf,
    },
    /// Import a CSV file as a named roster
    Import { name: String, csv: PathBuf },
    /// List saved rosters
    Rosters,
    /// Generate a seating chart for a saved roster
    Generate {
        name: String,
        /// Roster column to group by
        #[arg(long, default_value = NO_GROUPING)]
        group_by: String,
        #[arg(long, default_value = "mixed")]
        mode: GroupingType,
        /// Seed for a reproducible chart
        #[arg(long)]
        seed: Option<u64>,
        /// Also write the chart to this text file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show preferences, updating any values given
    Preferences {
        #[arg(long)]
        tables: Option<usize>,
        #[arg(long)]
        per_table: Option<usize>,
        #[arg(long)]
        min_per_table: Option<usize>,
        /// Restore default table names and colors
        #[arg(long)]
        reset_tables: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, bind, static_dir } => {
            let config = Config::new()
                .data_dir(cli.data_dir)
                .bind(bind)
                .port(port)
                .static_dir(static_dir);
            println!("Access the site at http://localhost:{}", config.port);
            web::start_server(config).await?;
        }
        Commands::Import { name, csv } => {
            let store = JsonStore::open(&cli.data_dir)?;
            println!("Loading roster from {}...", csv.display());
            let roster = load_roster_csv(&csv)?;
            store.save_roster(&name, &roster)?;
            println!("Roster \"{}\" saved with {} students", name, roster.len());
        }
        Commands::Rosters => {
            let store = JsonStore::open(&cli.data_dir)?;
            let active = store.active_roster()?;
            for name in store.list_rosters()? {
                let marker = if name == active { "*" } else { " " };
                println!("{} {}", marker, name);
            }
        }
        Commands::Generate { name, group_by, mode, seed, out } => {
            let store = JsonStore::open(&cli.data_dir)?;
            let roster = store.load_roster(&name)?;
            let prefs = store.load_preferences()?;
            let grouping = Grouping::from_selection(&group_by, mode);

            let chart = match seed {
                Some(seed) => generate_with_rng(&roster, &prefs, &grouping, &mut StdRng::seed_from_u64(seed))?,
                None => generate(&roster, &prefs, &grouping)?,
            };
            print_chart(&name, &chart);

            if let Some(out) = out {
                write_chart_to_file(&name, &chart, &out)?;
                println!("\nChart saved to {}", out.display());
            }
        }
        Commands::Preferences { tables, per_table, min_per_table, reset_tables } => {
            let store = JsonStore::open(&cli.data_dir)?;
            let mut prefs = store.load_preferences()?;
            if tables.is_some() || per_table.is_some() || min_per_table.is_some() || reset_tables {
                prefs.num_tables = tables.unwrap_or(prefs.num_tables);
                prefs.students_per_table = per_table.unwrap_or(prefs.students_per_table);
                prefs.min_students_per_table = min_per_table.unwrap_or(prefs.min_students_per_table);
                if reset_tables {
                    prefs.reset_table_settings();
                }
                prefs.pad_table_settings();
                store.save_preferences(&prefs)?;
                info!("Preferences updated");
            }
            println!("Tables: {}", prefs.num_tables);
            println!("Students per table: {}", prefs.students_per_table);
            println!("Minimum students per table: {}", prefs.min_students_per_table);
            for (index, setting) in prefs.table_settings.iter().take(prefs.num_tables).enumerate() {
                println!("  {}: {} [{}]", index + 1, setting.name, setting.color);
            }
        }
    }

    Ok(())
}
