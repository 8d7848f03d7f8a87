use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use tripcase::config::{parse_assignment, parse_weight, QueryConfig};
use tripcase::{results_table, Gazetteer, PlaceCache, QueryReport, RawCase, StorageManager, Table};

/// Retrieve and adapt holiday packages from a case base
#[derive(Parser, Debug)]
#[command(name = "tripcase")]
#[command(about = "Case-based retrieval of holiday packages", long_about = None)]
struct Args {
    /// Path to the data directory
    #[arg(short, long, default_value = "./data", global = true)]
    data_dir: PathBuf,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Extra gazetteer entries (JSON object of name -> location)
    #[arg(long, global = true)]
    gazetteer: Option<PathBuf>,

    /// Query configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a .cases or .csv file as the case base
    Import {
        file: PathBuf,
        /// Replace an existing case base
        #[arg(long)]
        force: bool,
    },
    /// Run a query against the case base
    Query {
        /// Query attribute, repeatable
        #[arg(long = "set", value_name = "ATTRIBUTE=VALUE", value_parser = parse_assignment, required = true)]
        set: Vec<(String, String)>,
        /// How many cases to retrieve
        #[arg(long)]
        retrieve: Option<usize>,
        /// Do not adapt the best match
        #[arg(long)]
        no_adapt: bool,
        /// Show per-field similarities (normalised/weighted)
        #[arg(long)]
        verbose: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Weight override, repeatable
        #[arg(long = "weight", value_name = "ATTRIBUTE=WEIGHT", value_parser = parse_weight)]
        weights: Vec<(String, f64)>,
    },
    /// List attributes, or describe one
    Names { attribute: Option<String> },
    /// Show what is stored in the data directory
    Status {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    debug!("tripcase v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);

    let storage = StorageManager::open(&args.data_dir)?;
    match args.command {
        Command::Import { ref file, force } => import(&storage, &args, file, force),
        Command::Query { ref set, retrieve, no_adapt, verbose, json, ref weights } => {
            let mut config = match &args.config {
                Some(path) => QueryConfig::load(path)?,
                None => QueryConfig::default(),
            };
            if let Some(retrieve) = retrieve {
                config.retrieve = retrieve;
            }
            config.adapt &= !no_adapt;
            config.verbose_results |= verbose;
            config.weights.extend(weights.iter().cloned());
            config.validate()?;
            query(&storage, &args, set, &config, json)
        }
        Command::Names { ref attribute } => names(&storage, attribute.as_deref()),
        Command::Status { json } => status(&storage, json),
    }
}

fn places(args: &Args) -> anyhow::Result<PlaceCache<Gazetteer>> {
    let mut gazetteer = Gazetteer::builtin();
    if let Some(path) = &args.gazetteer {
        let extra = Gazetteer::from_json_file(path)
            .with_context(|| format!("failed to load gazetteer {}", path.display()))?;
        info!("Loaded {} gazetteer entries from {}", extra.len(), path.display());
        gazetteer.extend(extra);
    }
    Ok(PlaceCache::new(gazetteer))
}

fn import(storage: &StorageManager, args: &Args, file: &Path, force: bool) -> anyhow::Result<()> {
    let places = places(args)?;
    let report = storage.import_file(file, &places, force)?;

    println!(
        "Parsed {} records: imported {}, skipped {}.",
        report.parsed, report.imported, report.skipped
    );
    if !report.unresolved.is_empty() {
        println!("Unresolved places (distance 0 to any other place):");
        for name in &report.unresolved {
            println!("  {}", name);
        }
    }

    let mut table = Table::new(["Attribute", "Low", "High"]);
    let (lo, hi): (BTreeMap<_, _>, BTreeMap<_, _>) = report
        .ranges
        .iter()
        .map(|(name, range)| {
            (
                (name.to_string(), format!("{:.6}", range.lo)),
                (name.to_string(), format!("{:.6}", range.hi)),
            )
        })
        .unzip();
    table.push_column(lo);
    table.push_column(hi);
    print!("{}", table);
    Ok(())
}

fn query(
    storage: &StorageManager,
    args: &Args,
    set: &[(String, String)],
    config: &QueryConfig,
    json: bool,
) -> anyhow::Result<()> {
    let case_base = storage.load_case_base()?.with_weights(&config.weights)?;
    let places = places(args)?;

    let raw: RawCase = set.iter().cloned().collect();
    let query = case_base.query(&raw, &places)?;
    if query.is_empty() {
        bail!("No query to run.");
    }

    let retrieval = case_base.matcher.run(&query, config.retrieve, config.adapt)?;
    let report = QueryReport::new(&query, &retrieval, case_base.matcher.len(), config.verbose_results || json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    if report.results.is_empty() {
        println!("No result.");
        return Ok(());
    }

    print!("{}", results_table(&report, config.verbose_results));
    if config.verbose_results {
        let stats = &report.stats;
        println!(
            "Retrieved {} of {} cases, average similarity {:.3}, best {:.3}{}",
            stats.results_count,
            stats.candidates_count,
            stats.avg_score,
            stats.best_score,
            stats
                .top_contributing_field
                .as_ref()
                .map(|field| format!(" (top field: {})", field))
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn names(storage: &StorageManager, attribute: Option<&str>) -> anyhow::Result<()> {
    let schema = storage.schema();
    match attribute {
        None => {
            println!("Possible attributes:");
            let mut columns: [BTreeMap<String, String>; 4] = Default::default();
            for spec in schema.fields() {
                let cells = [
                    spec.weight.to_string(),
                    spec.is_adaptable().to_string(),
                    spec.is_adjustable().to_string(),
                    spec.metric.name().to_string(),
                ];
                for (column, cell) in columns.iter_mut().zip(cells) {
                    column.insert(spec.name.clone(), cell);
                }
            }
            let mut table = Table::new(["Attribute name", "Weight", "Adaptable", "Adjusted", "Metric"]);
            for column in columns {
                table.push_column(column);
            }
            print!("{}", table);
            println!();
            println!("Weight is the weight of the attribute for case similarity.");
            println!("Adaptable attributes are adapted to the query value.");
            println!("Adjusted attributes follow the adaptation of the adaptable ones.");
            println!();
            println!("Run 'tripcase names <attribute>' for help on an attribute.");
        }
        Some(name) => {
            let spec = schema.resolve_name(name)?;
            println!("Attribute :  {}", spec.name);
            println!("Weight    :  {}", spec.weight);
            println!("Adaptable :  {}", spec.is_adaptable());
            println!("Adjusted  :  {}", spec.is_adjustable());
            println!("Matching  :  {}", spec.matching);
            println!();
            println!("{}", spec.help);
        }
    }
    Ok(())
}

fn status(storage: &StorageManager, json: bool) -> anyhow::Result<()> {
    let status = storage.status()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    if !status.exists {
        println!("No cases found (looking in {}).", status.snapshot.display());
        println!("Run 'tripcase import <FILE>' to create a case base.");
        return Ok(());
    }
    println!("Currently {} cases loaded from {}.", status.cases, status.snapshot.display());
    if let Some(created_at) = status.created_at {
        println!("Imported {}.", created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    for (name, range) in status.ranges.iter() {
        println!("  {:<16} {:.6} - {:.6}", name, range.lo, range.hi);
    }
    Ok(())
}
