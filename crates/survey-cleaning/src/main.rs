//! CLI entry point for cleaning a raw survey dataset.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use survey_cleaning::{
    CategoricalDraw, CleaningConfig, CleaningConfigBuilder, CleaningSummary, Pipeline, io,
};
use tracing::{error, info};

/// CLI-compatible categorical draw policy
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCategoricalDraw {
    /// Draw independently for every missing cell
    PerCell,
    /// Draw once per column and reuse it for every missing cell
    SharedBatch,
}

impl From<CliCategoricalDraw> for CategoricalDraw {
    fn from(cli: CliCategoricalDraw) -> Self {
        match cli {
            CliCategoricalDraw::PerCell => CategoricalDraw::PerCell,
            CliCategoricalDraw::SharedBatch => CategoricalDraw::SharedBatch,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Codebook-driven survey data cleaning",
    long_about = "Cleans a raw survey CSV column by column according to the semantic type \
                  declared for each variable in a codebook. Missing or malformed cells are \
                  replaced with draws from the column's own value distribution.\n\n\
                  EXAMPLES:\n  \
                  # Clean with a reproducible seed\n  \
                  survey-cleaning codebook.csv train.csv cleaned.csv --seed 42\n\n  \
                  # Write a JSON summary next to the output\n  \
                  survey-cleaning codebook.csv train.csv cleaned.csv --summary summary.json"
)]
struct Args {
    /// Path to the codebook CSV (columns: var_name, type_var)
    codebook: PathBuf,

    /// Path to the raw training data CSV
    training_data: PathBuf,

    /// Destination for the cleaned CSV
    cleaned_output: PathBuf,

    /// JSON configuration file; explicit flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for reproducible imputation
    #[arg(long)]
    seed: Option<u64>,

    /// How categorical replacement values are drawn
    #[arg(long, value_enum)]
    categorical_draw: Option<CliCategoricalDraw>,

    /// Category used for categorical columns with no parseable value
    #[arg(long, allow_negative_numbers = true)]
    fallback_category: Option<i64>,

    /// CSV field separator for input data and output
    #[arg(long)]
    separator: Option<char>,

    /// Write a JSON run summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Print the run summary as JSON to stdout instead of a text report
    ///
    /// Disables all logging so stdout only carries JSON.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    for path in [&args.codebook, &args.training_data] {
        if !path.exists() {
            return Err(anyhow!("Input file not found: {}", path.display()));
        }
    }

    let config = build_config(&args)?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let codebook = io::read_codebook(&args.codebook)?;
    let raw = io::read_raw_frame(&args.training_data, config.csv_separator)?;

    let pipeline = Pipeline::builder()
        .config(config.clone())
        .on_progress(|update| {
            if let (Some(done), Some(total)) = (update.items_processed, update.items_total)
                && (done % 500 == 0 || done == total)
            {
                info!(
                    "[{:.0}%] {}: {}/{} columns",
                    update.progress * 100.0,
                    update.stage.display_name(),
                    done,
                    total
                );
            }
        })
        .build()?;

    info!("Cleaning data...");
    let mut outcome = match pipeline.process(&raw, &codebook, &mut rng) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Cleaning failed: {}", e);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            return Err(anyhow!("Cleaning failed: {}", e));
        }
    };

    io::write_frame(&mut outcome.data, &args.cleaned_output, config.csv_separator)?;

    if let Some(ref summary_path) = config.summary_path {
        write_summary(&outcome.summary, summary_path)?;
        info!("Summary written to: {}", summary_path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
    } else {
        print_human_readable_summary(&outcome.summary, &args);
    }

    Ok(())
}

/// Merge the optional config file with explicit CLI flags.
fn build_config(args: &Args) -> Result<CleaningConfig> {
    let base = match &args.config {
        Some(path) => CleaningConfig::from_json_file(path)?,
        None => CleaningConfig::default(),
    };

    let mut builder = CleaningConfigBuilder::from_config(base);

    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    if let Some(draw) = args.categorical_draw {
        builder = builder.categorical_draw(draw.into());
    }
    if let Some(category) = args.fallback_category {
        builder = builder.fallback_category(category);
    }
    if let Some(separator) = args.separator {
        let byte = u8::try_from(separator)
            .map_err(|_| anyhow!("Separator '{}' is not a single-byte character", separator))?;
        builder = builder.csv_separator(byte);
    }
    if let Some(ref path) = args.summary {
        builder = builder.summary_path(path);
    }

    Ok(builder.build()?)
}

fn write_summary(summary: &CleaningSummary, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(summary)?)?;
    Ok(())
}

/// Print a short report of the run.
///
/// Uses `println!` on purpose: this is the command's output, not a log line.
fn print_human_readable_summary(summary: &CleaningSummary, args: &Args) {
    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();
    println!("Input:  {}", args.training_data.display());
    println!(
        "Output: {} ({} rows x {} columns)",
        args.cleaned_output.display(),
        summary.rows,
        summary.columns
    );
    println!("Duration: {}ms", summary.duration_ms);
    if let Some(seed) = summary.seed {
        println!("Seed: {}", seed);
    }
    println!();

    println!("Columns by type:");
    for (semantic_type, count) in summary.columns_by_type() {
        if count > 0 {
            println!("  {:<48} {}", semantic_type.codebook_label(), count);
        }
    }
    println!();

    println!("Imputed cells: {}", summary.total_imputed());
    let mut most_imputed: Vec<_> = summary
        .column_summaries
        .iter()
        .filter(|c| c.imputed_count > 0)
        .collect();
    most_imputed.sort_by(|a, b| b.imputed_count.cmp(&a.imputed_count));
    for column in most_imputed.iter().take(5) {
        println!(
            "  - {}: {} imputed ({:.1}%)",
            column.name,
            column.imputed_count,
            column.imputed_fraction() * 100.0
        );
    }
    if most_imputed.len() > 5 {
        println!("  ... and {} more columns", most_imputed.len() - 5);
    }
    println!();

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
