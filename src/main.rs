use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use smiles_lookup::{
    batch::{run_batch_files, BatchOptions, InputFormat, ParallelMode},
    config::{LookupConfig, DEFAULT_OPSIN_URL, DEFAULT_PUBCHEM_URL, DEFAULT_SMILES_PROPERTY},
    logging::init_tracing,
    memoize::CacheMode,
    normalize::NameForms,
    pipeline::Pipeline,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    lookup: LookupArgs,

    /// Emit logs as JSON lines on stderr.
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct LookupArgs {
    /// Network attempts per PubChem REST query.
    #[arg(long, env = "SMILES_LOOKUP_RETRIES", default_value_t = 3)]
    retries: u32,

    /// Pause between PubChem REST attempts, in milliseconds.
    #[arg(long, env = "SMILES_LOOKUP_DELAY_MS", default_value_t = 1000)]
    delay_ms: u64,

    /// Per-request timeout, in seconds.
    #[arg(long, env = "SMILES_LOOKUP_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    #[arg(long, env = "SMILES_LOOKUP_PUBCHEM_URL", default_value = DEFAULT_PUBCHEM_URL)]
    pubchem_url: String,

    #[arg(long, env = "SMILES_LOOKUP_OPSIN_URL", default_value = DEFAULT_OPSIN_URL)]
    opsin_url: String,

    /// PubChem property holding the SMILES string.
    #[arg(long, env = "SMILES_LOOKUP_PROPERTY", default_value = DEFAULT_SMILES_PROPERTY)]
    property: String,
}

impl LookupArgs {
    fn config(&self) -> LookupConfig {
        LookupConfig {
            retries: self.retries,
            delay: Duration::from_millis(self.delay_ms),
            timeout: Duration::from_secs(self.timeout_secs),
            pubchem_url: self.pubchem_url.clone(),
            opsin_url: self.opsin_url.clone(),
            smiles_property: self.property.clone(),
            ..LookupConfig::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the given names and print a report for each.
    Lookup {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Resolve every row of a CSV or name-per-line file.
    Batch {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Header of the column holding chemical names.
        #[arg(short, long, default_value = "name")]
        column: String,

        #[arg(long, value_enum, default_value_t = InputFormat::Csv)]
        format: InputFormat,

        #[arg(long, value_enum, default_value_t = ParallelMode::None)]
        parallel: ParallelMode,

        #[arg(long, value_enum, default_value_t = CacheMode::Name)]
        cache: CacheMode,
    },
    /// Print the spellings that would be queried, without touching the network.
    Variants {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Lookup { names } => {
            let pipeline = Pipeline::from_config(&cli.lookup.config())?;
            for name in &names {
                let res = pipeline.fetch_best_smiles(name);
                println!("\nChemical: {name}");
                println!("  SMILES: {}", res.smiles.as_deref().unwrap_or("None"));
                println!("  Status: {}", res.status);
                println!("  Name/Synonym/Variant Used: {}", res.matched_name);
            }
        }
        Command::Batch {
            input,
            output,
            column,
            format,
            parallel,
            cache,
        } => {
            let pipeline = Pipeline::from_config(&cli.lookup.config())?;
            let options = BatchOptions {
                column,
                format,
                parallel,
                cache,
                ..BatchOptions::default()
            };
            let summary = run_batch_files(&pipeline, &input, &output, &options)
                .with_context(|| format!("batch {input:?} -> {output:?} failed"))?;
            println!(
                "{} rows: {} resolved, {} unresolved ({} cached)",
                summary.rows, summary.resolved, summary.unresolved, summary.cache_hits
            );
        }
        Command::Variants { names } => {
            for name in &names {
                let forms = NameForms::new(name);
                println!("\nChemical: {name}");
                println!("  Normalized: {}", forms.normalized);
                println!("  Cleaned: {}", forms.cleaned);
                for (i, variant) in forms.variants.iter().enumerate() {
                    println!("  Variant {i}: {variant}");
                }
            }
        }
    }
    Ok(())
}
