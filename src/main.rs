//! accregex 命令行工具：校验规则、分类交易、规范化规则文件

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use accregex::{
    AccountClassifier, ClassifierConfig, ClassifyStats, ConfigManager, RuleLoader, Transaction,
    TransactionReader, write_account_rules,
};

/// Classify transactions into accounts using regex rules loaded from JSON.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and compile a rules file, then list its rules.
    Check {
        /// Path to the JSON rules file.
        rules: PathBuf,
    },
    /// Assign an account to each transaction in a CSV or JSON file.
    Classify {
        /// Path to the JSON rules file.
        rules: PathBuf,

        /// Transactions file (`.json` or CSV). Reads CSV from stdin when omitted.
        transactions: Option<PathBuf>,

        /// Account used when no rule matches.
        #[arg(long)]
        default_account: Option<String>,

        /// Match every rule case-insensitively.
        #[arg(short, long)]
        ignore_case: bool,

        /// Skip rules whose regex fails to compile instead of aborting.
        #[arg(long)]
        lenient: bool,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the rules file in canonical form.
    Normalize {
        /// Path to the JSON rules file.
        rules: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(args: Args) -> anyhow::Result<()> {
    match args.command {
        Command::Check { rules } => check(&rules),
        Command::Classify {
            rules,
            transactions,
            default_account,
            ignore_case,
            lenient,
            json,
        } => {
            let mut builder = ConfigManager::custom()
                .case_insensitive(ignore_case)
                .strict(!lenient);
            if let Some(account) = default_account {
                builder = builder.default_account(account);
            }
            classify(&rules, transactions.as_deref(), builder.build(), json)
        }
        Command::Normalize { rules } => normalize(&rules),
    }
}

fn check(rules_path: &Path) -> anyhow::Result<()> {
    let rules = RuleLoader::from_path(rules_path)
        .with_context(|| format!("Could not load rules from {}", rules_path.display()))?;
    AccountClassifier::new(&rules, ConfigManager::get_default()).context("Could not compile rules")?;

    println!("{}: {} rule(s) OK", rules_path.display(), rules.len());
    for (index, rule) in rules.iter().enumerate() {
        println!("  {index:>3}  {rule}");
    }

    Ok(())
}

fn classify(
    rules_path: &Path,
    transactions_path: Option<&Path>,
    config: ClassifierConfig,
    as_json: bool,
) -> anyhow::Result<()> {
    let classifier = AccountClassifier::from_path(rules_path, config)
        .with_context(|| format!("Could not load rules from {}", rules_path.display()))?;

    let transactions: Vec<Transaction> = match transactions_path {
        Some(path) => TransactionReader::from_path(path)
            .with_context(|| format!("Could not read transactions from {}", path.display()))?,
        None => TransactionReader::from_csv_reader(io::stdin().lock())
            .context("Could not read transactions from stdin")?,
    };

    let results = classifier.classify_all(&transactions);

    if as_json {
        let output: Vec<_> = transactions
            .iter()
            .zip(&results)
            .map(|(transaction, result)| {
                serde_json::json!({
                    "transaction": transaction,
                    "classification": result,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for (transaction, result) in transactions.iter().zip(&results) {
            match result {
                Some(classification) => println!("{transaction} -> {classification}"),
                None => println!("{transaction} -> <unmatched>"),
            }
        }
    }

    let stats = ClassifyStats::from_results(&results);
    tracing::info!(
        "classified {} transaction(s): {} matched, {} default, {} unmatched",
        stats.total,
        stats.matched,
        stats.fallback,
        stats.unmatched
    );

    Ok(())
}

fn normalize(rules_path: &Path) -> anyhow::Result<()> {
    let rules = RuleLoader::from_path(rules_path)
        .with_context(|| format!("Could not load rules from {}", rules_path.display()))?;
    println!("{}", write_account_rules(&rules)?);
    Ok(())
}
