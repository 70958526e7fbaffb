use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use grant_recommender::corpus::loader::load_tsv;
use grant_recommender::{RecommendError, RecommendationEngine, RecommenderConfig, ThemePredictor};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "grant-recommender", version, about = "Recommend researchers for a project proposal")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Grants TSV, overrides the config
    #[arg(long, global = true, env = "GRANTS_FILE")]
    grants: Option<PathBuf>,

    /// Directory holding theme_vectorizer.cbor and theme_model.cbor
    #[arg(long, global = true, env = "MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank researchers for a project title. Without a title, reads one title per line from stdin.
    Recommend {
        title: Option<String>,
        /// Use this theme instead of predicting one
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Theme distribution of the corpus
    Themes,
    /// Top predicted themes for a text
    Predict {
        text: String,
        #[arg(long, default_value_t = 2)]
        k: usize,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // library errors keep their machine readable kind
            let payload = match err.downcast_ref::<RecommendError>() {
                Some(e) => serde_json::to_value(e.payload()).unwrap_or_default(),
                None => serde_json::json!({ "kind": "internal", "message": format!("{err:#}") }),
            };
            println!("{payload}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<RecommenderConfig> {
    let mut config = match &cli.config {
        Some(path) => RecommenderConfig::load(path)?,
        None => RecommenderConfig::default(),
    };
    if let Some(grants) = &cli.grants {
        config.data.grants_file = grants.clone();
    }
    if let Some(model_dir) = &cli.model_dir {
        config.data.model_dir = model_dir.clone();
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    match &cli.command {
        Command::Recommend { title, theme, top_n } => {
            let start = Instant::now();
            let engine = RecommendationEngine::from_config(config)?;
            info!(elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "engine ready");

            let top_n = top_n.unwrap_or(engine.config().scoring.default_top_n);
            // blank theme means "predict"
            let theme = theme.as_deref().map(str::trim).filter(|t| !t.is_empty());
            match title {
                Some(title) => run_query(&engine, title, theme, top_n, cli.pretty)?,
                None => run_interactive(&engine, theme, top_n, cli.pretty)?,
            }
        }
        Command::Themes => {
            let corpus = load_tsv(&config.data.grants_file)?;
            let dist: Vec<_> = corpus
                .theme_distribution()
                .into_iter()
                .map(|(theme, count)| serde_json::json!({ "theme": theme, "count": count }))
                .collect();
            print_json(&dist, cli.pretty)?;
        }
        Command::Predict { text, k } => {
            let predictor = ThemePredictor::load(&config.data.model_dir)?;
            print_json(&predictor.top_k(text, *k), cli.pretty)?;
        }
    }
    Ok(())
}

fn run_query(engine: &RecommendationEngine, title: &str, theme: Option<&str>, top_n: usize, pretty: bool) -> anyhow::Result<()> {
    let start = Instant::now();
    let result = engine.recommend(title.trim(), theme, top_n);
    info!(
        theme = %result.resolved_theme,
        scored = result.total_candidates_scored,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "recommendation done"
    );
    let out = result.to_json(pretty).context("serialising recommendation")?;
    println!("{out}");
    Ok(())
}

fn run_interactive(engine: &RecommendationEngine, theme: Option<&str>, top_n: usize, pretty: bool) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stderr = io::stderr();
    loop {
        eprint!("Title> ");
        stderr.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }
        run_query(engine, trimmed, theme, top_n, pretty)?;
    }
    Ok(())
}
