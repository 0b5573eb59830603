mod cli;
mod render;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use sigsim_compute::{BatchOrchestrator, CancelToken, ScoringConfig, StepDown};
use sigsim_core::config::{load_dotenv, Config};
use sigsim_llm::{annotate_results, create_summarizer, AnnotateOptions};
use sigsim_rules::{parse_rule_file, DirectoryCorpus};

use crate::cli::{CliArgs, OutputFormat};
use crate::render::RunOutput;

const SUMMARY_CONCURRENCY: usize = 4;

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();

    // Logs go to stderr so stdout stays clean for results.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let mut config = Config::from_env().context("invalid environment configuration")?;
    args.apply(&mut config);
    config.log_summary();

    let mut scoring =
        ScoringConfig::from_settings(&config.scoring).context("invalid scoring configuration")?;
    if args.step_down {
        scoring = scoring.with_step_down(StepDown::default());
    }
    let target = parse_rule_file(&args.target)
        .with_context(|| format!("failed to read target rule {}", args.target.display()))?;
    let corpus = Arc::new(DirectoryCorpus::open(&config.corpus.rules_dir).with_context(|| {
        format!(
            "failed to open rules directory {}",
            config.corpus.rules_dir.display()
        )
    })?);
    info!("Loaded {} corpus rules", corpus.len());

    let orchestrator = BatchOrchestrator::new(scoring, config.scoring.resolved_workers())?;
    let cancel = match config.scoring.batch_timeout_secs {
        0 => CancelToken::new(),
        secs => CancelToken::with_timeout(Duration::from_secs(secs)),
    };
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling batch");
            interrupt.cancel();
        }
    });

    // Scoring is CPU-bound; keep it off the async workers.
    let (mut results, report) = {
        let target = target.clone();
        let corpus = Arc::clone(&corpus);
        let first_only = args.first;
        tokio::task::spawn_blocking(move || {
            if first_only {
                let hit = orchestrator.find_first(&target, &*corpus, &cancel)?;
                Ok::<_, anyhow::Error>((hit.into_iter().collect::<Vec<_>>(), None))
            } else {
                let outcome = orchestrator.compare_all(&target, &*corpus, &cancel)?;
                Ok((outcome.results, Some(outcome.report)))
            }
        })
        .await
        .context("scoring task failed")??
    };

    if config.ollama.enabled && !results.is_empty() {
        match create_summarizer(&config.ollama) {
            Ok(summarizer) => {
                let options = AnnotateOptions {
                    timeout: Duration::from_secs(config.ollama.timeout_secs),
                    concurrency: SUMMARY_CONCURRENCY,
                };
                annotate_results(
                    &mut results,
                    &target,
                    &*corpus,
                    &*summarizer,
                    &options,
                )
                .await;
            }
            Err(e) => warn!(error = %e, "Summaries disabled"),
        }
    }

    let rendered = match args.format {
        OutputFormat::Text => render::text(&target, &results, report.as_ref()),
        OutputFormat::Json => render::json(&RunOutput {
            target_id: &target.id,
            target_title: &target.title,
            results: &results,
            report: report.as_ref(),
        })?,
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Wrote results to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
