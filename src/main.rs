mod cli;
mod repl;

use std::path::Path;

use anyhow::{Context, bail};
use clap::Parser;
use colored::Colorize;
use llm_service::telemetry;
use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twin_rag::{Answer, StartupReport, TwinConfig, TwinServices};
use vector_store::{IngestOptions, load_profile};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the process environment is used as is.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("info", level))
        .with(telemetry::layer())
        .init();

    let cfg = TwinConfig::from_env().context("reading configuration")?;
    let services = TwinServices::from_config(&cfg);

    match cli.command {
        Command::Chat { top_k, auto_ingest } => {
            let report = startup(&services).await?;
            if auto_ingest {
                auto_ingest_profile(&services, &cfg, report.store.is_ok()).await;
            }
            let pipeline = services.pipeline();
            repl::banner(
                services.gateway().backend_name(),
                &cfg.chat.model,
            );
            repl::run(&pipeline, top_k.unwrap_or(pipeline.top_k())).await?;
        }
        Command::Ask {
            question,
            top_k,
            show_context,
        } => {
            let pipeline = services.pipeline();
            let top_k = top_k.unwrap_or(pipeline.top_k());
            let qa = pipeline.answer_with_context(&question, top_k).await;
            println!("{}", render_answer(&qa.answer));
            if show_context {
                println!("\n{}", "Context:".bold());
                for (i, c) in qa.context.iter().enumerate() {
                    let score = c.score.map(|s| format!("{s:.3}")).unwrap_or_else(|| "n/a".into());
                    println!("{:>2}. [{score}] {} ({}): {}", i + 1, c.title, c.category, c.text);
                }
            }
            if qa.answer.is_failure() {
                std::process::exit(1);
            }
        }
        Command::Ingest { file, reset } => {
            let path = file.unwrap_or_else(|| cfg.rag.profile_path.clone());
            let count = ingest(&services, &cfg, &path, reset).await?;
            println!("Ingested {count} chunks from {}", path.display());
        }
        Command::Health => {
            let report = services.startup_check().await;
            print_health(&report);
            if report.all_failed() {
                bail!("no backend is available");
            }
        }
    }

    Ok(())
}

/// Failures render with the marker in red; everything else as plain text.
pub(crate) fn render_answer(answer: &Answer) -> String {
    match answer {
        Answer::Failed(_) => answer.to_string().red().to_string(),
        _ => answer.to_string(),
    }
}

async fn startup(services: &TwinServices) -> anyhow::Result<StartupReport> {
    let report = services.startup_check().await;
    report.log();
    if report.all_failed() {
        print_health(&report);
        bail!("embedder, vector store and chat model are all unavailable");
    }
    Ok(report)
}

async fn ingest(
    services: &TwinServices,
    cfg: &TwinConfig,
    path: &Path,
    reset: bool,
) -> anyhow::Result<usize> {
    let chunks = load_profile(path).with_context(|| format!("loading {}", path.display()))?;
    info!(chunks = chunks.len(), path = %path.display(), "profile loaded");
    let opts = IngestOptions {
        reset,
        batch: upsert_batch(cfg),
    };
    let count = services.ingestor().ingest(&chunks, &opts).await?;
    Ok(count)
}

async fn auto_ingest_profile(services: &TwinServices, cfg: &TwinConfig, store_ok: bool) {
    if !store_ok {
        warn!("vector store unavailable; skipping auto-ingest");
        return;
    }
    let path = &cfg.rag.profile_path;
    let chunks = match load_profile(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "profile not loaded; skipping auto-ingest");
            return;
        }
    };
    let opts = IngestOptions {
        reset: false,
        batch: upsert_batch(cfg),
    };
    match services.ingestor().ingest_if_empty(&chunks, &opts).await {
        Ok(Some(n)) => info!(count = n, "index was empty; profile ingested"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "auto-ingest failed"),
    }
}

fn upsert_batch(cfg: &TwinConfig) -> usize {
    cfg.store
        .as_ref()
        .map(|s| s.upsert_batch)
        .unwrap_or_else(|_| IngestOptions::default().batch)
}

fn print_health(report: &StartupReport) {
    let line = |name: &str, r: Result<String, &String>| match r {
        Ok(detail) => println!("{} {name:<10} {detail}", "✅".green()),
        Err(e) => println!("{} {name:<10} {e}", "❌".red()),
    };
    line("embedder", report.embedder.as_ref().map(|m| format!("model {m}")));
    line(
        "store",
        report.store.as_ref().map(|i| {
            let dim = i.dimension.map(|d| d.to_string()).unwrap_or_else(|| "?".into());
            format!("{} vectors, dimension {dim}", i.vector_count)
        }),
    );
    line("generator", report.generator.as_ref().map(String::clone));
}
