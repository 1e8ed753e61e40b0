use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Targets owned by the digital-twin workspace.
pub const TARGET_PREFIXES: &[&str] = &["llm_service", "vector_store", "twin_rag", "digital_twin"];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let s = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

fn is_workspace_target(target: &str) -> bool {
    TARGET_PREFIXES.iter().any(|p| target.starts_with(p))
}

/// Formatting layer that renders only events emitted by workspace crates.
///
/// - RFC3339 UTC timestamps, compact single-line format with `file:line`
/// - Writes to **stderr**, keeping stdout free for chat output
/// - ANSI colors only when stderr is a terminal
///
/// Compose it in the binary together with a global [`EnvFilter`].
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stderr().is_terminal();
    let only_workspace = filter::filter_fn(|meta| is_workspace_target(meta.target()));

    let format = fmt::format()
        .compact()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_source_location(true);

    fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(use_ansi)
        .event_format(format)
        .with_filter(only_workspace)
}

/// Level directives for every workspace crate, e.g. `twin_rag=debug`.
pub fn level_directives(level: Level) -> Vec<Directive> {
    let lvl = level.as_str().to_lowercase();
    TARGET_PREFIXES
        .iter()
        .filter_map(|p| Directive::from_str(&format!("{p}={lvl}")).ok())
        .collect()
}

/// `RUST_LOG` if set, else `default`, with workspace crates raised to `level`.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    level_directives(level)
        .into_iter()
        .fold(base, |f, d| f.add_directive(d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_all_crates() {
        let ds = level_directives(Level::DEBUG);
        assert_eq!(ds.len(), TARGET_PREFIXES.len());
        assert_eq!(ds[2].to_string(), "twin_rag=debug");
    }

    #[test]
    fn target_filter() {
        assert!(is_workspace_target("vector_store::upstash"));
        assert!(!is_workspace_target("hyper::proto"));
    }
}
