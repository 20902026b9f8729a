//! Check command - filter a recipe catalog against a host snapshot

use std::sync::Arc;

use anyhow::{Context, Result};
use camino::Utf8Path;
use preflight_core::{load_host_snapshot, load_recipes, FilterSettings, PreflightConfig};
use preflight_filter::{
    CancellationToken, FilterError, FilterSummary, LoggingSubscriber, RecipeFilterRunner,
    StatusReporter, StatusSubscriber,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::cli::{CheckArgs, OutputFormat};
use crate::output;

/// Every recipe is compatible
const EXIT_OK: i32 = 0;

/// At least one recipe is excluded, or the host itself was rejected
const EXIT_EXCLUDED: i32 = 1;

/// Interrupted with Ctrl-C
const EXIT_CANCELLED: i32 = 130;

/// Run the check command
pub async fn run(args: CheckArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let mut config = PreflightConfig::load(config_path).context("Failed to load configuration")?;
    apply_jobs(&mut config.filter, args.jobs);

    let recipes = load_recipes(&args.recipes)
        .with_context(|| format!("Failed to load recipes from {}", args.recipes))?;
    let host = load_host_snapshot(&args.host)
        .with_context(|| format!("Failed to load host snapshot from {}", args.host))?;

    let subscribers: Vec<Arc<dyn StatusSubscriber>> = vec![Arc::new(LoggingSubscriber)];
    let reporter = Arc::new(StatusReporter::new(subscribers));
    let runner = RecipeFilterRunner::from_settings(&config.filter, reporter);

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling running validations");
            ctrl_c_token.cancel();
        }
    });

    let result = runner.filter_compatible(&token, &recipes, &host).await;
    let code = exit_code(&result);
    let summary = match result {
        Ok(summary) => summary,
        Err(FilterError::Cancelled) => {
            output::warning("Recipe filtering was cancelled");
            std::process::exit(code);
        }
        Err(e) => return Err(e.into()),
    };

    match args.format {
        OutputFormat::Human => output::print_summary(&summary),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary_document(&summary))?)
        }
    }

    if code != EXIT_OK {
        debug!("{} recipe(s) excluded", summary.report.len());
        std::process::exit(code);
    }

    Ok(())
}

/// `--jobs` replaces the configured concurrency
fn apply_jobs(settings: &mut FilterSettings, jobs: Option<usize>) {
    if let Some(jobs) = jobs {
        settings.max_concurrency = jobs.max(1);
    }
}

/// Process exit code for a filter run
fn exit_code(result: &std::result::Result<FilterSummary, FilterError>) -> i32 {
    match result {
        Ok(summary) if summary.all_compatible() => EXIT_OK,
        Ok(_) => EXIT_EXCLUDED,
        Err(FilterError::Cancelled) => EXIT_CANCELLED,
        Err(FilterError::RecipesExcluded(_) | FilterError::HostIncompatible { .. }) => {
            EXIT_EXCLUDED
        }
    }
}

/// JSON rendering of a filter summary
fn summary_document(summary: &FilterSummary) -> Value {
    let excluded: Vec<Value> = summary
        .report
        .excluded()
        .iter()
        .map(|excluded| {
            json!({
                "name": excluded.name,
                "displayName": excluded.display_name,
                "state": excluded.state.to_string(),
                "kind": excluded.outcome.kind(),
                "message": excluded.outcome.to_string(),
                "info": excluded.info,
            })
        })
        .collect();

    json!({
        "compatible": summary.compatible().iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        "excluded": excluded,
    })
}
