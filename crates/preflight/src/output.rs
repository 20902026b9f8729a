//! Terminal rendering of filter results

use console::style;
use preflight_core::Recipe;
use preflight_filter::{ExcludedRecipe, FilterSummary, RecipeState};

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print compatible recipes, then every excluded one with its reason
pub fn print_summary(summary: &FilterSummary) {
    println!("\n{}", style("Compatible recipes").bold().underlined());
    if summary.compatible().is_empty() {
        println!("  {}", style("(none)").dim());
    }
    for recipe in summary.compatible() {
        println!("{}", compatible_line(recipe));
    }

    if summary.all_compatible() {
        return;
    }

    println!("\n{}", style("Excluded recipes").bold().underlined());
    for excluded in summary.report.excluded() {
        for line in excluded_lines(excluded) {
            println!("{}", line);
        }
    }
}

fn compatible_line(recipe: &Recipe) -> String {
    format!("{} {}", style("✓").green().bold(), recipe.label())
}

/// Marker per state: validation errors stand out from rejections
fn state_marker(state: RecipeState) -> console::StyledObject<&'static str> {
    match state {
        RecipeState::ValidationError => style("!").magenta().bold(),
        RecipeState::DetectedUnsupported => style("●").yellow().bold(),
        _ => style("✗").red().bold(),
    }
}

fn excluded_lines(excluded: &ExcludedRecipe) -> Vec<String> {
    let mut lines = vec![
        format!("{} {}", state_marker(excluded.state), excluded.name),
        format!("    {} {}", style("state:").dim(), excluded.state),
        format!("    {} {}", style("reason:").dim(), excluded.outcome),
    ];
    if let Some(info) = &excluded.info {
        lines.push(format!("    {} {}", style("info:").dim(), info));
    }
    lines
}
