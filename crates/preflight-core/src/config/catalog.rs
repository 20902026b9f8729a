//! Recipe catalog and host snapshot loading
//!
//! Both files are YAML; a JSON host snapshot is accepted as well since JSON
//! is a subset of YAML.

use crate::error::{Error, Result};
use crate::types::{HostSnapshot, Recipe};
use camino::Utf8Path;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use tracing::debug;

/// A recipe file is either a bare list or a mapping with a `recipes` key
#[derive(Deserialize)]
#[serde(untagged)]
enum RecipeDocument {
    List(Vec<Recipe>),
    Catalog { recipes: Vec<Recipe> },
}

/// Load recipes from a YAML file
pub fn load_recipes(path: &Utf8Path) -> Result<Vec<Recipe>> {
    let content = read_file(path)?;
    let recipes = parse_recipes(&content)?;
    debug!("Loaded {} recipe(s) from {}", recipes.len(), path);
    Ok(recipes)
}

/// Parse recipes from YAML content
///
/// Rejects recipes without a name and names that appear more than once.
pub fn parse_recipes(content: &str) -> Result<Vec<Recipe>> {
    let recipes = match serde_yaml_ng::from_str::<RecipeDocument>(content)? {
        RecipeDocument::List(recipes) => recipes,
        RecipeDocument::Catalog { recipes } => recipes,
    };

    let mut seen = HashSet::new();
    for (index, recipe) in recipes.iter().enumerate() {
        if recipe.name.trim().is_empty() {
            return Err(Error::invalid_recipe(
                format!("#{}", index + 1),
                "recipe name cannot be empty",
            ));
        }
        if !seen.insert(recipe.name.as_str()) {
            return Err(Error::duplicate_recipe(&recipe.name));
        }
    }

    Ok(recipes)
}

/// Load a host snapshot from a YAML or JSON file
pub fn load_host_snapshot(path: &Utf8Path) -> Result<HostSnapshot> {
    let content = read_file(path)?;
    let host = parse_host_snapshot(&content)?;
    debug!(
        "Loaded host snapshot from {}: os={} version={} processes={}",
        path,
        host.os,
        host.platform_version,
        host.discovered_processes.len()
    );
    Ok(host)
}

/// Parse a host snapshot from YAML or JSON content
///
/// Content that opens with `{` is parsed as JSON so syntax errors are
/// reported against JSON rather than YAML.
pub fn parse_host_snapshot(content: &str) -> Result<HostSnapshot> {
    if content.trim_start().starts_with('{') {
        Ok(serde_json::from_str(content)?)
    } else {
        Ok(serde_yaml_ng::from_str(content)?)
    }
}

fn read_file(path: &Utf8Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::config_not_found(path.as_str())
        } else {
            Error::Io(e)
        }
    })
}
