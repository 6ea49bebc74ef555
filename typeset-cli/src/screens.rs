//! Loading screen registration files into a [`ScreenRegistry`].
//!
//! A screen file is a JSON or TOML document:
//!
//! ```json
//! {
//!     "slug": "social",
//!     "title": "Social Media",
//!     "inputs": { "enable_og": { "type": "checkbox" } },
//!     "options": { "enable_og": { "type": "bool", "value": false } }
//! }
//! ```

use std::{fs, path::Path};

use anyhow::{Context, anyhow};
use log::{debug, warn};
use serde_json::{Map, Value};
use typeset::{Screen, ScreenRegistry, data::form::ValuesFormat};

/// Read a JSON or TOML document as a map.
pub fn read_map(path: &Path) -> anyhow::Result<Map<String, Value>> {
    let format = ValuesFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    format
        .parse(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn screen_from_map(path: &Path, map: &Map<String, Value>) -> anyhow::Result<Screen> {
    let slug = map
        .get("slug")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().to_string())
        })
        .ok_or_else(|| anyhow!("screen file without slug: {}", path.display()))?;
    let title = map
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(&slug)
        .to_string();

    let empty = Value::Object(Map::new());
    Ok(Screen::new(slug, title)
        .with_inputs(map.get("inputs").unwrap_or(&empty))
        .with_options(map.get("options").unwrap_or(&empty)))
}

/// Register every screen file found in `dir`.
///
/// Files with other extensions are skipped.
pub fn load_dir(dir: &Path) -> anyhow::Result<ScreenRegistry> {
    let mut registry = ScreenRegistry::new();
    let mut paths = fs::read_dir(dir)
        .with_context(|| format!("Failed to read screens directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect::<Vec<_>>();
    paths.sort();

    for path in paths {
        if ValuesFormat::from_path(&path).is_err() {
            debug!("skipping {}", path.display());
            continue;
        }
        let screen = screen_from_map(&path, &read_map(&path)?)?;
        if registry.contains(&screen.slug) {
            warn!("screen `{}` registered twice, {} wins", screen.slug, path.display());
        }
        let slug = screen.slug.clone();
        registry.register(slug, move || screen.clone())?;
    }
    Ok(registry)
}

/// Build a one-screen registry from a single screen file.
pub fn load_file(path: &Path) -> anyhow::Result<ScreenRegistry> {
    let screen = screen_from_map(path, &read_map(path)?)?;
    let mut registry = ScreenRegistry::new();
    let slug = screen.slug.clone();
    registry.register(slug, move || screen.clone())?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("social.json"),
            r#"{ "title": "Social", "inputs": { "og": { "type": "checkbox" } } }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("b.toml"),
            "slug = \"sitemap\"\n[options.enable]\ntype = \"bool\"\nvalue = true\n",
        )
        .unwrap();
        fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let registry = load_dir(dir.path()).unwrap();
        assert_eq!(registry.slugs().collect::<Vec<_>>(), vec!["sitemap", "social"]);

        let social = registry.build("social").unwrap();
        assert_eq!(social.title, "Social");
        assert_eq!(social.input_typesets().len(), 1);

        let sitemap = registry.build("sitemap").unwrap();
        assert_eq!(sitemap.value_typesets().unwrap().len(), 1);
    }
}
