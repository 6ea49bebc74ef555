use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use anyhow::bail;
use indexmap::IndexMap;
use log::{debug, info};
use serde_json::{Map, Value};

use crate::{
    cast::Caster,
    data::{option::ValueTypeset, typeset::InputTypeset},
    defaults::{DefaultsMode, get_defaults},
    error::TypesetError,
    eval::{FieldEffect, resolve_typesets},
    merge::deep_override_map,
    sanitize::SanitizeRegistry,
    screen::Screen,
};

const DEFAULT_VALUES_PATH: &str = ".values.json";

/// Values file formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuesFormat {
    Json,
    Toml,
}

impl ValuesFormat {
    /// Format of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TypesetError::UnsupportedExtension`] for anything but
    /// `json`, `toml` and `tml`.
    pub fn from_path(path: &Path) -> Result<Self, TypesetError> {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        match ext {
            "json" => Ok(ValuesFormat::Json),
            "toml" | "tml" => Ok(ValuesFormat::Toml),
            other => Err(TypesetError::UnsupportedExtension(other.to_string())),
        }
    }

    /// Parse a values document into a map.
    pub fn parse(&self, content: &str) -> anyhow::Result<Map<String, Value>> {
        let value: Value = match self {
            ValuesFormat::Json => serde_json::from_str(content)?,
            ValuesFormat::Toml => {
                let v: toml::Value = toml::from_str(content)?;
                serde_json::to_value(v)?
            }
        };
        match value {
            Value::Object(map) => Ok(map),
            other => bail!("values document must be a map, got: {other}"),
        }
    }

    /// Render a values map.
    pub fn render(&self, values: &Map<String, Value>) -> anyhow::Result<String> {
        let s = match self {
            ValuesFormat::Json => serde_json::to_string_pretty(values)?,
            ValuesFormat::Toml => toml::to_string_pretty(&without_nulls(values))?,
        };
        Ok(s)
    }
}

/// Copy of `values` with every `null` removed, since TOML has no null.
fn without_nulls(values: &Map<String, Value>) -> Map<String, Value> {
    values
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), strip_null_value(v)))
        .collect()
}

fn strip_null_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(without_nulls(map)),
        Value::Array(list) => Value::Array(
            list.iter()
                .filter(|v| !v.is_null())
                .map(strip_null_value)
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Per-request state of one screen's form.
///
/// Binds the screen's validated input typesets and value typesets to the
/// values file they describe.
#[derive(Debug, Clone)]
pub struct FormData {
    /// Slug of the screen the form renders.
    pub screen: String,
    pub title: String,
    /// Validated input typesets.
    pub inputs: IndexMap<String, InputTypeset>,
    /// Value typesets used for casting and defaults.
    pub options: IndexMap<String, ValueTypeset>,
    /// Current clean values.
    pub values: Map<String, Value>,
    /// Whether values changed since loading.
    pub needs_save: bool,
    /// Path to the values file.
    pub path: PathBuf,
    sanitizers: SanitizeRegistry,
}

impl FormData {
    /// Build the form of `screen`, loading stored values from `path` when the
    /// file exists.
    ///
    /// Without a path, `.values.json` in the working directory is used.
    pub fn new(
        screen: &Screen,
        path: Option<impl AsRef<Path>>,
        sanitizers: SanitizeRegistry,
    ) -> anyhow::Result<Self> {
        let path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_VALUES_PATH));

        let content = if path.exists() {
            fs::read_to_string(&path)?
        } else {
            String::new()
        };
        Self::new_with_content(screen, &content, &path, sanitizers)
    }

    /// Build the form of `screen` from already loaded values content.
    pub fn new_with_content(
        screen: &Screen,
        content: &str,
        path: &Path,
        sanitizers: SanitizeRegistry,
    ) -> anyhow::Result<Self> {
        let format = ValuesFormat::from_path(path)?;
        let options = screen.value_typesets()?;

        let stored = if content.trim().is_empty() {
            Map::new()
        } else {
            format.parse(content)?
        };

        let mut form = FormData {
            screen: screen.slug.clone(),
            title: screen.title.clone(),
            inputs: screen.input_typesets(),
            options,
            values: Map::new(),
            needs_save: false,
            path: path.to_path_buf(),
            sanitizers,
        };

        let filled = get_defaults(&form.options, DefaultsMode::Fill);
        form.values = form.cast(&deep_override_map(&filled, &stored));
        debug!(
            "form `{}` loaded with {} stored values",
            form.screen,
            stored.len()
        );
        Ok(form)
    }

    /// Blank configuration for this form.
    pub fn defaults(&self) -> Map<String, Value> {
        get_defaults(&self.options, DefaultsMode::Default)
    }

    fn cast(&self, raw: &Map<String, Value>) -> Map<String, Value> {
        Caster::new(&self.sanitizers).cast_values(raw, &self.options)
    }

    /// Replace the values with a complete form submission.
    ///
    /// Fields missing from `raw` take their defaults, the way an unchecked
    /// checkbox is absent from a POST body. Returns whether values changed.
    pub fn submit(&mut self, raw: &Map<String, Value>) -> bool {
        let values = self.cast(raw);
        self.replace_values(values)
    }

    /// Apply a partial update on top of the current values.
    ///
    /// Returns whether values changed.
    pub fn update(&mut self, partial: &Map<String, Value>) -> bool {
        let values = self.cast(&deep_override_map(&self.values, partial));
        self.replace_values(values)
    }

    fn replace_values(&mut self, values: Map<String, Value>) -> bool {
        if values == self.values {
            return false;
        }
        self.values = values;
        self.needs_save = true;
        true
    }

    /// Visibility and enablement of every conditional input.
    pub fn effects(&self) -> Vec<FieldEffect> {
        resolve_typesets(&self.inputs, &self.values)
    }

    /// Persist changes, backing up the previous file first.
    pub fn on_exit(&mut self) -> anyhow::Result<()> {
        if !self.needs_save {
            return Ok(());
        }
        let format = ValuesFormat::from_path(&self.path)?;
        let s = format.render(&self.values)?;

        if self.path.exists() {
            let ext = self
                .path
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("");
            let bk = format!(
                "bk-{:?}.{ext}",
                SystemTime::now()
                    .duration_since(SystemTime::UNIX_EPOCH)?
                    .as_secs()
            );
            let backup_path = self.path.with_extension(bk);
            fs::copy(&self.path, &backup_path)?;
            info!("backup written to {}", backup_path.display());
        }
        fs::write(&self.path, s)?;
        self.needs_save = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn screen() -> Screen {
        Screen::new("social", "Social Media")
            .with_inputs(&json!({
                "enable_og": { "type": "checkbox" },
                "og_image": {
                    "type": "text",
                    "conditions": { "enable_og": { "operator": "==", "right_value": true } },
                },
            }))
            .with_options(&json!({
                "enable_og": { "type": "bool", "value": false },
                "og_image": {
                    "type": "string",
                    "value": "",
                    "sanitize": { "string": [["esc_url_raw"]] },
                },
                "post_types": {
                    "type": "cast_dynamic",
                    "items": { "post": "Posts", "page": "Pages" },
                    "cast_dynamic": { "title": { "type": "string", "value": "%title%" } },
                },
            }))
    }

    fn form(content: &str, path: &Path) -> FormData {
        FormData::new_with_content(&screen(), content, path, SanitizeRegistry::with_builtins())
            .unwrap()
    }

    #[test]
    fn test_defaults_when_empty() {
        let form = form("", Path::new("social.json"));
        assert_eq!(form.values["enable_og"], json!(false));
        assert_eq!(form.values["post_types"]["page"], json!({ "title": "%title%" }));
        assert!(!form.needs_save);
        assert_eq!(Value::Object(form.defaults())["post_types"], Value::Null);
    }

    #[test]
    fn test_stored_values_override_defaults() {
        let form = form(
            r#"{ "enable_og": true, "post_types": { "post": { "title": "%post_title%" } } }"#,
            Path::new("social.json"),
        );
        assert_eq!(form.values["enable_og"], json!(true));
        assert_eq!(form.values["post_types"]["post"]["title"], json!("%post_title%"));
        assert_eq!(form.values["post_types"]["page"]["title"], json!("%title%"));
    }

    #[test]
    fn test_toml_values() {
        let form = form("enable_og = true\nog_image = \"https://x.test/a.png\"\n", Path::new("v.toml"));
        assert_eq!(form.values["og_image"], json!("https://x.test/a.png"));
    }

    #[test]
    fn test_toml_save_skips_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v.toml");
        let screen = Screen::new("s", "S").with_options(&json!({
            "title": { "type": "string" },
            "n": { "type": "int", "value": 0 },
            "list": { "type": "array", "value": [1, null, 2] },
        }));

        let mut form = FormData::new(&screen, Some(&path), SanitizeRegistry::new()).unwrap();
        assert_eq!(form.values["title"], Value::Null);
        assert!(form.submit(json!({ "n": 3 }).as_object().unwrap()));
        form.on_exit().unwrap();

        let saved = ValuesFormat::Toml
            .parse(&fs::read_to_string(&path).unwrap())
            .unwrap();
        assert_eq!(Value::Object(saved), json!({ "n": 3, "list": [1, 2] }));

        let reloaded = FormData::new(&screen, Some(&path), SanitizeRegistry::new()).unwrap();
        assert_eq!(reloaded.values["n"], json!(3));
        assert_eq!(reloaded.values["title"], Value::Null);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = FormData::new_with_content(
            &screen(),
            "",
            Path::new("values.yaml"),
            SanitizeRegistry::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TypesetError>(),
            Some(TypesetError::UnsupportedExtension(ext)) if ext == "yaml"
        ));
    }

    #[test]
    fn test_submit_and_effects() {
        let mut form = form("", Path::new("social.json"));
        assert_eq!(form.effects()[0].effect, crate::eval::Effect::Hide);

        let raw = json!({ "enable_og": true, "og_image": "javascript:alert(1)" });
        assert!(form.submit(raw.as_object().unwrap()));
        assert!(form.needs_save);
        assert_eq!(form.values["og_image"], json!(""));
        assert_eq!(form.effects()[0].effect, crate::eval::Effect::Show);

        assert!(!form.submit(raw.as_object().unwrap()));
    }

    #[test]
    fn test_update_keeps_other_values() {
        let mut form = form(r#"{ "enable_og": true }"#, Path::new("social.json"));
        let partial = json!({ "og_image": "/logo.png" });
        assert!(form.update(partial.as_object().unwrap()));
        assert_eq!(form.values["enable_og"], json!(true));
        assert_eq!(form.values["og_image"], json!("/logo.png"));
    }

    #[test]
    fn test_save_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("social.json");
        fs::write(&path, r#"{ "enable_og": false }"#).unwrap();

        let mut form = FormData::new(&screen(), Some(&path), SanitizeRegistry::with_builtins())
            .unwrap();
        form.on_exit().unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);

        form.update(json!({ "enable_og": true }).as_object().unwrap());
        form.on_exit().unwrap();
        assert!(!form.needs_save);

        let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["enable_og"], json!(true));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
