//! Interface strings in English and Simplified Chinese
//!
//! Built-in tables are compiled in; a site can override any entry with
//! `languages/<lang>.yml` files in its base directory.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::helpers::Language;

const BUILTIN: [(&str, &str); 2] = [
    ("en", include_str!("en.yml")),
    ("zh-CN", include_str!("zh-CN.yml")),
];

/// Translation tables keyed by language, then by top-level section
pub struct I18n {
    language: String,
    translations: HashMap<String, HashMap<String, serde_yaml::Value>>,
}

impl I18n {
    /// An empty table set for `language`
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            translations: HashMap::new(),
        }
    }

    /// The compiled-in tables, reading in `language`
    pub fn builtin(language: Language) -> Result<Self> {
        let mut i18n = Self::new(language.code());
        for (lang, yaml) in BUILTIN {
            i18n.add_yaml(lang, yaml)?;
        }
        Ok(i18n)
    }

    /// Merge a YAML table into `lang`; top-level sections in `yaml` replace
    /// existing ones
    pub fn add_yaml(&mut self, lang: &str, yaml: &str) -> Result<()> {
        let data: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(yaml)?;
        self.translations
            .entry(lang.to_string())
            .or_default()
            .extend(data);
        Ok(())
    }

    /// Load `<lang>.yml` override files from a directory. Unparseable files
    /// are skipped with a warning.
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_yaml = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yml") | Some("yaml")
            );
            if !path.is_file() || !is_yaml {
                continue;
            }

            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = fs::read_to_string(&path)?;
            match self.add_yaml(lang, &content) {
                Ok(()) => tracing::debug!("Loaded language file: {:?}", path),
                Err(e) => tracing::warn!("Failed to parse language file {:?}: {}", path, e),
            }
        }

        Ok(())
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Look up a dotted key such as `nav.home`, falling back to English and
    /// then to the key itself
    pub fn get(&self, key: &str) -> String {
        [self.language.as_str(), "en"]
            .into_iter()
            .filter_map(|lang| self.translations.get(lang))
            .find_map(|data| get_nested_value(data, key))
            .map(yaml_value_to_string)
            .unwrap_or_else(|| key.to_string())
    }

    /// Pick `key.zero`, `key.one` or `key.other` by `count` and substitute
    /// `%d`
    pub fn get_plural(&self, key: &str, count: usize) -> String {
        let form = match count {
            0 => "zero",
            1 => "one",
            _ => "other",
        };
        self.get(&format!("{}.{}", key, form))
            .replace("%d", &count.to_string())
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new(Language::default().code())
    }
}

fn get_nested_value<'a>(
    data: &'a HashMap<String, serde_yaml::Value>,
    key: &str,
) -> Option<&'a serde_yaml::Value> {
    let mut parts = key.split('.');
    let mut current = data.get(parts.next()?)?;

    for part in parts {
        current = match current {
            serde_yaml::Value::Mapping(map) => map.get(part)?,
            _ => return None,
        };
    }

    Some(current)
}

fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => format!("{:?}", other),
    }
}
