use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::recipes::{
    DEFAULT_RECIPE_PAGE_PREFIX, DEFAULT_RECIPE_TEMPLATE, DEFAULT_RECIPES_PER_PAGE,
    RecipePageSettings,
};
use crate::retry::RetryPolicy;

pub const DEFAULT_USER_AGENT: &str = "wikisync/0.2";
pub const DEFAULT_CONFIG_FILE: &str = "wikisync.toml";
pub const DEFAULT_ITEMS_FILE: &str = "Items.json";
pub const DEFAULT_RECIPES_FILE: &str = "Recipes.json";
pub const DEFAULT_ITEM_TEMPLATE: &str = "Item";
pub const DEFAULT_RECIPE_LIST_TEMPLATE: &str = "Recipes";
pub const DEFAULT_DATA_NAMESPACE: &str = "Data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Flag,
    Env,
    Config,
    Default,
}

impl ValueSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Env => "env",
            Self::Config => "config",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SyncConfig {
    #[serde(default)]
    pub wiki: WikiSection,
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub sync: SyncSection,
    #[serde(default)]
    pub retry: RetrySection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct WikiSection {
    pub api_url: Option<String>,
    pub user_agent: Option<String>,
    #[serde(default)]
    pub custom_namespaces: Vec<CustomNamespace>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CustomNamespace {
    pub name: String,
    pub id: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ExportSection {
    pub dir: Option<PathBuf>,
    pub items_file: Option<String>,
    pub recipes_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SyncSection {
    pub item_template: Option<String>,
    pub recipe_template: Option<String>,
    pub recipe_list_template: Option<String>,
    pub recipes_per_page: Option<usize>,
    pub recipe_page_prefix: Option<String>,
    pub data_namespace: Option<String>,
    pub game_name: Option<String>,
    #[serde(default)]
    pub clear_stale_list_params: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct RetrySection {
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}

impl SyncConfig {
    /// Resolve the wiki API URL with owned return: env > config > None.
    pub fn api_url_owned(&self) -> Option<String> {
        env_non_empty("WIKI_API_URL").or_else(|| self.wiki.api_url.clone())
    }

    /// Resolve user agent: env WIKI_USER_AGENT > config > DEFAULT_USER_AGENT.
    pub fn user_agent(&self) -> String {
        env_non_empty("WIKI_USER_AGENT")
            .or_else(|| self.wiki.user_agent.clone())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    pub fn namespace_id(&self, name: &str) -> Option<i32> {
        self.wiki
            .custom_namespaces
            .iter()
            .find(|namespace| namespace.name.eq_ignore_ascii_case(name.trim()))
            .map(|namespace| namespace.id)
    }

    /// Namespace id declared in `[wiki].custom_namespaces`. When absent the id
    /// is looked up on the wiki itself.
    pub fn data_namespace_id(&self) -> Option<i32> {
        self.namespace_id(self.data_namespace())
    }

    pub fn data_namespace(&self) -> &str {
        self.sync
            .data_namespace
            .as_deref()
            .unwrap_or(DEFAULT_DATA_NAMESPACE)
    }

    /// Export directory: flag > env ABF_EXPORTED_PATH > config.
    pub fn export_dir(&self, flag: Option<&Path>) -> Result<(PathBuf, ValueSource)> {
        if let Some(path) = flag {
            return Ok((path.to_path_buf(), ValueSource::Flag));
        }
        if let Some(value) = env_non_empty("ABF_EXPORTED_PATH") {
            return Ok((PathBuf::from(value), ValueSource::Env));
        }
        if let Some(dir) = &self.export.dir {
            return Ok((dir.clone(), ValueSource::Config));
        }
        bail!("export directory is not configured (pass --export-dir, set ABF_EXPORTED_PATH, or set [export].dir)")
    }

    pub fn items_file(&self, export_dir: &Path) -> PathBuf {
        export_dir.join(
            self.export
                .items_file
                .as_deref()
                .unwrap_or(DEFAULT_ITEMS_FILE),
        )
    }

    pub fn recipes_file(&self, export_dir: &Path) -> PathBuf {
        export_dir.join(
            self.export
                .recipes_file
                .as_deref()
                .unwrap_or(DEFAULT_RECIPES_FILE),
        )
    }

    pub fn item_template(&self) -> &str {
        self.sync
            .item_template
            .as_deref()
            .unwrap_or(DEFAULT_ITEM_TEMPLATE)
    }

    pub fn recipe_list_template(&self) -> &str {
        self.sync
            .recipe_list_template
            .as_deref()
            .unwrap_or(DEFAULT_RECIPE_LIST_TEMPLATE)
    }

    pub fn recipe_page_settings(&self) -> Result<RecipePageSettings> {
        let recipes_per_page = self
            .sync
            .recipes_per_page
            .unwrap_or(DEFAULT_RECIPES_PER_PAGE);
        if recipes_per_page == 0 {
            bail!("[sync].recipes_per_page must be at least 1");
        }
        Ok(RecipePageSettings {
            template: self
                .sync
                .recipe_template
                .clone()
                .unwrap_or_else(|| DEFAULT_RECIPE_TEMPLATE.to_string()),
            page_prefix: self
                .sync
                .recipe_page_prefix
                .clone()
                .unwrap_or_else(|| DEFAULT_RECIPE_PAGE_PREFIX.to_string()),
            recipes_per_page,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.retry.max_attempts.unwrap_or(defaults.max_attempts).max(1),
            base_delay: self
                .retry
                .base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_delay),
            max_delay: self
                .retry
                .max_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_delay),
        }
    }
}

/// Config file location: flag > env WIKISYNC_CONFIG > `wikisync.toml` in the
/// working directory.
pub fn resolve_config_path(flag: Option<&Path>) -> (PathBuf, ValueSource) {
    if let Some(path) = flag {
        return (path.to_path_buf(), ValueSource::Flag);
    }
    if let Some(value) = env_non_empty("WIKISYNC_CONFIG") {
        return (PathBuf::from(value), ValueSource::Env);
    }
    (PathBuf::from(DEFAULT_CONFIG_FILE), ValueSource::Default)
}

/// Load and parse a SyncConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<SyncConfig> {
    if !config_path.exists() {
        return Ok(SyncConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: SyncConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_config_returns_default_for_missing_file() {
        let config = load_config(Path::new("/nonexistent/wikisync.toml")).expect("load config");
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.item_template(), "Item");
        assert_eq!(config.recipe_list_template(), "Recipes");
        assert_eq!(config.data_namespace(), "Data");
    }

    #[test]
    fn load_config_parses_all_sections() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("wikisync.toml");
        fs::write(
            &config_path,
            r#"
[wiki]
api_url = "https://wiki.example.org/api.php"
user_agent = "test-agent/1.0"

[[wiki.custom_namespaces]]
name = "Data"
id = 3002

[export]
dir = "/srv/export"
items_file = "ItemsV2.json"

[sync]
item_template = "Infobox item"
recipes_per_page = 25
clear_stale_list_params = true

[retry]
max_attempts = 3
base_delay_ms = 250
"#,
        )
        .expect("write config");

        let config = load_config(&config_path).expect("load config");
        assert_eq!(
            config.wiki.api_url.as_deref(),
            Some("https://wiki.example.org/api.php")
        );
        assert_eq!(config.data_namespace_id(), Some(3002));
        assert_eq!(config.namespace_id("data"), Some(3002));
        assert_eq!(config.item_template(), "Infobox item");
        assert!(config.sync.clear_stale_list_params);
        assert_eq!(
            config.items_file(Path::new("/srv/export")),
            PathBuf::from("/srv/export/ItemsV2.json")
        );
        assert_eq!(
            config.recipes_file(Path::new("/srv/export")),
            PathBuf::from("/srv/export/Recipes.json")
        );

        let settings = config.recipe_page_settings().expect("settings");
        assert_eq!(settings.recipes_per_page, 25);
        assert_eq!(settings.page_prefix, "Data:Recipes/");

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(policy.max_delay, RetryPolicy::default().max_delay);
    }

    #[test]
    fn load_config_returns_error_for_invalid_toml() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("wikisync.toml");
        fs::write(&config_path, "[sync\nrecipes_per_page = 5").expect("write config");
        let error = load_config(&config_path).expect_err("must fail");
        assert!(error.to_string().contains("failed to parse"));
    }

    #[test]
    fn zero_recipes_per_page_is_rejected() {
        let config: SyncConfig =
            toml::from_str("[sync]\nrecipes_per_page = 0\n").expect("parse");
        let error = config.recipe_page_settings().expect_err("must fail");
        assert!(error.to_string().contains("recipes_per_page"));
    }

    #[test]
    fn export_dir_flag_wins_over_config() {
        let config: SyncConfig = toml::from_str("[export]\ndir = \"/from/config\"\n").expect("parse");
        let (dir, source) = config
            .export_dir(Some(Path::new("/from/flag")))
            .expect("export dir");
        assert_eq!(dir, PathBuf::from("/from/flag"));
        assert_eq!(source, ValueSource::Flag);
        assert_eq!(source.as_str(), "flag");
    }

    #[test]
    fn config_path_flag_wins() {
        let (path, source) = resolve_config_path(Some(Path::new("custom.toml")));
        assert_eq!(path, PathBuf::from("custom.toml"));
        assert_eq!(source, ValueSource::Flag);
    }

    #[test]
    fn unknown_namespace_has_no_id() {
        let config = SyncConfig::default();
        assert_eq!(config.data_namespace_id(), None);
    }
}
