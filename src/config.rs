use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::models::{RepoView, SortField, SortOrder, SortSpec};

/// Compiled-in copy of `ghclean.toml`, used as the lowest layer and as the
/// blueprint for the user config.
const BLUEPRINT: &str = include_str!("../ghclean.toml");

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub github_token: Option<String>,
    pub api_url: String,
    pub per_page: u32,
    pub max_pages: u32,
    pub default_sort: SortField,
    pub default_order: SortOrder,
    pub default_view: RepoView,
    pub log_file: Option<String>,
    pub prompt_for_token: bool,
}

impl Settings {
    pub fn new() -> anyhow::Result<Self> {
        let user_config_path = get_user_config_path()?;
        ensure_user_config(&user_config_path)?;
        let mut settings = Self::load_from(&user_config_path, Path::new("ghclean.toml"))?;
        if settings.github_token.is_none() {
            settings.github_token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        }
        Ok(settings)
    }

    /// Layers: blueprint -> user file -> local file -> `GHCLEAN_*` env vars.
    pub fn load_from(user_config: &Path, local_config: &Path) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from_str(BLUEPRINT, FileFormat::Toml))
            .add_source(File::from(user_config.to_path_buf()).required(false))
            .add_source(File::from(local_config.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("GHCLEAN").try_parsing(true))
            .build()?;

        let mut settings: Settings = s.try_deserialize()?;
        settings.per_page = settings.per_page.clamp(1, 100);
        settings.max_pages = settings.max_pages.max(1);
        Ok(settings)
    }

    pub fn sort_spec(&self) -> SortSpec {
        SortSpec { field: self.default_sort, order: self.default_order }
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
    }
}

pub fn get_user_config_path() -> anyhow::Result<PathBuf> {
    let mut path = dirs::home_dir().context("Failed to get home directory")?;
    path.push(".config");
    path.push("ghclean");
    path.push("ghclean.toml");
    Ok(path)
}

/// Writes the blueprint to `path` if no user config exists yet.
pub fn ensure_user_config(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create config directory {}", parent.display()))?;
    }
    fs::write(path, BLUEPRINT).with_context(|| format!("Could not write {}", path.display()))?;
    Ok(())
}

/// Sets `key` in the user config, or removes it when `value` is `None`.
fn update_user_config(path: &Path, key: &str, value: Option<toml::Value>) -> anyhow::Result<()> {
    let config_str = fs::read_to_string(path).unwrap_or_default();
    let mut doc = config_str.parse::<toml::Table>()?;

    match value {
        Some(value) => {
            doc.insert(key.to_string(), value);
        }
        None => {
            doc.remove(key);
        }
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, doc.to_string())?;

    Ok(())
}

pub fn save_token(path: &Path, token: &str) -> anyhow::Result<()> {
    update_user_config(path, "github_token", Some(toml::Value::String(token.to_string())))
}

pub fn clear_token(path: &Path) -> anyhow::Result<()> {
    update_user_config(path, "github_token", None)
}

pub fn disable_token_prompt(path: &Path) -> anyhow::Result<()> {
    update_user_config(path, "prompt_for_token", Some(toml::Value::Boolean(false)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blueprint_defaults_apply() {
        let dir = tempfile::tempdir().unwrap();
        let settings =
            Settings::load_from(&dir.path().join("missing.toml"), &dir.path().join("nope.toml"))
                .unwrap();
        assert_eq!(settings.api_url, "https://api.github.com");
        assert_eq!(settings.per_page, 30);
        assert_eq!(
            settings.sort_spec(),
            SortSpec { field: SortField::Updated, order: SortOrder::Descending }
        );
        assert_eq!(settings.default_view, RepoView::Owned);
        assert!(settings.prompt_for_token);
    }

    #[test]
    fn local_file_overrides_user_file() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("user.toml");
        let local = dir.path().join("local.toml");
        fs::write(&user, "per_page = 50\ndefault_sort = \"name\"\n").unwrap();
        fs::write(
            &local,
            "default_sort = \"stars\"\ndefault_order = \"asc\"\nper_page = 500\n",
        )
        .unwrap();

        let settings = Settings::load_from(&user, &local).unwrap();
        assert_eq!(settings.default_sort, SortField::Stars);
        assert_eq!(settings.default_order, SortOrder::Ascending);
        // clamped to the API maximum
        assert_eq!(settings.per_page, 100);
    }

    #[test]
    fn save_token_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("ghclean").join("ghclean.toml");
        ensure_user_config(&user).unwrap();
        save_token(&user, "ghp_test").unwrap();
        disable_token_prompt(&user).unwrap();

        let settings = Settings::load_from(&user, &dir.path().join("none.toml")).unwrap();
        assert_eq!(settings.github_token.as_deref(), Some("ghp_test"));
        assert!(!settings.prompt_for_token);
        assert_eq!(settings.max_pages, 10);
    }

    #[test]
    fn clear_token_removes_only_the_token() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("ghclean.toml");
        fs::write(&user, "github_token = \"ghp_old\"\nper_page = 50\n").unwrap();

        clear_token(&user).unwrap();
        let settings = Settings::load_from(&user, &dir.path().join("none.toml")).unwrap();
        assert_eq!(settings.github_token, None);
        assert_eq!(settings.per_page, 50);

        // nothing to remove is fine
        clear_token(&user).unwrap();
    }

    #[test]
    fn log_path_expands_home() {
        let dir = tempfile::tempdir().unwrap();
        let settings =
            Settings::load_from(&dir.path().join("a.toml"), &dir.path().join("b.toml")).unwrap();
        let path = settings.log_path().unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with("ghclean/ghclean.log"));
    }
}
