use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::index::IndexOptions;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Ratchakitcha";
const APP_NAME: &str = "ratchaview";

pub const CONFIG_ENV: &str = "RATCHAVIEW_CONFIG";
pub const DATA_ENV: &str = "RATCHAVIEW_DATA";
pub const PROXY_SECRET_ENV: &str = "RATCHAVIEW_PROXY_SECRET";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn from_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            self.write_default_config(&default_cfg)?;
            default_cfg.post_load(&self.paths)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths)?;
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub log_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let override_data = env::var(DATA_ENV).ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_root = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
        let export_dir = data_root.join("exports");

        let cache_dir = project_dirs.cache_dir().to_path_buf();
        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_root.join("state"));
        let log_dir = state_dir.join("logs");

        Ok(Self {
            config_dir,
            config_file,
            data_dir: data_root,
            export_dir,
            cache_dir,
            log_dir,
            state_dir,
        })
    }

    /// Lays every directory out under one root; used by tests and `--data-dir` sandboxes.
    pub fn rooted_at(root: &Path) -> Self {
        let config_dir = root.join("config");
        let data_dir = root.join("data");
        let state_dir = root.join("state");
        Self {
            config_file: config_dir.join("config.toml"),
            config_dir,
            export_dir: data_dir.join("exports"),
            data_dir,
            cache_dir: root.join("cache"),
            log_dir: state_dir.join("logs"),
            state_dir,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.config_dir,
            &self.data_dir,
            &self.export_dir,
            &self.cache_dir,
            &self.log_dir,
            &self.state_dir,
        ] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tick_rate_ms: u64,
    pub sources: SourceOptions,
    pub index: IndexOptions,
    pub viewer: ViewerOptions,
    pub export: ExportOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 100,
            sources: SourceOptions::default(),
            index: IndexOptions::default(),
            viewer: ViewerOptions::default(),
            export: ExportOptions::default(),
        }
    }
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) -> Result<()> {
        self.export.resolve(paths);
        if let Ok(secret) = env::var(PROXY_SECRET_ENV) {
            self.sources.proxy_secret = secret;
        }
        if self.index.max_entries == 0 {
            tracing::warn!("index.max_entries must be at least 1, falling back to default");
            self.index.max_entries = IndexOptions::default().max_entries;
        }
        if self.sources.proxy_secret.is_empty() {
            tracing::warn!(
                "no proxy secret configured; set sources.proxy_secret or {}",
                PROXY_SECRET_ENV
            );
        }
        Ok(())
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(10))
    }
}

/// Remote endpoints the viewer talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOptions {
    pub index_csv_url: String,
    /// Repository tree listing; the drafts folder entry is followed from here.
    pub tree_url: String,
    pub raw_content_base: String,
    pub drafts_folder: String,
    pub proxy_base: String,
    pub secret_header: String,
    pub proxy_secret: String,
    pub user_agent: String,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            index_csv_url:
                "https://raw.githubusercontent.com/narze/ratchagitja.md/main/data/ratchakitcha.csv"
                    .into(),
            tree_url: "https://api.github.com/repos/narze/ratchagitja.md/git/trees/main".into(),
            raw_content_base: "https://raw.githubusercontent.com/narze/ratchagitja.md/main".into(),
            drafts_folder: "entries".into(),
            proxy_base: "http://127.0.0.1:8787/files".into(),
            secret_header: "x-proxy-secret".into(),
            proxy_secret: String::new(),
            user_agent: concat!("ratchaview/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerOptions {
    /// Pages mounted on each side of the current page.
    pub page_window: u32,
    pub initial_markdown: String,
    /// Local file served for the placeholder record instead of the proxy.
    pub demo_document: Option<PathBuf>,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            page_window: 3,
            initial_markdown: "**Hello world!!!**".into(),
            demo_document: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExportOptions {
    /// Empty means `<data dir>/exports`.
    pub directory: PathBuf,
}

impl ExportOptions {
    fn resolve(&mut self, paths: &ConfigPaths) {
        if self.directory.as_os_str().is_empty() {
            self.directory = paths.export_dir.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_default_config_on_first_run() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted_at(temp.path());
        let loader = ConfigLoader::from_paths(paths.clone());

        let cfg = loader.load_or_init()?;
        assert!(paths.config_file.exists());
        assert_eq!(cfg.index.max_entries, 100);
        assert_eq!(cfg.viewer.page_window, 3);
        assert_eq!(cfg.export.directory, paths.export_dir);

        let raw = fs::read_to_string(&paths.config_file)?;
        assert!(raw.contains("index_csv_url"));
        Ok(())
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_sections() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted_at(temp.path());
        paths.ensure_directories()?;
        fs::write(
            &paths.config_file,
            "[index]\ncategory_filter = \"ก\"\n\n[viewer]\npage_window = 5\n",
        )?;

        let cfg = ConfigLoader::from_paths(paths).load()?;
        assert_eq!(cfg.index.category_filter.as_deref(), Some("ก"));
        assert_eq!(cfg.index.max_entries, 100);
        assert_eq!(cfg.viewer.page_window, 5);
        assert_eq!(cfg.sources.drafts_folder, "entries");
        Ok(())
    }
}
