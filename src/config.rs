use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use video_cv_common::Operation;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// バックエンドURLの環境変数（優先順）
pub const BACKEND_URL_ENV_VARS: [&str; 2] = ["VIDEO_CV_BACKEND_URL", "NEXT_PUBLIC_BACKEND_URL"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    pub shots_timeout_secs: u64,
    pub bgsub_timeout_secs: u64,
    /// 背景差分の出力先ディレクトリ
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            shots_timeout_secs: Operation::ShotDetection.default_timeout().as_secs(),
            bgsub_timeout_secs: Operation::BackgroundSubtraction.default_timeout().as_secs(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// 読めない設定ファイルはデフォルトで置き換える（`config` コマンドで修復するため）
    pub fn load_or_default() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load_or_default_from(&path),
            Err(e) => {
                warn!("{}", e);
                Self::default()
            }
        }
    }

    pub fn load_or_default_from(config_path: &Path) -> Self {
        Self::load_from(config_path).unwrap_or_else(|e| {
            warn!(path = %config_path.display(), error = %e, "config ignored, using defaults");
            Self::default()
        })
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ClientError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("video-cv").join("config.json"))
    }

    /// 実際に使うバックエンドURL
    ///
    /// 優先順位: 引数 > 環境変数 > 設定ファイル。末尾の `/` は除く。
    pub fn resolve_backend_url(&self, cli_override: Option<&str>) -> String {
        let env_value = BACKEND_URL_ENV_VARS
            .iter()
            .find_map(|name| std::env::var(name).ok())
            .filter(|v| !v.trim().is_empty());

        let url = cli_override
            .map(str::to_string)
            .or(env_value)
            .unwrap_or_else(|| self.backend_url.clone());

        normalize_base_url(&url)
    }

    pub fn set_backend_url(&mut self, url: String) -> Result<()> {
        let url = normalize_base_url(&url);
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "URLは http:// か https:// で始めてください: {}",
                url
            )));
        }
        self.backend_url = url;
        self.save()
    }

    pub fn timeout_for(&self, operation: Operation) -> Duration {
        match operation {
            Operation::ShotDetection => Duration::from_secs(self.shots_timeout_secs),
            Operation::BackgroundSubtraction => Duration::from_secs(self.bgsub_timeout_secs),
        }
    }
}

pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_BACKEND_URL.to_string()
    } else {
        trimmed.to_string()
    }
}
