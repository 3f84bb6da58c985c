use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application directory name under the platform config/data dirs.
pub const APP_DIR: &str = "chat-session";

/// 永続化バックエンドの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    File,
    Keyring,
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::File => "file",
            StorageBackend::Keyring => "keyring",
            StorageBackend::Memory => "memory",
        };
        f.write_str(name)
    }
}

/// ストレージ設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 使用するバックエンド（省略可、デフォルト: sqlite）
    #[serde(default)]
    pub backend: StorageBackend,

    /// ストレージファイルのパス（省略可、デフォルト: データディレクトリ下）
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// トークンを保存するキー名
    #[serde(default = "default_token_key")]
    pub token_key: String,

    /// Keyringのサービス名
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,
}

fn default_token_key() -> String {
    "token".to_string()
}

fn default_keyring_service() -> String {
    APP_DIR.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: None,
            token_key: default_token_key(),
            keyring_service: default_keyring_service(),
        }
    }
}

impl StorageConfig {
    /// Location of the backing file, if the backend uses one.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        let file_name = match self.backend {
            StorageBackend::Sqlite => "session.db",
            StorageBackend::File => "session.json",
            StorageBackend::Keyring | StorageBackend::Memory => return None,
        };
        Some(
            self.path
                .clone()
                .unwrap_or_else(|| app_dir(dirs::data_local_dir()).join(file_name)),
        )
    }
}

/// ログ設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// ログレベル（省略可、デフォルト: info）
    #[serde(default = "default_log_level")]
    pub level: String,

    /// ログファイルのパス（省略時は標準エラー出力）
    #[serde(default)]
    pub file_path: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: None,
        }
    }
}

/// メイン設定構造体
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// ストレージ設定
    #[serde(default)]
    pub storage: StorageConfig,

    /// ログ設定
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn log_level(&self) -> &str {
        &self.logging.level
    }

    pub fn log_file_path(&self) -> &Option<String> {
        &self.logging.file_path
    }

    pub fn token_key(&self) -> &str {
        &self.storage.token_key
    }
}

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.or_else(|| std::env::current_dir().ok())
        .unwrap_or_default()
        .join(APP_DIR)
}

/// 設定ファイルのデフォルトパスを取得
pub fn config_file_path() -> PathBuf {
    app_dir(dirs::config_dir()).join("config.toml")
}

/// 設定ファイルを読み込む（存在しない場合はデフォルト設定）
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config file at {:?}, using defaults", path);
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

/// 設定ファイルを保存する
pub fn save_config_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent_dir) = path.parent()
        && !parent_dir.as_os_str().is_empty()
        && !parent_dir.exists()
    {
        fs::create_dir_all(parent_dir).map_err(|source| ConfigError::Write { source })?;
    }

    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents).map_err(|source| ConfigError::Write { source })?;
    Ok(())
}
