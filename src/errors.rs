use keyring;
use thiserror::Error;

/// アプリケーション全体のエラー型
#[derive(Error, Debug)]
pub enum AppError {
    /// ストレージ関連エラー
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// 設定関連エラー
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// 汎用エラー
    #[error("{message}")]
    Generic { message: String },
}

/// Errors raised by a durable key-value backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLiteエラー
    #[error("SQLite error: {source}")]
    Sqlite {
        #[source]
        source: rusqlite::Error,
    },

    /// ファイル入出力エラー
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    /// JSONパースエラー
    #[error("JSON parsing error: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },

    /// Keyring操作エラー
    #[error("Keyring error: {source}")]
    Keyring {
        #[source]
        source: keyring::Error,
    },

    /// The backend refuses every operation (disabled, quota exceeded).
    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },
}

/// 設定関連エラー
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 設定ファイル読み込みエラー
    #[error("Failed to load config file: {source}")]
    Load {
        #[source]
        source: std::io::Error,
    },

    /// 設定ファイルパースエラー
    #[error("Failed to parse config file: {source}")]
    Parse {
        #[source]
        source: toml::de::Error,
    },

    /// 設定シリアライズエラー
    #[error("Failed to serialize config: {source}")]
    Serialize {
        #[source]
        source: toml::ser::Error,
    },

    /// 設定ファイル書き込みエラー
    #[error("Failed to write config file: {source}")]
    Write {
        #[source]
        source: std::io::Error,
    },
}

impl From<rusqlite::Error> for StorageError {
    fn from(error: rusqlite::Error) -> Self {
        StorageError::Sqlite { source: error }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::Io { source: error }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::Json { source: error }
    }
}

impl From<keyring::Error> for StorageError {
    fn from(error: keyring::Error) -> Self {
        StorageError::Keyring { source: error }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(error: std::io::Error) -> Self {
        ConfigError::Load { source: error }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::Parse { source: error }
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(error: toml::ser::Error) -> Self {
        ConfigError::Serialize { source: error }
    }
}
