pub mod cell;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logger;
pub mod models;
pub mod persisted;
pub mod session;
pub mod storage;
pub mod traits;

pub use cell::{ReactiveCell, Subscription};
pub use config::Config;
pub use errors::{AppError, ConfigError, StorageError};
pub use models::{LoginResponse, User};
pub use persisted::PersistedCell;
pub use session::SessionContext;
pub use storage::DurableStorage;
