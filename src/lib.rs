pub mod api;
pub mod chain;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod orchestration;
pub mod projector;

pub use chain::{CallError, ChainReader, HttpChainReader, MockChainReader};
pub use config::{Config, ProjectorConfig};
pub use db::{init_db, Repository};
pub use domain::{Address, Amount, HexKey, Side};
pub use error::AppError;
pub use events::{ChainRecord, EventKind, EventMeta, LogEvent};
pub use orchestration::{ReplayReport, Replayer};
pub use projector::{Projector, ProjectorError};
