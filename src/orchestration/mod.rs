pub mod replay;

pub use replay::{ReplayError, ReplayReport, Replayer};
