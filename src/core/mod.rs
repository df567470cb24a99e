pub mod engine;
pub mod ingest;

pub use crate::domain::model::{Issue, Party, SenderTotal, TransactionRecord};
pub use crate::domain::ports::Storage;
pub use crate::utils::error::Result;
