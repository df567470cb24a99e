use crate::utils::error::Result;

/// Source of raw transaction documents.
pub trait Storage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
}
