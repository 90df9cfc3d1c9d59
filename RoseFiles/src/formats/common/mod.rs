//! Structural patterns shared by the block-structured and tagged formats

pub mod block;
pub mod tagged;

pub use block::{BlockEntry, BlockTableWriter, read_block_table, visit_blocks};
pub use tagged::{TaggedRecord, read_enveloped, skip_to, write_enveloped};

use crate::error::{Error, Result};

/// Fail with [`Error::IdentifierMismatch`] unless `actual == expected`.
pub(crate) fn expect_identifier(expected: &str, actual: &str) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(identifier_mismatch(expected, actual))
    }
}

pub(crate) fn identifier_mismatch(expected: &str, actual: &str) -> Error {
    Error::IdentifierMismatch {
        expected: expected.to_string(),
        actual: actual.to_string(),
        path: None,
    }
}
