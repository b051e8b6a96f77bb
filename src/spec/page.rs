//! Offset/limit paging.

use serde::{Deserialize, Serialize};

use crate::error::{QuarryError, QuarryResult};

/// A skip/take window over a result set.
///
/// `limit == 0` means unlimited; the offset is still applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Page {
    /// Create a page window. Negative inputs are rejected eagerly so a bad
    /// specification never reaches compilation.
    pub fn new(offset: i64, limit: i64) -> QuarryResult<Self> {
        if offset < 0 {
            return Err(QuarryError::invalid(format!("negative offset: {offset}")));
        }
        if limit < 0 {
            return Err(QuarryError::invalid(format!("negative limit: {limit}")));
        }
        Ok(Self {
            offset: offset as u64,
            limit: limit as u64,
        })
    }

    /// Create a page window from a 1-based page number and a page size.
    ///
    /// `offset = (page_number - 1) * page_size`; a page number below 1
    /// clamps to offset 0. A negative page size is rejected.
    pub fn numbered(page_number: i64, page_size: i64) -> QuarryResult<Self> {
        if page_size < 0 {
            return Err(QuarryError::invalid(format!(
                "negative page size: {page_size}"
            )));
        }
        let limit = page_size as u64;
        let offset = if page_number < 1 {
            0
        } else {
            (page_number as u64 - 1).checked_mul(limit).ok_or_else(|| {
                QuarryError::invalid(format!(
                    "page window overflows: page {page_number} of size {page_size}"
                ))
            })?
        };
        Ok(Self { offset, limit })
    }

    /// Take at most `limit` rows from the start.
    pub fn first(limit: i64) -> QuarryResult<Self> {
        Self::new(0, limit)
    }

    /// Whether this window limits the number of rows.
    pub fn is_limited(&self) -> bool {
        self.limit > 0
    }
}
