//! Page-index pagination.
//!
//! A page token is the decimal index of the page to serve, not an element offset. It is
//! re-scaled by whatever page size accompanies each call, so the same token with a
//! different page size addresses a different range. Clients depend on this.

use crate::utils::errors::DutiesError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: u64 = 250;
pub const MAX_PAGE_SIZE: u64 = 500;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Requested page size {requested} can not be greater than max size {max}")]
    PageSizeTooLarge { requested: u64, max: u64 },

    #[error("could not convert page token {token:?}: {reason}")]
    InvalidToken { token: String, reason: String },

    #[error("page start {start} >= list {total}")]
    StartOutOfRange { start: u64, total: u64 },

    #[error("page {page} of size {size} overflows")]
    Overflow { page: u64, size: u64 },
}

impl From<PaginationError> for DutiesError {
    fn from(err: PaginationError) -> Self {
        match err {
            PaginationError::PageSizeTooLarge { .. } | PaginationError::InvalidToken { .. } => {
                DutiesError::InvalidArgument(err.to_string())
            }
            PaginationError::StartOutOfRange { .. } | PaginationError::Overflow { .. } => {
                DutiesError::Internal(format!("Could not paginate results: {}", err))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

/// `[start, end)` of the page to serve and the token of the page after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub start: usize,
    pub end: usize,
    /// Empty on the last page.
    pub next_page_token: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Paginator {
    config: PaginationConfig,
}

impl Paginator {
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    /// Resolve the page size of a request: zero means the default.
    pub fn page_size(&self, requested: u64) -> Result<u64, PaginationError> {
        if requested > self.config.max_page_size {
            return Err(PaginationError::PageSizeTooLarge {
                requested,
                max: self.config.max_page_size,
            });
        }
        Ok(if requested == 0 { self.config.default_page_size } else { requested })
    }

    pub fn page_index(token: &str) -> Result<u64, PaginationError> {
        if token.is_empty() {
            return Ok(0);
        }
        token.parse().map_err(|e: std::num::ParseIntError| PaginationError::InvalidToken {
            token: token.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn paginate(
        &self,
        token: &str,
        page_size: u64,
        total: usize,
    ) -> Result<Page, PaginationError> {
        let size = self.page_size(page_size)?;
        let page = Self::page_index(token)?;
        let total = total as u64;

        let start = page
            .checked_mul(size)
            .ok_or(PaginationError::Overflow { page, size })?;
        if start >= total {
            return Err(PaginationError::StartOutOfRange { start, total });
        }

        let end = start.saturating_add(size).min(total);
        let next_page_token = if end == total {
            String::new()
        } else {
            (page + 1).to_string()
        };

        Ok(Page {
            start: start as usize,
            end: end as usize,
            next_page_token,
        })
    }
}
