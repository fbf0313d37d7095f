use crate::error::ContractError;
use crate::model::Value;
use serde::{Deserialize, Serialize};

/// Sentinel reported for the total count when it is not known (keyset pages)
pub const UNKNOWN_TOTAL_COUNT: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingStrategy {
    /// Skip `(page - 1) * size` rows
    #[default]
    Offset,
    /// Continue after the last-seen ordering-key value
    Keyset,
}

/// Represents paging parameters for a repository read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagingOptions {
    pub strategy: PagingStrategy,
    pub page_number: u32,
    pub page_size: u32,
    pub after_value: Option<Value>,
    pub skip_pagination: bool,
}

impl PagingOptions {
    /// Offset paging with a 1-based page number
    pub fn offset(page_number: u32, page_size: u32) -> Self {
        Self {
            strategy: PagingStrategy::Offset,
            page_number,
            page_size,
            after_value: None,
            skip_pagination: false,
        }
    }

    /// First keyset page; continue with [`PagingOptions::after`]
    pub fn keyset(page_size: u32) -> Self {
        Self {
            strategy: PagingStrategy::Keyset,
            page_number: 1,
            page_size,
            after_value: None,
            skip_pagination: false,
        }
    }

    /// Return every matching row without a limit
    pub fn all() -> Self {
        Self {
            strategy: PagingStrategy::Offset,
            page_number: 1,
            page_size: 0,
            after_value: None,
            skip_pagination: true,
        }
    }

    pub fn after(mut self, value: impl Into<Value>) -> Self {
        self.after_value = Some(value.into());
        self
    }

    /// Page number echoed back on keyset pages; a display hint only
    pub fn with_page_number(mut self, page_number: u32) -> Self {
        self.page_number = page_number;
        self
    }

    pub fn validate(&self, max_page_size: Option<u32>) -> Result<(), ContractError> {
        if self.skip_pagination {
            return Ok(());
        }

        if self.page_number == 0 {
            return Err(ContractError::InvalidPageNumber {
                page_number: self.page_number,
            });
        }

        if self.page_size == 0 {
            return Err(ContractError::InvalidPageSize {
                page_size: self.page_size,
            });
        }

        if let Some(max_page_size) = max_page_size {
            if self.page_size > max_page_size {
                return Err(ContractError::PageSizeExceedsMaximum {
                    page_size: self.page_size,
                    max_page_size,
                });
            }
        }

        Ok(())
    }

    /// Rows skipped before this page in offset mode
    pub fn offset_rows(&self) -> u64 {
        u64::from(self.page_number.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn has_previous_page(&self) -> bool {
        match self.strategy {
            PagingStrategy::Offset => !self.skip_pagination && self.page_number > 1,
            PagingStrategy::Keyset => self.after_value.is_some(),
        }
    }

    /// Calculate total pages given a total count
    pub fn total_pages(&self, total_count: u64) -> u64 {
        if self.skip_pagination || self.page_size == 0 {
            1
        } else {
            total_count.div_ceil(u64::from(self.page_size))
        }
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    /// `None` when unknown, which is always the case for keyset pages
    pub total_count: Option<u64>,
    pub current_page: u32,
    pub page_size: u32,
    /// Ordering-key value of the last item; pass it back as the next `after_value`
    pub last_key_value: Option<Value>,
    pub has_next_page: bool,
}

impl<T> PagedResult<T> {
    pub fn total_count_or_unknown(&self) -> i64 {
        self.total_count
            .and_then(|count| i64::try_from(count).ok())
            .unwrap_or(UNKNOWN_TOTAL_COUNT)
    }

    pub fn total_pages(&self) -> Option<u64> {
        let total = self.total_count?;
        if self.page_size == 0 {
            return Some(1);
        }
        Some(total.div_ceil(u64::from(self.page_size)))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            current_page: self.current_page,
            page_size: self.page_size,
            last_key_value: self.last_key_value,
            has_next_page: self.has_next_page,
        }
    }
}
