//! Page size for cursor-paginated lease queries.

use std::{fmt, num::NonZeroUsize};

use serde::{Deserialize, Serialize};

use crate::error::{LeaseError, Result};

/// Largest accepted page size.
pub const MAX_LEASE_PAGE_SIZE: usize = u32::MAX as usize;

/// Number of leases returned by one paged query.
///
/// Always between 1 and [`MAX_LEASE_PAGE_SIZE`]: a zero page size cannot be
/// constructed, so queries never have to check for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct LeasePageSize(NonZeroUsize);

impl LeasePageSize {
    /// Creates a page size.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::InvalidPageSize`] if `size` is zero or larger than
    /// [`MAX_LEASE_PAGE_SIZE`].
    pub fn new(size: usize) -> Result<Self> {
        match NonZeroUsize::new(size) {
            Some(size) if size.get() <= MAX_LEASE_PAGE_SIZE => Ok(Self(size)),
            _ => Err(LeaseError::InvalidPageSize {
                value: size as u64,
                max: MAX_LEASE_PAGE_SIZE as u64,
            }),
        }
    }

    /// Returns the page size as a count.
    #[inline]
    pub fn get(self) -> usize {
        self.0.get()
    }

    /// Returns the smaller of this page size and `max`.
    pub fn clamp_to(self, max: LeasePageSize) -> LeasePageSize {
        self.min(max)
    }
}

impl TryFrom<usize> for LeasePageSize {
    type Error = LeaseError;

    fn try_from(size: usize) -> Result<Self> {
        Self::new(size)
    }
}

impl From<LeasePageSize> for usize {
    fn from(size: LeasePageSize) -> Self {
        size.get()
    }
}

impl fmt::Display for LeasePageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_page_size_rejected() {
        let err = LeasePageSize::new(0).unwrap_err();
        assert!(matches!(err, LeaseError::InvalidPageSize { value: 0, .. }));
        assert!(err.to_string().contains("page size 0"));
    }

    #[test]
    fn test_page_size_bounds() {
        assert_eq!(LeasePageSize::new(1).unwrap().get(), 1);
        assert_eq!(LeasePageSize::new(MAX_LEASE_PAGE_SIZE).unwrap().get(), MAX_LEASE_PAGE_SIZE);
        #[cfg(target_pointer_width = "64")]
        assert!(LeasePageSize::new(MAX_LEASE_PAGE_SIZE + 1).is_err());
    }

    #[test]
    fn test_clamp_to_smaller_maximum() {
        let requested = LeasePageSize::new(500).unwrap();
        let max = LeasePageSize::new(100).unwrap();
        assert_eq!(requested.clamp_to(max).get(), 100);
        assert_eq!(max.clamp_to(requested).get(), 100);
    }

    #[test]
    fn test_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<LeasePageSize>("0").is_err());
        let size: LeasePageSize = serde_json::from_str("25").unwrap();
        assert_eq!(size.get(), 25);
    }
}
