//! Error types for the lease store using snafu.
//!
//! The store has three failure classes:
//! - Caller-contract violations (bad page size, empty identifier, bad prefix
//!   length, malformed DUID). Rejected synchronously before any work is done.
//! - Lifecycle errors on the primary store (updating a lease that does not exist).
//! - Concurrency contract violations (a second thread entering a store that was
//!   configured for single-threaded use).
//!
//! Benign absence (unknown identifier, unknown address, empty link) is never an
//! error; it is represented by empty results or no-ops.
//!
//! Each variant maps to an [`ErrorCode`] with a stable numeric identifier.

use core::fmt;
use std::net::Ipv6Addr;

use snafu::{Location, Snafu};

use crate::{config::ConfigError, types::IdentifierTable};

/// Unified result type for lease store operations.
pub type Result<T, E = LeaseError> = std::result::Result<T, E>;

/// Machine-readable error codes for programmatic error handling.
///
/// | Range       | Domain      | Examples                                 |
/// |-------------|-------------|------------------------------------------|
/// | 1000–1099   | Arguments   | Page size, identifier, prefix length     |
/// | 2000–2099   | Lifecycle   | Missing lease on update                  |
/// | 3000–3099   | Runtime     | Concurrency contract, configuration      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    /// Page size outside the accepted range.
    InvalidPageSize = 1000,
    /// Identifier bytes rejected on insertion.
    InvalidIdentifier = 1001,
    /// Prefix length larger than 128 bits.
    InvalidPrefixLength = 1002,
    /// DUID empty or longer than the protocol maximum.
    InvalidDuid = 1003,
    /// Update or lookup targeted an address with no lease.
    LeaseNotFound = 2000,
    /// Concurrent entry into a single-threaded store.
    ConcurrentAccess = 3000,
    /// Configuration value rejected.
    Config = 3001,
}

impl ErrorCode {
    /// Returns the numeric code value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Converts a numeric code to an `ErrorCode`, returning `None` for unknown values.
    #[must_use]
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            1000 => Some(Self::InvalidPageSize),
            1001 => Some(Self::InvalidIdentifier),
            1002 => Some(Self::InvalidPrefixLength),
            1003 => Some(Self::InvalidDuid),
            2000 => Some(Self::LeaseNotFound),
            3000 => Some(Self::ConcurrentAccess),
            3001 => Some(Self::Config),
            _ => None,
        }
    }

    /// Whether this code describes a caller-contract violation.
    ///
    /// Contract violations are deterministic: resubmitting the same call
    /// always fails the same way.
    #[must_use]
    pub const fn is_contract_violation(self) -> bool {
        matches!(
            self,
            Self::InvalidPageSize
                | Self::InvalidIdentifier
                | Self::InvalidPrefixLength
                | Self::InvalidDuid
                | Self::ConcurrentAccess
        )
    }

    /// Suggested recovery action for this error code.
    #[must_use]
    pub const fn suggested_action(self) -> &'static str {
        match self {
            Self::InvalidPageSize => "Request a page size of at least 1.",
            Self::InvalidIdentifier => "Pass the decoded, non-empty relay or remote identifier.",
            Self::InvalidPrefixLength => "Use a prefix length between 0 and 128.",
            Self::InvalidDuid => "Pass a DUID of 1 to 128 bytes.",
            Self::LeaseNotFound => "Add the lease before updating it.",
            Self::ConcurrentAccess => {
                "Enable multi-threaded mode or serialize all calls into the store."
            },
            Self::Config => "Fix the configuration value and restart.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Top-level error type for lease store operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LeaseError {
    /// Page size outside `1..=u32::MAX`.
    #[snafu(display("Invalid page size {value}: must be between 1 and {max}"))]
    InvalidPageSize {
        /// Requested page size.
        value: u64,
        /// Largest accepted page size.
        max: u64,
    },

    /// Identifier bytes rejected on insertion into an index table.
    #[snafu(display("Invalid {table} identifier for {address}: {reason}"))]
    InvalidIdentifier {
        /// Target table.
        table: IdentifierTable,
        /// Lease address the identifier was attached to.
        address: Ipv6Addr,
        /// Why the identifier was rejected.
        reason: String,
    },

    /// Prefix length above 128.
    #[snafu(display("Invalid prefix length {value}: must be at most 128"))]
    InvalidPrefixLength {
        /// Requested prefix length.
        value: u8,
    },

    /// DUID rejected at construction.
    #[snafu(display("Invalid DUID: {reason}"))]
    InvalidDuid {
        /// Why the DUID was rejected.
        reason: String,
    },

    /// No lease exists for the address.
    #[snafu(display("No lease for address {address}"))]
    LeaseNotFound {
        /// Lease address.
        address: Ipv6Addr,
    },

    /// A second thread entered a store configured for single-threaded use.
    #[snafu(display("Concurrent {operation} on a single-threaded lease store at {location}"))]
    ConcurrentAccess {
        /// Name of the operation that observed contention.
        operation: &'static str,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// Configuration rejected.
    #[snafu(display("Configuration error: {source}"))]
    Config {
        /// Underlying validation error.
        source: ConfigError,
    },
}

impl LeaseError {
    /// Returns the machine-readable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidPageSize { .. } => ErrorCode::InvalidPageSize,
            Self::InvalidIdentifier { .. } => ErrorCode::InvalidIdentifier,
            Self::InvalidPrefixLength { .. } => ErrorCode::InvalidPrefixLength,
            Self::InvalidDuid { .. } => ErrorCode::InvalidDuid,
            Self::LeaseNotFound { .. } => ErrorCode::LeaseNotFound,
            Self::ConcurrentAccess { .. } => ErrorCode::ConcurrentAccess,
            Self::Config { .. } => ErrorCode::Config,
        }
    }

    /// Suggested recovery action for this error.
    ///
    /// Delegates to [`ErrorCode::suggested_action`].
    #[must_use]
    pub const fn suggested_action(&self) -> &'static str {
        self.code().suggested_action()
    }
}

impl From<ConfigError> for LeaseError {
    fn from(source: ConfigError) -> Self {
        LeaseError::Config { source }
    }
}
