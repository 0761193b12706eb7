//! # Query Configuration & Constants
//!
//! Every magic number in the storage access layer lives here: compact-integer
//! mode boundaries, paging sizes, and the JSON-RPC wire constants. If you're
//! hardcoding a page size somewhere else, move it here.

// ---------------------------------------------------------------------------
// Compact Integer Framing
// ---------------------------------------------------------------------------

/// Values below this fit the single-byte mode (`0b00`).
pub const COMPACT_SINGLE_BYTE_LIMIT: u64 = 1 << 6;

/// Values below this fit the two-byte mode (`0b01`).
pub const COMPACT_TWO_BYTE_LIMIT: u64 = 1 << 14;

/// Values below this fit the four-byte mode (`0b10`). Everything else goes
/// big-integer.
pub const COMPACT_FOUR_BYTE_LIMIT: u64 = 1 << 30;

/// Largest big-integer payload: the header stores `len - 4` in six bits.
pub const COMPACT_MAX_BIG_INT_BYTES: usize = 4 + 63;

/// Most elements a length-prefixed sequence may declare when its elements
/// encode to zero bytes. Any other sequence is bounded by the input length.
pub const MAX_ZERO_WIDTH_ITEMS: usize = 1024;

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

/// Keys per `state_queryStorageAt` page and per `state_getKeysPaged` page.
///
/// Nodes reject or throttle much larger batches. A page shorter than this
/// is the only end-of-enumeration signal the key listing RPC gives us.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

// ---------------------------------------------------------------------------
// Wire
// ---------------------------------------------------------------------------

/// JSON-RPC protocol version sent with every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// Per-request timeout in milliseconds when the caller sets none.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Length of a block hash in bytes.
pub const BLOCK_HASH_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// QueryConfig
// ---------------------------------------------------------------------------

/// Tuning knobs for paged storage queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// Maximum keys per `state_queryStorageAt` request.
    pub page_size: usize,

    /// Keys requested per `state_getKeysPaged` call during prefix enumeration.
    pub key_page_size: u32,
}

impl QueryConfig {
    /// Returns a copy with zero page sizes raised to one, so paging always
    /// makes progress.
    pub fn normalized(&self) -> Self {
        Self {
            page_size: self.page_size.max(1),
            key_page_size: self.key_page_size.max(1),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            key_page_size: DEFAULT_PAGE_SIZE as u32,
        }
    }
}
