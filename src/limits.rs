//! Serving-layer configuration limits and timeouts.
//!
//! Defaults are intentionally conservative: bounded request heads and
//! bodies, bounded header counts, and socket timeouts on every read and
//! write. Each struct supports struct-update syntax so call sites override
//! only the knobs they care about:
//!
//! ```
//! use strata_web::limits::{ConnLimits, ReqLimits};
//! use std::time::Duration;
//!
//! let conn = ConnLimits {
//!     socket_read_timeout: Duration::from_secs(5),
//!     ..ConnLimits::default()
//! };
//! let req = ReqLimits {
//!     body_size: 16 * 1024,
//!     ..ReqLimits::default()
//! };
//! # let _ = (conn, req);
//! ```

use std::time::Duration;

/// How an idle connection worker waits for the next accepted stream.
#[derive(Debug, Clone)]
pub enum WaitStrategy {
    /// Yield back to the runtime between polls. Lowest latency.
    Yield,
    /// Sleep between polls. Lower idle CPU at the cost of pickup latency.
    Sleep(Duration),
}

/// Limits for the accept loop and the worker pool.
#[derive(Debug, Clone)]
pub struct ServerLimits {
    /// Number of pre-spawned connection workers, i.e. the maximum number of
    /// connections served simultaneously.
    pub max_connections: usize,

    /// Accepted connections held in the pending queue while all workers are
    /// busy. Connections beyond this cap go to overflow handling.
    pub max_pending_connections: usize,

    /// Workers dedicated to answering overflow connections with a canned
    /// `503`. With `0`, overflow connections are dropped without a reply.
    pub count_503_handlers: usize,

    /// Wait behavior of idle workers.
    pub wait_strategy: WaitStrategy,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            max_pending_connections: 4096,
            count_503_handlers: 1,
            wait_strategy: WaitStrategy::Yield,
        }
    }
}

/// Per-connection I/O limits.
#[derive(Debug, Clone)]
pub struct ConnLimits {
    /// Deadline for each socket read while receiving a request.
    pub socket_read_timeout: Duration,

    /// Deadline for writing a complete response.
    pub socket_write_timeout: Duration,

    /// Keep-alive requests served on one connection before it is closed.
    pub max_requests_per_connection: usize,
}

impl Default for ConnLimits {
    fn default() -> Self {
        Self {
            socket_read_timeout: Duration::from_secs(10),
            socket_write_timeout: Duration::from_secs(10),
            max_requests_per_connection: 1024,
        }
    }
}

/// Request parsing limits.
#[derive(Debug, Clone)]
pub struct ReqLimits {
    /// Maximum size of the request head (request line plus headers),
    /// including the terminating blank line.
    pub head_size: usize,

    /// Maximum accepted `content-length`.
    pub body_size: usize,

    /// Maximum number of header lines.
    pub header_count: usize,
}

impl Default for ReqLimits {
    fn default() -> Self {
        Self {
            head_size: 8 * 1024,
            body_size: 64 * 1024,
            header_count: 32,
        }
    }
}

/// Response buffer limits.
#[derive(Debug, Clone)]
pub struct RespLimits {
    /// Initial capacity of the serialization buffer.
    pub default_capacity: usize,

    /// A buffer grown beyond this capacity is replaced after the response
    /// is written, so one oversized response does not pin memory for the
    /// connection's lifetime.
    pub max_capacity: usize,
}

impl Default for RespLimits {
    fn default() -> Self {
        Self {
            default_capacity: 1024,
            max_capacity: 64 * 1024,
        }
    }
}
