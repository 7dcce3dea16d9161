pub mod connection;
pub mod dispatcher;
pub mod protocol;
pub mod server;

pub use dispatcher::Dispatcher;
pub use server::Server;

/// Longest request line accepted by default, in bytes.
pub const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024;

/// Default capacity of each connection's outbound queue.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// Per-connection transport limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayConfig {
    pub max_line_bytes: usize,
    pub outbound_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }
}
