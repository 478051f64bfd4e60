/// Largest datagram read without truncation by default.
pub const DEFAULT_MAX_DATAGRAM_SIZE: usize = 4098;

/// Default readiness events fetched per wait.
pub const DEFAULT_EVENTS_CAPACITY: usize = 64;

/// Receive loop configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiplexerConfig {
    /// Size of the scratch buffer every datagram is read into. Longer
    /// datagrams are truncated to this size.
    pub max_datagram_size: usize,
    /// Stop the loop when a socket receives
    /// [`STOP_DATAGRAM`](oscprims_transport::STOP_DATAGRAM).
    pub honor_stop_datagram: bool,
    /// Readiness events fetched per wait.
    pub events_capacity: usize,
}

impl Default for MultiplexerConfig {
    fn default() -> Self {
        Self {
            max_datagram_size: DEFAULT_MAX_DATAGRAM_SIZE,
            honor_stop_datagram: true,
            events_capacity: DEFAULT_EVENTS_CAPACITY,
        }
    }
}
