pub const WINDOW_WIDTH: i32 = 1280;            // Initial window width
pub const WINDOW_HEIGHT: i32 = 800;            // Initial window height
pub const FPS: u32 = 60;                       // Frames per second

pub const MIN_VALUE: f64 = 1.0;                // Lower bound of the control value
pub const MAX_VALUE: f64 = 10.0;               // Upper bound of the control value

pub const MIN_POLL_INTERVAL_MS: u64 = 3_000;   // Shortest delay between autonomous polls
pub const MAX_POLL_INTERVAL_MS: u64 = 10_000;  // Longest delay between autonomous polls

pub const FALLBACK_VALUE: f64 = 5.5;           // Value substituted when the uplink degrades

pub const LOG_TAIL: usize = 5;                 // Event log entries shown on screen
pub const DEFAULT_SEQUENCE_LEN: usize = 10;    // Placeholder images when no directory is given
