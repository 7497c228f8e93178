mod engine;
mod format;
mod ticker;

pub use engine::{SessionTimer, TimerMode, TimerState};
pub use format::{format_clock, format_duration, progress};
pub use ticker::Ticker;
