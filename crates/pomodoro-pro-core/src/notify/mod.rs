//! Work-end / break-end signals.
//!
//! Notifications are best effort: the engine logs a failed signal and moves
//! on, it never waits on or fails because of a notifier.

use std::io::Write;

/// Audio or desktop signal played at the end of a session.
pub trait Notifier {
    fn play_work_end(&self) -> std::io::Result<()>;
    fn play_break_end(&self) -> std::io::Result<()>;
}

/// Plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn play_work_end(&self) -> std::io::Result<()> {
        Ok(())
    }

    fn play_break_end(&self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Rings the terminal bell on stderr: once after work, twice after a break.
#[derive(Debug, Clone, Copy, Default)]
pub struct BellNotifier;

impl BellNotifier {
    fn ring(times: usize) -> std::io::Result<()> {
        let mut err = std::io::stderr().lock();
        err.write_all("\x07".repeat(times).as_bytes())?;
        err.flush()
    }
}

impl Notifier for BellNotifier {
    fn play_work_end(&self) -> std::io::Result<()> {
        Self::ring(1)
    }

    fn play_break_end(&self) -> std::io::Result<()> {
        Self::ring(2)
    }
}
