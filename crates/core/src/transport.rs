//! Hardware seams between the firmware core and the board.
//!
//! The display driver talks to the panel through [`Transport`] alone: a
//! write-only byte sink plus the three digital select lines. Millisecond
//! waits (controller settle times, game pacing) go through [`Delay`] so
//! a simulator can compress time.

/// Byte link to the display controller plus its three control signals.
///
/// There is no error return anywhere on this interface: a transport
/// fault is a hardware failure the firmware cannot recover from, so
/// implementations halt rather than report.
pub trait Transport {
    /// Push a byte burst onto the bus.
    fn write(&mut self, bytes: &[u8]);
    /// Data/command select: high for pixel or parameter data, low for
    /// commands.
    fn set_dc(&mut self, high: bool);
    /// Chip select, idle high; low selects the controller.
    fn set_cs(&mut self, high: bool);
    /// Reset line, idle high; low holds the controller in reset.
    fn set_reset(&mut self, high: bool);
}

/// Blocking millisecond delay.
pub trait Delay {
    fn delay_ms(&mut self, ms: u32);
}
