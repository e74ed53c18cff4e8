//! # tftboy-core
//!
//! Hardware-agnostic firmware core for a small handheld: an ST7735
//! colour TFT on a write-only SPI-style link, seven active-low
//! push-buttons, a two-entry menu, and two games (tile maze and bubble
//! shooter).
//!
//! There is no frame buffer on the firmware side. Every screen element
//! decomposes into rectangle fills, and each fill is an addressing
//! window on the controller followed by a chunked RGB565 pixel burst.
//! The board supplies a [`Transport`] (bytes plus the DC/CS/RESET
//! lines), a [`Delay`], and a [`Buttons`] view; nothing in here touches
//! hardware directly, so the same code runs on the device and inside
//! the desktop simulator.
//!
//! ## Architecture
//!
//! - [`St7735`] — display driver: init sequencing, rotation, the
//!   chunked rectangle-fill pixel path, true filled circles
//! - [`Renderer`] — the narrow draw capability (rectangle fill, whole
//!   surface fill, two-rectangle disc approximation) games depend on
//! - [`St7735Model`] — in-memory model of the controller for the
//!   simulator and tests; [`ModelTransport`] adapts it to [`Transport`]
//! - [`menu`] — top-level control loop
//! - [`maze`] / [`bubble`] — the two games
//! - [`png`] — screenshot encoder for the simulator
//! - [`Rng`] — xorshift PRNG for bubble colours

pub mod bubble;
pub mod color;
pub mod gfx;
pub mod input;
pub mod maze;
pub mod menu;
pub mod panel;
pub mod png;
pub mod rng;
pub mod st7735;
pub mod transport;

pub use gfx::Renderer;
pub use input::{Button, Buttons};
pub use panel::{ModelTransport, St7735Model};
pub use rng::Rng;
pub use st7735::{Config, Rotation, St7735, GREENTAB_128X160};
pub use transport::{Delay, Transport};

/// Effective landscape surface the menu and games are laid out for.
pub const SCREEN_WIDTH: usize = 160;
/// Effective landscape surface height.
pub const SCREEN_HEIGHT: usize = 132;
