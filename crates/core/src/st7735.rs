//! ST7735 TFT display driver.
//!
//! Frame-buffer-less direct drawing: there is no pixel store on the
//! firmware side, only on the panel. Every draw operation opens an
//! addressing window on the controller and streams RGB565 pixel data
//! into it; [`St7735::fill_rect`] is the single pixel-writing path that
//! everything else decomposes into. Pixel bursts are chunked so transfer
//! memory stays bounded regardless of the rectangle area.
//!
//! Out-of-range coordinates are clipped or dropped silently before they
//! reach the controller, which misbehaves on out-of-range windows. No
//! draw call can fail.

use crate::gfx::Renderer;
use crate::transport::{Delay, Transport};

/// ST7735 command set
#[allow(dead_code)]
pub mod cmd {
    pub const NOP: u8 = 0x00;
    pub const SWRESET: u8 = 0x01;
    pub const SLPIN: u8 = 0x10;
    pub const SLPOUT: u8 = 0x11;
    pub const NORON: u8 = 0x13; // Normal display mode on
    pub const DISPOFF: u8 = 0x28;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A; // Column address set
    pub const RASET: u8 = 0x2B; // Row address set
    pub const RAMWR: u8 = 0x2C; // Memory write
    pub const MADCTL: u8 = 0x36; // Memory access control
    pub const COLMOD: u8 = 0x3A; // Pixel format
}

/// Pixels per chunk when streaming a fill. Bounds the transfer buffer at
/// 2 KB; a full-surface burst would otherwise need over 40 KB.
const CHUNK_PIXELS: usize = 1024;

/// Panel geometry and calibration.
///
/// `portrait` is the effective surface for rotation modes 0 and 2,
/// `landscape` for modes 1 and 3. `colstart`/`rowstart` shift every
/// addressing window to line controller memory up with the visible
/// glass.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub portrait: (i32, i32),
    pub landscape: (i32, i32),
    pub colstart: u16,
    pub rowstart: u16,
}

/// The 1.8" 128x160 panel this device ships with. Landscape exposes the
/// 160x132 region the menu and games are laid out for.
pub const GREENTAB_128X160: Config = Config {
    portrait: (128, 160),
    landscape: (160, 132),
    colstart: 0,
    rowstart: 0,
};

/// Display orientation. Set once at startup; the protocol allows
/// changing it mid-session but nothing here does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Portrait,
    Landscape,
    PortraitFlipped,
    LandscapeFlipped,
}

impl Rotation {
    /// MADCTL data byte for this orientation.
    pub fn madctl(self) -> u8 {
        match self {
            Rotation::Portrait => 0xC0,
            Rotation::Landscape => 0xA0,
            Rotation::PortraitFlipped => 0x00,
            Rotation::LandscapeFlipped => 0x60,
        }
    }

    fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Landscape | Rotation::LandscapeFlipped)
    }
}

/// Driver for an ST7735 controller behind any [`Transport`].
pub struct St7735<T: Transport> {
    transport: T,
    config: Config,
    width: i32,
    height: i32,
    rotation: Rotation,
}

impl<T: Transport> St7735<T> {
    pub fn new(transport: T, config: Config) -> Self {
        St7735 {
            transport,
            config,
            width: config.portrait.0,
            height: config.portrait.1,
            rotation: Rotation::Portrait,
        }
    }

    /// Effective surface width for the current rotation.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Effective surface height for the current rotation.
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Consume the driver and hand the transport back (simulator
    /// teardown, tests).
    pub fn release(self) -> T {
        self.transport
    }

    fn write_cmd(&mut self, c: u8) {
        self.transport.set_dc(false);
        self.transport.set_cs(false);
        self.transport.write(&[c]);
        self.transport.set_cs(true);
    }

    fn write_data(&mut self, data: &[u8]) {
        self.transport.set_dc(true);
        self.transport.set_cs(false);
        self.transport.write(data);
        self.transport.set_cs(true);
    }

    /// Power-on sequence. Every wait is a controller-mandated minimum
    /// settle time, not a tunable.
    pub fn init(&mut self, delay: &mut impl Delay) {
        self.transport.set_cs(true);
        self.transport.set_dc(false);

        self.transport.set_reset(false);
        delay.delay_ms(50);
        self.transport.set_reset(true);
        delay.delay_ms(50);

        self.write_cmd(cmd::SWRESET);
        delay.delay_ms(150);
        self.write_cmd(cmd::SLPOUT);
        delay.delay_ms(255);

        // 16 bits per pixel
        self.write_cmd(cmd::COLMOD);
        self.write_data(&[0x05]);

        self.write_cmd(cmd::MADCTL);
        self.write_data(&[Rotation::Portrait.madctl()]);
        self.rotation = Rotation::Portrait;
        self.width = self.config.portrait.0;
        self.height = self.config.portrait.1;

        self.write_cmd(cmd::NORON);
        delay.delay_ms(10);
        self.write_cmd(cmd::DISPON);
        delay.delay_ms(100);
    }

    /// Select an orientation and track its effective dimensions.
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.write_cmd(cmd::MADCTL);
        self.write_data(&[rotation.madctl()]);
        let (w, h) = if rotation.swaps_axes() {
            self.config.landscape
        } else {
            self.config.portrait
        };
        self.width = w;
        self.height = h;
        self.rotation = rotation;
    }

    /// Open the addressing window (x0,y0)-(x1,y1), calibration offsets
    /// applied, leaving the controller expecting pixel data.
    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) {
        let cx0 = x0 + self.config.colstart;
        let cx1 = x1 + self.config.colstart;
        let ry0 = y0 + self.config.rowstart;
        let ry1 = y1 + self.config.rowstart;
        self.write_cmd(cmd::CASET);
        self.write_data(&[(cx0 >> 8) as u8, cx0 as u8, (cx1 >> 8) as u8, cx1 as u8]);
        self.write_cmd(cmd::RASET);
        self.write_data(&[(ry0 >> 8) as u8, ry0 as u8, (ry1 >> 8) as u8, ry1 as u8]);
        self.write_cmd(cmd::RAMWR);
    }

    /// Fill a rectangle with one colour, clipped to the surface.
    ///
    /// An origin at or past the right/bottom edge, or a degenerate
    /// extent after clipping, is a complete no-op: no bytes reach the
    /// transport. Pixels stream in [`CHUNK_PIXELS`]-sized bursts, two
    /// bytes per pixel high byte first; the final burst is a sub-slice
    /// of the same buffer.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u16) {
        let (mut x, mut y, mut w, mut h) = (x, y, w, h);
        if x >= self.width || y >= self.height {
            return;
        }
        if x < 0 {
            w += x;
            x = 0;
        }
        if y < 0 {
            h += y;
            y = 0;
        }
        if x + w > self.width {
            w = self.width - x;
        }
        if y + h > self.height {
            h = self.height - y;
        }
        if w <= 0 || h <= 0 {
            return;
        }

        self.set_window(x as u16, y as u16, (x + w - 1) as u16, (y + h - 1) as u16);

        let high = (color >> 8) as u8;
        let low = color as u8;
        let total = (w * h) as usize;
        let mut chunk = [0u8; CHUNK_PIXELS * 2];
        for pair in chunk[..total.min(CHUNK_PIXELS) * 2].chunks_exact_mut(2) {
            pair[0] = high;
            pair[1] = low;
        }
        let mut remaining = total;
        while remaining > 0 {
            let n = remaining.min(CHUNK_PIXELS);
            self.write_data(&chunk[..n * 2]);
            remaining -= n;
        }
    }

    /// Fill the whole surface.
    pub fn fill(&mut self, color: u16) {
        let (w, h) = (self.width, self.height);
        self.fill_rect(0, 0, w, h, color);
    }

    /// Write a single pixel. Off-surface coordinates are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: u16) {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return;
        }
        self.set_window(x as u16, y as u16, x as u16, y as u16);
        self.write_data(&[(color >> 8) as u8, color as u8]);
    }

    /// True filled circle: exactly the pixels with dx^2 + dy^2 <= r^2,
    /// boundary inclusive. Painted one scan line per row rather than one
    /// window per pixel; the resulting pixel set is identical. Contrast
    /// with `Renderer::draw_disc`, the games' two-rectangle
    /// approximation.
    pub fn fill_circle(&mut self, x: i32, y: i32, r: i32, color: u16) {
        if r < 0 {
            return;
        }
        for dy in -r..=r {
            let span = isqrt(r * r - dy * dy);
            self.fill_rect(x - span, y + dy, 2 * span + 1, 1, color);
        }
    }
}

impl<T: Transport> Renderer for St7735<T> {
    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u16) {
        St7735::fill_rect(self, x, y, w, h, color);
    }

    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }
}

/// Integer square root, rounded down. Radii here are tiny, so the
/// counting loop is fine.
fn isqrt(v: i32) -> i32 {
    let mut s = 0;
    while (s + 1) * (s + 1) <= v {
        s += 1;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLUE, GREEN, RED};
    use crate::panel::ModelTransport;

    /// Transport recording command bytes and data bursts as they would
    /// cross the bus.
    #[derive(Debug, PartialEq, Eq, Clone)]
    enum Ev {
        Cmd(u8),
        Data(Vec<u8>),
    }

    #[derive(Default)]
    struct Recorder {
        dc: bool,
        events: Vec<Ev>,
        write_calls: usize,
    }

    impl Transport for Recorder {
        fn write(&mut self, bytes: &[u8]) {
            self.write_calls += 1;
            if self.dc {
                self.events.push(Ev::Data(bytes.to_vec()));
            } else {
                for &b in bytes {
                    self.events.push(Ev::Cmd(b));
                }
            }
        }
        fn set_dc(&mut self, high: bool) {
            self.dc = high;
        }
        fn set_cs(&mut self, _high: bool) {}
        fn set_reset(&mut self, _high: bool) {}
    }

    struct NoDelay;
    impl Delay for NoDelay {
        fn delay_ms(&mut self, _ms: u32) {}
    }

    struct SumDelay(u32);
    impl Delay for SumDelay {
        fn delay_ms(&mut self, ms: u32) {
            self.0 += ms;
        }
    }

    /// Data bytes streamed after RAMWR commands (the pixel stream),
    /// excluding window parameter bytes.
    fn pixel_bytes(events: &[Ev]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut in_ram_write = false;
        for ev in events {
            match ev {
                Ev::Cmd(c) => in_ram_write = *c == cmd::RAMWR,
                Ev::Data(d) => {
                    if in_ram_write {
                        out.extend_from_slice(d);
                    }
                }
            }
        }
        out
    }

    fn commands(events: &[Ev]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                Ev::Cmd(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    fn landscape_driver() -> St7735<Recorder> {
        let mut d = St7735::new(Recorder::default(), GREENTAB_128X160);
        d.init(&mut NoDelay);
        d.set_rotation(Rotation::Landscape);
        d.transport.events.clear();
        d.transport.write_calls = 0;
        d
    }

    #[test]
    fn test_init_sequence() {
        let mut d = St7735::new(Recorder::default(), GREENTAB_128X160);
        let mut delay = SumDelay(0);
        d.init(&mut delay);
        assert_eq!(
            commands(&d.transport.events),
            vec![
                cmd::SWRESET,
                cmd::SLPOUT,
                cmd::COLMOD,
                cmd::MADCTL,
                cmd::NORON,
                cmd::DISPON
            ]
        );
        // parameter bytes: 16bpp, then the default portrait orientation
        let data: Vec<&Vec<u8>> = d
            .transport
            .events
            .iter()
            .filter_map(|e| match e {
                Ev::Data(d) => Some(d),
                _ => None,
            })
            .collect();
        assert_eq!(data, vec![&vec![0x05], &vec![0xC0]]);
        // mandated settle times: 50+50 reset, 150, 255, 10, 100
        assert_eq!(delay.0, 615);
        assert_eq!((d.width(), d.height()), (128, 160));
    }

    #[test]
    fn test_rotation_swaps_tracked_dimensions() {
        let mut d = St7735::new(Recorder::default(), GREENTAB_128X160);
        d.init(&mut NoDelay);
        assert_eq!((d.width(), d.height()), (128, 160));
        d.set_rotation(Rotation::Landscape);
        assert_eq!((d.width(), d.height()), (160, 132));
        d.set_rotation(Rotation::PortraitFlipped);
        assert_eq!((d.width(), d.height()), (128, 160));
        d.set_rotation(Rotation::LandscapeFlipped);
        assert_eq!((d.width(), d.height()), (160, 132));
    }

    #[test]
    fn test_madctl_table() {
        assert_eq!(Rotation::Portrait.madctl(), 0xC0);
        assert_eq!(Rotation::Landscape.madctl(), 0xA0);
        assert_eq!(Rotation::PortraitFlipped.madctl(), 0x00);
        assert_eq!(Rotation::LandscapeFlipped.madctl(), 0x60);
    }

    #[test]
    fn test_out_of_bounds_origin_writes_nothing() {
        let mut d = landscape_driver();
        d.fill_rect(160, 0, 10, 10, RED);
        d.fill_rect(0, 132, 10, 10, RED);
        d.fill_rect(500, 700, 10, 10, RED);
        assert_eq!(d.transport.write_calls, 0);
    }

    #[test]
    fn test_degenerate_extent_writes_nothing() {
        let mut d = landscape_driver();
        d.fill_rect(10, 10, 0, 5, RED);
        d.fill_rect(10, 10, 5, 0, RED);
        d.fill_rect(10, 10, -3, 5, RED);
        // fully clipped away on the left
        d.fill_rect(-20, 10, 10, 5, RED);
        assert_eq!(d.transport.write_calls, 0);
    }

    #[test]
    fn test_edge_clip_byte_stream() {
        // 10x10 at x=155 on a 160-wide surface clips to 5x10
        let mut d = landscape_driver();
        d.fill_rect(155, 0, 10, 10, RED);
        let px = pixel_bytes(&d.transport.events);
        assert_eq!(px.len(), 100);
        for pair in px.chunks_exact(2) {
            assert_eq!(pair, [0xF8, 0x00]);
        }
        // window covers exactly columns 155..=159
        assert_eq!(
            d.transport.events[..2],
            [Ev::Cmd(cmd::CASET), Ev::Data(vec![0, 155, 0, 159])]
        );
        assert_eq!(
            d.transport.events[2..4],
            [Ev::Cmd(cmd::RASET), Ev::Data(vec![0, 0, 0, 9])]
        );
    }

    #[test]
    fn test_bottom_edge_clip() {
        let mut d = landscape_driver();
        d.fill_rect(0, 130, 4, 10, BLUE);
        assert_eq!(pixel_bytes(&d.transport.events).len(), 2 * 4 * 2);
    }

    #[test]
    fn test_negative_origin_clips_left_and_top() {
        let mut d = landscape_driver();
        d.fill_rect(-3, -2, 10, 10, RED);
        // 7x8 survives at the origin
        assert_eq!(pixel_bytes(&d.transport.events).len(), 2 * 7 * 8);
        assert_eq!(
            d.transport.events[..2],
            [Ev::Cmd(cmd::CASET), Ev::Data(vec![0, 0, 0, 6])]
        );
    }

    #[test]
    fn test_fill_matches_full_rect_byte_for_byte() {
        let mut a = landscape_driver();
        let mut b = landscape_driver();
        a.fill(GREEN);
        b.fill_rect(0, 0, 160, 132, GREEN);
        assert_eq!(a.transport.events, b.transport.events);
    }

    #[test]
    fn test_chunking_preserves_stream() {
        // 40x30 = 1200 pixels crosses one chunk boundary
        let mut d = landscape_driver();
        d.fill_rect(0, 0, 40, 30, BLUE);
        let px = pixel_bytes(&d.transport.events);
        assert_eq!(px.len(), 2 * 1200);
        for pair in px.chunks_exact(2) {
            assert_eq!(pair, [0x00, 0x1F]);
        }
        // burst sizes: one full chunk then the short tail
        let bursts: Vec<usize> = d
            .transport
            .events
            .iter()
            .skip_while(|e| !matches!(e, Ev::Cmd(c) if *c == cmd::RAMWR))
            .filter_map(|e| match e {
                Ev::Data(d) => Some(d.len()),
                _ => None,
            })
            .collect();
        assert_eq!(bursts, vec![2048, 352]);
    }

    #[test]
    fn test_rotated_max_coordinate_not_clipped() {
        let mut d = landscape_driver();
        d.fill_rect(159, 131, 1, 1, RED);
        assert_eq!(pixel_bytes(&d.transport.events), vec![0xF8, 0x00]);
    }

    #[test]
    fn test_calibration_offsets_shift_window() {
        let cfg = Config {
            colstart: 2,
            rowstart: 1,
            ..GREENTAB_128X160
        };
        let mut d = St7735::new(Recorder::default(), cfg);
        d.init(&mut NoDelay);
        d.transport.events.clear();
        d.fill_rect(0, 0, 4, 4, RED);
        assert_eq!(
            d.transport.events[..4],
            [
                Ev::Cmd(cmd::CASET),
                Ev::Data(vec![0, 2, 0, 5]),
                Ev::Cmd(cmd::RASET),
                Ev::Data(vec![0, 1, 0, 4]),
            ]
        );
    }

    #[test]
    fn test_set_pixel() {
        let mut d = landscape_driver();
        d.set_pixel(3, 7, RED);
        assert_eq!(
            d.transport.events,
            vec![
                Ev::Cmd(cmd::CASET),
                Ev::Data(vec![0, 3, 0, 3]),
                Ev::Cmd(cmd::RASET),
                Ev::Data(vec![0, 7, 0, 7]),
                Ev::Cmd(cmd::RAMWR),
                Ev::Data(vec![0xF8, 0x00]),
            ]
        );
        d.transport.events.clear();
        d.set_pixel(-1, 0, RED);
        d.set_pixel(160, 0, RED);
        d.set_pixel(0, 132, RED);
        assert!(d.transport.events.is_empty());
    }

    #[test]
    fn test_fill_circle_matches_distance_predicate() {
        let mut d = St7735::new(ModelTransport::new(), GREENTAB_128X160);
        d.init(&mut NoDelay);
        let (cx, cy, r) = (30, 40, 7);
        d.fill_circle(cx, cy, r, RED);
        let model = &d.transport.model;
        for y in 0..60 {
            for x in 0..60 {
                let inside = (x - cx).pow(2) + (y - cy).pow(2) <= r * r;
                let painted = model.pixel(x as usize, y as usize) == RED;
                assert_eq!(painted, inside, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(48), 6);
        assert_eq!(isqrt(49), 7);
        assert_eq!(isqrt(50), 7);
    }
}
