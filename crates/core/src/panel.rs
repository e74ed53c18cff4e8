//! In-memory model of the ST7735 display controller.
//!
//! Consumes the same command/data byte protocol the real panel receives
//! over the bus and maintains GRAM contents, addressing state, and mode
//! flags. The simulator renders its frames from this model and the
//! driver tests assert on its pixels, so the firmware above it runs
//! unmodified. Commands outside the set the firmware relies on are
//! accepted and ignored.

use crate::color;
use crate::st7735::cmd;
use crate::transport::Transport;

/// Controller GRAM geometry: 132 columns by 162 rows of RGB565.
pub const GRAM_COLS: usize = 132;
pub const GRAM_ROWS: usize = 162;

/// MADCTL row/column exchange bit. The mirror bits (0x80/0x40) only
/// change the glass scan direction and are ignored here, like the
/// remap commands of simpler controllers.
const MADCTL_MV: u8 = 0x20;

/// Multi-byte command parameter collector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmdState {
    Ready,
    Caset,
    Raset,
    Madctl,
    Colmod,
}

/// ST7735 controller state machine.
pub struct St7735Model {
    ram: Vec<u16>,
    /// Column address window and cursor (address space, offsets included)
    x_start: u16,
    x_end: u16,
    x: u16,
    /// Row address window and cursor
    y_start: u16,
    y_end: u16,
    y: u16,
    madctl: u8,
    colmod: u8,
    sleeping: bool,
    display_on: bool,
    normal_mode: bool,
    in_ram_write: bool,
    /// High pixel byte waiting for its partner
    byte_latch: Option<u8>,
    state: CmdState,
    params: [u8; 4],
    nparams: usize,
    /// Command bytes received (diagnostics)
    pub dbg_cmd_count: u32,
    /// Data bytes received (diagnostics)
    pub dbg_data_count: u32,
}

impl St7735Model {
    pub fn new() -> Self {
        let mut m = St7735Model {
            ram: vec![0; GRAM_COLS * GRAM_ROWS],
            x_start: 0,
            x_end: 0,
            x: 0,
            y_start: 0,
            y_end: 0,
            y: 0,
            madctl: 0,
            colmod: 0,
            sleeping: true,
            display_on: false,
            normal_mode: true,
            in_ram_write: false,
            byte_latch: None,
            state: CmdState::Ready,
            params: [0; 4],
            nparams: 0,
            dbg_cmd_count: 0,
            dbg_data_count: 0,
        };
        m.reset_registers();
        m
    }

    /// Power-on / software-reset register defaults. GRAM is untouched,
    /// as on the real part.
    fn reset_registers(&mut self) {
        self.x_start = 0;
        self.x_end = (GRAM_COLS - 1) as u16;
        self.x = 0;
        self.y_start = 0;
        self.y_end = (GRAM_ROWS - 1) as u16;
        self.y = 0;
        self.madctl = 0;
        self.colmod = 0x06;
        self.sleeping = true;
        self.display_on = false;
        self.normal_mode = true;
        self.in_ram_write = false;
        self.byte_latch = None;
        self.state = CmdState::Ready;
        self.nparams = 0;
    }

    /// Hardware reset line pulled low.
    pub fn hardware_reset(&mut self) {
        self.reset_registers();
    }

    /// Receive a command byte (DC low).
    pub fn receive_command(&mut self, byte: u8) {
        self.dbg_cmd_count += 1;
        // any command aborts parameter collection and closes the pixel stream
        self.state = CmdState::Ready;
        self.in_ram_write = false;
        self.byte_latch = None;
        self.nparams = 0;

        match byte {
            cmd::NOP => {}
            cmd::SWRESET => self.reset_registers(),
            cmd::SLPIN => self.sleeping = true,
            cmd::SLPOUT => self.sleeping = false,
            cmd::NORON => self.normal_mode = true,
            cmd::DISPOFF => self.display_on = false,
            cmd::DISPON => self.display_on = true,
            cmd::CASET => self.state = CmdState::Caset,
            cmd::RASET => self.state = CmdState::Raset,
            cmd::RAMWR => {
                self.in_ram_write = true;
                self.x = self.x_start;
                self.y = self.y_start;
            }
            cmd::MADCTL => self.state = CmdState::Madctl,
            cmd::COLMOD => self.state = CmdState::Colmod,
            _ => {
                // unknown command, ignore
            }
        }
    }

    /// Receive a data byte (DC high).
    pub fn receive_data(&mut self, byte: u8) {
        self.dbg_data_count += 1;
        match self.state {
            CmdState::Caset | CmdState::Raset => {
                self.params[self.nparams] = byte;
                self.nparams += 1;
                if self.nparams == 4 {
                    let start = u16::from_be_bytes([self.params[0], self.params[1]]);
                    let end = u16::from_be_bytes([self.params[2], self.params[3]]);
                    if self.state == CmdState::Caset {
                        self.x_start = start;
                        self.x_end = end;
                        self.x = start;
                    } else {
                        self.y_start = start;
                        self.y_end = end;
                        self.y = start;
                    }
                    self.state = CmdState::Ready;
                    self.nparams = 0;
                }
            }
            CmdState::Madctl => {
                self.madctl = byte;
                self.state = CmdState::Ready;
            }
            CmdState::Colmod => {
                self.colmod = byte;
                self.state = CmdState::Ready;
            }
            CmdState::Ready => {
                if self.in_ram_write {
                    match self.byte_latch.take() {
                        None => self.byte_latch = Some(byte),
                        Some(high) => {
                            let pixel = ((high as u16) << 8) | byte as u16;
                            self.push_pixel(pixel);
                        }
                    }
                }
                // data with no consumer falls on the floor
            }
        }
    }

    /// Store one pixel at the cursor and advance within the window,
    /// wrapping back to the window origin when it overflows.
    fn push_pixel(&mut self, pixel: u16) {
        // with row/column exchange the column counter walks GRAM rows
        let (col, row) = if self.madctl & MADCTL_MV != 0 {
            (self.y as usize, self.x as usize)
        } else {
            (self.x as usize, self.y as usize)
        };
        if col < GRAM_COLS && row < GRAM_ROWS {
            self.ram[row * GRAM_COLS + col] = pixel;
        }

        if self.x < self.x_end {
            self.x += 1;
        } else {
            self.x = self.x_start;
            if self.y < self.y_end {
                self.y += 1;
            } else {
                self.y = self.y_start;
            }
        }
    }

    /// GRAM contents at logical surface coordinates for the current
    /// orientation. Out-of-range reads are black.
    pub fn pixel(&self, x: usize, y: usize) -> u16 {
        let (col, row) = if self.madctl & MADCTL_MV != 0 {
            (y, x)
        } else {
            (x, y)
        };
        if col < GRAM_COLS && row < GRAM_ROWS {
            self.ram[row * GRAM_COLS + col]
        } else {
            color::BLACK
        }
    }

    /// A w x h logical frame as RGB565, row-major. Black until the
    /// display is awake and on.
    pub fn frame_rgb565(&self, w: usize, h: usize) -> Vec<u16> {
        let mut out = vec![color::BLACK; w * h];
        if self.sleeping || !self.display_on {
            return out;
        }
        for y in 0..h {
            for x in 0..w {
                out[y * w + x] = self.pixel(x, y);
            }
        }
        out
    }

    /// A w x h logical frame as 0x00RRGGBB pixels (minifb layout).
    pub fn frame_u32(&self, w: usize, h: usize) -> Vec<u32> {
        self.frame_rgb565(w, h)
            .into_iter()
            .map(color::to_u32)
            .collect()
    }

    pub fn sleeping(&self) -> bool {
        self.sleeping
    }

    pub fn display_on(&self) -> bool {
        self.display_on
    }

    pub fn normal_mode(&self) -> bool {
        self.normal_mode
    }

    pub fn madctl(&self) -> u8 {
        self.madctl
    }

    pub fn colmod(&self) -> u8 {
        self.colmod
    }

    /// Reset the per-frame diagnostic counters.
    pub fn dbg_reset_counters(&mut self) {
        self.dbg_cmd_count = 0;
        self.dbg_data_count = 0;
    }
}

impl Default for St7735Model {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Transport`] adapter that feeds a model, honouring the DC and CS
/// lines the way the real chip does: bytes arriving while deselected
/// are dropped.
pub struct ModelTransport {
    pub model: St7735Model,
    dc: bool,
    cs: bool,
}

impl ModelTransport {
    pub fn new() -> Self {
        ModelTransport {
            model: St7735Model::new(),
            dc: false,
            cs: true,
        }
    }
}

impl Default for ModelTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ModelTransport {
    fn write(&mut self, bytes: &[u8]) {
        if self.cs {
            return;
        }
        for &b in bytes {
            if self.dc {
                self.model.receive_data(b);
            } else {
                self.model.receive_command(b);
            }
        }
    }

    fn set_dc(&mut self, high: bool) {
        self.dc = high;
    }

    fn set_cs(&mut self, high: bool) {
        self.cs = high;
    }

    fn set_reset(&mut self, high: bool) {
        if !high {
            self.model.hardware_reset();
        }
    }
}
