//! tftboy desktop simulator.
//!
//! Runs the firmware control loop unmodified on a dedicated thread,
//! wired to an in-memory ST7735 panel model instead of the real bus.
//!
//! Two execution modes:
//!
//! - **GUI mode** (default): scaled window, keyboard/gamepad input,
//!   scale toggle, PNG screenshots, FPS title.
//! - **Headless mode** (`--headless`): automated runs with a scripted
//!   Select press and ASCII display snapshots.
//!
//! Keyboard map (the device has two button clusters):
//! W/S = menu up/down (bubble aim), Z or Enter = select/fire,
//! arrows = pad (maze movement; up exits the bubble game).

use minifb::{Key, Scale, ScaleMode, Window, WindowOptions};
use gilrs::{Axis, Button as GilrsButton, Event as GilrsEvent, EventType, Gilrs};
use std::env;
use std::fs;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tftboy_core::{
    menu, png, Buttons, Button, Delay, Rng, Rotation, St7735, St7735Model, Transport,
    GREENTAB_128X160, SCREEN_HEIGHT, SCREEN_WIDTH,
};

/// Analog stick deadzone
const STICK_DEADZONE: f32 = 0.3;
/// Analog trigger deadzone
const TRIGGER_DEADZONE: f32 = 0.2;

type SharedPanel = Arc<Mutex<St7735Model>>;
type SharedButtons = Arc<AtomicU8>;

// ─── Simulated board ────────────────────────────────────────────────────────

/// Display bus: feeds command/data bytes into the shared panel model
/// with the DC/CS framing the real controller sees.
struct SimBus {
    panel: SharedPanel,
    dc: bool,
    cs: bool,
}

impl SimBus {
    fn new(panel: SharedPanel) -> Self {
        SimBus { panel, dc: false, cs: true }
    }
}

impl Transport for SimBus {
    fn write(&mut self, bytes: &[u8]) {
        if self.cs {
            return;
        }
        let mut panel = self.panel.lock().expect("panel lock");
        for &b in bytes {
            if self.dc {
                panel.receive_data(b);
            } else {
                panel.receive_command(b);
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
            self.panel.lock().expect("panel lock").hardware_reset();
        }
    }
}

/// Buttons + delays for the firmware thread. `divisor` compresses time
/// in headless runs.
struct SimIo {
    buttons: SharedButtons,
    divisor: u32,
}

impl Buttons for SimIo {
    fn level(&self, button: Button) -> bool {
        // pulled high, pressed = low
        self.buttons.load(Ordering::Relaxed) & (1 << button.bit()) == 0
    }
}

impl Delay for SimIo {
    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis((ms / self.divisor).max(1) as u64));
    }
}

/// Spawn the firmware control loop. It owns the driver and never
/// returns; the process exits with the UI.
fn spawn_firmware(panel: SharedPanel, buttons: SharedButtons, divisor: u32, seed: u32) {
    thread::Builder::new()
        .name("firmware".into())
        .spawn(move || {
            let mut io = SimIo { buttons, divisor };
            let mut screen = St7735::new(SimBus::new(panel), GREENTAB_128X160);
            screen.init(&mut io);
            screen.set_rotation(Rotation::Landscape);
            let mut rng = Rng::new(seed);
            menu::run(&mut screen, &mut io, &mut rng);
        })
        .expect("spawn firmware thread");
}

// ─── Gamepad ────────────────────────────────────────────────────────────────

struct GamepadState {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    cluster_up: bool,
    cluster_down: bool,
    select: bool,
    left_stick_x: f32,
    left_stick_y: f32,
}

impl GamepadState {
    fn new() -> Self {
        GamepadState {
            up: false,
            down: false,
            left: false,
            right: false,
            cluster_up: false,
            cluster_down: false,
            select: false,
            left_stick_x: 0.0,
            left_stick_y: 0.0,
        }
    }
    fn eff_up(&self) -> bool {
        self.up || self.left_stick_y < -STICK_DEADZONE
    }
    fn eff_down(&self) -> bool {
        self.down || self.left_stick_y > STICK_DEADZONE
    }
    fn eff_left(&self) -> bool {
        self.left || self.left_stick_x < -STICK_DEADZONE
    }
    fn eff_right(&self) -> bool {
        self.right || self.left_stick_x > STICK_DEADZONE
    }
}

fn init_gamepad(debug: bool) -> Option<Gilrs> {
    match Gilrs::new() {
        Ok(gilrs) => {
            if debug {
                let mut found = false;
                for (id, gp) in gilrs.gamepads() {
                    println!("Gamepad: [{}] \"{}\" ({})", id, gp.name(), gp.os_name());
                    found = true;
                }
                if !found {
                    println!("No gamepad (hot-plug supported).");
                }
            }
            Some(gilrs)
        }
        Err(e) => {
            eprintln!("Warning: gamepad: {}", e);
            None
        }
    }
}

fn poll_gamepad(gilrs: &mut Gilrs, state: &mut GamepadState) {
    while let Some(GilrsEvent { event, .. }) = gilrs.next_event() {
        match event {
            EventType::ButtonPressed(b, _) => apply_button(state, b, true),
            EventType::ButtonReleased(b, _) => apply_button(state, b, false),
            EventType::AxisChanged(a, v, _) => apply_axis(state, a, v),
            EventType::Disconnected => *state = GamepadState::new(),
            _ => {}
        }
    }
}

fn apply_button(state: &mut GamepadState, btn: GilrsButton, pressed: bool) {
    match btn {
        GilrsButton::DPadUp => state.up = pressed,
        GilrsButton::DPadDown => state.down = pressed,
        GilrsButton::DPadLeft => state.left = pressed,
        GilrsButton::DPadRight => state.right = pressed,
        GilrsButton::South | GilrsButton::Start => state.select = pressed,
        GilrsButton::North | GilrsButton::RightTrigger | GilrsButton::RightTrigger2 => {
            state.cluster_up = pressed
        }
        GilrsButton::West | GilrsButton::LeftTrigger | GilrsButton::LeftTrigger2 => {
            state.cluster_down = pressed
        }
        _ => {}
    }
}

fn apply_axis(state: &mut GamepadState, axis: Axis, value: f32) {
    match axis {
        Axis::LeftStickX => state.left_stick_x = value,
        Axis::LeftStickY => state.left_stick_y = value,
        Axis::DPadX => {
            state.left = value < -STICK_DEADZONE;
            state.right = value > STICK_DEADZONE;
        }
        Axis::DPadY => {
            state.up = value < -STICK_DEADZONE;
            state.down = value > STICK_DEADZONE;
        }
        Axis::LeftZ | Axis::RightZ => {
            if value > TRIGGER_DEADZONE {
                state.select = true;
            } else if value < 0.05 {
                state.select = false;
            }
        }
        _ => {}
    }
}

// ─── Screenshot ─────────────────────────────────────────────────────────────

fn save_screenshot(panel: &SharedPanel, path: &str) -> Result<(), String> {
    let frame = panel
        .lock()
        .map_err(|_| "panel lock poisoned".to_string())?
        .frame_rgb565(SCREEN_WIDTH, SCREEN_HEIGHT);
    let data = png::encode(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32, &frame);
    fs::write(path, &data).map_err(|e| format!("{}: {}", path, e))
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("tftboy simulator");
        eprintln!("Usage: {} [options]", args[0]);
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --headless           Run without GUI");
        eprintln!("  --frames N           Run N frames (headless, default 120)");
        eprintln!("  --press F            Press Select on frame F (headless)");
        eprintln!("  --snapshot F         Print display at frame F (repeatable)");
        eprintln!("  --debug              Show diagnostics");
        eprintln!("  --scale N            Initial window scale 1-6 (default 4)");
        eprintln!("  --seed N             PRNG seed (default: wall clock)");
        eprintln!();
        eprintln!("GUI keys: Arrows=pad W/S=menu Z/Enter=select");
        eprintln!("          1-6=Scale S=Screenshot Esc=Quit");
        std::process::exit(1);
    }

    let headless = args.iter().any(|a| a == "--headless");
    let debug = args.iter().any(|a| a == "--debug");

    let initial_scale: usize = arg_value(&args, "--scale")
        .unwrap_or(4)
        .clamp(1, 6);
    let seed: u32 = arg_value(&args, "--seed").unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(1)
    });
    if debug {
        println!("Seed: {}", seed);
    }

    let panel: SharedPanel = Arc::new(Mutex::new(St7735Model::new()));
    let buttons: SharedButtons = Arc::new(AtomicU8::new(0));

    if headless {
        // compress firmware delays so scripted runs finish quickly
        spawn_firmware(panel.clone(), buttons.clone(), 10, seed);
        run_headless(&args, &panel, &buttons);
    } else {
        spawn_firmware(panel.clone(), buttons.clone(), 1, seed);
        run_gui(&panel, &buttons, initial_scale, debug);
    }
}

/// `--flag value` lookup.
fn arg_value<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn press_mask(window: &Window, gp: &GamepadState) -> u8 {
    let mut mask = 0u8;
    let mut set = |b: Button, on: bool| {
        if on {
            mask |= 1 << b.bit();
        }
    };
    set(
        Button::Up,
        window.is_key_down(Key::W) || gp.cluster_up,
    );
    set(
        Button::Down,
        window.is_key_down(Key::S) || gp.cluster_down,
    );
    set(
        Button::Select,
        window.is_key_down(Key::Z) || window.is_key_down(Key::Enter) || gp.select,
    );
    set(Button::PadUp, window.is_key_down(Key::Up) || gp.eff_up());
    set(
        Button::PadDown,
        window.is_key_down(Key::Down) || gp.eff_down(),
    );
    set(
        Button::PadLeft,
        window.is_key_down(Key::Left) || gp.eff_left(),
    );
    set(
        Button::PadRight,
        window.is_key_down(Key::Right) || gp.eff_right(),
    );
    mask
}

// ─── GUI Mode ───────────────────────────────────────────────────────────────

fn run_gui(panel: &SharedPanel, buttons: &SharedButtons, initial_scale: usize, debug: bool) {
    let mut scale = initial_scale;
    let mut scaled_w = SCREEN_WIDTH * scale;
    let mut scaled_h = SCREEN_HEIGHT * scale;

    let mut window = Window::new(
        "tftboy-sim",
        scaled_w,
        scaled_h,
        WindowOptions {
            scale: Scale::X1,
            scale_mode: ScaleMode::AspectRatioStretch,
            resize: true,
            ..Default::default()
        },
    )
    .expect("Failed to create window");
    window.set_target_fps(60);

    let mut gilrs = init_gamepad(debug);
    let mut gp = GamepadState::new();
    let mut scaled_buf = vec![0u32; scaled_w * scaled_h];
    let mut prev_s = false;
    let mut prev_num = [false; 6];
    let mut screenshot_n = 0u32;
    let mut last_fps_time = Instant::now();
    let mut fps_frames: u64 = 0;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        if let Some(ref mut g) = gilrs {
            poll_gamepad(g, &mut gp);
        }

        // Scale toggle (1-6)
        let num = [
            window.is_key_down(Key::Key1),
            window.is_key_down(Key::Key2),
            window.is_key_down(Key::Key3),
            window.is_key_down(Key::Key4),
            window.is_key_down(Key::Key5),
            window.is_key_down(Key::Key6),
        ];
        for i in 0..6 {
            if num[i] && !prev_num[i] {
                scale = i + 1;
                scaled_w = SCREEN_WIDTH * scale;
                scaled_h = SCREEN_HEIGHT * scale;
                scaled_buf.resize(scaled_w * scaled_h, 0);
                window = Window::new(
                    "tftboy-sim",
                    scaled_w,
                    scaled_h,
                    WindowOptions {
                        scale: Scale::X1,
                        scale_mode: ScaleMode::AspectRatioStretch,
                        resize: true,
                        ..Default::default()
                    },
                )
                .expect("window");
                window.set_target_fps(60);
            }
        }
        prev_num = num;

        // Screenshot (S)
        let s = window.is_key_down(Key::S);
        if s && !prev_s {
            let f = format!("screenshot_{:04}.png", screenshot_n);
            match save_screenshot(panel, &f) {
                Ok(()) => {
                    eprintln!("Screenshot: {}", f);
                    screenshot_n += 1;
                }
                Err(e) => eprintln!("Screenshot error: {}", e),
            }
        }
        prev_s = s;

        // Input
        buttons.store(press_mask(&window, &gp), Ordering::Relaxed);

        // Render
        let pixels = panel
            .lock()
            .expect("panel lock")
            .frame_u32(SCREEN_WIDTH, SCREEN_HEIGHT);
        let cur_scale = scaled_w / SCREEN_WIDTH;
        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                let c = pixels[y * SCREEN_WIDTH + x];
                for sy in 0..cur_scale {
                    let base = (y * cur_scale + sy) * scaled_w + x * cur_scale;
                    for sx in 0..cur_scale {
                        if base + sx < scaled_buf.len() {
                            scaled_buf[base + sx] = c;
                        }
                    }
                }
            }
        }
        window
            .update_with_buffer(&scaled_buf, scaled_w, scaled_h)
            .expect("update");

        fps_frames += 1;
        if last_fps_time.elapsed() >= Duration::from_secs(2) {
            let fps = fps_frames as f64 / last_fps_time.elapsed().as_secs_f64();
            window.set_title(&format!("tftboy-sim - {:.0} FPS ({}x)", fps, cur_scale));
            fps_frames = 0;
            last_fps_time = Instant::now();
        }
    }
}

// ─── Headless Mode ──────────────────────────────────────────────────────────

fn run_headless(args: &[String], panel: &SharedPanel, buttons: &SharedButtons) {
    let frames: usize = arg_value(args, "--frames").unwrap_or(120);
    let debug = args.iter().any(|a| a == "--debug");
    let press_frame: Option<usize> = arg_value(args, "--press");
    let mut snapshots: Vec<usize> = Vec::new();
    {
        let mut i = 0;
        while i < args.len() {
            if args[i] == "--snapshot" {
                if let Some(f) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    snapshots.push(f);
                }
                i += 2;
            } else {
                i += 1;
            }
        }
    }
    if debug {
        if let Some(pf) = press_frame {
            println!("Press Select on frame {}", pf);
        }
        println!("Running {} frames...", frames);
    }

    for frame in 0..frames {
        if let Some(pf) = press_frame {
            if frame == pf {
                buttons.store(1 << Button::Select.bit(), Ordering::Relaxed);
                if debug {
                    println!("  >> Select pressed");
                }
            } else if frame == pf + 5 {
                buttons.store(0, Ordering::Relaxed);
                if debug {
                    println!("  >> Select released");
                }
            }
        }
        thread::sleep(Duration::from_millis(16));

        if debug && frame % 30 == 0 {
            let (cmds, data) = {
                let p = panel.lock().expect("panel lock");
                (p.dbg_cmd_count, p.dbg_data_count)
            };
            println!("  Frame {:4}: cmds={} data={}", frame, cmds, data);
        }
        if snapshots.contains(&frame) || (debug && frame == frames - 1) {
            println!("\n  === Frame {} ===", frame);
            print_display(panel);
        }
    }
}

/// ASCII half-block rendering of the panel, two rows per text line.
fn print_display(panel: &SharedPanel) {
    let frame = panel
        .lock()
        .expect("panel lock")
        .frame_rgb565(SCREEN_WIDTH, SCREEN_HEIGHT);
    let lit = |x: usize, y: usize| frame[y * SCREEN_WIDTH + x] != 0;
    let count = frame.iter().filter(|&&p| p != 0).count();
    println!("  ({} px lit)", count);
    for y in (0..SCREEN_HEIGHT).step_by(2) {
        let mut l = String::with_capacity(SCREEN_WIDTH + 4);
        l.push_str("  |");
        for x in 0..SCREEN_WIDTH {
            let t = lit(x, y);
            let b = if y + 1 < SCREEN_HEIGHT { lit(x, y + 1) } else { false };
            l.push(match (t, b) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                _ => ' ',
            });
        }
        l.push('|');
        println!("{}", l);
    }
}
