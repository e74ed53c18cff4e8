//! Bubble-shooter game.
//!
//! Bubbles sit on a honeycomb grid (odd rows shifted half a cell). The
//! shooter at the bottom aims with the menu cluster, fires with Select;
//! a flying bubble bounces off the side walls, sticks at the top or
//! next to settled bubbles, and groups of three or more equal colours
//! pop. Clearing the board wins. Pad-up leaves the game from any wait.

use crate::color::{BLACK, BLUE, CYAN, GREEN, MAGENTA, RED, WHITE, YELLOW};
use crate::gfx::Renderer;
use crate::input::{Button, Buttons};
use crate::rng::Rng;
use crate::transport::Delay;

pub const GRID_RADIUS: i32 = 7;
pub const GRID_DIA: i32 = GRID_RADIUS * 2;
pub const ROWS: usize = 15;
/// Vertical pitch between rows: 90% of a diameter, floored, so the
/// staggered rows interlock.
pub const ROW_HEIGHT: i32 = GRID_DIA * 9 / 10;

const DRAW_RADIUS: i32 = 5;
const SHOOTER_X: f32 = 80.0;
const SHOOTER_Y: f32 = 125.0;
const FLIGHT_STEP: f32 = 12.0;

/// Shooter palette. Cell value 0 is an empty slot.
pub const COLORS: [u16; 6] = [RED, GREEN, BLUE, YELLOW, MAGENTA, CYAN];

const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// The bubble grid: `ROWS` rows by a column count derived from the
/// surface width at startup.
pub struct Grid {
    cells: Vec<u16>,
    cols: usize,
}

impl Grid {
    pub fn new(cols: usize) -> Self {
        Grid {
            cells: vec![0; ROWS * cols],
            cols,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, r: usize, c: usize) -> u16 {
        self.cells[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, color: u16) {
        self.cells[r * self.cols + c] = color;
    }

    /// Occupied cells left on the board.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }
}

/// Centre pixel of cell (r, c): honeycomb packing, odd rows shifted
/// right by one radius.
pub fn cell_center(r: usize, c: usize) -> (i32, i32) {
    let y = r as i32 * ROW_HEIGHT + GRID_RADIUS + 2;
    let offset = if r % 2 == 1 { GRID_RADIUS } else { 0 };
    let x = c as i32 * GRID_DIA + GRID_RADIUS + offset + 2;
    (x, y)
}

/// Connected component of `color` seeded at (r, c), 8-directional
/// adjacency. Explicit work-list and visited set, bounded by the grid
/// size.
pub fn check_matches(grid: &Grid, r: usize, c: usize, color: u16) -> Vec<(usize, usize)> {
    if color == 0 || grid.get(r, c) != color {
        return Vec::new();
    }
    let mut visited = vec![false; ROWS * grid.cols];
    let mut stack = vec![(r, c)];
    let mut group = Vec::new();
    visited[r * grid.cols + c] = true;
    while let Some((r, c)) = stack.pop() {
        group.push((r, c));
        for (dr, dc) in NEIGHBOURS {
            let nr = r as i32 + dr;
            let nc = c as i32 + dc;
            if nr < 0 || nr >= ROWS as i32 || nc < 0 || nc >= grid.cols as i32 {
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);
            if visited[nr * grid.cols + nc] || grid.get(nr, nc) != color {
                continue;
            }
            visited[nr * grid.cols + nc] = true;
            stack.push((nr, nc));
        }
    }
    group
}

/// Nearest empty cell to a point, with its distance. A settled bubble
/// snaps here when the distance is within 1.5 diameters.
fn nearest_empty(grid: &Grid, x: f32, y: f32) -> Option<(usize, usize, f32)> {
    let mut best: Option<(usize, usize, f32)> = None;
    for r in 0..ROWS {
        for c in 0..grid.cols {
            if grid.get(r, c) == 0 {
                let (gx, gy) = cell_center(r, c);
                let (dx, dy) = (x - gx as f32, y - gy as f32);
                let dist = (dx * dx + dy * dy).sqrt();
                if best.map_or(true, |(_, _, d)| dist < d) {
                    best = Some((r, c, dist));
                }
            }
        }
    }
    best
}

/// Play until the board is cleared or Pad-up is pressed.
pub fn run<R: Renderer, I: Buttons + Delay>(screen: &mut R, io: &mut I, rng: &mut Rng) {
    let cols = (screen.width() / GRID_DIA) as usize;
    let mut grid = Grid::new(cols);
    for r in 0..4 {
        for c in 0..cols {
            grid.set(r, c, rng.choice(&COLORS));
        }
    }

    let mut angle: f32 = 90.0;
    let mut shooter_color = rng.choice(&COLORS);
    let mut next_color = rng.choice(&COLORS);

    screen.fill(BLACK);
    for r in 0..ROWS {
        for c in 0..cols {
            let color = grid.get(r, c);
            if color != 0 {
                let (gx, gy) = cell_center(r, c);
                screen.draw_disc(gx, gy, DRAW_RADIUS, color);
            }
        }
    }

    loop {
        if io.pressed(Button::PadUp) {
            return;
        }

        // redraw the shooter strip: aim line, shooter, next-colour preview
        let rad = angle.to_radians();
        let strip_w = screen.width();
        screen.fill_rect(0, 105, strip_w, 27, BLACK);
        let mut i = 5;
        while i < 20 {
            let px = SHOOTER_X + rad.cos() * i as f32;
            let py = SHOOTER_Y - rad.sin() * i as f32;
            screen.fill_rect(px as i32, py as i32, 2, 2, WHITE);
            i += 2;
        }
        screen.draw_disc(SHOOTER_X as i32, SHOOTER_Y as i32, DRAW_RADIUS, shooter_color);
        screen.draw_disc(10, 125, 4, next_color);

        // wait for an aim change or the trigger
        let mut fired = false;
        while !fired {
            if io.pressed(Button::PadUp) {
                return;
            }
            if io.pressed(Button::Down) {
                // aim left
                if angle < 160.0 {
                    angle += 5.0;
                }
                break;
            }
            if io.pressed(Button::Up) {
                // aim right
                if angle > 20.0 {
                    angle -= 5.0;
                }
                break;
            }
            if io.pressed(Button::Select) {
                fired = true;
                // debounce by holding until release
                while io.pressed(Button::Select) {
                    if io.pressed(Button::PadUp) {
                        return;
                    }
                    io.delay_ms(10);
                }
            }
            io.delay_ms(40);
        }
        if !fired {
            continue;
        }

        // projectile flight
        let (mut bx, mut by) = (SHOOTER_X, SHOOTER_Y);
        let mut dx = rad.cos() * FLIGHT_STEP;
        let dy = -rad.sin() * FLIGHT_STEP;
        let right_limit = (screen.width() - GRID_RADIUS) as f32;

        let mut moving = true;
        while moving {
            if io.pressed(Button::PadUp) {
                return;
            }
            screen.draw_disc(bx as i32, by as i32, DRAW_RADIUS, BLACK);
            bx += dx;
            by += dy;

            if bx <= GRID_RADIUS as f32 || bx >= right_limit {
                dx = -dx;
                bx += dx;
            }
            if by <= GRID_RADIUS as f32 {
                moving = false;
            }

            for r in 0..ROWS {
                let (_, gy) = cell_center(r, 0);
                if (gy as f32 - by).abs() > GRID_DIA as f32 {
                    continue;
                }
                for c in 0..cols {
                    if grid.get(r, c) != 0 {
                        let (gx, gy) = cell_center(r, c);
                        let (ddx, ddy) = (bx - gx as f32, by - gy as f32);
                        if (ddx * ddx + ddy * ddy).sqrt() < (GRID_DIA - 1) as f32 {
                            moving = false;
                        }
                    }
                }
            }

            if moving {
                screen.draw_disc(bx as i32, by as i32, DRAW_RADIUS, shooter_color);
            } else {
                screen.draw_disc(bx as i32, by as i32, DRAW_RADIUS, BLACK);
            }
            io.delay_ms(10);
        }

        if let Some((r, c, dist)) = nearest_empty(&grid, bx, by) {
            if dist < GRID_DIA as f32 * 1.5 {
                grid.set(r, c, shooter_color);

                let group = check_matches(&grid, r, c, shooter_color);
                if group.len() >= 3 {
                    for &(mr, mc) in &group {
                        grid.set(mr, mc, 0);
                        let (gx, gy) = cell_center(mr, mc);
                        screen.draw_disc(gx, gy, DRAW_RADIUS, BLACK);
                    }
                    // erasing a disc can bite into its neighbours, so
                    // repaint the survivors around the cleared cells
                    for &(mr, mc) in &group {
                        for (dr, dc) in NEIGHBOURS {
                            let nr = mr as i32 + dr;
                            let nc = mc as i32 + dc;
                            if nr < 0 || nr >= ROWS as i32 || nc < 0 || nc >= cols as i32 {
                                continue;
                            }
                            let color = grid.get(nr as usize, nc as usize);
                            if color != 0 {
                                let (gx, gy) = cell_center(nr as usize, nc as usize);
                                screen.draw_disc(gx, gy, DRAW_RADIUS, color);
                            }
                        }
                    }
                } else {
                    let (gx, gy) = cell_center(r, c);
                    screen.draw_disc(gx, gy, DRAW_RADIUS, shooter_color);
                }

                shooter_color = next_color;
                next_color = rng.choice(&COLORS);

                if grid.count() == 0 {
                    screen.fill(BLACK);
                    for _ in 0..3 {
                        screen.fill(GREEN);
                        io.delay_ms(200);
                        screen.fill(BLUE);
                        io.delay_ms(200);
                    }
                    return;
                }
            }
        }
    }
}
