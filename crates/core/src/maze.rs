//! Tile-maze game.
//!
//! Three fixed levels on a 14x11 grid of 11-pixel tiles. The player is
//! a 7x7 sprite moved with the pad; touching a wall flashes and resets
//! to the start tile, reaching the goal advances a level. Everything on
//! screen is rectangle fills; only damaged regions are redrawn.

use crate::color::{BLACK, BLUE, GRAY, GREEN, LIGHT_GRAY, RED, WHITE, YELLOW};
use crate::gfx::Renderer;
use crate::input::{Button, Buttons};
use crate::transport::Delay;

pub const TILE_SIZE: i32 = 11;
pub const MAP_W: usize = 14;
pub const MAP_H: usize = 11;

pub const EMPTY: u8 = 0;
pub const WALL: u8 = 1;
pub const START: u8 = 2;
pub const GOAL: u8 = 3;

pub type Map = [[u8; MAP_W]; MAP_H];

const SPRITE_W: i32 = 7;
const SPRITE_H: i32 = 7;
const SPEED: i32 = 2;

pub const LEVELS: [Map; 3] = [
    [
        [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 3, 1],
        [1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1, 0, 0, 1],
        [1, 0, 1, 0, 1, 0, 1, 1, 1, 0, 1, 1, 0, 1],
        [1, 0, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 1],
        [1, 1, 1, 1, 1, 0, 1, 0, 1, 1, 1, 1, 1, 1],
        [1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 1],
        [1, 0, 1, 1, 1, 1, 1, 1, 1, 0, 1, 1, 0, 1],
        [1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1, 0, 0, 1],
        [1, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1],
        [1, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
        [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
    ],
    [
        [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
        [1, 2, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1],
        [1, 1, 1, 1, 0, 1, 0, 1, 1, 1, 1, 1, 0, 1],
        [1, 0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1],
        [1, 0, 1, 1, 1, 1, 1, 1, 0, 1, 0, 1, 1, 1],
        [1, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1],
        [1, 1, 1, 1, 1, 1, 1, 1, 0, 1, 1, 1, 0, 1],
        [1, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 1],
        [1, 0, 1, 1, 1, 1, 0, 1, 1, 1, 0, 1, 0, 1],
        [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 3, 1],
        [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
    ],
    [
        [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
        [1, 3, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 1],
        [1, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
        [1, 0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1],
        [1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 0, 1, 1, 1],
        [1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1],
        [1, 1, 1, 1, 0, 1, 0, 1, 1, 1, 1, 1, 0, 1],
        [1, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 1],
        [1, 0, 1, 1, 1, 1, 1, 1, 0, 1, 1, 1, 0, 1],
        [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 1],
        [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
    ],
];

/// Draw a whole level: walls get a darker border with a lighter face,
/// start and goal tiles are solid.
fn draw_map(screen: &mut impl Renderer, map: &Map) {
    screen.fill(BLACK);
    for (ty, row) in map.iter().enumerate() {
        for (tx, &tile) in row.iter().enumerate() {
            let px = tx as i32 * TILE_SIZE;
            let py = ty as i32 * TILE_SIZE;
            match tile {
                WALL => {
                    screen.fill_rect(px, py, TILE_SIZE, TILE_SIZE, GRAY);
                    screen.fill_rect(px + 1, py + 1, TILE_SIZE - 2, TILE_SIZE - 2, LIGHT_GRAY);
                }
                START => screen.fill_rect(px, py, TILE_SIZE, TILE_SIZE, BLUE),
                GOAL => screen.fill_rect(px, py, TILE_SIZE, TILE_SIZE, GREEN),
                _ => {}
            }
        }
    }
}

/// Sprite spawn point: two pixels inside the start tile.
fn start_position(map: &Map) -> (i32, i32) {
    for (ty, row) in map.iter().enumerate() {
        for (tx, &tile) in row.iter().enumerate() {
            if tile == START {
                return (tx as i32 * TILE_SIZE + 2, ty as i32 * TILE_SIZE + 2);
            }
        }
    }
    (10, 10)
}

/// Test the sprite's four corners against the grid at a proposed
/// position. Returns (hit_wall, reached_goal); callers must honour wall
/// contact first, so a move straddling both counts as a wall hit.
fn probe(map: &Map, x: i32, y: i32) -> (bool, bool) {
    let mut hit_wall = false;
    let mut reached_goal = false;
    let corners = [
        (x, y),
        (x + SPRITE_W - 1, y),
        (x, y + SPRITE_H - 1),
        (x + SPRITE_W - 1, y + SPRITE_H - 1),
    ];
    for (cx, cy) in corners {
        let tx = cx / TILE_SIZE;
        let ty = cy / TILE_SIZE;
        if tx >= 0 && (tx as usize) < MAP_W && ty >= 0 && (ty as usize) < MAP_H {
            match map[ty as usize][tx as usize] {
                WALL => hit_wall = true,
                GOAL => reached_goal = true,
                _ => {}
            }
        }
    }
    (hit_wall, reached_goal)
}

/// Play through every level in order. Returns when Select is pressed or
/// the last level is cleared (after the victory flash).
pub fn run<R: Renderer, I: Buttons + Delay>(screen: &mut R, io: &mut I) {
    for map in LEVELS.iter() {
        if !play_level(screen, io, map) {
            return;
        }
    }
    screen.fill(BLACK);
    for _ in 0..3 {
        screen.fill(YELLOW);
        io.delay_ms(200);
        screen.fill(RED);
        io.delay_ms(200);
    }
}

/// One level. Returns false if the player exited with Select, true when
/// the goal was reached.
fn play_level<R: Renderer, I: Buttons + Delay>(screen: &mut R, io: &mut I, map: &Map) -> bool {
    draw_map(screen, map);
    let (sx, sy) = start_position(map);
    let (mut px, mut py) = (sx, sy);
    screen.fill_rect(px, py, SPRITE_W, SPRITE_H, WHITE);

    loop {
        if io.pressed(Button::Select) {
            return false;
        }

        let mut dx = 0;
        let mut dy = 0;
        if io.pressed(Button::PadUp) {
            dy = -SPEED;
        }
        if io.pressed(Button::PadDown) {
            dy = SPEED;
        }
        if io.pressed(Button::PadLeft) {
            dx = -SPEED;
        }
        if io.pressed(Button::PadRight) {
            dx = SPEED;
        }

        if dx == 0 && dy == 0 {
            io.delay_ms(10);
            continue;
        }

        let new_x = (px + dx).clamp(0, screen.width() - SPRITE_W);
        let new_y = (py + dy).clamp(0, screen.height() - SPRITE_H);

        let (hit_wall, reached_goal) = probe(map, new_x, new_y);

        if hit_wall {
            for _ in 0..3 {
                screen.fill_rect(px, py, SPRITE_W, SPRITE_H, RED);
                io.delay_ms(50);
                screen.fill_rect(px, py, SPRITE_W, SPRITE_H, BLACK);
                io.delay_ms(50);
            }
            screen.fill_rect(px, py, SPRITE_W, SPRITE_H, BLACK);
            px = sx;
            py = sy;
            screen.fill_rect(px, py, SPRITE_W, SPRITE_H, WHITE);
            io.delay_ms(300);
            continue;
        }

        if reached_goal {
            screen.fill(GREEN);
            io.delay_ms(500);
            return true;
        }

        if new_x != px || new_y != py {
            screen.fill_rect(px, py, SPRITE_W, SPRITE_H, BLACK);
            // keep the start tile visible while the sprite still overlaps
            // its neighbourhood
            if (px - sx).abs() < TILE_SIZE && (py - sy).abs() < TILE_SIZE {
                screen.fill_rect(
                    sx / TILE_SIZE * TILE_SIZE,
                    sy / TILE_SIZE * TILE_SIZE,
                    TILE_SIZE,
                    TILE_SIZE,
                    BLUE,
                );
            }
            px = new_x;
            py = new_y;
            screen.fill_rect(px, py, SPRITE_W, SPRITE_H, WHITE);
        }

        io.delay_ms(20);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::recorder::RecRenderer;
    use crate::input::testio::ScriptIo;

    /// Empty map with one wall tile and one goal tile side by side.
    fn wall_goal_map() -> Map {
        let mut map = [[EMPTY; MAP_W]; MAP_H];
        map[5][5] = WALL;
        map[5][6] = GOAL;
        map
    }

    #[test]
    fn test_pixel_to_tile_mapping() {
        // a corner at pixel 54 is still in tile 4; 55 starts tile 5
        assert_eq!(54 / TILE_SIZE, 4);
        assert_eq!(55 / TILE_SIZE, 5);
    }

    #[test]
    fn test_wall_takes_precedence_over_goal() {
        let map = wall_goal_map();
        // sprite spans pixels 60..=66: left corners in tile 5 (wall),
        // right corners in tile 6 (goal)
        let (hit_wall, reached_goal) = probe(&map, 60, 55);
        assert!(hit_wall);
        assert!(reached_goal);
        // the game loop consumes wall contact before the goal check, so
        // this position must reset, never win
    }

    #[test]
    fn test_goal_without_wall() {
        let map = wall_goal_map();
        let (hit_wall, reached_goal) = probe(&map, 67, 55);
        assert!(!hit_wall);
        assert!(reached_goal);
    }

    #[test]
    fn test_probe_all_corners() {
        let mut map = [[EMPTY; MAP_W]; MAP_H];
        map[0][0] = WALL;
        // only the top-left corner touches the wall tile
        let (hit_wall, _) = probe(&map, 10, 10);
        assert!(hit_wall);
        let (hit_wall, _) = probe(&map, 11, 11);
        assert!(!hit_wall);
    }

    #[test]
    fn test_levels_are_well_formed() {
        for map in LEVELS.iter() {
            let mut starts = 0;
            let mut goals = 0;
            for row in map.iter() {
                for &tile in row.iter() {
                    match tile {
                        START => starts += 1,
                        GOAL => goals += 1,
                        _ => {}
                    }
                }
            }
            assert_eq!(starts, 1);
            assert_eq!(goals, 1);
            // outer border is wall except for start/goal openings
            for tx in 0..MAP_W {
                assert_ne!(map[0][tx], EMPTY);
                assert_ne!(map[MAP_H - 1][tx], EMPTY);
            }
        }
    }

    #[test]
    fn test_start_position_is_inside_start_tile() {
        let (sx, sy) = start_position(&LEVELS[0]);
        assert_eq!((sx, sy), (1 * TILE_SIZE + 2, 9 * TILE_SIZE + 2));
    }

    #[test]
    fn test_select_exits_immediately() {
        let mut screen = RecRenderer::new(160, 132);
        let mut io = ScriptIo::holding(&[Button::Select]);
        run(&mut screen, &mut io);
        // the map was drawn, but no victory flash happened
        assert!(screen.calls.iter().any(|&(_, _, w, h, _)| (w, h) == (160, 132)));
        assert_eq!(io.ticks, 0);
    }

    #[test]
    fn test_idle_loop_keeps_polling() {
        // no buttons held: the loop must spin on the pacing delay until
        // the budget trips, proving it re-polls rather than blocking
        let mut screen = RecRenderer::new(160, 132);
        let mut io = ScriptIo::holding(&[]);
        io.max_ticks = 50;
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            run(&mut screen, &mut io);
        }));
        assert!(result.is_err());
    }
}
