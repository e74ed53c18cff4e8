//! Main menu.
//!
//! Two entries drawn entirely with rectangle fills: a maze icon (framed
//! box, blue door shape, white wall marker) and a bubble icon (framed
//! box, a cluster of discs, white "S" glyph strokes). The selected
//! entry's frame is yellow. This module owns the top-level control
//! loop; it never returns.

use crate::bubble;
use crate::color::{BLACK, BLUE, GRAY, GREEN, MAGENTA, RED, WHITE, YELLOW};
use crate::gfx::Renderer;
use crate::input::{Button, Buttons};
use crate::maze;
use crate::rng::Rng;
use crate::transport::Delay;

/// Redraw the whole menu; `selected` is 0 (maze) or 1 (bubble).
pub fn draw_menu(screen: &mut impl Renderer, selected: usize) {
    screen.fill(BLACK);

    let frame = if selected == 0 { YELLOW } else { GRAY };
    screen.fill_rect(40, 20, 80, 40, frame);
    screen.fill_rect(42, 22, 76, 36, BLACK);
    screen.fill_rect(50, 30, 60, 5, BLUE);
    screen.fill_rect(50, 45, 60, 5, BLUE);
    screen.fill_rect(50, 30, 5, 20, BLUE);
    screen.fill_rect(105, 30, 5, 20, BLUE);
    screen.fill_rect(20, 30, 5, 20, WHITE);

    let frame = if selected == 1 { YELLOW } else { GRAY };
    screen.fill_rect(40, 70, 80, 40, frame);
    screen.fill_rect(42, 72, 76, 36, BLACK);
    screen.draw_disc(60, 90, 6, RED);
    screen.draw_disc(75, 90, 6, GREEN);
    screen.draw_disc(90, 90, 6, BLUE);
    screen.draw_disc(67, 80, 6, YELLOW);
    screen.draw_disc(82, 80, 6, MAGENTA);
    screen.fill_rect(20, 75, 15, 5, WHITE);
    screen.fill_rect(30, 75, 5, 10, WHITE);
    screen.fill_rect(20, 85, 15, 5, WHITE);
    screen.fill_rect(20, 85, 5, 10, WHITE);
    screen.fill_rect(20, 95, 15, 5, WHITE);
}

/// Top-level control loop: navigate, launch, redraw, repeat.
pub fn run<R: Renderer, I: Buttons + Delay>(screen: &mut R, io: &mut I, rng: &mut Rng) {
    let mut selected = 0;
    draw_menu(screen, selected);

    loop {
        if io.pressed(Button::Up) {
            if selected == 1 {
                selected = 0;
                draw_menu(screen, selected);
            }
            io.delay_ms(150);
        } else if io.pressed(Button::Down) {
            if selected == 0 {
                selected = 1;
                draw_menu(screen, selected);
            }
            io.delay_ms(150);
        } else if io.pressed(Button::Select) {
            if selected == 0 {
                maze::run(screen, io);
            } else {
                bubble::run(screen, io, rng);
            }
            draw_menu(screen, selected);
            // hold here until Select is released so the game that just
            // consumed it does not immediately retrigger
            while io.pressed(Button::Select) {
                io.delay_ms(10);
            }
        }
        io.delay_ms(50);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::recorder::RecRenderer;

    #[test]
    fn test_menu_clears_screen_first() {
        let mut screen = RecRenderer::new(160, 132);
        draw_menu(&mut screen, 0);
        assert_eq!(screen.calls[0], (0, 0, 160, 132, BLACK));
    }

    #[test]
    fn test_selection_controls_frame_colors() {
        let mut screen = RecRenderer::new(160, 132);
        draw_menu(&mut screen, 0);
        assert_eq!(screen.calls[1], (40, 20, 80, 40, YELLOW));
        assert_eq!(screen.calls[8], (40, 70, 80, 40, GRAY));

        let mut screen = RecRenderer::new(160, 132);
        draw_menu(&mut screen, 1);
        assert_eq!(screen.calls[1], (40, 20, 80, 40, GRAY));
        assert_eq!(screen.calls[8], (40, 70, 80, 40, YELLOW));
    }

    #[test]
    fn test_menu_draw_list_is_stable() {
        let mut a = RecRenderer::new(160, 132);
        let mut b = RecRenderer::new(160, 132);
        draw_menu(&mut a, 0);
        draw_menu(&mut b, 0);
        assert_eq!(a.calls, b.calls);
        // full clear + 7 maze-icon rects + frame/inner + 5 discs
        // (3 rects each) + 5 glyph strokes
        assert_eq!(a.calls.len(), 1 + 7 + 2 + 15 + 5);
    }
}
