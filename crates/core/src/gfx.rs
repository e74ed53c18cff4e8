//! Draw primitives over the rectangle-fill capability.
//!
//! Everything the menu and games put on screen decomposes into rectangle
//! fills; [`Renderer`] is the narrow capability they depend on, so a
//! test can substitute an in-memory recorder for the real driver.

use crate::color::{BLACK, WHITE};

/// Rectangle-fill capability with known surface dimensions.
///
/// Implemented by the ST7735 driver and by recorders in tests. The
/// provided methods are the only draw routines built on top of it.
pub trait Renderer {
    /// Fill a rectangle, clipped to the surface. Out-of-range requests
    /// shrink or vanish silently.
    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u16);
    /// Effective surface width for the current orientation.
    fn width(&self) -> i32;
    /// Effective surface height for the current orientation.
    fn height(&self) -> i32;

    /// Fill the whole surface.
    fn fill(&mut self, color: u16) {
        let (w, h) = (self.width(), self.height());
        self.fill_rect(0, 0, w, h, color);
    }

    /// Fast disc approximation: two overlapping inset rectangles whose
    /// union is the visible shape, plus a 2x2 white highlight off-centre
    /// when the colour is not the background. Not a true circle; see
    /// `St7735::fill_circle` for the exact one.
    fn draw_disc(&mut self, x: i32, y: i32, r: i32, color: u16) {
        self.fill_rect(x - r + 2, y - r, 2 * r - 4, 2 * r, color);
        self.fill_rect(x - r, y - r + 2, 2 * r, 2 * r - 4, color);
        if color != BLACK {
            self.fill_rect(x - r / 2, y - r / 2, 2, 2, WHITE);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::recorder::RecRenderer;
    use super::*;
    use crate::color::{GREEN, RED};

    #[test]
    fn test_fill_covers_surface() {
        let mut r = RecRenderer::new(160, 132);
        r.fill(GREEN);
        assert_eq!(r.calls, vec![(0, 0, 160, 132, GREEN)]);
    }

    #[test]
    fn test_disc_is_two_rects_plus_highlight() {
        let mut r = RecRenderer::new(160, 132);
        r.draw_disc(80, 66, 5, RED);
        assert_eq!(
            r.calls,
            vec![
                (77, 61, 6, 10, RED),
                (75, 63, 10, 6, RED),
                (78, 64, 2, 2, WHITE),
            ]
        );
    }

    #[test]
    fn test_background_disc_has_no_highlight() {
        let mut r = RecRenderer::new(160, 132);
        r.draw_disc(80, 66, 5, BLACK);
        assert_eq!(r.calls.len(), 2);
        assert!(r.calls.iter().all(|&(_, _, _, _, c)| c == BLACK));
    }
}
