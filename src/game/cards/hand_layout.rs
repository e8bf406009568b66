//=========================================================================
// Hand Layout
//=========================================================================
//
// Per-seat hand canvases and the stacking formula.
//
// Seats map to screen edges by `seat % 4`:
//
//                 ┌──── Up (2) ────┐
//                 │                │
//          Left (3)     table     Right (1)
//                 │                │
//                 └─── Down (0) ───┘
//
// Along the stacking axis, `n` cards of size `s` in a canvas of span `w`:
//
//   overlap = round3((w - s) / (s * n))
//   total   = s + s * overlap * (n - 1)
//   base    = (w - total) / 2
//   pos(i)  = base + s * overlap * i + s / 2
//
// Across it, cards hug the screen edge.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::config::StageConfig;
use crate::core::render::Pose;

//=== Orientation =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Down,
    Right,
    Up,
    Left,
}

impl Orientation {
    pub fn for_seat(seat: usize) -> Self {
        match seat % 4 {
            0 => Self::Down,
            1 => Self::Right,
            2 => Self::Up,
            _ => Self::Left,
        }
    }

    /// Card rotation in degrees, facing the table centre.
    pub fn rotation(self) -> f32 {
        match self {
            Self::Down => 0.0,
            Self::Right => 270.0,
            Self::Up => 180.0,
            Self::Left => 90.0,
        }
    }

    /// True when cards stack along the screen's x axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Down | Self::Up)
    }
}

//=== Stacking ============================================================

/// Fractional step between adjacent cards, rounded to 3 decimals.
///
/// Values above 1.0 spread small hands apart; below 1.0 they overlap.
pub fn overlap_fraction(span: f32, card_size: f32, count: usize) -> f32 {
    if count == 0 {
        return 0.0;
    }
    let raw = (span - card_size) / (card_size * count as f32);
    (raw * 1000.0).round() / 1000.0
}

/// Card centres along the stacking axis, relative to the canvas start.
pub fn stack_positions(span: f32, card_size: f32, count: usize) -> Vec<f32> {
    let overlap = overlap_fraction(span, card_size, count);
    let step = card_size * overlap;
    let total = card_size + step * count.saturating_sub(1) as f32;
    let base = (span - total) / 2.0;
    (0..count).map(|i| base + step * i as f32 + card_size / 2.0).collect()
}

//=== HandCanvas ==========================================================

/// Layout rectangle of one seat, in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct HandCanvas {
    seat: usize,
    orientation: Orientation,
    left: f32,
    top: f32,
    span: f32,
    depth: f32,
    card_width: f32,
    card_height: f32,
}

impl HandCanvas {
    /// Canvas centred on the seat's screen edge.
    pub fn for_seat(seat: usize, config: &StageConfig) -> Self {
        let orientation = Orientation::for_seat(seat);
        let (w, h) = (config.screen_width, config.screen_height);
        let (span, depth) = (config.hand_span, config.hand_depth);

        let (left, top) = match orientation {
            Orientation::Down => ((w - span) / 2.0, h - depth),
            Orientation::Up => ((w - span) / 2.0, 0.0),
            Orientation::Right => (w - depth, (h - span) / 2.0),
            Orientation::Left => (0.0, (h - span) / 2.0),
        };

        Self {
            seat,
            orientation,
            left,
            top,
            span,
            depth,
            card_width: config.card_width,
            card_height: config.card_height,
        }
    }

    pub fn seat(&self) -> usize {
        self.seat
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// `(left, top, width, height)` on screen.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        if self.orientation.is_horizontal() {
            (self.left, self.top, self.span, self.depth)
        } else {
            (self.left, self.top, self.depth, self.span)
        }
    }

    /// Arrival point of drawn cards.
    pub fn center(&self) -> Pose {
        let (left, top, width, height) = self.bounds();
        Pose::at(left + width / 2.0, top + height / 2.0).rotated(self.orientation.rotation())
    }

    /// Global poses of a hand of `count` cards, in hand order.
    pub fn layout(&self, count: usize) -> Vec<Pose> {
        let rotation = self.orientation.rotation();
        // Cards stand on their short side along the stacking axis.
        let cross = self.card_height / 2.0;

        stack_positions(self.span, self.card_width, count)
            .into_iter()
            .map(|along| {
                let (x, y) = match self.orientation {
                    Orientation::Down => (self.left + along, self.top + self.depth - cross),
                    Orientation::Up => (self.left + along, self.top + cross),
                    Orientation::Right => (self.left + self.depth - cross, self.top + along),
                    Orientation::Left => (self.left + cross, self.top + along),
                };
                Pose::at(x, y).rotated(rotation)
            })
            .collect()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn three_cards_in_a_350_canvas() {
        assert_relative_eq!(overlap_fraction(350.0, 50.0, 3), 2.0);

        let positions = stack_positions(350.0, 50.0, 3);
        assert_eq!(positions.len(), 3);
        assert_relative_eq!(positions[0], 75.0);
        assert_relative_eq!(positions[1], 175.0);
        assert_relative_eq!(positions[2], 275.0);
    }

    #[test]
    fn large_hands_compress_inside_the_canvas() {
        let positions = stack_positions(350.0, 50.0, 20);
        let first = positions[0] - 25.0;
        let last = positions[19] + 25.0;
        assert!(first >= 0.0, "first card starts at {}", first);
        assert!(last <= 350.0 + 0.5, "last card ends at {}", last);
        assert!(positions.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn overlap_is_rounded_to_three_decimals() {
        // 300 / 350 = 0.857142...
        assert_relative_eq!(overlap_fraction(350.0, 50.0, 7), 0.857);
    }

    #[test]
    fn degenerate_hands() {
        assert!(stack_positions(350.0, 50.0, 0).is_empty());
        let single = stack_positions(350.0, 50.0, 1);
        assert_relative_eq!(single[0], 175.0);
    }

    #[test]
    fn layout_is_idempotent() {
        let canvas = HandCanvas::for_seat(1, &StageConfig::default());
        assert_eq!(canvas.layout(5), canvas.layout(5));
    }

    #[test]
    fn down_seat_is_bottom_aligned() {
        let config = StageConfig::default();
        let canvas = HandCanvas::for_seat(0, &config);
        let poses = canvas.layout(3);

        // canvas starts at (816 - 350) / 2 = 233
        assert_relative_eq!(poses[0].x, 233.0 + 75.0);
        assert_relative_eq!(poses[2].x, 233.0 + 275.0);
        assert_relative_eq!(poses[0].y, 624.0 - 35.0);
        assert_relative_eq!(poses[0].rotation, 0.0);
    }

    #[test]
    fn seats_wrap_around_the_table() {
        let config = StageConfig { seats: 6, ..StageConfig::default() };
        assert_eq!(Orientation::for_seat(4), Orientation::Down);
        assert_eq!(Orientation::for_seat(5), Orientation::Right);

        let right = HandCanvas::for_seat(1, &config);
        let poses = right.layout(2);
        assert!(poses.iter().all(|p| p.x > config.screen_width - config.hand_depth));
        assert!(poses[1].y > poses[0].y);
        assert_relative_eq!(right.center().rotation, 270.0);

        let up = HandCanvas::for_seat(2, &config);
        assert_relative_eq!(up.layout(1)[0].y, 35.0);
    }
}
