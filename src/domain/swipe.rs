//! Swipe commit decisions on drag release

use super::gesture::Vector;

/// Fraction of the card width a drag must cover to commit
pub const COMMIT_FRACTION: f32 = 0.20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Delete intent
    Left,
    /// Keep intent
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDecision {
    /// Animate back to rest; nothing changes
    Reset,
    /// Animate off-screen, then act on the commit exactly once
    Commit(Direction),
}

/// Stateless resolver for one card width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeResolver {
    card_width: f32,
}

impl SwipeResolver {
    pub fn new(card_width: f32) -> Self {
        Self {
            card_width: card_width.max(0.0),
        }
    }

    pub fn card_width(&self) -> f32 {
        self.card_width
    }

    pub fn threshold(&self) -> f32 {
        self.card_width * COMMIT_FRACTION
    }

    /// Decides what a release at `offset` means
    pub fn resolve(&self, offset: Vector) -> SwipeDecision {
        if offset.x.abs() < self.threshold() {
            SwipeDecision::Reset
        } else if offset.x > 0.0 {
            SwipeDecision::Commit(Direction::Right)
        } else {
            SwipeDecision::Commit(Direction::Left)
        }
    }

    /// Where the card flies to after a commit
    pub fn exit_target(&self, direction: Direction) -> Vector {
        match direction {
            Direction::Right => Vector::new(self.card_width * 2.0, 0.0),
            Direction::Left => Vector::new(-self.card_width * 2.0, 0.0),
        }
    }

    /// How far (0..=1) a drag is towards committing, for swipe indicators
    pub fn progress(&self, offset: Vector) -> f32 {
        let threshold = self.threshold();
        if threshold <= 0.0 {
            return 0.0;
        }
        (offset.x.abs() / threshold).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: f32 = 400.0;

    #[test]
    fn test_below_threshold_resets() {
        let resolver = SwipeResolver::new(WIDTH);
        assert_eq!(
            resolver.resolve(Vector::new(0.19 * WIDTH, 0.0)),
            SwipeDecision::Reset
        );
        assert_eq!(
            resolver.resolve(Vector::new(-0.19 * WIDTH, 30.0)),
            SwipeDecision::Reset
        );
    }

    #[test]
    fn test_past_threshold_commits_right() {
        let resolver = SwipeResolver::new(WIDTH);
        assert_eq!(
            resolver.resolve(Vector::new(0.21 * WIDTH, 0.0)),
            SwipeDecision::Commit(Direction::Right)
        );
    }

    #[test]
    fn test_past_threshold_commits_left() {
        let resolver = SwipeResolver::new(WIDTH);
        assert_eq!(
            resolver.resolve(Vector::new(-0.21 * WIDTH, 0.0)),
            SwipeDecision::Commit(Direction::Left)
        );
    }

    #[test]
    fn test_exactly_threshold_commits() {
        let resolver = SwipeResolver::new(WIDTH);
        let threshold = resolver.threshold();
        assert_eq!(
            resolver.resolve(Vector::new(threshold, 0.0)),
            SwipeDecision::Commit(Direction::Right)
        );
        assert_eq!(
            resolver.resolve(Vector::new(-threshold, 0.0)),
            SwipeDecision::Commit(Direction::Left)
        );
    }

    #[test]
    fn test_vertical_drag_alone_never_commits() {
        let resolver = SwipeResolver::new(WIDTH);
        assert_eq!(
            resolver.resolve(Vector::new(0.0, 10_000.0)),
            SwipeDecision::Reset
        );
    }

    #[test]
    fn test_exit_target_is_off_screen() {
        let resolver = SwipeResolver::new(WIDTH);
        assert_eq!(resolver.exit_target(Direction::Left).x, -800.0);
        assert_eq!(resolver.exit_target(Direction::Right).x, 800.0);
    }

    #[test]
    fn test_progress_is_clamped() {
        let resolver = SwipeResolver::new(WIDTH);
        assert_eq!(resolver.progress(Vector::new(40.0, 0.0)), 0.5);
        assert_eq!(resolver.progress(Vector::new(-500.0, 0.0)), 1.0);
        assert_eq!(SwipeResolver::new(0.0).progress(Vector::new(5.0, 0.0)), 0.0);
    }
}
