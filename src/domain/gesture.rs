//! Per-card gesture classification.
//!
//! A [`GestureClassifier`] turns the pointer samples of one card into drag,
//! tap, double-tap and long-press gestures. Time is injected: every pointer
//! event carries a monotonic timestamp and timers (long press, double-tap
//! window, settle animation) only advance through [`GestureClassifier::tick`],
//! which the host loop calls on every frame.

use std::ops::{Add, AddAssign, Sub};
use std::time::Duration;

/// Displacement (in density-independent units) that turns a press into a drag
pub const DRAG_SLOP: f32 = 10.0;
/// Hold time before a video card starts its preview
pub const LONG_PRESS_TIMEOUT: Duration = Duration::from_millis(200);
/// Window for both the "short press" cut-off and the double-tap wait
pub const TAP_TIMEOUT: Duration = Duration::from_millis(300);
/// Card rotation is `offset.x / ROTATION_DIVISOR`
pub const ROTATION_DIVISOR: f32 = 60.0;
/// Duration of the snap-back animation after a cancelled swipe
pub const RESET_SETTLE_DURATION: Duration = Duration::from_millis(200);
/// Duration of the fly-out animation after a committed swipe
pub const EXIT_SETTLE_DURATION: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    fn lerp(self, target: Vector, t: f32) -> Vector {
        Vector {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
        }
    }
}

impl Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Point) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

/// Rotation (degrees) drawn for a card displaced by `offset`
pub fn rotation_for(offset: Vector) -> f32 {
    offset.x / ROTATION_DIVISOR
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// One raw pointer sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer: PointerId,
    pub phase: PointerPhase,
    pub position: Point,
    /// Monotonic timestamp
    pub time: Duration,
}

impl PointerEvent {
    pub fn down(pointer: PointerId, position: Point, time: Duration) -> Self {
        Self {
            pointer,
            phase: PointerPhase::Down,
            position,
            time,
        }
    }

    pub fn moved(pointer: PointerId, position: Point, time: Duration) -> Self {
        Self {
            pointer,
            phase: PointerPhase::Move,
            position,
            time,
        }
    }

    pub fn up(pointer: PointerId, position: Point, time: Duration) -> Self {
        Self {
            pointer,
            phase: PointerPhase::Up,
            position,
            time,
        }
    }
}

/// A classified gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Incremental drag movement since the previous sample
    Drag(Vector),
    /// Drag released with the final cumulative offset
    DragEnd { offset: Vector, rotation: f32 },
    Tap,
    DoubleTap,
    LongPressStart,
    LongPressEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongPressTimer {
    /// Not a video, no long press for this card
    Disabled,
    Armed { deadline: Duration },
    Fired,
}

/// Transient per-card state; never persisted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    Probing {
        down_time: Duration,
        origin: Point,
        last: Point,
        accumulated: Vector,
        long_press: LongPressTimer,
    },
    Dragging {
        last: Point,
        offset: Vector,
        rotation: f32,
    },
    /// Short tap released, waiting for a possible second down
    TapPending { deadline: Duration },
    /// Second half of a double tap; swallowed until `up`
    SecondTap,
    SettlingAnimation {
        from: Vector,
        target: Vector,
        started: Duration,
        duration: Duration,
    },
}

#[derive(Debug, Clone)]
pub struct GestureClassifier {
    is_video: bool,
    state: GestureState,
    primary: Option<PointerId>,
    /// Offset the card rests at while idle
    resting: Vector,
}

impl GestureClassifier {
    pub fn new(is_video: bool) -> Self {
        Self {
            is_video,
            state: GestureState::Idle,
            primary: None,
            resting: Vector::ZERO,
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, GestureState::Idle)
    }

    pub fn is_settling(&self) -> bool {
        matches!(self.state, GestureState::SettlingAnimation { .. })
    }

    /// Forgets everything about the previous card. Must be called whenever
    /// the front item changes.
    pub fn reset(&mut self, is_video: bool) {
        *self = Self::new(is_video);
    }

    /// Feeds one pointer sample and returns the gestures it produced.
    ///
    /// Timers due at or before the sample's timestamp fire first, so a late
    /// second `down` still yields `Tap` followed by a new gesture.
    pub fn handle(&mut self, event: PointerEvent) -> Vec<Gesture> {
        let mut out = self.tick(event.time);

        if let Some(primary) = self.primary {
            if primary != event.pointer {
                return out;
            }
        }

        match (self.state, event.phase) {
            (GestureState::Idle, PointerPhase::Down) => {
                self.primary = Some(event.pointer);
                let long_press = if self.is_video {
                    LongPressTimer::Armed {
                        deadline: event.time + LONG_PRESS_TIMEOUT,
                    }
                } else {
                    LongPressTimer::Disabled
                };
                self.state = GestureState::Probing {
                    down_time: event.time,
                    origin: event.position,
                    last: event.position,
                    accumulated: Vector::ZERO,
                    long_press,
                };
            }
            (
                GestureState::Probing {
                    down_time,
                    origin,
                    last,
                    long_press,
                    ..
                },
                PointerPhase::Move,
            ) => {
                let delta = event.position - last;
                let accumulated = event.position - origin;

                if accumulated.length() > DRAG_SLOP {
                    if long_press == LongPressTimer::Fired {
                        out.push(Gesture::LongPressEnd);
                    }
                    self.state = GestureState::Dragging {
                        last: event.position,
                        offset: delta,
                        rotation: rotation_for(delta),
                    };
                    out.push(Gesture::Drag(delta));
                } else {
                    self.state = GestureState::Probing {
                        down_time,
                        origin,
                        last: event.position,
                        accumulated,
                        long_press,
                    };
                }
            }
            (
                GestureState::Probing {
                    down_time,
                    long_press,
                    ..
                },
                PointerPhase::Up,
            ) => {
                self.primary = None;
                if long_press == LongPressTimer::Fired {
                    // The hold was the gesture; releasing ends the preview.
                    out.push(Gesture::LongPressEnd);
                    self.state = GestureState::Idle;
                } else if event.time.saturating_sub(down_time) >= TAP_TIMEOUT {
                    out.push(Gesture::Tap);
                    self.state = GestureState::Idle;
                } else {
                    self.state = GestureState::TapPending {
                        deadline: event.time + TAP_TIMEOUT,
                    };
                }
            }
            (GestureState::Dragging { last, offset, .. }, PointerPhase::Move) => {
                let delta = event.position - last;
                let offset = offset + delta;
                self.state = GestureState::Dragging {
                    last: event.position,
                    offset,
                    rotation: rotation_for(offset),
                };
                out.push(Gesture::Drag(delta));
            }
            (
                GestureState::Dragging {
                    offset, rotation, ..
                },
                PointerPhase::Up,
            ) => {
                self.primary = None;
                self.resting = offset;
                self.state = GestureState::Idle;
                out.push(Gesture::DragEnd { offset, rotation });
            }
            (GestureState::TapPending { .. }, PointerPhase::Down) => {
                self.primary = Some(event.pointer);
                self.state = GestureState::SecondTap;
                out.push(Gesture::DoubleTap);
            }
            (GestureState::SecondTap, PointerPhase::Up) => {
                self.primary = None;
                self.state = GestureState::Idle;
            }
            // Stray samples, repeated downs and anything during a settle
            _ => {}
        }

        out
    }

    /// Advances timers to `now` and returns any gestures they produced
    pub fn tick(&mut self, now: Duration) -> Vec<Gesture> {
        let mut out = Vec::new();
        let state = self.state;

        match state {
            GestureState::Probing {
                long_press: LongPressTimer::Armed { deadline },
                down_time,
                origin,
                last,
                accumulated,
            } if now >= deadline => {
                self.state = GestureState::Probing {
                    down_time,
                    origin,
                    last,
                    accumulated,
                    long_press: LongPressTimer::Fired,
                };
                out.push(Gesture::LongPressStart);
            }
            GestureState::TapPending { deadline } if now >= deadline => {
                self.state = GestureState::Idle;
                out.push(Gesture::Tap);
            }
            GestureState::SettlingAnimation {
                target,
                started,
                duration,
                ..
            } if now >= started + duration => {
                self.resting = target;
                self.state = GestureState::Idle;
            }
            _ => {}
        }

        out
    }

    /// Starts animating the card from its resting offset towards `target`.
    /// Pointer input is ignored until the animation finishes.
    pub fn settle(&mut self, target: Vector, now: Duration, duration: Duration) {
        self.primary = None;
        self.state = GestureState::SettlingAnimation {
            from: self.resting,
            target,
            started: now,
            duration,
        };
    }

    /// Offset and rotation to draw the card with at `now`
    pub fn visual_offset(&self, now: Duration) -> (Vector, f32) {
        let offset = match self.state {
            GestureState::Dragging { offset, .. } => offset,
            GestureState::SettlingAnimation {
                from,
                target,
                started,
                duration,
            } => {
                let t = if duration.is_zero() {
                    1.0
                } else {
                    (now.saturating_sub(started).as_secs_f32() / duration.as_secs_f32()).min(1.0)
                };
                let eased = 1.0 - (1.0 - t).powi(3);
                from.lerp(target, eased)
            }
            _ => self.resting,
        };
        (offset, rotation_for(offset))
    }
}
