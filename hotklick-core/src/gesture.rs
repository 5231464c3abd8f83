//! Pointer gesture classification
//!
//! Turns raw press/move/release events into semantic gestures:
//! - Tap: a short press, confirmed once the double-tap window has passed
//! - DoubleTap: a second release within the double-tap window of the first
//! - LongPress: a press held still until the long-press timer fires
//! - Cancelled: the pointer left or the platform cancelled the interaction
//!
//! # Usage
//!
//! ```ignore
//! let mut classifier = GestureClassifier::new(GestureSettings::default());
//!
//! let mut gestures = classifier.handle(PointerEvent::Press(point), clock.now());
//! gestures.extend(classifier.handle(PointerEvent::Release(point), clock.now()));
//! // ...later, when the next deadline passes
//! gestures.extend(classifier.tick(clock.now()));
//! ```

use std::time::Duration;

use crate::clock::{earliest, Timer};
use crate::model::Point;
use crate::settings::GestureSettings;

/// Low-level pointer input, already mapped to image coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press(Point),
    Move(Point),
    Release(Point),
    /// Pointer left the surface or the platform cancelled the touch
    Cancel,
}

/// A classified user gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Tap(Point),
    DoubleTap(Point),
    LongPress(Point),
    Cancelled,
}

impl Gesture {
    pub fn point(&self) -> Option<Point> {
        match self {
            Gesture::Tap(p) | Gesture::DoubleTap(p) | Gesture::LongPress(p) => Some(*p),
            Gesture::Cancelled => None,
        }
    }
}

/// Where the current interaction stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pressed,
    LongPressFired,
    /// Released once, waiting to see if a second release follows
    Released,
}

/// State of the pointer while it is down
#[derive(Debug, Clone)]
struct PressState {
    origin: Point,
    long_press: Timer,
    /// Long press already emitted; the release stays silent
    triggered: bool,
    /// Moved past the tolerance; the release stays silent
    dragging: bool,
}

/// Gesture state machine for a single pointer.
///
/// The classifier never reads a clock. Callers pass `now` into
/// [`handle`](Self::handle) and call [`tick`](Self::tick) whenever
/// [`next_deadline`](Self::next_deadline) has passed.
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    settings: GestureSettings,
    press: Option<PressState>,
    /// Point of the first release while the double-tap window is open
    pending_tap: Option<Point>,
    tap_timer: Timer,
}

impl GestureClassifier {
    pub fn new(settings: GestureSettings) -> Self {
        Self {
            settings,
            press: None,
            pending_tap: None,
            tap_timer: Timer::idle(),
        }
    }

    pub fn phase(&self) -> Phase {
        match (&self.press, self.pending_tap) {
            (Some(press), _) if press.triggered => Phase::LongPressFired,
            (Some(_), _) => Phase::Pressed,
            (None, Some(_)) => Phase::Released,
            (None, None) => Phase::Idle,
        }
    }

    /// Feed one pointer event. Timers that expired before `now` are
    /// resolved first, so their gestures come out ahead of this event's.
    pub fn handle(&mut self, event: PointerEvent, now: Duration) -> Vec<Gesture> {
        let mut out = self.tick(now);

        match event {
            PointerEvent::Press(point) => self.on_press(point, now),
            PointerEvent::Move(point) => self.on_move(point),
            PointerEvent::Release(point) => out.extend(self.on_release(point, now)),
            PointerEvent::Cancel => out.extend(self.on_cancel()),
        }

        out
    }

    /// Resolve every timer whose deadline has passed, oldest first
    pub fn tick(&mut self, now: Duration) -> Vec<Gesture> {
        let mut out = Vec::new();

        let long_press_due = self
            .press
            .as_ref()
            .and_then(|p| p.long_press.deadline())
            .filter(|d| *d <= now);
        let tap_due = self.tap_timer.deadline().filter(|d| *d <= now);

        match (long_press_due, tap_due) {
            (Some(lp), Some(tap)) if tap <= lp => {
                out.extend(self.fire_tap(now));
                out.extend(self.fire_long_press(now));
            }
            _ => {
                out.extend(self.fire_long_press(now));
                out.extend(self.fire_tap(now));
            }
        }

        out
    }

    /// Earliest moment at which [`tick`](Self::tick) could emit something
    pub fn next_deadline(&self) -> Option<Duration> {
        earliest([
            self.press.as_ref().and_then(|p| p.long_press.deadline()),
            self.tap_timer.deadline(),
        ])
    }

    /// Drop all in-flight state without emitting anything
    pub fn reset(&mut self) {
        self.press = None;
        self.pending_tap = None;
        self.tap_timer.cancel();
    }

    fn on_press(&mut self, point: Point, now: Duration) {
        if self.press.is_some() {
            tracing::debug!("press while already pressed, restarting interaction");
        }

        let mut long_press = Timer::idle();
        long_press.start(now, self.settings.long_press());

        self.press = Some(PressState {
            origin: point,
            long_press,
            triggered: false,
            dragging: false,
        });
    }

    fn on_move(&mut self, point: Point) {
        let tolerance = self.settings.move_tolerance_px;
        if let Some(press) = self.press.as_mut() {
            if !press.dragging && press.origin.distance_to(point) > tolerance {
                press.long_press.cancel();
                press.dragging = true;
                tracing::debug!("pointer moved past {}px, treating as drag", tolerance);
            }
        }
    }

    fn on_release(&mut self, point: Point, now: Duration) -> Option<Gesture> {
        let press = self.press.take()?;

        if press.triggered || press.dragging {
            return None;
        }

        // Any tap still pending here is inside the window: expired ones were
        // flushed by `tick` before this event was handled.
        if self.pending_tap.take().is_some() {
            self.tap_timer.cancel();
            tracing::debug!("double tap at ({:.0}, {:.0})", point.x, point.y);
            return Some(Gesture::DoubleTap(point));
        }

        self.pending_tap = Some(point);
        self.tap_timer.start(now, self.settings.double_tap());
        None
    }

    fn on_cancel(&mut self) -> Option<Gesture> {
        let in_flight = self.press.is_some() || self.pending_tap.is_some();
        self.reset();
        in_flight.then_some(Gesture::Cancelled)
    }

    fn fire_long_press(&mut self, now: Duration) -> Option<Gesture> {
        let press = self.press.as_mut()?;
        press.long_press.fire(now)?;
        press.triggered = true;
        tracing::debug!("long press at ({:.0}, {:.0})", press.origin.x, press.origin.y);
        Some(Gesture::LongPress(press.origin))
    }

    fn fire_tap(&mut self, now: Duration) -> Option<Gesture> {
        self.tap_timer.fire(now)?;
        let point = self.pending_tap.take()?;
        tracing::debug!("tap at ({:.0}, {:.0})", point.x, point.y);
        Some(Gesture::Tap(point))
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(GestureSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    /// Drive the classifier one millisecond at a time and record when each
    /// gesture came out.
    fn run_until(classifier: &mut GestureClassifier, from: u64, to: u64) -> Vec<(u64, Gesture)> {
        let mut out = Vec::new();
        for t in from..=to {
            for g in classifier.tick(ms(t)) {
                out.push((t, g));
            }
        }
        out
    }

    // ============= Tap =============

    #[test]
    fn test_tap_fires_after_window() {
        let mut c = GestureClassifier::default();
        assert!(c.handle(PointerEvent::Press(p(5.0, 5.0)), ms(0)).is_empty());
        assert!(c.handle(PointerEvent::Release(p(5.0, 5.0)), ms(120)).is_empty());
        assert_eq!(c.phase(), Phase::Released);

        let fired = run_until(&mut c, 121, 1000);
        assert_eq!(fired, vec![(420, Gesture::Tap(p(5.0, 5.0)))]);
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn test_tap_timing_for_various_hold_times() {
        for hold in [0, 1, 250, 499] {
            let mut c = GestureClassifier::default();
            c.handle(PointerEvent::Press(p(0.0, 0.0)), ms(1000));
            c.handle(PointerEvent::Move(p(6.0, 7.0)), ms(1000 + hold / 2));
            c.handle(PointerEvent::Release(p(6.0, 7.0)), ms(1000 + hold));

            let release = 1000 + hold;
            let fired = run_until(&mut c, release, release + 1000);
            assert_eq!(fired.len(), 1, "hold {hold}ms");
            let (at, gesture) = fired[0];
            assert!(matches!(gesture, Gesture::Tap(_)));
            assert!(at >= release + 300 && at < release + 301);
        }
    }

    #[test]
    fn test_small_jitter_still_taps() {
        let mut c = GestureClassifier::default();
        c.handle(PointerEvent::Press(p(100.0, 100.0)), ms(0));
        c.handle(PointerEvent::Move(p(106.0, 108.0)), ms(50)); // exactly 10px
        c.handle(PointerEvent::Release(p(106.0, 108.0)), ms(80));

        let fired = run_until(&mut c, 80, 600);
        assert_eq!(fired, vec![(380, Gesture::Tap(p(106.0, 108.0)))]);
    }

    // ============= Double tap =============

    #[test]
    fn test_double_tap_emits_once_without_tap() {
        let mut c = GestureClassifier::default();
        let at = p(40.0, 40.0);

        assert!(c.handle(PointerEvent::Press(at), ms(0)).is_empty());
        assert!(c.handle(PointerEvent::Release(at), ms(60)).is_empty());
        assert!(c.handle(PointerEvent::Press(at), ms(150)).is_empty());
        let out = c.handle(PointerEvent::Release(at), ms(220));
        assert_eq!(out, vec![Gesture::DoubleTap(at)]);

        assert!(run_until(&mut c, 220, 1500).is_empty());
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn test_double_tap_uses_latest_point() {
        let mut c = GestureClassifier::default();
        c.handle(PointerEvent::Press(p(10.0, 10.0)), ms(0));
        c.handle(PointerEvent::Release(p(10.0, 10.0)), ms(40));
        c.handle(PointerEvent::Press(p(13.0, 12.0)), ms(100));
        let out = c.handle(PointerEvent::Release(p(13.0, 12.0)), ms(140));
        assert_eq!(out, vec![Gesture::DoubleTap(p(13.0, 12.0))]);
    }

    #[test]
    fn test_second_release_after_window_is_two_taps() {
        let mut c = GestureClassifier::default();
        let at = p(1.0, 1.0);
        c.handle(PointerEvent::Press(at), ms(0));
        c.handle(PointerEvent::Release(at), ms(10));
        c.handle(PointerEvent::Press(at), ms(250));
        // Window closed at 310; the pending tap is flushed before this release
        let out = c.handle(PointerEvent::Release(at), ms(310));
        assert_eq!(out, vec![Gesture::Tap(at)]);

        let fired = run_until(&mut c, 311, 1000);
        assert_eq!(fired, vec![(610, Gesture::Tap(at))]);
    }

    #[test]
    fn test_third_release_starts_new_sequence() {
        let mut c = GestureClassifier::default();
        let at = p(0.0, 0.0);
        for (down, up) in [(0, 20), (60, 80)] {
            c.handle(PointerEvent::Press(at), ms(down));
            c.handle(PointerEvent::Release(at), ms(up));
        }
        c.handle(PointerEvent::Press(at), ms(120));
        assert!(c.handle(PointerEvent::Release(at), ms(140)).is_empty());

        let fired = run_until(&mut c, 141, 800);
        assert_eq!(fired, vec![(440, Gesture::Tap(at))]);
    }

    // ============= Long press =============

    #[test]
    fn test_long_press_fires_once_and_release_is_silent() {
        let mut c = GestureClassifier::default();
        let at = p(200.0, 80.0);
        c.handle(PointerEvent::Press(at), ms(0));
        c.handle(PointerEvent::Move(p(204.0, 83.0)), ms(200));

        let fired = run_until(&mut c, 1, 700);
        assert_eq!(fired, vec![(500, Gesture::LongPress(at))]);
        assert_eq!(c.phase(), Phase::LongPressFired);

        assert!(c.handle(PointerEvent::Release(at), ms(900)).is_empty());
        assert!(run_until(&mut c, 900, 2000).is_empty());
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn test_release_flushes_overdue_long_press_first() {
        let mut c = GestureClassifier::default();
        let at = p(3.0, 3.0);
        c.handle(PointerEvent::Press(at), ms(0));
        // No tick in between; the release arrives late
        let out = c.handle(PointerEvent::Release(at), ms(800));
        assert_eq!(out, vec![Gesture::LongPress(at)]);
        assert!(run_until(&mut c, 800, 1500).is_empty());
    }

    #[test]
    fn test_drag_cancels_long_press_and_tap() {
        let mut c = GestureClassifier::default();
        c.handle(PointerEvent::Press(p(0.0, 0.0)), ms(0));
        c.handle(PointerEvent::Move(p(8.0, 7.0)), ms(100)); // ~10.6px
        assert_eq!(c.next_deadline(), None);

        assert!(run_until(&mut c, 100, 1000).is_empty());
        assert!(c.handle(PointerEvent::Release(p(0.0, 0.0)), ms(1000)).is_empty());
        assert!(run_until(&mut c, 1000, 2000).is_empty());
    }

    #[test]
    fn test_pending_tap_survives_following_drag() {
        let mut c = GestureClassifier::default();
        let at = p(50.0, 50.0);
        c.handle(PointerEvent::Press(at), ms(0));
        c.handle(PointerEvent::Release(at), ms(30));
        c.handle(PointerEvent::Press(at), ms(100));
        c.handle(PointerEvent::Move(p(90.0, 50.0)), ms(120));
        assert!(c.handle(PointerEvent::Release(p(90.0, 50.0)), ms(200)).is_empty());

        let fired = run_until(&mut c, 201, 600);
        assert_eq!(fired, vec![(330, Gesture::Tap(at))]);
    }

    // ============= Cancel =============

    #[test]
    fn test_cancel_drops_everything() {
        let mut c = GestureClassifier::default();
        let at = p(9.0, 9.0);
        c.handle(PointerEvent::Press(at), ms(0));
        c.handle(PointerEvent::Release(at), ms(20));
        c.handle(PointerEvent::Press(at), ms(100));

        let out = c.handle(PointerEvent::Cancel, ms(150));
        assert_eq!(out, vec![Gesture::Cancelled]);
        assert_eq!(c.next_deadline(), None);
        assert!(run_until(&mut c, 150, 1500).is_empty());
    }

    #[test]
    fn test_cancel_when_idle_is_silent() {
        let mut c = GestureClassifier::default();
        assert!(c.handle(PointerEvent::Cancel, ms(0)).is_empty());
    }

    #[test]
    fn test_stray_move_and_release_are_ignored() {
        let mut c = GestureClassifier::default();
        assert!(c.handle(PointerEvent::Move(p(1.0, 1.0)), ms(0)).is_empty());
        assert!(c.handle(PointerEvent::Release(p(1.0, 1.0)), ms(5)).is_empty());
        assert_eq!(c.phase(), Phase::Idle);
    }

    // ============= Settings =============

    #[test]
    fn test_custom_timings() {
        let settings = GestureSettings {
            long_press_ms: 100,
            double_tap_ms: 50,
            move_tolerance_px: 2.0,
        };
        let mut c = GestureClassifier::new(settings);
        let at = p(0.0, 0.0);

        c.handle(PointerEvent::Press(at), ms(0));
        c.handle(PointerEvent::Release(at), ms(10));
        assert_eq!(c.next_deadline(), Some(ms(60)));
        assert_eq!(run_until(&mut c, 10, 200), vec![(60, Gesture::Tap(at))]);

        c.handle(PointerEvent::Press(at), ms(300));
        c.handle(PointerEvent::Move(p(3.0, 0.0)), ms(310));
        assert_eq!(c.next_deadline(), None);
    }
}
