//! Touch pad event tracking and callback dispatch.
//!
//! The touch controller only reports which pads are touched right now.
//! [`TouchTracker`] turns successive snapshots into press, release and held
//! events and hands them to the registered callbacks. It runs whenever the
//! owner calls [`ExplorerHat::poll`](crate::ExplorerHat::poll), typically
//! every 10-50ms from the main loop.
//!
//! # Example
//!
//! ```rust
//! use explorer_hat::pins::PinMap;
//! use explorer_hat::touch::{TouchEventKind, TouchTracker};
//! use explorer_hat::TouchId;
//!
//! let pins = PinMap::default();
//! let mut tracker = TouchTracker::new();
//!
//! // Pad one is wired to controller input 4
//! let events = tracker.update(1 << 4, 0, 500, 200, &pins);
//! assert_eq!(events[0].pad, TouchId::One);
//! assert_eq!(events[0].kind, TouchEventKind::Press);
//!
//! let events = tracker.update(1 << 4, 600, 500, 200, &pins);
//! assert_eq!(events[0].kind, TouchEventKind::Held);
//!
//! let events = tracker.update(0, 650, 500, 200, &pins);
//! assert_eq!(events[0].kind, TouchEventKind::Release);
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;

use heapless::Vec as HVec;

use crate::pins::{PinMap, TouchId};

/// Number of touch pads on the board.
pub const PAD_COUNT: usize = 8;

/// What happened to a pad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TouchEventKind {
    /// Pad was touched.
    Press,
    /// Pad was let go.
    Release,
    /// Pad is still touched after the hold time; repeats while held.
    Held,
}

/// A single touch event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TouchEvent {
    /// Pad the event is for.
    pub pad: TouchId,
    /// What happened.
    pub kind: TouchEventKind,
}

/// Events produced by one update; at most one per pad.
pub type TouchEvents = HVec<TouchEvent, PAD_COUNT>;

/// Callback for touch events.
pub type TouchCallback = Box<dyn FnMut(TouchEvent) + Send + 'static>;

struct Handler {
    pad: Option<TouchId>,
    kind: TouchEventKind,
    callback: TouchCallback,
}

/// Per-pad touch state plus the registered callbacks.
#[derive(Default)]
pub struct TouchTracker {
    pressed_at: [Option<u64>; PAD_COUNT],
    last_held: [Option<u64>; PAD_COUNT],
    handlers: Vec<Handler>,
}

impl TouchTracker {
    /// Creates a tracker with every pad released.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `pad` was touched at the last update.
    #[inline]
    pub fn is_pressed(&self, pad: TouchId) -> bool {
        self.pressed_at[pad.index()].is_some()
    }

    /// Register `callback` for `kind` events on `pad`, or on every pad when
    /// `pad` is `None`.
    ///
    /// A selection holds one callback per kind; registering again replaces
    /// the previous one.
    pub fn register(&mut self, pad: Option<TouchId>, kind: TouchEventKind, callback: TouchCallback) {
        self.handlers
            .retain(|handler| !(handler.pad == pad && handler.kind == kind));
        self.handlers.push(Handler {
            pad,
            kind,
            callback,
        });
    }

    /// Drop the callbacks registered for `pad` (or the all-pads callbacks
    /// when `pad` is `None`).
    pub fn clear(&mut self, pad: Option<TouchId>) {
        self.handlers.retain(|handler| handler.pad != pad);
    }

    /// Drop every callback.
    pub fn clear_all(&mut self) {
        self.handlers.clear();
    }

    /// Number of registered callbacks.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Compare `mask` (bit n = controller input n touched) with the previous
    /// snapshot and return the resulting events.
    ///
    /// A pad held past `hold_ms` reports `Held`, then again every
    /// `repeat_ms` until it is released.
    pub fn update(
        &mut self,
        mask: u8,
        now_ms: u64,
        hold_ms: u64,
        repeat_ms: u64,
        pins: &PinMap,
    ) -> TouchEvents {
        let mut events = TouchEvents::new();

        for &pad in TouchId::ALL {
            let i = pad.index();
            let touched = mask & (1 << (pins.touch(pad) & 0x07)) != 0;

            let kind = match (self.pressed_at[i], touched) {
                (None, true) => {
                    self.pressed_at[i] = Some(now_ms);
                    self.last_held[i] = None;
                    Some(TouchEventKind::Press)
                }
                (Some(_), false) => {
                    self.pressed_at[i] = None;
                    self.last_held[i] = None;
                    Some(TouchEventKind::Release)
                }
                (Some(since), true) => {
                    let due = match self.last_held[i] {
                        None => since.saturating_add(hold_ms),
                        Some(last) => last.saturating_add(repeat_ms),
                    };
                    if now_ms >= due {
                        self.last_held[i] = Some(now_ms);
                        Some(TouchEventKind::Held)
                    } else {
                        None
                    }
                }
                (None, false) => None,
            };

            if let Some(kind) = kind {
                // At most one event per pad, so this never overflows.
                let _ = events.push(TouchEvent { pad, kind });
            }
        }

        events
    }

    /// Run the matching callbacks for each event, in registration order.
    pub fn dispatch(&mut self, events: &[TouchEvent]) {
        for event in events {
            for handler in self
                .handlers
                .iter_mut()
                .filter(|h| h.kind == event.kind && h.pad.map_or(true, |pad| pad == event.pad))
            {
                (handler.callback)(*event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn bit(pad: TouchId) -> u8 {
        1 << PinMap::default().touch(pad)
    }

    #[test]
    fn press_then_release() {
        let pins = PinMap::default();
        let mut tracker = TouchTracker::new();

        let events = tracker.update(bit(TouchId::Five), 0, 500, 200, &pins);
        assert_eq!(
            events.as_slice(),
            &[TouchEvent {
                pad: TouchId::Five,
                kind: TouchEventKind::Press
            }]
        );
        assert!(tracker.is_pressed(TouchId::Five));

        assert!(tracker
            .update(bit(TouchId::Five), 100, 500, 200, &pins)
            .is_empty());

        let events = tracker.update(0, 200, 500, 200, &pins);
        assert_eq!(events[0].kind, TouchEventKind::Release);
        assert!(!tracker.is_pressed(TouchId::Five));
    }

    #[test]
    fn held_repeats_at_interval() {
        let pins = PinMap::default();
        let mut tracker = TouchTracker::new();
        let mask = bit(TouchId::Two);

        tracker.update(mask, 0, 500, 200, &pins);
        assert!(tracker.update(mask, 499, 500, 200, &pins).is_empty());
        assert_eq!(tracker.update(mask, 500, 500, 200, &pins)[0].kind, TouchEventKind::Held);
        assert!(tracker.update(mask, 600, 500, 200, &pins).is_empty());
        assert_eq!(tracker.update(mask, 700, 500, 200, &pins)[0].kind, TouchEventKind::Held);
    }

    #[test]
    fn simultaneous_pads_report_in_board_order() {
        let pins = PinMap::default();
        let mut tracker = TouchTracker::new();

        let events = tracker.update(0xFF, 0, 500, 200, &pins);
        assert_eq!(events.len(), PAD_COUNT);
        let pads: Vec<TouchId> = events.iter().map(|e| e.pad).collect();
        assert_eq!(pads, TouchId::ALL.to_vec());
    }

    #[test]
    fn dispatch_filters_by_pad_and_kind() {
        let pins = PinMap::default();
        let mut tracker = TouchTracker::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&log);
        tracker.register(
            Some(TouchId::One),
            TouchEventKind::Press,
            Box::new(move |e| sink.lock().unwrap().push(("one", e.pad))),
        );
        let sink = Arc::clone(&log);
        tracker.register(
            None,
            TouchEventKind::Release,
            Box::new(move |e| sink.lock().unwrap().push(("any", e.pad))),
        );

        let events = tracker.update(bit(TouchId::One) | bit(TouchId::Three), 0, 500, 200, &pins);
        tracker.dispatch(&events);
        let events = tracker.update(0, 10, 500, 200, &pins);
        tracker.dispatch(&events);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ("one", TouchId::One),
                ("any", TouchId::One),
                ("any", TouchId::Three)
            ]
        );
    }

    #[test]
    fn register_replaces_same_pad_and_kind() {
        let pins = PinMap::default();
        let mut tracker = TouchTracker::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let sink = Arc::clone(&log);
            tracker.register(
                Some(TouchId::One),
                TouchEventKind::Press,
                Box::new(move |_| sink.lock().unwrap().push(tag)),
            );
        }
        // Different kind on the same pad is kept alongside
        tracker.register(Some(TouchId::One), TouchEventKind::Release, Box::new(|_| {}));
        assert_eq!(tracker.handler_count(), 2);

        let events = tracker.update(bit(TouchId::One), 0, 500, 200, &pins);
        tracker.dispatch(&events);
        assert_eq!(*log.lock().unwrap(), vec!["third"]);
    }

    #[test]
    fn clear_removes_only_selected_handlers() {
        let mut tracker = TouchTracker::new();
        tracker.register(Some(TouchId::One), TouchEventKind::Press, Box::new(|_| {}));
        tracker.register(None, TouchEventKind::Press, Box::new(|_| {}));

        tracker.clear(Some(TouchId::One));
        assert_eq!(tracker.handler_count(), 1);
        tracker.clear_all();
        assert_eq!(tracker.handler_count(), 0);
    }
}
