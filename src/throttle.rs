//! Rate limiting for scan events
//!
//! A decoded code is forwarded to the host only if at least `window` ms
//! passed since the last forwarded one. Dropped codes are discarded, never
//! queued, and leave the timestamp untouched.

use crate::device::DecodeHandler;
use crate::props::{EventHandler, DEFAULT_SCAN_THROTTLE_MS};
use crate::timing::{Clock, MonotonicClock};
use crate::types::{CodeFormat, ScanEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const NEVER_EMITTED: u64 = u64::MAX;

pub struct BarcodeThrottle {
    last_emitted: AtomicU64,
    window_ms: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl BarcodeThrottle {
    pub fn new(window_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            last_emitted: AtomicU64::new(NEVER_EMITTED),
            window_ms: AtomicU64::new(window_ms),
            clock,
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms.load(Ordering::Relaxed)
    }

    pub fn set_window_ms(&self, window_ms: u64) {
        self.window_ms.store(window_ms, Ordering::Relaxed);
    }

    /// Timestamp of the last emission, if any
    pub fn last_emitted_ms(&self) -> Option<u64> {
        match self.last_emitted.load(Ordering::Acquire) {
            NEVER_EMITTED => None,
            ts => Some(ts),
        }
    }

    /// Claim the emission slot at `now_ms`.
    ///
    /// The check and the timestamp update are one compare-and-set, so two
    /// decoder threads can never both pass inside the same window.
    pub fn try_acquire_at(&self, now_ms: u64) -> bool {
        let window = self.window_ms();
        let mut last = self.last_emitted.load(Ordering::Acquire);
        loop {
            if last != NEVER_EMITTED && now_ms.saturating_sub(last) < window {
                return false;
            }
            match self.last_emitted.compare_exchange_weak(
                last,
                now_ms,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => last = actual,
            }
        }
    }

    /// Forward a decoded code to `sink` unless it falls inside the window
    pub fn on_decode(&self, value: String, format: CodeFormat, sink: &EventHandler<ScanEvent>) -> bool {
        let now = self.clock.now_ms();
        if !self.try_acquire_at(now) {
            log::trace!("Dropping throttled {} code at {}ms", format, now);
            return false;
        }

        log::debug!("Emitting {} code at {}ms", format, now);
        sink.emit(ScanEvent {
            code_string_value: value,
            code_format: format,
        });
        true
    }

    /// Device-facing decode callback that throttles into `sink`
    pub fn decode_handler(self: &Arc<Self>, sink: EventHandler<ScanEvent>) -> DecodeHandler {
        let throttle = Arc::clone(self);
        Arc::new(move |value: String, format: CodeFormat| {
            throttle.on_decode(value, format, &sink);
        })
    }
}

impl Default for BarcodeThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_THROTTLE_MS, Arc::new(MonotonicClock::new()))
    }
}
