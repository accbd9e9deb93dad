// Implements an explicitly owned, interrupt safe home for the single encoder instance.

// Key Features:
// - One static context per physical sensor, no instance pointer exposed to the handlers
// - Every access runs inside a critical section, so a reader never sees a half updated state
// - Handlers that fire before install or after take are silently ignored
// - Ownership returns to the caller on teardown, after the interrupt sources are disarmed

// Detailed Operation:
// Edge and sample handlers mutate position, speed, direction, the pulse accumulator
// and the edge timestamp together. On a core with nested or prioritised interrupts a
// lower priority context could otherwise copy some fields before and some after a
// handler ran. Wrapping the encoder in a critical_section::Mutex makes each handler
// body and each snapshot copy atomic with respect to the others, for the few cycles
// the copy takes. With RTIC the same guarantee comes from a #[shared] resource lock.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use core::cell::RefCell;

use critical_section::Mutex;

use crate::clock::MicrosClock;
use crate::quadrature::edge_decoder::Channel;
use crate::quadrature::{EncoderSnapshot, QuadratureEncoder};

/// Slot for the encoder owned by the interrupt handlers, meant to live in a `static`.
///
/// ```ignore
/// static ENCODER: SharedEncoder<MicrosCounter> = SharedEncoder::new();
///
/// #[interrupt]
/// fn EXTI0() {
///     ENCODER.on_edge(Channel::A, inputs.paired_high(Channel::A));
/// }
///
/// // Teardown: silence every source before the state leaves the slot
/// inputs.disarm();
/// sample_timer.disarm();
/// let encoder = ENCODER.take();
/// ```
pub struct SharedEncoder<C: MicrosClock> {
    inner: Mutex<RefCell<Option<QuadratureEncoder<C>>>>,
}

impl<C: MicrosClock> SharedEncoder<C> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Starts `encoder` and moves it into the slot, returning any previous instance.
    ///
    /// Arm the edge interrupts and the sample timer after this returns.
    pub fn install(&self, mut encoder: QuadratureEncoder<C>) -> Option<QuadratureEncoder<C>> {
        encoder.begin();
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).replace(encoder))
    }

    /// Takes the encoder back. Disarm the edge interrupts and the sample timer first.
    pub fn take(&self) -> Option<QuadratureEncoder<C>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).take())
    }

    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_some())
    }

    /// Runs `f` on the encoder with interrupts held off. `None` when nothing is installed.
    pub fn with<R>(&self, f: impl FnOnce(&mut QuadratureEncoder<C>) -> R) -> Option<R> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).as_mut().map(f))
    }

    /// Rising edge interrupt entry point.
    #[inline(always)]
    pub fn on_edge(&self, channel: Channel, paired_high: bool) {
        self.with(|enc| enc.on_edge(channel, paired_high));
    }

    /// Sample timer interrupt entry point.
    #[inline(always)]
    pub fn on_sample_tick(&self) {
        self.with(|enc| enc.on_sample_tick());
    }

    pub fn set_home(&self) {
        self.with(|enc| enc.set_home());
    }

    /// Position, velocity and mode copied out in one critical section.
    pub fn snapshot(&self) -> Option<EncoderSnapshot> {
        self.with(|enc| enc.snapshot())
    }

    pub fn position(&self) -> Option<u16> {
        self.with(|enc| enc.position())
    }

    pub fn velocity(&self) -> Option<i32> {
        self.with(|enc| enc.velocity())
    }
}

impl<C: MicrosClock> Default for SharedEncoder<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::mock::MockClock;
    use crate::config::EncoderConfig;

    #[test]
    fn handlers_before_install_are_ignored() {
        let shared: SharedEncoder<&MockClock> = SharedEncoder::new();
        shared.on_edge(Channel::A, true);
        shared.on_sample_tick();
        assert!(!shared.is_installed());
        assert_eq!(shared.snapshot(), None);
    }

    #[test]
    fn install_edges_snapshot_take() {
        let clock = MockClock::default();
        let shared = SharedEncoder::new();
        let enc = QuadratureEncoder::new(EncoderConfig::new(100), &clock).unwrap();
        assert!(shared.install(enc).is_none());

        clock.advance(20_000);
        shared.on_edge(Channel::A, true);
        clock.advance(20_000);
        shared.on_edge(Channel::A, true);
        shared.on_sample_tick();

        let snap = shared.snapshot().unwrap();
        assert_eq!(snap.position, 2);
        assert!(snap.velocity > 0);
        assert!(!snap.fast_mode);

        shared.set_home();
        assert_eq!(shared.position(), Some(0));

        let enc = shared.take().unwrap();
        assert_eq!(enc.position(), 0);
        assert!(!shared.is_installed());
        assert_eq!(shared.velocity(), None);
    }
}
