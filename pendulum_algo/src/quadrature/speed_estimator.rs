// Implements the adaptive speed estimator: pulse timing at low speed, pulse counting at high speed.

// Key Features:
// - Filtered speed magnitude in pps plus the last known direction
// - Reversal flag that biases the next filter update towards the new sample
// - Strategy selection against a configurable threshold on the filtered speed
// - Speed dependent stall window, longer for slower last known speed

// Detailed Operation:
// Counting pulses over a fixed window is cheap and accurate when many pulses
// arrive per window. At low rates the same window sees only a handful of pulses,
// so each edge is timed instead and fed to the filter as a single pulse over the
// measured interval. Comparing the threshold against the filtered speed rather
// than the raw sample damps flapping between the two strategies.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use super::edge_decoder::Direction;
use crate::fmt::debug;
use crate::math_integer::filters::speed_lpf::{pulse_rate_pps, FilterSpeedLPF};

pub struct SpeedEstimator {
    filter: FilterSpeedLPF,    // Filtered speed magnitude (pps)
    direction: Direction,      // Last known direction
    direction_changed: bool,   // Reversal seen since the last filter update
    fast_mode: bool,           // Pulse counting when set, pulse timing otherwise
    fast_threshold_pps: u32,   // Strategy switch point
}

impl SpeedEstimator {
    pub const fn new(fast_threshold_pps: u32) -> Self {
        Self {
            filter: FilterSpeedLPF::new(),
            direction: Direction::Ccw,
            direction_changed: false,
            fast_mode: false,
            fast_threshold_pps,
        }
    }

    /// Back to standstill in slow mode.
    pub fn reset(&mut self) {
        self.filter.reset();
        self.direction = Direction::Ccw;
        self.direction_changed = false;
        self.fast_mode = false;
    }

    /// Record the newest direction sample, flagging a reversal.
    #[inline(always)]
    pub fn update_direction(&mut self, direction: Direction) {
        self.direction_changed = direction != self.direction;
        self.direction = direction;
    }

    /// Feed `samples` pulses measured over `period_us`, consuming the reversal flag.
    #[inline(always)]
    pub fn update_speed(&mut self, samples: u32, period_us: u32) -> u32 {
        let sample = pulse_rate_pps(samples, period_us);
        let reversed = self.direction_changed;
        self.direction_changed = false;
        self.filter.tick(sample, reversed)
    }

    /// Re-evaluate the strategy. Only the sample clock calls this.
    pub fn check_fast_calc_status(&mut self) -> bool {
        let fast = self.filter.get_output() > self.fast_threshold_pps;
        if fast != self.fast_mode {
            debug!(
                "ENCODER: {} mode at {}pps",
                if fast { "fast" } else { "slow" },
                self.filter.get_output()
            );
        }
        self.fast_mode = fast;
        fast
    }

    /// Longest silence tolerated before the speed is declared zero.
    ///
    /// `(threshold - speed) * period / 2`: a slower last known speed waits longer.
    /// `None` while the filtered speed is above the threshold, the tick is about to
    /// hand over to pulse counting and there is nothing to time out.
    pub fn allowed_silence_us(&self, sample_period_us: u32) -> Option<u32> {
        let speed = self.filter.get_output();
        if speed > self.fast_threshold_pps {
            return None;
        }
        Some((self.fast_threshold_pps - speed).saturating_mul(sample_period_us) / 2)
    }

    /// Force the speed to zero after a stall, keeping the old value as history.
    pub fn settle(&mut self) {
        self.filter.settle();
    }

    /// Signed speed in pps, CCW positive.
    #[inline(always)]
    pub fn velocity(&self) -> i32 {
        let speed = self.filter.get_output().min(i32::MAX as u32) as i32;
        speed * self.direction.step()
    }

    pub fn speed(&self) -> u32 {
        self.filter.get_output()
    }

    pub fn previous_speed(&self) -> u32 {
        self.filter.get_previous()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn direction_changed(&self) -> bool {
        self.direction_changed
    }

    pub fn is_fast_mode(&self) -> bool {
        self.fast_mode
    }

    #[cfg(test)]
    pub(crate) fn preload(&mut self, speed: u32) {
        self.filter = FilterSpeedLPF::preload(speed);
    }
}
