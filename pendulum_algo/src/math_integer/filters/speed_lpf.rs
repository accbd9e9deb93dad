// Implements the direction aware speed low-pass filter used by the quadrature estimator.

// Key Features:
// - First order IIR filter, y[i] = B*x[i] + (1-B)*y[i-1], in integer math only
// - B = 3/8 in steady rotation, B = 3/4 right after a direction reversal
// - Scales a pulse count over a microsecond period to pulses per second
// - Keeps the current and the previous output for the stall logic

// Detailed Operation:
// With B expressed as a fraction of a power of two the filter reduces to
// (3*x + 5*y) / 8, which avoids floating point on the edge interrupt path.
// After a reversal the filtered history describes the old direction, so the
// weight flips towards the new sample: (3*x + y) / 4. Sums saturate instead of
// wrapping so an absurd sample clamps rather than folding to a small speed.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

/// Microseconds per second, scale between a pulse count over `period_us` and pps.
pub const MICROS_PER_SECOND: u32 = 1_000_000;

/// Pulse rate in pulses per second for `samples` pulses over `period_us` microseconds.
///
/// A zero period is read as 1 us: two edges inside the same counter tick.
#[inline(always)]
pub fn pulse_rate_pps(samples: u32, period_us: u32) -> u32 {
    samples.saturating_mul(MICROS_PER_SECOND) / period_us.max(1)
}

pub struct FilterSpeedLPF {
    current: u32,  // Filtered speed (pps)
    previous: u32, // Output of the previous update (pps)
}

impl FilterSpeedLPF {
    pub const fn new() -> Self {
        Self {
            current: 0,
            previous: 0,
        }
    }

    /// Math call. `reversed` selects the 3/4 weight on the new sample.
    #[inline(always)]
    pub fn tick(&mut self, sample: u32, reversed: bool) -> u32 {
        self.previous = self.current;
        self.current = if reversed {
            sample
                .saturating_mul(3)
                .saturating_add(self.previous)
                / 4
        } else {
            sample
                .saturating_mul(3)
                .saturating_add(self.previous.saturating_mul(5))
                / 8
        };
        self.current
    }

    /// Shift the output into history and force it to zero (stall).
    pub fn settle(&mut self) {
        self.previous = self.current;
        self.current = 0;
    }

    pub fn reset(&mut self) {
        self.current = 0;
        self.previous = 0;
    }

    pub fn get_output(&self) -> u32 {
        self.current
    }

    pub fn get_previous(&self) -> u32 {
        self.previous
    }

    #[cfg(test)]
    pub(crate) fn preload(current: u32) -> Self {
        Self {
            current,
            previous: current,
        }
    }
}

impl Default for FilterSpeedLPF {
    fn default() -> Self {
        Self::new()
    }
}
