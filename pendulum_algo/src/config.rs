// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use core::fmt;

use crate::fmt::{info, warning};

/// Speed in pps above which pulse counting replaces pulse timing.
pub const DEFAULT_FAST_THRESHOLD_PPS: u32 = 130;

/// Sample clock period in microseconds (~61.6 Hz on the reference board).
pub const DEFAULT_SAMPLE_PERIOD_US: u32 = 16_225;

/// Reasons an [`EncoderConfig`] is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Position wraps modulo pulses per rotation, zero has no meaning.
    ZeroPulsesPerRotation,
    /// Fast mode speed is computed as pulses / period.
    ZeroSamplePeriod,
    /// Stall window scales with the threshold and would collapse to zero.
    ZeroFastThreshold,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroPulsesPerRotation => f.write_str("pulses per rotation must be > 0"),
            ConfigError::ZeroSamplePeriod => f.write_str("sample period must be > 0 us"),
            ConfigError::ZeroFastThreshold => f.write_str("fast mode threshold must be > 0 pps"),
        }
    }
}

/// Static parameters of one quadrature sensor and its sample clock.
///
/// The threshold and the period were tuned for one sensor/MCU pair, so both are
/// exposed here instead of being baked into the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderConfig {
    /// Pulses in one full rotation, the position wrap modulus.
    pub pulses_per_rotation: u16,
    /// Filtered speed (pps) above which the sample clock counts pulses.
    pub fast_threshold_pps: u32,
    /// Period of the sample clock in microseconds.
    pub sample_period_us: u32,
}

impl EncoderConfig {
    /// Config with the reference threshold and sample period.
    pub const fn new(pulses_per_rotation: u16) -> Self {
        Self {
            pulses_per_rotation,
            fast_threshold_pps: DEFAULT_FAST_THRESHOLD_PPS,
            sample_period_us: DEFAULT_SAMPLE_PERIOD_US,
        }
    }

    pub const fn with_fast_threshold(mut self, pps: u32) -> Self {
        self.fast_threshold_pps = pps;
        self
    }

    pub const fn with_sample_period_us(mut self, period_us: u32) -> Self {
        self.sample_period_us = period_us;
        self
    }

    /// Sample clock frequency in Hz, rounded to the nearest integer.
    pub fn sample_freq_hz(&self) -> u32 {
        if self.sample_period_us == 0 {
            return 0;
        }
        (1_000_000 + self.sample_period_us / 2) / self.sample_period_us
    }

    /// Checks every field that would otherwise end in a division or modulo by zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let res = if self.pulses_per_rotation == 0 {
            Err(ConfigError::ZeroPulsesPerRotation)
        } else if self.sample_period_us == 0 {
            Err(ConfigError::ZeroSamplePeriod)
        } else if self.fast_threshold_pps == 0 {
            Err(ConfigError::ZeroFastThreshold)
        } else {
            Ok(())
        };

        match res {
            Ok(()) => info!(
                "ENCODER: ppr={} threshold={}pps period={}us",
                self.pulses_per_rotation,
                self.fast_threshold_pps,
                self.sample_period_us
            ),
            Err(_) => warning!(
                "ENCODER: rejected config ppr={} threshold={}pps period={}us",
                self.pulses_per_rotation,
                self.fast_threshold_pps,
                self.sample_period_us
            ),
        }
        res
    }
}
