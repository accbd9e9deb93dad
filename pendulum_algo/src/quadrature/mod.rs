// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

pub mod edge_decoder;
pub mod sample_clock;
pub mod speed_estimator;

use self::edge_decoder::{decode, wrap_step, Channel, Direction};
use self::speed_estimator::SpeedEstimator;
use crate::clock::MicrosClock;
use crate::config::{ConfigError, EncoderConfig};
use crate::fmt::{debug, info};

/// Consistent copy of the values a control loop reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderSnapshot {
    /// Position in pulses, `[0, pulses_per_rotation)`.
    pub position: u16,
    /// Signed speed in pps, CCW positive.
    pub velocity: i32,
    /// Strategy used for the last speed update.
    pub fast_mode: bool,
}

/// QuadratureEncoder tracks the position and filtered velocity of an AB encoder.
///
/// All mutation happens from three interrupt entry points: [`on_edge`](Self::on_edge)
/// for either channel and [`on_sample_tick`](Self::on_sample_tick) for the periodic
/// timer. Callers own the exclusion between those handlers and any reader (an RTIC
/// shared resource or [`SharedEncoder`](crate::shared_encoder::SharedEncoder)).
pub struct QuadratureEncoder<C: MicrosClock> {
    clock: C,
    config: EncoderConfig,
    position: u16,           // Position in pulses from home, CCW positive
    pulses_per_sample: i32,  // Net pulses since the last sample tick (fast mode)
    last_edge_us: u32,       // Timestamp of the last position update
    speed: SpeedEstimator,
}

impl<C: MicrosClock> QuadratureEncoder<C> {
    /// Creates a stopped encoder at home. Nothing is armed until [`begin`](Self::begin).
    pub fn new(config: EncoderConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let now = clock.now_us();
        Ok(Self {
            clock,
            config,
            position: 0,
            pulses_per_sample: 0,
            last_edge_us: now,
            speed: SpeedEstimator::new(config.fast_threshold_pps),
        })
    }

    /// Resets to a stopped state at home and restarts edge timing.
    ///
    /// Call right before arming the edge interrupts and the sample timer.
    pub fn begin(&mut self) {
        self.pulses_per_sample = 0;
        self.speed.reset();
        self.set_home();
        self.last_edge_us = self.clock.now_us();
        info!(
            "ENCODER: started, ppr={} sample={}us",
            self.config.pulses_per_rotation,
            self.config.sample_period_us
        );
    }

    /// Current position becomes 0.
    pub fn set_home(&mut self) {
        self.position = 0;
        debug!("ENCODER: home set");
    }

    /// Rising edge handler for `channel`, given the level of the other channel.
    #[inline(always)]
    pub fn on_edge(&mut self, channel: Channel, paired_high: bool) {
        self.update_position(decode(channel, paired_high));
    }

    /// Advance one pulse in `direction`, then update speed for the active strategy.
    pub fn update_position(&mut self, direction: Direction) {
        self.position = wrap_step(self.position, direction, self.config.pulses_per_rotation);

        if self.speed.is_fast_mode() {
            self.pulses_per_sample = self.pulses_per_sample.wrapping_add(direction.step());
            self.last_edge_us = self.clock.now_us();
        } else {
            self.speed.update_direction(direction);
            let elapsed = self.clock.elapsed_us(self.last_edge_us);

            // Only one pulse is timed, so the filter's own run time is taken out of the
            // next interval.
            let start = self.clock.now_us();
            self.speed.update_speed(1, elapsed);
            let cost = self.clock.elapsed_us(start);
            self.last_edge_us = self.clock.now_us().wrapping_sub(cost);
        }
    }

    /// Position in pulses, `[0, pulses_per_rotation)`.
    #[inline(always)]
    pub fn position(&self) -> u16 {
        self.position
    }

    /// Filtered speed in pps, CCW positive.
    #[inline(always)]
    pub fn velocity(&self) -> i32 {
        self.speed.velocity()
    }

    pub fn snapshot(&self) -> EncoderSnapshot {
        EncoderSnapshot {
            position: self.position,
            velocity: self.speed.velocity(),
            fast_mode: self.speed.is_fast_mode(),
        }
    }

    pub fn pulses_per_rotation(&self) -> u16 {
        self.config.pulses_per_rotation
    }

    pub fn direction(&self) -> Direction {
        self.speed.direction()
    }

    pub fn is_fast_mode(&self) -> bool {
        self.speed.is_fast_mode()
    }

    pub fn pulses_per_sample(&self) -> i32 {
        self.pulses_per_sample
    }

    pub fn last_edge_us(&self) -> u32 {
        self.last_edge_us
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Speed estimator state, exposed for diagnostics.
    pub fn estimator(&self) -> &SpeedEstimator {
        &self.speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::mock::{MockClock, SteppingClock};

    fn encoder(clock: &MockClock, ppr: u16) -> QuadratureEncoder<&MockClock> {
        let mut enc = QuadratureEncoder::new(EncoderConfig::new(ppr), clock).unwrap();
        enc.begin();
        enc
    }

    #[test]
    fn rejects_zero_ppr() {
        let clock = MockClock::default();
        assert_eq!(
            QuadratureEncoder::new(EncoderConfig::new(0), &clock).err(),
            Some(ConfigError::ZeroPulsesPerRotation)
        );
    }

    #[test]
    fn edges_move_position_with_wraparound() {
        let clock = MockClock::default();
        let mut enc = encoder(&clock, 100);
        // A rises while B is low: CW from home wraps to the top
        enc.on_edge(Channel::A, false);
        assert_eq!(enc.position(), 99);
        enc.on_edge(Channel::B, false);
        assert_eq!(enc.position(), 0);
        enc.on_edge(Channel::A, true);
        assert_eq!(enc.position(), 1);
    }

    #[test]
    fn slow_mode_times_each_edge() {
        let clock = MockClock::starting_at(1_000);
        let mut enc = encoder(&clock, 600);
        assert!(!enc.is_fast_mode());

        clock.advance(10_000);
        enc.update_position(Direction::Ccw);
        // First edge after begin is the same direction as the idle default:
        // 100pps sample, (300 + 0) / 8
        assert_eq!(enc.velocity(), 37);
        assert_eq!(enc.last_edge_us(), 11_000);
        assert_eq!(enc.pulses_per_sample(), 0);

        clock.advance(10_000);
        enc.update_position(Direction::Cw);
        // Reversal: (300 + 37) / 4 = 84, now CW
        assert_eq!(enc.velocity(), -84);
    }

    #[test]
    fn slow_mode_takes_filter_cost_out_of_next_interval() {
        // Every read moves the clock 40us
        let clock = SteppingClock::new(40);
        let mut enc = QuadratureEncoder::new(EncoderConfig::new(600), &clock).unwrap();
        enc.begin();
        assert_eq!(enc.last_edge_us(), 40);

        clock.set(10_000);
        enc.update_position(Direction::Ccw);
        // Reads: elapsed 10_000, start 10_040, cost end 10_080, now 10_120.
        // Cost is 40us, so the stamp lands one cost before the last read.
        assert_eq!(enc.last_edge_us(), 10_080);
        assert_eq!(clock.peek(), 10_160);
        // 1 pulse over 9_960us = 100pps, (300 + 0) / 8
        assert_eq!(enc.velocity(), 37);
    }

    #[test]
    fn home_reset_after_motion() {
        let clock = MockClock::default();
        let mut enc = encoder(&clock, 360);
        for _ in 0..77 {
            clock.advance(500);
            enc.update_position(Direction::Ccw);
        }
        assert_eq!(enc.position(), 77);
        enc.set_home();
        assert_eq!(enc.position(), 0);
    }

    #[test]
    fn begin_clears_motion_state() {
        let clock = MockClock::default();
        let mut enc = encoder(&clock, 100);
        clock.advance(1_000);
        enc.update_position(Direction::Cw);
        assert_ne!(enc.velocity(), 0);
        enc.begin();
        assert_eq!(
            enc.snapshot(),
            EncoderSnapshot {
                position: 0,
                velocity: 0,
                fast_mode: false
            }
        );
    }
}
