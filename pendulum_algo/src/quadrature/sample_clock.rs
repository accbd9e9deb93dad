// Implements the periodic sample clock handler of the quadrature estimator.

// Key Features:
// - Converts the pulses counted during one period into a speed sample (fast mode)
// - Declares standstill when no edge arrives within a speed dependent window (slow mode)
// - Is the only place the measurement strategy changes

// Detailed Operation:
// In fast mode the edge handler only accumulates signed pulses. On each tick the
// sign gives the direction and the magnitude over the fixed period gives the
// speed sample. In slow mode the edge handler already filtered the speed, so the
// tick only watches for silence: the allowed gap is (threshold - speed) * period / 2,
// which lets a slowly swinging pendulum near its turning point keep its last
// speed for longer than a fast one. Afterwards the accumulator is cleared and the
// strategy re-evaluated for the next period.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use super::edge_decoder::Direction;
use super::QuadratureEncoder;
use crate::clock::MicrosClock;
use crate::fmt::debug;

impl<C: MicrosClock> QuadratureEncoder<C> {
    /// Periodic timer handler, called once per `sample_period_us`.
    pub fn on_sample_tick(&mut self) {
        let period_us = self.config.sample_period_us;

        if self.speed.is_fast_mode() {
            self.speed
                .update_direction(Direction::from_net_pulses(self.pulses_per_sample));
            self.speed
                .update_speed(self.pulses_per_sample.unsigned_abs(), period_us);
        } else {
            self.check_speed_timeout();
        }

        self.pulses_per_sample = 0;
        self.speed.check_fast_calc_status();
    }

    /// Zero the speed if the sensor has been silent for longer than the stall window.
    fn check_speed_timeout(&mut self) {
        let Some(allowed) = self.speed.allowed_silence_us(self.config.sample_period_us) else {
            return;
        };
        let silence = self.clock.elapsed_us(self.last_edge_us);
        if silence > allowed {
            if self.speed.speed() != 0 {
                debug!("ENCODER: stall after {}us", silence);
            }
            self.speed.settle();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::mock::MockClock;
    use crate::config::EncoderConfig;
    use crate::quadrature::edge_decoder::Direction;
    use crate::quadrature::QuadratureEncoder;

    const PERIOD: u32 = 16_225;

    fn encoder(clock: &MockClock) -> QuadratureEncoder<&MockClock> {
        let mut enc = QuadratureEncoder::new(EncoderConfig::new(600), clock).unwrap();
        enc.begin();
        enc
    }

    /// Spin at a steady rate until the estimator is in fast mode.
    fn spin_up(enc: &mut QuadratureEncoder<&MockClock>, clock: &MockClock, dir: Direction) {
        // 1 edge every 2ms = 500pps
        for _ in 0..200 {
            for _ in 0..8 {
                clock.advance(2_000);
                enc.update_position(dir);
            }
            clock.advance(PERIOD - 16_000);
            enc.on_sample_tick();
            if enc.is_fast_mode() {
                return;
            }
        }
        panic!("never reached fast mode");
    }

    #[test]
    fn fast_mode_counts_pulses_per_period() {
        let clock = MockClock::default();
        let mut enc = encoder(&clock);
        spin_up(&mut enc, &clock, Direction::Ccw);

        let before = enc.estimator().speed();
        for _ in 0..20 {
            clock.advance(800);
            enc.update_position(Direction::Ccw);
        }
        assert_eq!(enc.pulses_per_sample(), 20);
        clock.advance(PERIOD - 16_000);
        enc.on_sample_tick();
        assert_eq!(enc.pulses_per_sample(), 0);

        let raw = 20 * 1_000_000 / PERIOD;
        assert_eq!(enc.estimator().speed(), (3 * raw + 5 * before) / 8);
        assert!(enc.velocity() > 0);
    }

    #[test]
    fn fast_mode_reversal_uses_net_sign() {
        let clock = MockClock::default();
        let mut enc = encoder(&clock);
        spin_up(&mut enc, &clock, Direction::Ccw);

        for _ in 0..12 {
            enc.update_position(Direction::Cw);
        }
        for _ in 0..2 {
            enc.update_position(Direction::Ccw);
        }
        assert_eq!(enc.pulses_per_sample(), -10);
        let before = enc.estimator().speed();
        enc.on_sample_tick();

        let raw = 10 * 1_000_000 / PERIOD;
        assert_eq!(enc.direction(), Direction::Cw);
        assert_eq!(enc.estimator().speed(), (3 * raw + before) / 4);
        assert!(enc.velocity() < 0);
    }

    #[test]
    fn fast_mode_holds_while_speed_stays_high() {
        let clock = MockClock::default();
        let mut enc = encoder(&clock);
        spin_up(&mut enc, &clock, Direction::Ccw);

        for _ in 0..50 {
            for _ in 0..8 {
                clock.advance(2_000);
                enc.update_position(Direction::Ccw);
            }
            clock.advance(PERIOD - 16_000);
            enc.on_sample_tick();
            assert!(enc.is_fast_mode());
        }
    }

    #[test]
    fn slow_mode_holds_while_speed_stays_low() {
        let clock = MockClock::default();
        let mut enc = encoder(&clock);

        // 1 edge every 20ms = 50pps, one tick per edge
        for _ in 0..50 {
            clock.advance(20_000);
            enc.update_position(Direction::Cw);
            enc.on_sample_tick();
            assert!(!enc.is_fast_mode());
        }
        assert!(enc.velocity() < 0);
    }

    #[test]
    fn falls_back_to_slow_mode_when_pulses_stop() {
        let clock = MockClock::default();
        let mut enc = encoder(&clock);
        spin_up(&mut enc, &clock, Direction::Ccw);

        for _ in 0..20 {
            clock.advance(PERIOD);
            enc.on_sample_tick();
        }
        assert!(!enc.is_fast_mode());
    }

    #[test]
    fn stall_from_standstill_reports_zero() {
        let clock = MockClock::default();
        let mut enc = encoder(&clock);
        let window = enc.estimator().allowed_silence_us(PERIOD).unwrap();

        clock.advance(window + 1);
        enc.on_sample_tick();
        assert_eq!(enc.velocity(), 0);
        assert!(!enc.is_fast_mode());
    }

    #[test]
    fn stall_zeroes_slow_speed_after_window() {
        let clock = MockClock::default();
        let mut enc = encoder(&clock);

        clock.advance(10_000);
        enc.update_position(Direction::Ccw);
        let speed = enc.estimator().speed();
        assert!(speed > 0);
        let window = enc.estimator().allowed_silence_us(PERIOD).unwrap();

        // Still inside the window: speed kept
        clock.advance(window);
        enc.on_sample_tick();
        assert_eq!(enc.estimator().speed(), speed);

        clock.advance(1);
        enc.on_sample_tick();
        assert_eq!(enc.velocity(), 0);
        assert_eq!(enc.estimator().previous_speed(), speed);
    }

    #[test]
    fn tick_survives_clock_rollover() {
        let clock = MockClock::starting_at(u32::MAX - 1_000);
        let mut enc = encoder(&clock);
        clock.advance(5_000);
        enc.update_position(Direction::Ccw);
        assert!(enc.velocity() > 0);
        clock.advance(1_000);
        enc.on_sample_tick();
        assert!(enc.velocity() > 0);
    }
}
