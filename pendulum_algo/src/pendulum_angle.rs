// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use core::f32::consts::TAU;

use crate::config::ConfigError;
use crate::quadrature::EncoderSnapshot;

/// Converts encoder pulses into pendulum angles and angular rates.
///
/// Pulse counts stay integer inside the estimator; floats only appear here, on the
/// reading side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendulumAngle {
    rad_per_pulse: f32,
    deg_per_pulse: f32,
}

impl PendulumAngle {
    pub fn new(pulses_per_rotation: u16) -> Result<Self, ConfigError> {
        if pulses_per_rotation == 0 {
            return Err(ConfigError::ZeroPulsesPerRotation);
        }
        let ppr = pulses_per_rotation as f32;
        Ok(Self {
            rad_per_pulse: TAU / ppr,
            deg_per_pulse: 360.0 / ppr,
        })
    }

    /// Position in radians, `[0, 2pi)`, CCW from home.
    pub fn position_rad(&self, position: u16) -> f32 {
        position as f32 * self.rad_per_pulse
    }

    /// Position in degrees, `[0, 360)`, CCW from home.
    pub fn position_deg(&self, position: u16) -> f32 {
        position as f32 * self.deg_per_pulse
    }

    /// Angular rate in rad/s, CCW positive.
    pub fn velocity_rad(&self, velocity: i32) -> f32 {
        velocity as f32 * self.rad_per_pulse
    }

    /// Angular rate in deg/s, CCW positive.
    pub fn velocity_deg(&self, velocity: i32) -> f32 {
        velocity as f32 * self.deg_per_pulse
    }

    /// (rad, rad/s) of a snapshot.
    pub fn from_snapshot_rad(&self, snap: &EncoderSnapshot) -> (f32, f32) {
        (
            self.position_rad(snap.position),
            self.velocity_rad(snap.velocity),
        )
    }

    /// (deg, deg/s) of a snapshot.
    pub fn from_snapshot_deg(&self, snap: &EncoderSnapshot) -> (f32, f32) {
        (
            self.position_deg(snap.position),
            self.velocity_deg(snap.velocity),
        )
    }
}
