// Position and velocity estimation for an AB quadrature encoder driven from interrupts.
//
// The estimator is hardware independent: edge and timer handlers call into
// `QuadratureEncoder`, a `MicrosClock` provides timestamps. See `pendulum_drivers`
// for the STM32G4 side and `app` for the RTIC firmware wiring.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

#![cfg_attr(not(test), no_std)]

pub(crate) mod fmt;

pub mod clock;
pub mod config;
pub mod math_integer;
pub mod pendulum_angle;
pub mod quadrature;
pub mod shared_encoder;

pub use clock::MicrosClock;
pub use config::{ConfigError, EncoderConfig};
pub use pendulum_angle::PendulumAngle;
pub use quadrature::edge_decoder::{Channel, Direction};
pub use quadrature::{EncoderSnapshot, QuadratureEncoder};
pub use shared_encoder::SharedEncoder;
