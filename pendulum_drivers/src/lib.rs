//! STM32G4 side of the pendulum encoder: pin map, edge inputs, microsecond counter
//! and the sample clock timer.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

#![no_std]

pub mod micros;
pub mod pinout;
pub mod quadrature_inputs;
pub mod sample_timer;

pub use micros::MicrosCounter;
pub use quadrature_inputs::QuadratureInputs;
pub use sample_timer::SampleTimer;
