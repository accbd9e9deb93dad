// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

//! Quadrature encoder inputs. The sensor has open collector outputs, both pins need
//! the internal pull-up.
use super::PinDef;
use super::{PinMode, Port};

/// Channel A, green wire. EXTI0.
pub const ENC_A: PinDef = PinDef {
    port: Port::B,
    pin: 0,
    mode: PinMode::Input,
};

/// Channel B, white wire. EXTI1.
pub const ENC_B: PinDef = PinDef {
    port: Port::B,
    pin: 1,
    mode: PinMode::Input,
};
