// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use cortex_m::peripheral::NVIC;
use hal::{
    gpio::{self, Edge, Pin, Pull},
    pac::Interrupt,
};

use pendulum_algo::Channel;

use super::pinout;

/// EXTI vector serving channel A.
pub const ENC_A_IRQ: Interrupt = Interrupt::EXTI0;
/// EXTI vector serving channel B.
pub const ENC_B_IRQ: Interrupt = Interrupt::EXTI1;

/// The two encoder channels as rising edge interrupt sources.
pub struct QuadratureInputs {
    pin_a: Pin,
    pin_b: Pin,
}

impl QuadratureInputs {
    /// Configures both pins as pulled-up inputs with rising edge EXTI. Nothing fires
    /// until [`arm`](Self::arm).
    pub fn new() -> Self {
        let mut pin_a = pinout::encoder::ENC_A.init();
        pin_a.pull(Pull::Up);
        pin_a.enable_interrupt(Edge::Rising);

        let mut pin_b = pinout::encoder::ENC_B.init();
        pin_b.pull(Pull::Up);
        pin_b.enable_interrupt(Edge::Rising);

        NVIC::mask(ENC_A_IRQ);
        NVIC::mask(ENC_B_IRQ);

        QuadratureInputs { pin_a, pin_b }
    }

    /// Clears stale edges and unmasks both EXTI vectors.
    pub fn arm(&mut self) {
        self.clear(Channel::A);
        self.clear(Channel::B);
        unsafe {
            NVIC::unmask(ENC_A_IRQ);
            NVIC::unmask(ENC_B_IRQ);
        }
    }

    /// Masks both EXTI vectors. Required before the encoder state is released.
    pub fn disarm(&mut self) {
        NVIC::mask(ENC_A_IRQ);
        NVIC::mask(ENC_B_IRQ);
    }

    /// Acknowledges the pending edge of `channel`.
    #[inline(always)]
    pub fn clear(&mut self, channel: Channel) {
        match channel {
            Channel::A => gpio::clear_exti_interrupt(pinout::encoder::ENC_A.exti_line()),
            Channel::B => gpio::clear_exti_interrupt(pinout::encoder::ENC_B.exti_line()),
        }
    }

    /// Level of the channel paired with `channel`, read inside its edge handler.
    #[inline(always)]
    pub fn paired_high(&self, channel: Channel) -> bool {
        match channel {
            Channel::A => self.pin_b.is_high(),
            Channel::B => self.pin_a.is_high(),
        }
    }

    pub fn levels(&self) -> (bool, bool) {
        (self.pin_a.is_high(), self.pin_b.is_high())
    }
}
