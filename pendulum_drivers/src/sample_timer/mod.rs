// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use cortex_m::peripheral::NVIC;
use hal::{
    clocks::Clocks,
    pac::{Interrupt, TIM6},
    timer::{
        Alignment, CaptureCompareDma, CountDir, Timer, TimerConfig, TimerInterrupt, UpdateReqSrc,
    },
};

/// Vector of the sample clock.
pub const SAMPLE_IRQ: Interrupt = Interrupt::TIM6_DACUNDER;

/// TIM6 update interrupt at the estimator sample rate.
pub struct SampleTimer {
    tim: Timer<TIM6>,
}

impl SampleTimer {
    /// Configures TIM6 for `sample_period_us`. The counter runs once armed.
    pub fn new(tim6: TIM6, clock_cfg: &Clocks, sample_period_us: u32) -> Self {
        let freq = 1_000_000.0 / sample_period_us as f32;
        let mut timer = Timer::new_tim6(
            tim6,
            freq,
            TimerConfig {
                one_pulse_mode: false,
                update_request_source: UpdateReqSrc::OverUnderFlow,
                auto_reload_preload: true,
                alignment: Alignment::Edge,
                capture_compare_dma: CaptureCompareDma::Update,
                direction: CountDir::Up,
            },
            clock_cfg,
        );
        // Enable update interrupt for the timer
        timer.enable_interrupt(TimerInterrupt::Update);
        NVIC::mask(SAMPLE_IRQ);

        SampleTimer { tim: timer }
    }

    pub fn get_timer(&mut self) -> &mut Timer<TIM6> {
        &mut self.tim
    }

    /// Starts counting from zero and unmasks the vector.
    pub fn arm(&mut self) {
        self.tim.reset_count();
        self.tim.clear_interrupt(TimerInterrupt::Update);
        self.tim.enable();
        unsafe { NVIC::unmask(SAMPLE_IRQ) };
    }

    /// Stops the timer and masks the vector.
    pub fn disarm(&mut self) {
        NVIC::mask(SAMPLE_IRQ);
        self.tim.disable();
    }

    /// Acknowledges the update event, first thing in the handler.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.tim.clear_interrupt(TimerInterrupt::Update);
    }
}
