// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use hal::{
    clocks::Clocks,
    pac::TIM2,
    timer::{Alignment, CaptureCompareDma, CountDir, Timer, TimerConfig, UpdateReqSrc},
};

use pendulum_algo::MicrosClock;

/// Ticks per second of the counter.
const COUNTER_HZ: u32 = 1_000_000;

/// TIM2 running free at 1 MHz over its full 32 bit range.
pub struct MicrosCounter {
    tim: Timer<TIM2>,
}

impl MicrosCounter {
    pub fn new(tim2: TIM2, clock_cfg: &Clocks) -> Self {
        let mut timer = Timer::new_tim2(
            tim2,
            1.0,
            TimerConfig {
                one_pulse_mode: false,
                update_request_source: UpdateReqSrc::OverUnderFlow,
                auto_reload_preload: false,
                alignment: Alignment::Edge,
                capture_compare_dma: CaptureCompareDma::Update,
                direction: CountDir::Up,
            },
            clock_cfg,
        );

        // 1 us per count, wrap after u32::MAX
        let psc = clock_cfg.apb1_timer() / COUNTER_HZ - 1;
        timer.set_prescaler(psc as u16);
        timer.set_auto_reload(u32::MAX);
        timer.reinitialize();
        timer.enable();

        MicrosCounter { tim: timer }
    }

    pub fn get_timer(&mut self) -> &mut Timer<TIM2> {
        &mut self.tim
    }
}

impl MicrosClock for MicrosCounter {
    #[inline(always)]
    fn now_us(&self) -> u32 {
        self.tim.read_count()
    }
}
