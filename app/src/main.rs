// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

#![no_main]
#![no_std]

use defmt_rtt as _;
use panic_probe as _;

use hal::{self, clocks::Clocks, pac};

use pendulum_algo::{Channel, EncoderConfig, PendulumAngle, QuadratureEncoder};

use cortex_m;

/// Pulses per rotation of the pendulum encoder (200 line disc, rising edges of A and B).
const PULSES_PER_ROTATION: u16 = 400;

/// Core cycles between two telemetry prints, about 10 Hz at 170 MHz.
const REPORT_CYCLES: u32 = 17_000_000;

#[rtic::app(device = pac, peripherals = true)]
mod app {
    use super::*;

    use pendulum_drivers::*;

    #[shared]
    struct Shared {
        encoder: QuadratureEncoder<MicrosCounter>,
        inputs: QuadratureInputs,
    }

    #[local]
    struct Local {
        sample_timer: SampleTimer,
        angle: PendulumAngle,
    }

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local) {
        let dp = ctx.device;
        let clock_cfg = Clocks::default();
        clock_cfg.setup().unwrap();

        let sysclk_freq = clock_cfg.sysclk(); // System clock frequency in Hz
        defmt::debug!("SYSTEM: Clock frequency is {} MHz", sysclk_freq / 1000000);

        let config = EncoderConfig::new(PULSES_PER_ROTATION);
        let micros = MicrosCounter::new(dp.TIM2, &clock_cfg);

        let mut encoder = match QuadratureEncoder::new(config, micros) {
            Ok(encoder) => encoder,
            Err(e) => defmt::panic!("ENCODER: {}", e),
        };
        let angle = match PendulumAngle::new(PULSES_PER_ROTATION) {
            Ok(angle) => angle,
            Err(e) => defmt::panic!("ENCODER: {}", e),
        };

        // Encoder state first, interrupt sources after. The firmware runs until reset
        // and never disarms them.
        encoder.begin();

        let mut inputs = QuadratureInputs::new();
        let mut sample_timer = SampleTimer::new(dp.TIM6, &clock_cfg, config.sample_period_us);
        inputs.arm();
        sample_timer.arm();

        defmt::info!("SYSTEM: sample clock at {} Hz", config.sample_freq_hz());

        (
            Shared { encoder, inputs },
            Local {
                sample_timer,
                angle,
            },
        )
    }

    #[idle(shared = [encoder], local = [angle])]
    fn idle(mut cx: idle::Context) -> ! {
        loop {
            cortex_m::asm::delay(REPORT_CYCLES);

            // Copy out in one lock so position and velocity belong together
            let snap = cx.shared.encoder.lock(|enc| enc.snapshot());
            let (deg, deg_s) = cx.local.angle.from_snapshot_deg(&snap);

            defmt::info!(
                "ENCODER: pos={} vel={}pps fast={} | {}deg {}deg/s",
                snap.position,
                snap.velocity,
                snap.fast_mode,
                deg,
                deg_s
            );
        }
    }

    #[task(binds = EXTI0, shared = [encoder, inputs], priority = 2)]
    fn enc_a_edge(cx: enc_a_edge::Context) {
        (cx.shared.encoder, cx.shared.inputs).lock(|encoder, inputs| {
            inputs.clear(Channel::A);
            encoder.on_edge(Channel::A, inputs.paired_high(Channel::A));
        });
    }

    #[task(binds = EXTI1, shared = [encoder, inputs], priority = 2)]
    fn enc_b_edge(cx: enc_b_edge::Context) {
        (cx.shared.encoder, cx.shared.inputs).lock(|encoder, inputs| {
            inputs.clear(Channel::B);
            encoder.on_edge(Channel::B, inputs.paired_high(Channel::B));
        });
    }

    #[task(binds = TIM6_DACUNDER, shared = [encoder], local = [sample_timer], priority = 2)]
    fn sample_tick(mut cx: sample_tick::Context) {
        // Clear the update interrupt flag
        cx.local.sample_timer.clear();
        cx.shared.encoder.lock(|encoder| encoder.on_sample_tick());
    }
}

#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}
