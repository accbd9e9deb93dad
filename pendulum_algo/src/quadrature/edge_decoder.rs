// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

/// Sensor channel that produced a rising edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    A,
    B,
}

/// Rotation direction, CCW counts up as in standard angular position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(i8)]
pub enum Direction {
    Ccw = 1,
    Cw = -1,
}

impl Direction {
    /// Position increment for one pulse.
    #[inline(always)]
    pub fn step(self) -> i32 {
        self as i8 as i32
    }

    /// Direction of a net pulse count; zero counts as CCW.
    #[inline(always)]
    pub fn from_net_pulses(pulses: i32) -> Self {
        if pulses < 0 {
            Direction::Cw
        } else {
            Direction::Ccw
        }
    }
}

/// Direction for a rising edge on `channel` given the level of the other channel.
///
/// Single edge resolution: only rising edges are decoded, one count per edge.
#[inline(always)]
pub fn decode(channel: Channel, paired_high: bool) -> Direction {
    match (channel, paired_high) {
        (Channel::A, false) => Direction::Cw,
        (Channel::A, true) => Direction::Ccw,
        (Channel::B, false) => Direction::Ccw,
        (Channel::B, true) => Direction::Cw,
    }
}

/// One step of `direction` from `position`, wrapped into `[0, pulses_per_rotation)`.
#[inline(always)]
pub fn wrap_step(position: u16, direction: Direction, pulses_per_rotation: u16) -> u16 {
    let next = position as i32 + direction.step();
    if next < 0 {
        pulses_per_rotation - 1
    } else if next >= pulses_per_rotation as i32 {
        0
    } else {
        next as u16
    }
}
