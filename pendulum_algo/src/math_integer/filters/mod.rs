pub mod speed_lpf;
