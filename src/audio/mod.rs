//! Audio wire format, loudness gating and WAV inspection.

pub mod frame;
pub mod gate;
pub mod wav;
