//! Whisper model discovery.

pub mod catalog;
