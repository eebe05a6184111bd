//! Cepstra CLI library.
//!
//! This crate provides the core functionality for the `cepstra` binary:
//! WAV input and output, pipeline configuration, and the `analyze`, `pitch`
//! and `synth` commands.

pub mod audio_io;
pub mod commands;
pub mod config;
