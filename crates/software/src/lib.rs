//! This crate contains architecture-agnostic logic for a device which lets a three-voice sound chip be played from
//! modern music equipment by translating [MIDI](https://midi.org/midi-1-0) messages into control signals.
//!
//! At its heart is a fixed-capacity, insertion-ordered [`Deque`](collections::Deque) of held notes, which lives
//! entirely in statically sized storage so that it can run without an allocator.

#![deny(missing_docs)]
#![cfg_attr(not(test), no_std)]

// must come first so the logging macros are visible to the modules below
mod fmt;

pub mod collections;

pub mod configuration;

/// Data structures for tracking MIDI messages the device has received.
pub mod midi_state;
