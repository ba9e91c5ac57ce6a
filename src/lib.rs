//! emupad: a polymorphic model of emulated game-controller input.
//!
//! Heterogeneous host-input signals are normalized into calibrated logical
//! state by typed control groups, and an extension encoder serializes that
//! state into the byte-exact register frame of the real peripheral so the
//! emulated I/O bus cannot tell emulated from physical hardware.
//!
//! Device enumeration, binding-expression parsing and the bus emulation
//! itself are external collaborators behind the [`controller::InputSource`]
//! and [`extension::Extension`] seams.

pub mod controller;
pub mod extension;
pub mod persistence;
