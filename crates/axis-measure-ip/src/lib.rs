//! Register model for the AXIS measurement IP block.
//!
//! This crate has **no dependencies** and **no hardware access**. It is a
//! pure model of the IP: register offsets, control codes, and the layout of
//! the captured last-frame window.
//!
//! The IP sits on an AXI4-Stream bus and counts, per clock cycle, whether a
//! beat was transferred (`TVALID && TREADY`, an "assertion"). It exposes the
//! counters through an AXI4-Lite slave.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`regs`] | Register offsets, 64-bit counter layout, control codes |
//! | [`frame`] | Last-frame window: word count and word offsets |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod frame;
pub mod regs;

pub use regs::{ControlCode, ControlState, Counter};
