//! This crate provides drivers for the two instruments of a transistor
//! curve-tracing bench: a Eurotherm 2404 temperature controller (for the
//! oven holding the device under test) and a Tektronix 371A high-power
//! curve tracer.
//!
//! The Eurotherm speaks Modbus RTU; the Tektronix speaks its own
//! line-oriented ASCII command set with a binary curve transfer. Both
//! drivers work over anything implementing [`embedded_io::Read`] and
//! [`embedded_io::Write`], so they are equally at home on a desktop serial
//! port or a bridge of your own.
//!
//! The serial port used for Eurotherm comms should be configured like so:
//! * Baud rate: 9600
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//!
//! Both instruments are slow; the drivers pace consecutive operations with
//! configurable delays so back-to-back calls do not overrun them.

pub mod curve;
pub mod error;
pub mod eurotherm;
pub mod frame;
pub mod preamble;
pub mod registers;
pub mod tek371a;
pub mod types;

#[cfg(test)]
mod mock_serial;
