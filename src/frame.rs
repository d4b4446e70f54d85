//! Framing for the Eurotherm 2404's Modbus RTU style serial protocol.
//!
//! Requests and responses share the same layout: a 1-byte device address, a
//! 1-byte function code, a 16-bit big-endian register address, a
//! function-specific payload, and a CRC16 over everything before it
//! (low byte first on the wire).
//!
//! Everything in this module is pure. The driver in [`crate::eurotherm`] is
//! responsible for moving bytes over the transport.

use strum_macros::EnumIter;

use crate::error::{DeviceError, FrameError};

/// Function codes understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
#[repr(u8)]
pub enum Function {
    /// Read holding registers.
    ReadHolding = 0x03,
    /// Write a single register. Present in the protocol but unused by this
    /// driver, which always writes through [`Function::WriteMultiple`].
    WriteSingle = 0x06,
    /// Loopback test. The register address must be zero.
    Echo = 0x08,
    /// Write multiple registers.
    WriteMultiple = 0x10,
}

impl TryFrom<u8> for Function {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x03 => Ok(Function::ReadHolding),
            0x06 => Ok(Function::WriteSingle),
            0x08 => Ok(Function::Echo),
            0x10 => Ok(Function::WriteMultiple),
            other => Err(other),
        }
    }
}

/// A decoded response frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Register contents, interpreted as a big-endian signed integer.
    Read(i64),
    /// Acknowledgment of a multi-register write.
    WriteAck { register: u16, count: u16 },
    /// Echoed test data, as an unsigned big-endian integer.
    Echo(u16),
}

/// Modbus CRC16 of `data`: init `0xFFFF`, polynomial `0xA001` (reflected),
/// LSB-first bit loop. Returned low byte first, ready to append to a frame.
pub fn crc16(data: &[u8]) -> [u8; 2] {
    let mut crc: u16 = 0xFFFF;
    for &octet in data {
        crc ^= octet as u16;
        for _ in 0..8 {
            let lsb = crc & 0x1;
            crc >>= 1;
            if lsb != 0 {
                crc ^= 0xA001;
            }
        }
    }
    [(crc & 0xFF) as u8, (crc >> 8) as u8]
}

/// Build a request to read `count` 16-bit registers starting at `register`.
pub fn read_request(device: u8, register: u16, count: u16) -> Vec<u8> {
    let mut frame = vec![device, Function::ReadHolding as u8];
    frame.extend_from_slice(&register.to_be_bytes());
    frame.extend_from_slice(&count.to_be_bytes());
    append_crc(frame)
}

/// Build a request to write `values` to consecutive registers starting at
/// `register`. Each value is sent as a signed 16-bit big-endian integer.
pub fn write_request(device: u8, register: u16, values: &[i16]) -> Vec<u8> {
    let mut frame = vec![device, Function::WriteMultiple as u8];
    frame.extend_from_slice(&register.to_be_bytes());
    let elements = values.len() as u16;
    frame.extend_from_slice(&elements.to_be_bytes());
    frame.push((elements * 2) as u8);
    for value in values {
        frame.extend_from_slice(&value.to_be_bytes());
    }
    append_crc(frame)
}

/// Build a loopback request, optionally carrying 2 bytes of test data.
pub fn echo_request(device: u8, test_data: Option<u16>) -> Vec<u8> {
    // The echo function requires a zero register address.
    let mut frame = vec![device, Function::Echo as u8, 0x00, 0x00];
    if let Some(data) = test_data {
        frame.extend_from_slice(&data.to_be_bytes());
    }
    append_crc(frame)
}

fn append_crc(mut frame: Vec<u8>) -> Vec<u8> {
    let crc = crc16(&frame);
    frame.extend_from_slice(&crc);
    frame
}

/// Decode a complete response frame.
///
/// Exception frames (function code with the high bit set) carry an error
/// code which the controller does not CRC-protect consistently; the code is
/// taken as-is, matching the instrument's observed behaviour.
pub fn decode_response(frame: &[u8]) -> Result<Response, FrameError> {
    if frame.len() < 5 {
        return Err(FrameError::Truncated);
    }
    let function = frame[1];
    match Function::try_from(function) {
        Ok(Function::ReadHolding) => {
            let length = frame[2] as usize;
            if frame.len() < 3 + length + 2 {
                return Err(FrameError::Truncated);
            }
            let (covered, crc) = frame.split_at(3 + length);
            verify_crc(covered, crc)?;
            decode_signed(&covered[3..]).map(Response::Read)
        }
        Ok(Function::WriteMultiple) => {
            if frame.len() < 8 {
                return Err(FrameError::Truncated);
            }
            verify_crc(&frame[..6], &frame[6..8])?;
            Ok(Response::WriteAck {
                register: u16::from_be_bytes([frame[2], frame[3]]),
                count: u16::from_be_bytes([frame[4], frame[5]]),
            })
        }
        Ok(Function::Echo) => {
            if frame.len() < 8 {
                return Err(FrameError::Truncated);
            }
            verify_crc(&frame[..6], &frame[6..8])?;
            Ok(Response::Echo(u16::from_be_bytes([frame[4], frame[5]])))
        }
        Err(_) if function & 0x80 != 0 => match frame[2] {
            0x02 => Err(FrameError::Device(DeviceError::BadAddress)),
            0x03 => Err(FrameError::Device(DeviceError::BadData)),
            0x04 => Err(FrameError::Device(DeviceError::Operation)),
            _ => Err(FrameError::UnknownDeviceError {
                raw: frame.to_vec(),
            }),
        },
        _ => Err(FrameError::UnknownFunction {
            function,
            raw: frame.to_vec(),
        }),
    }
}

/// Interpret `data` as a big-endian signed integer of 1 to 8 bytes.
fn decode_signed(data: &[u8]) -> Result<i64, FrameError> {
    if data.is_empty() || data.len() > 8 {
        return Err(FrameError::BadDataLength(data.len()));
    }
    let mut value = (data[0] as i8) as i64;
    for &byte in &data[1..] {
        value = (value << 8) | byte as i64;
    }
    Ok(value)
}

fn verify_crc(covered: &[u8], received: &[u8]) -> Result<(), FrameError> {
    if crc16(covered) != [received[0], received[1]] {
        return Err(FrameError::ChecksumMismatch);
    }
    Ok(())
}
