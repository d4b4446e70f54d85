//! Driver for the Eurotherm 2404 temperature controller.
//!
//! The controller speaks a Modbus RTU style protocol over its serial port
//! (9600 baud, 8 data bits, 1 stop bit, no parity, no termination
//! characters). Registers are 16-bit holding registers addressed per
//! [`Register`].
//!
//! Consecutive operations of the same kind (write or read) are paced by a
//! configurable minimum delay: before each one the driver sleeps for
//! whatever remains of the delay since the previous one. This is cooperative
//! pacing for a slow instrument, not a lock, and gives no hard real-time
//! guarantee.

use std::thread;
use std::time::{Duration, Instant};

use log::trace;

use crate::{
    error::{Error, Result},
    frame::{self, Function, Response},
    registers::{
        MAX_TEMPERATURE_C, MIN_TEMPERATURE_C, Register, Resolution, SETPOINT_COUNT, WorkingMode,
    },
};

/// You can create a Eurotherm2404 using any interface which implements
/// [`embedded_io::Read`] & [`embedded_io::Write`].
///
/// Methods follow the nomenclature that "set" writes a configuration value,
/// "get" reads one back, and "read" fetches a measured value.
pub struct Eurotherm2404<S: embedded_io::Read + embedded_io::Write> {
    interface: S,
    /// Default for the controller is 0x01.
    address: u8,
    write_delay: Duration,
    read_delay: Duration,
    query_delay: Duration,
    last_write: Option<Instant>,
    last_read: Option<Instant>,
}

impl<S: embedded_io::Read + embedded_io::Write> Eurotherm2404<S> {
    /// Create a new driver instance for the device at `address`, with the
    /// default 100 ms write/read/query delays.
    pub fn new(interface: S, address: u8) -> Self {
        Self {
            interface,
            address,
            write_delay: Duration::from_millis(100),
            read_delay: Duration::from_millis(100),
            query_delay: Duration::from_millis(100),
            last_write: None,
            last_read: None,
        }
    }

    /// Override the pacing delays.
    pub fn with_delays(
        mut self,
        write_delay: Duration,
        read_delay: Duration,
        query_delay: Duration,
    ) -> Self {
        self.write_delay = write_delay;
        self.read_delay = read_delay;
        self.query_delay = query_delay;
        self
    }

    /// Return the measured oven temperature in °C.
    pub fn read_process_temperature(&mut self) -> Result<i64, S::Error> {
        self.read_register(Register::ProcessTemperature, 1)
    }

    /// Return the setpoint 1 value in °C.
    pub fn read_setpoint1(&mut self) -> Result<i64, S::Error> {
        self.read_register(Register::Setpoint1, 1)
    }

    /// Return the setpoint 2 value in °C.
    pub fn read_setpoint2(&mut self) -> Result<i64, S::Error> {
        self.read_register(Register::Setpoint2, 1)
    }

    /// Return the current oven output power in %.
    pub fn read_output_power(&mut self) -> Result<i64, S::Error> {
        self.read_register(Register::OutputPower, 1)
    }

    /// Return which setpoint is currently selected (0 is SP1, 1 is SP2).
    pub fn get_selected_setpoint(&mut self) -> Result<u16, S::Error> {
        let value = self.read_register(Register::CurrentlySelectedSetpoint, 1)?;
        u16::try_from(value).map_err(|_| Error::UnexpectedResponse)
    }

    /// Select the active setpoint (0 is SP1, 1 is SP2).
    pub fn select_setpoint(&mut self, slot: u16) -> Result<(), S::Error> {
        if slot >= SETPOINT_COUNT {
            return Err(Error::InvalidRange);
        }
        self.write_register(Register::SelectSetpoint, &[slot as i16])
    }

    /// Set the currently selected setpoint of the oven, in °C.
    pub fn set_selected_setpoint_value(&mut self, celsius: i64) -> Result<(), S::Error> {
        if !(MIN_TEMPERATURE_C..=MAX_TEMPERATURE_C).contains(&celsius) {
            return Err(Error::InvalidRange);
        }
        self.write_register(Register::SelectedSetpointValue, &[celsius as i16])
    }

    /// Switch the controller between automatic and manual working mode.
    pub fn set_automode_enabled(&mut self, enabled: bool) -> Result<(), S::Error> {
        let mode = if enabled {
            WorkingMode::Automatic
        } else {
            WorkingMode::Manual
        };
        self.write_register(Register::Mode, &[mode as i16])
    }

    /// Set the display resolution.
    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<(), S::Error> {
        self.write_register(Register::Resolution, &[resolution as i16])
    }

    /// Switch between factory and user calibration.
    pub fn set_user_calibration_enabled(&mut self, enabled: bool) -> Result<(), S::Error> {
        self.write_register(Register::UserCalibrationEnable, &[enabled as i16])
    }

    /// Test the connection by sending an integer up to 65535 and checking
    /// that the device echoes it back.
    pub fn ping(&mut self, test_data: u16) -> Result<(), S::Error> {
        let request = frame::echo_request(self.address, Some(test_data));
        match self.query(&request)? {
            Response::Echo(got) if got == test_data => Ok(()),
            Response::Echo(got) => Err(Error::EchoMismatch {
                sent: test_data,
                got,
            }),
            _ => Err(Error::UnexpectedResponse),
        }
    }

    /// Read `count` 16-bit registers starting at `register`, interpreted as
    /// one big-endian signed integer.
    pub fn read_register(
        &mut self,
        register: impl Into<u16>,
        count: u16,
    ) -> Result<i64, S::Error> {
        let request = frame::read_request(self.address, register.into(), count);
        match self.query(&request)? {
            Response::Read(value) => Ok(value),
            _ => Err(Error::UnexpectedResponse),
        }
    }

    /// Write `values` to consecutive registers starting at `register`,
    /// checking that the acknowledgment mirrors the request.
    pub fn write_register(
        &mut self,
        register: impl Into<u16>,
        values: &[i16],
    ) -> Result<(), S::Error> {
        let register = register.into();
        let request = frame::write_request(self.address, register, values);
        self.write_frame(&request)?;
        match self.read_response()? {
            Response::WriteAck { register: r, count }
                if r == register && count as usize == values.len() =>
            {
                Ok(())
            }
            _ => Err(Error::UnexpectedResponse),
        }
    }

    /// Write a request and read its response, with the query delay between.
    fn query(&mut self, request: &[u8]) -> Result<Response, S::Error> {
        self.write_frame(request)?;
        thread::sleep(self.query_delay);
        self.read_response()
    }

    fn write_frame(&mut self, request: &[u8]) -> Result<(), S::Error> {
        pace(self.last_write, self.write_delay);
        trace!("writing frame {request:02X?}");
        self.interface.write_all(request).map_err(Error::Serial)?;
        self.interface.flush().map_err(Error::Serial)?;
        self.last_write = Some(Instant::now());
        Ok(())
    }

    /// Read one response frame. How much follows the 2-byte header depends
    /// on the function code: reads carry a length byte, write and echo
    /// acknowledgments are fixed-size, anything else is an exception frame.
    fn read_response(&mut self) -> Result<Response, S::Error> {
        pace(self.last_read, self.read_delay);
        let mut header = [0u8; 2];
        self.read_exact(&mut header)?;
        let mut response = header.to_vec();
        match header[1] {
            f if f == Function::ReadHolding as u8 => {
                let mut length = [0u8; 1];
                self.read_exact(&mut length)?;
                response.push(length[0]);
                let mut rest = vec![0u8; length[0] as usize + 2];
                self.read_exact(&mut rest)?;
                response.extend_from_slice(&rest);
            }
            f if f == Function::WriteMultiple as u8 || f == Function::Echo as u8 => {
                let mut rest = [0u8; 6];
                self.read_exact(&mut rest)?;
                response.extend_from_slice(&rest);
            }
            _ => {
                // Error code plus CRC.
                let mut rest = [0u8; 3];
                self.read_exact(&mut rest)?;
                response.extend_from_slice(&rest);
            }
        }
        trace!("read frame {response:02X?}");
        self.last_read = Some(Instant::now());
        Ok(frame::decode_response(&response)?)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), S::Error> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.interface.read(&mut buf[filled..]) {
                Ok(0) => return Err(Error::UnexpectedEof),
                Ok(n) => filled += n,
                Err(e) => return Err(Error::Serial(e)),
            }
        }
        Ok(())
    }
}

/// Sleep for whatever remains of `delay` since `last`.
fn pace(last: Option<Instant>, delay: Duration) {
    if let Some(last) = last {
        let elapsed = last.elapsed();
        if elapsed < delay {
            thread::sleep(delay - elapsed);
        }
    }
}
