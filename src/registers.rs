//! Register map for the Eurotherm 2404 temperature controller.

use strum_macros::EnumIter;

/// Holding registers exposed by the controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter)]
#[repr(u16)]
pub enum Register {
    /// __R__ - Current oven temperature in °C.
    ProcessTemperature = 0x01,
    /// __W__ - Target value for the currently selected setpoint, in °C.
    SelectedSetpointValue = 0x02,
    /// __R__ - Current oven output power in %.
    OutputPower = 0x03,
    /// __W__ - Setpoint selection. `0` selects SP1, `1` selects SP2.
    SelectSetpoint = 0x0F,
    /// __R__ - Setpoint 1 value in °C.
    Setpoint1 = 0x18,
    /// __R__ - Setpoint 2 value in °C.
    Setpoint2 = 0x19,
    /// __R/W__ - User calibration enable. `0` is factory calibration.
    UserCalibrationEnable = 0x6E,
    /// __W__ - Working mode. See [`WorkingMode`].
    Mode = 0x0111,
    /// __R__ - Index of the currently selected setpoint.
    CurrentlySelectedSetpoint = 0x0123,
    /// __W__ - Display resolution. See [`Resolution`].
    Resolution = 0x3106,
}

impl From<Register> for u16 {
    fn from(value: Register) -> Self {
        value as u16
    }
}

/// Oven ratings.
pub const MIN_TEMPERATURE_C: i64 = 0;
pub const MAX_TEMPERATURE_C: i64 = 500;
pub const MIN_OUTPUT_POWER: i64 = 0;
pub const MAX_OUTPUT_POWER: i64 = 100;

/// Standard controllers only carry two setpoints.
pub const SETPOINT_COUNT: u16 = 2;

/// Working modes of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum WorkingMode {
    /// Closed-loop temperature regulation.
    Automatic = 0,
    /// Output power driven directly by the operator.
    Manual = 1,
}

/// Display resolution modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Resolution {
    /// Full (fractional degree) resolution.
    Full = 0,
    /// Whole degrees only.
    Integer = 1,
}
