//! Command vocabulary for the Tektronix 371A curve tracer.
//!
//! Each enum knows the argument text it puts on the wire and how to
//! recognise itself in a reply (the instrument echoes the long form,
//! e.g. `POSITIVE` for `POS`).

/// Collector supply peak power settings, in watts.
pub const PEAK_POWER_WATTS: [u16; 4] = [3000, 300, 30, 3];

/// Collector supply output level range, in percent of peak power.
pub const COLLECTOR_SUPPLY_RANGE: (f64, f64) = (0.0, 100.0);

/// Largest addressable display coordinate (0 is the first point).
pub const MAX_COORDINATE: u16 = 1023;

/// Largest dot cursor position (1024 is the end of the curve).
pub const MAX_DOT_POSITION: u16 = 1024;

/// Longest text the CRT readout will accept.
pub const MAX_CRT_TEXT_LEN: usize = 24;

/// Collector supply polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Positive (NPN) operation.
    Positive,
    /// Negative (PNP) operation.
    Negative,
}

impl Polarity {
    pub(crate) fn command_arg(self) -> &'static str {
        match self {
            Polarity::Positive => "POS",
            Polarity::Negative => "NEG",
        }
    }

    pub(crate) fn parse(text: &str) -> Option<Self> {
        match text {
            "POS" | "POSITIVE" | "NPN" => Some(Polarity::Positive),
            "NEG" | "NEGATIVE" | "PNP" => Some(Polarity::Negative),
            _ => None,
        }
    }
}

/// Measurement modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureMode {
    /// Continuous retrigger.
    Repeat,
    /// One measurement per trigger.
    Single,
    /// Single sweep of the step generator.
    Sweep,
    /// Stepped sweep.
    SteppedSweep,
}

impl MeasureMode {
    pub(crate) fn command_arg(self) -> &'static str {
        match self {
            MeasureMode::Repeat => "REP",
            MeasureMode::Single => "SIN",
            MeasureMode::Sweep => "SWE",
            MeasureMode::SteppedSweep => "SSW",
        }
    }

    pub(crate) fn parse(text: &str) -> Option<Self> {
        match text {
            "REP" | "REPEAT" => Some(MeasureMode::Repeat),
            "SIN" | "SINGLE" => Some(MeasureMode::Single),
            "SWE" | "SWEEP" => Some(MeasureMode::Sweep),
            "SSW" | "SSWEEP" => Some(MeasureMode::SteppedSweep),
            _ => None,
        }
    }
}

/// Display storage modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Acquired curves are stored on the display.
    Store,
    /// Live display, nothing stored.
    NonStore,
}

impl StoreMode {
    pub(crate) fn command_arg(self) -> &'static str {
        match self {
            StoreMode::Store => "STO",
            StoreMode::NonStore => "NST",
        }
    }

    pub(crate) fn parse(text: &str) -> Option<Self> {
        match text {
            "STO" | "STORE" => Some(StoreMode::Store),
            "NST" | "NSTORE" => Some(StoreMode::NonStore),
            _ => None,
        }
    }
}

/// Signal sources for the display axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplaySource {
    /// Collector supply.
    Collector,
    /// Step generator (horizontal axis only).
    StepGen,
}

impl DisplaySource {
    pub(crate) fn command_arg(self) -> &'static str {
        match self {
            DisplaySource::Collector => "COLLECT",
            DisplaySource::StepGen => "STPGEN",
        }
    }

    pub(crate) fn parse(text: &str) -> Option<Self> {
        match text {
            "COL" | "COLLECT" => Some(DisplaySource::Collector),
            "STP" | "STPGEN" => Some(DisplaySource::StepGen),
            _ => None,
        }
    }
}

/// Step generator sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSource {
    Voltage,
    Current,
}

impl StepSource {
    pub(crate) fn command_arg(self) -> &'static str {
        match self {
            StepSource::Voltage => "VOLTAGE",
            StepSource::Current => "CURRENT",
        }
    }

    pub(crate) fn parse(text: &str) -> Option<Self> {
        match text {
            "VOL" | "VOLTAGE" => Some(StepSource::Voltage),
            "CUR" | "CURRENT" => Some(StepSource::Current),
            _ => None,
        }
    }
}

/// Cursor placement on the tracer display.
///
/// While the cursor is off, cursor readout queries return nothing. With a
/// single stored point on screen, the instrument only accepts `Dot(1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    Off,
    /// Dot cursor at a position along the curve, 0 to [`MAX_DOT_POSITION`].
    Dot(u16),
    /// Line cursor through a (horizontal, vertical) coordinate.
    Line(u16, u16),
    /// Window cursor spanning two corner coordinates.
    Window { h1: u16, v1: u16, h2: u16, v2: u16 },
}
