//! Parser for the curve tracer's ASCII waveform preamble.
//!
//! The preamble is the tracer's answer to `WFMpre?` and carries everything
//! needed to interpret, scale and label the binary curve data that follows
//! it. Label/value pairs are separated by commas and linked by colons; the
//! leading `WFID:` field is a slash-delimited sub-string of tracer-specific
//! parameters. A complete preamble looks like:
//!
//! ```text
//! WFMPRE WFID:"INDEX 3/VERT 500MA/HORIZ 1V/STEP 5V/OFFSET 0.00V/BGM 100mS/VCS 12.3/TEXT /HSNS VCE",
//! ENCDG:BIN,NR.PT:3,PT.FMT:XY,XMULT:+1.0E-2,XZERO:0,XOFF:12,XUNIT:V,YMULT:+5.0E-3,YZERO:0,YOFF:12,
//! YUNIT:A,BYT/NR:2,BN.FMT:RP,BIT/NR:10,CRVCHK:CHKSMO,LN.FMT:DOT
//! ```

use crate::error::PreambleError;

/// Fixed resolution of the tracer display, in points per axis.
pub const RESOLUTION_POINTS: u32 = 1024;

// Positions of the variable fields in the comma-separated preamble.
const NR_PT_FIELD: usize = 2;
const XMULT_FIELD: usize = 4;
const XOFF_FIELD: usize = 6;
const XUNIT_FIELD: usize = 7;
const YMULT_FIELD: usize = 8;
const YOFF_FIELD: usize = 10;
const YUNIT_FIELD: usize = 11;

// Positions of the step parameters in the slash-separated WFID sub-string.
const STEP_SIZE_SEGMENT: usize = 3;
const STEP_OFFSET_SEGMENT: usize = 4;

/// Scaling and labelling information for one curve, parsed once from the
/// instrument's preamble reply. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformPreamble {
    /// Number of (x, y) samples in the curve payload.
    pub sample_count: usize,
    pub x_scale_factor: f64,
    pub y_scale_factor: f64,
    pub horizontal_offset: i64,
    pub vertical_offset: i64,
    pub horizontal_units: String,
    pub vertical_units: String,
    /// Scale factor times the display resolution.
    pub horizontal_range: f64,
    pub vertical_range: f64,
    /// Step generator step size, in volts.
    pub step_size: f64,
    /// Step generator offset, in volts.
    pub step_offset: f64,
}

impl WaveformPreamble {
    /// Parse a preamble string as returned by the instrument.
    ///
    /// Malformed fields (missing colon, non-numeric value) are errors; there
    /// are no silent defaults. Parsing the same string twice yields
    /// field-equal records.
    pub fn parse(preamble: &str) -> Result<Self, PreambleError> {
        let fields: Vec<&str> = preamble.split(',').collect();
        let wf_id: Vec<&str> = field(&fields, 0)?.split('/').collect();

        let sample_count = uint_field(&fields, NR_PT_FIELD)?;
        let x_scale_factor = float_field(&fields, XMULT_FIELD)?;
        let y_scale_factor = float_field(&fields, YMULT_FIELD)?;
        let horizontal_offset = int_field(&fields, XOFF_FIELD)?;
        let vertical_offset = int_field(&fields, YOFF_FIELD)?;
        let horizontal_units = value_of(&fields, XUNIT_FIELD)?;
        let vertical_units = value_of(&fields, YUNIT_FIELD)?;

        let step_size = step_value(&wf_id, STEP_SIZE_SEGMENT, "STEP")?;
        let step_offset = step_value(&wf_id, STEP_OFFSET_SEGMENT, "OFFSET")?;

        Ok(Self {
            sample_count,
            x_scale_factor,
            y_scale_factor,
            horizontal_offset,
            vertical_offset,
            horizontal_units,
            vertical_units,
            horizontal_range: x_scale_factor * f64::from(RESOLUTION_POINTS),
            vertical_range: y_scale_factor * f64::from(RESOLUTION_POINTS),
            step_size,
            step_offset,
        })
    }
}

fn field<'a>(fields: &[&'a str], index: usize) -> Result<&'a str, PreambleError> {
    fields
        .get(index)
        .copied()
        .ok_or(PreambleError::MissingField(index))
}

/// The value after the label colon, with embedded spaces removed.
fn value_of(fields: &[&str], index: usize) -> Result<String, PreambleError> {
    let field = field(fields, index)?;
    let (_, value) = field
        .split_once(':')
        .ok_or(PreambleError::MissingValue(index))?;
    Ok(value.replace(' ', ""))
}

fn uint_field(fields: &[&str], index: usize) -> Result<usize, PreambleError> {
    let value = value_of(fields, index)?;
    value
        .parse()
        .map_err(|_| PreambleError::InvalidNumber {
            field: index,
            value,
        })
}

fn int_field(fields: &[&str], index: usize) -> Result<i64, PreambleError> {
    let value = value_of(fields, index)?;
    value
        .parse()
        .map_err(|_| PreambleError::InvalidNumber {
            field: index,
            value,
        })
}

fn float_field(fields: &[&str], index: usize) -> Result<f64, PreambleError> {
    let value = value_of(fields, index)?;
    value
        .parse()
        .map_err(|_| PreambleError::InvalidNumber {
            field: index,
            value,
        })
}

/// Parse a WFID step parameter such as `STEP 5V` or `OFFSET 250mV` into
/// volts.
fn step_value(wf_id: &[&str], index: usize, prefix: &str) -> Result<f64, PreambleError> {
    let segment = wf_id
        .get(index)
        .copied()
        .ok_or(PreambleError::MissingSegment(index))?;
    let text = segment
        .strip_prefix(prefix)
        .unwrap_or(segment)
        .trim_start_matches(' ');

    let (number, factor) = if let Some(number) = text.strip_suffix("mV") {
        (number, 1E-3)
    } else if let Some(number) = text.strip_suffix('V') {
        (number, 1.0)
    } else {
        return Err(PreambleError::UnknownUnit(text.to_string()));
    };

    let volts: f64 = number.parse().map_err(|_| PreambleError::InvalidNumber {
        field: index,
        value: number.to_string(),
    })?;
    Ok(volts * factor)
}
