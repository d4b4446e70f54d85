//! Driver for the Tektronix 371A curve tracer.
//!
//! The instrument speaks a line-oriented ASCII command set: commands are
//! terminated with `\n`, queries end in `?`, and replies echo the command
//! label (`PKPOWER 300`). The one exception is the curve transfer, where
//! `CURve?` is answered with a fixed-size binary block decoded by
//! [`Curve`].
//!
//! The instrument needs time between commands; consecutive writes are paced
//! by a configurable delay and queries wait a further delay before reading
//! the reply.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use embedded_io::Error as _;
use log::{debug, info};

use crate::curve::Curve;
use crate::error::{Error, Result};
use crate::preamble::WaveformPreamble;
use crate::types::{
    COLLECTOR_SUPPLY_RANGE, CursorMode, DisplaySource, MAX_COORDINATE, MAX_CRT_TEXT_LEN,
    MAX_DOT_POSITION, MeasureMode, PEAK_POWER_WATTS, Polarity, StepSource, StoreMode,
};

/// Shared flag set by a service-request callback and consumed by
/// [`Tektronix371A::wait_for_srq`].
#[derive(Clone, Debug, Default)]
pub struct SrqFlag(Arc<AtomicBool>);

impl SrqFlag {
    /// Mark the service request as received. Safe to call from any thread.
    pub fn signal(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// Step generator settings as reported by `STPgen?`.
#[derive(Debug, Clone, PartialEq)]
pub struct StepGenStatus {
    pub output: bool,
    pub number_steps: u16,
    /// Step size multiplier, used together with `invert` for the offset.
    pub multiplier: f64,
    pub invert: bool,
    pub source: StepSource,
    /// Step size, in volts or amps per step depending on `source`.
    pub step_size: f64,
}

/// You can create a Tektronix371A using any interface which implements
/// [`embedded_io::Read`] & [`embedded_io::Write`].
pub struct Tektronix371A<S: embedded_io::Read + embedded_io::Write> {
    interface: S,
    write_delay: Duration,
    query_delay: Duration,
    last_write: Option<Instant>,
    srq_flag: SrqFlag,
}

impl<S: embedded_io::Read + embedded_io::Write> Tektronix371A<S> {
    /// Create a new driver instance with the default 400 ms write delay and
    /// 100 ms query delay.
    pub fn new(interface: S) -> Self {
        Self {
            interface,
            write_delay: Duration::from_millis(400),
            query_delay: Duration::from_millis(100),
            last_write: None,
            srq_flag: SrqFlag::default(),
        }
    }

    /// Override the pacing delays.
    pub fn with_delays(mut self, write_delay: Duration, query_delay: Duration) -> Self {
        self.write_delay = write_delay;
        self.query_delay = query_delay;
        self
    }

    /// Return the identification of the instrument.
    pub fn id(&mut self) -> Result<String, S::Error> {
        self.query("ID?")
    }

    /// Return the list of valid commands for the instrument.
    pub fn help(&mut self) -> Result<String, S::Error> {
        self.query("HELp?")
    }

    /// Return the actual front-panel settings of the instrument.
    pub fn front_panel_settings(&mut self) -> Result<String, S::Error> {
        self.query("SET?")
    }

    /// Initialize the instrument. Settings are the same as at power-up.
    pub fn initialize(&mut self) -> Result<(), S::Error> {
        info!("initializing the instrument");
        self.write_command("INIt")
    }

    // ------------------------------------------------------------------
    // Collector supply
    // ------------------------------------------------------------------

    /// Return the HIGH VOLTAGE and HIGH CURRENT breaker status.
    pub fn cs_breakers(&mut self) -> Result<String, S::Error> {
        self.query("CSOut?")
    }

    /// Set the collector supply polarity.
    pub fn set_cs_polarity(&mut self, polarity: Polarity) -> Result<(), S::Error> {
        self.write_command(&format!("CSPol {}", polarity.command_arg()))
    }

    /// Get the collector supply polarity.
    pub fn get_cs_polarity(&mut self) -> Result<Polarity, S::Error> {
        let reply = self.query("CSPol?")?;
        Polarity::parse(&strip_label(&reply, "CSPOL")).ok_or(Error::BadReply(reply))
    }

    /// Set the collector supply peak power, in watts. Only the values in
    /// [`PEAK_POWER_WATTS`] are accepted.
    pub fn set_cs_peak_power(&mut self, watts: u16) -> Result<(), S::Error> {
        if !PEAK_POWER_WATTS.contains(&watts) {
            return Err(Error::InvalidRange);
        }
        self.write_command(&format!("PKPower {watts}"))
    }

    /// Get the collector supply peak power setting, in watts.
    pub fn get_cs_peak_power(&mut self) -> Result<f64, S::Error> {
        let reply = self.query("PKPower?")?;
        parse_float(&strip_label(&reply, "PKPOWER"), &reply)
    }

    /// Set the collector supply output level, from 0.0 % to 100.0 % of peak
    /// power in increments of 0.1 %.
    pub fn set_cs_collector_supply(&mut self, percent: f64) -> Result<(), S::Error> {
        let (min, max) = COLLECTOR_SUPPLY_RANGE;
        if !(min..=max).contains(&percent) {
            return Err(Error::InvalidRange);
        }
        self.write_command(&format!("VCSpply {percent:.1}"))
    }

    /// Get the collector supply output level, in percent of peak power.
    pub fn get_cs_collector_supply(&mut self) -> Result<f64, S::Error> {
        let reply = self.query("VCSpply?")?;
        parse_float(&strip_label(&reply, "VCSPPLY"), &reply)
    }

    // ------------------------------------------------------------------
    // Display
    // ------------------------------------------------------------------

    /// Set the store mode of the display.
    pub fn set_display_store_mode(&mut self, mode: StoreMode) -> Result<(), S::Error> {
        self.write_command(&format!("DISplay {}", mode.command_arg()))
    }

    /// Get the store mode of the display.
    pub fn get_display_store_mode(&mut self) -> Result<StoreMode, S::Error> {
        // The display reply lists several settings; store mode is the third.
        let reply = self.query("DISplay?")?;
        let field = reply
            .split(',')
            .nth(2)
            .ok_or_else(|| Error::BadReply(reply.clone()))?;
        let value = field.rsplit(':').next().unwrap_or(field).trim();
        StoreMode::parse(value).ok_or(Error::BadReply(reply))
    }

    /// Set the horizontal axis source and its sensitivity in volts/div.
    pub fn set_display_horizontal(
        &mut self,
        source: DisplaySource,
        sensitivity: f64,
    ) -> Result<(), S::Error> {
        self.write_command(&format!("HORiz {}:{sensitivity}", source.command_arg()))
    }

    /// Get the horizontal axis source and sensitivity.
    pub fn get_display_horizontal(&mut self) -> Result<(DisplaySource, f64), S::Error> {
        let reply = self.query("HORiz?")?;
        parse_source_sensitivity(&strip_label(&reply, "HORIZ"), &reply)
    }

    /// Set the vertical axis source and its sensitivity in amps/div. Only
    /// the collector supply can drive the vertical axis.
    pub fn set_display_vertical(
        &mut self,
        source: DisplaySource,
        sensitivity: f64,
    ) -> Result<(), S::Error> {
        self.write_command(&format!("VERt {}:{sensitivity}", source.command_arg()))
    }

    /// Get the vertical axis source and sensitivity.
    pub fn get_display_vertical(&mut self) -> Result<(DisplaySource, f64), S::Error> {
        let reply = self.query("VERt?")?;
        parse_source_sensitivity(&strip_label(&reply, "VERT"), &reply)
    }

    // ------------------------------------------------------------------
    // Step generator
    // ------------------------------------------------------------------

    /// Return the step generator settings.
    ///
    /// The positional reply is only complete while the step generator
    /// output is enabled.
    pub fn get_stepgen(&mut self) -> Result<StepGenStatus, S::Error> {
        let reply = self.query("STPgen?")?;
        parse_stepgen(&reply).ok_or(Error::BadReply(reply))
    }

    /// Enable or disable the step generator output.
    ///
    /// Enabling the output (even when already enabled) makes the instrument
    /// re-evaluate the other step generator parameters.
    pub fn set_stepgen_output(&mut self, enabled: bool) -> Result<(), S::Error> {
        self.write_command(&format!("STPgen OUT:{}", on_off(enabled)))
    }

    /// Set the number of steps, 0 to 5.
    pub fn set_stepgen_number_steps(&mut self, steps: u16) -> Result<(), S::Error> {
        if steps > 5 {
            return Err(Error::InvalidRange);
        }
        self.write_command(&format!("STPgen NUMber:{steps}"))
    }

    /// Invert the step generator polarity.
    pub fn set_stepgen_invert(&mut self, invert: bool) -> Result<(), S::Error> {
        self.write_command(&format!("STPgen INVert:{}", on_off(invert)))
    }

    /// Set the step size multiplier (the instrument calls this the offset).
    pub fn set_stepgen_multiplier(&mut self, multiplier: f64) -> Result<(), S::Error> {
        self.write_command(&format!("STPgen OFFset:{multiplier}"))
    }

    /// Set the step generator source and step size (volts or amps per step).
    pub fn set_stepgen_source_and_size(
        &mut self,
        source: StepSource,
        size: f64,
    ) -> Result<(), S::Error> {
        self.write_command(&format!("STPgen {}:{size}", source.command_arg()))
    }

    /// Effective step generator offset: multiplier times step size, negated
    /// when the generator is inverted.
    pub fn get_stepgen_offset(&mut self) -> Result<f64, S::Error> {
        let status = self.get_stepgen()?;
        let offset = status.multiplier * status.step_size;
        Ok(if status.invert { -offset } else { offset })
    }

    /// Configure the step generator offset by adjusting the multiplier and
    /// invert parameters.
    ///
    /// The instrument only honours increments of 10 % of the step size;
    /// other values have no effect on the output.
    pub fn set_stepgen_offset(&mut self, offset: f64) -> Result<(), S::Error> {
        let status = self.get_stepgen()?;
        let multiplier = offset.abs() / status.step_size;
        self.set_stepgen_multiplier(multiplier)?;
        let invert = offset < 0.0;
        if invert != status.invert {
            self.set_stepgen_invert(invert)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cursor and CRT readout
    // ------------------------------------------------------------------

    /// Place the display cursor.
    pub fn set_cursor_mode(&mut self, mode: CursorMode) -> Result<(), S::Error> {
        match mode {
            CursorMode::Off => self.write_command("CURSor OFF"),
            CursorMode::Dot(position) => {
                if position > MAX_DOT_POSITION {
                    return Err(Error::InvalidRange);
                }
                self.write_command(&format!("DOT {position}"))
            }
            CursorMode::Line(h, v) => {
                if h > MAX_COORDINATE || v > MAX_COORDINATE {
                    return Err(Error::InvalidRange);
                }
                self.write_command(&format!("LINe {h},{v}"))
            }
            CursorMode::Window { h1, v1, h2, v2 } => {
                if [h1, v1, h2, v2].iter().any(|&c| c > MAX_COORDINATE) {
                    return Err(Error::InvalidRange);
                }
                self.write_command(&format!("WINdow {h1},{v1},{h2},{v2}"))
            }
        }
    }

    /// Return the dot cursor position.
    pub fn get_cursor_dot(&mut self) -> Result<f64, S::Error> {
        let reply = self.query("DOT?")?;
        parse_float(&strip_label(&reply, "DOT"), &reply)
    }

    /// Return the horizontal and vertical values under the cursor, in
    /// scientific notation.
    pub fn readout(&mut self) -> Result<(f64, f64), S::Error> {
        let reply = self.query("REAdout? SCientific")?;
        let (h, v) = reply
            .split_once(',')
            .ok_or_else(|| Error::BadReply(reply.clone()))?;
        let h = parse_float(&strip_label(h, "READOUT"), &reply)?;
        let v = parse_float(v.trim(), &reply)?;
        Ok((h, v))
    }

    /// Write a text on the display. No more than 24 characters is possible.
    pub fn set_crt_text(&mut self, text: &str) -> Result<(), S::Error> {
        if text.len() > MAX_CRT_TEXT_LEN {
            return Err(Error::InvalidRange);
        }
        self.write_command(&format!("TEXt \"{text}\""))
    }

    /// Return the text currently on the display.
    pub fn get_crt_text(&mut self) -> Result<String, S::Error> {
        self.query("TEXt?")
    }

    // ------------------------------------------------------------------
    // Measurement and status
    // ------------------------------------------------------------------

    /// Set the measurement mode.
    pub fn set_measure_mode(&mut self, mode: MeasureMode) -> Result<(), S::Error> {
        self.write_command(&format!("MEAsure {}", mode.command_arg()))
    }

    /// Get the measurement mode.
    pub fn get_measure_mode(&mut self) -> Result<MeasureMode, S::Error> {
        let reply = self.query("MEAsure?")?;
        MeasureMode::parse(&strip_label(&reply, "MEASURE")).ok_or(Error::BadReply(reply))
    }

    /// Return the event code of the most recent event.
    pub fn most_recent_event_code(&mut self) -> Result<String, S::Error> {
        self.query("EVEnt?")
    }

    /// Enable or disable the operation-complete service request.
    pub fn set_opc_enabled(&mut self, enabled: bool) -> Result<(), S::Error> {
        self.write_command(&format!("OPC {}", on_off(enabled)))
    }

    /// Enable or disable assertion of service requests.
    pub fn set_srq_enabled(&mut self, enabled: bool) -> Result<(), S::Error> {
        self.write_command(&format!("RQS {}", on_off(enabled)))
    }

    /// Configure the instrument to assert a service request on operation
    /// complete. Wire the flag from [`Self::srq_flag`] into the transport's
    /// event callback to be notified.
    pub fn enable_srq_on_opc(&mut self) -> Result<(), S::Error> {
        self.set_srq_enabled(true)?;
        self.set_opc_enabled(true)
    }

    /// Handle for the transport's service-request callback to signal.
    pub fn srq_flag(&self) -> SrqFlag {
        self.srq_flag.clone()
    }

    /// Suspend the calling thread until the service-request flag is
    /// signalled, clearing it before returning.
    ///
    /// This is an open-ended poll with no timeout or cancellation.
    pub fn wait_for_srq(&self) {
        while !self.srq_flag.take() {
            thread::sleep(Duration::from_millis(100));
        }
    }

    // ------------------------------------------------------------------
    // Waveform transfer
    // ------------------------------------------------------------------

    /// Return the waveform preamble for the currently displayed waveform.
    pub fn waveform_preamble(&mut self) -> Result<WaveformPreamble, S::Error> {
        let reply = self.query("WFMpre?")?;
        Ok(WaveformPreamble::parse(&reply)?)
    }

    /// Request the curve transfer and read exactly `len` raw bytes.
    ///
    /// In store mode this is the stored curve; otherwise the current
    /// display.
    pub fn curve_raw(&mut self, len: usize) -> Result<Vec<u8>, S::Error> {
        info!("asking the instrument for the curve data");
        self.write_command("CURve?")?;
        thread::sleep(self.query_delay);
        let mut raw = vec![0u8; len];
        self.read_exact(&mut raw)?;
        Ok(raw)
    }

    /// Fetch and decode the currently displayed curve: query the preamble,
    /// size the transfer from its sample count, then decode the binary
    /// block.
    pub fn get_curve(&mut self) -> Result<Curve, S::Error> {
        let preamble = self.waveform_preamble()?;
        let raw = self.curve_raw(Curve::expected_len(preamble.sample_count))?;
        Ok(Curve::decode(preamble, raw)?)
    }

    // ------------------------------------------------------------------
    // Raw command plumbing
    // ------------------------------------------------------------------

    /// Send a command line, paced against the previous write.
    pub fn write_command(&mut self, command: &str) -> Result<(), S::Error> {
        if let Some(last) = self.last_write {
            let elapsed = last.elapsed();
            if elapsed < self.write_delay {
                thread::sleep(self.write_delay - elapsed);
            }
        }
        debug!("-> {command}");
        self.interface
            .write_all(command.as_bytes())
            .map_err(Error::Serial)?;
        self.interface.write_all(b"\n").map_err(Error::Serial)?;
        self.interface.flush().map_err(Error::Serial)?;
        self.last_write = Some(Instant::now());
        Ok(())
    }

    /// Send a query and read its reply after the query delay.
    pub fn query(&mut self, command: &str) -> Result<String, S::Error> {
        self.write_command(command)?;
        thread::sleep(self.query_delay);
        self.read_reply()
    }

    /// Read one ASCII reply, a byte at a time so binary data queued behind
    /// the terminator is left untouched.
    fn read_reply(&mut self) -> Result<String, S::Error> {
        let mut reply: Vec<u8> = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match self.interface.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    if byte[0] == b'\n' {
                        break;
                    }
                    reply.push(byte[0]);
                }
                Err(e) => {
                    // The instrument does not always terminate replies; a
                    // timed out read with data in hand ends the reply.
                    if matches!(
                        e.kind(),
                        embedded_io::ErrorKind::TimedOut | embedded_io::ErrorKind::Other
                    ) && !reply.is_empty()
                    {
                        break;
                    }
                    return Err(Error::Serial(e));
                }
            }
        }
        if reply.is_empty() {
            return Err(Error::UnexpectedEof);
        }
        let text = String::from_utf8_lossy(&reply)
            .trim_end_matches('\r')
            .to_string();
        debug!("<- {text}");
        Ok(text)
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

fn on_off(enabled: bool) -> &'static str {
    if enabled { "ON" } else { "OFF" }
}

/// Remove spaces and the echoed command label from a reply.
fn strip_label(reply: &str, label: &str) -> String {
    reply.replace(' ', "").replace(label, "")
}

fn parse_float<I: embedded_io::Error>(value: &str, reply: &str) -> Result<f64, I> {
    value
        .parse()
        .map_err(|_| Error::BadReply(reply.to_string()))
}

/// Parse a `SOURCE:sensitivity` pair from a compacted axis reply.
fn parse_source_sensitivity<I: embedded_io::Error>(
    value: &str,
    reply: &str,
) -> Result<(DisplaySource, f64), I> {
    let (source, sensitivity) = value
        .split_once(':')
        .ok_or_else(|| Error::BadReply(reply.to_string()))?;
    let source = DisplaySource::parse(source).ok_or_else(|| Error::BadReply(reply.to_string()))?;
    let sensitivity = parse_float(sensitivity, reply)?;
    Ok((source, sensitivity))
}

/// Parse the positional `STPgen?` reply, e.g.
/// `STPGEN OUT:ON,NUMBER:4,OFFSET:0.0,INVERT:OFF,MULT:OFF,VOLTAGE:5.0`.
fn parse_stepgen(reply: &str) -> Option<StepGenStatus> {
    let fields: Vec<&str> = reply.split(',').collect();
    if fields.len() < 6 {
        return None;
    }
    let value = |index: usize| -> Option<&str> {
        fields.get(index)?.split(':').nth(1).map(str::trim)
    };

    let output = value(0)? == "ON";
    let number_steps = value(1)?.parse().ok()?;
    let multiplier = value(2)?.parse().ok()?;
    let invert = value(3)? == "ON";
    let (source, size) = fields[5].trim().split_once(':')?;
    let source = StepSource::parse(source.trim())?;
    let step_size = size.trim().parse().ok()?;

    Some(StepGenStatus {
        output,
        number_steps,
        multiplier,
        invert,
        source,
        step_size,
    })
}
