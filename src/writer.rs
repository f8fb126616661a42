use std::fmt::Write as _;
use std::io::{BufWriter, Write};

use crate::error::{ComtradeError, Result};
use crate::geometry::RecordGeometry;
use crate::time::format_timestamp;
use crate::types::{AnalogChannel, DigitalChannel, Header};

/// Line terminator used for generated header text
const LINE_END: &str = "\r\n";

impl Header {
    /// Renders the header in the text layout [`Header::parse`] accepts
    ///
    /// Optional columns are emitted only when present, so parsing the output
    /// yields an equal header.
    ///
    /// ```rust
    /// use comtrade::Header;
    ///
    /// let header = comtrade::doctest_utils::sample_header();
    /// let text = header.to_cfg_string();
    /// assert!(text.starts_with("SUB1,REL7,1999\r\n3,2A,1D\r\n"));
    /// assert_eq!(Header::parse(text.as_bytes())?, header);
    /// # Ok::<(), comtrade::ComtradeError>(())
    /// ```
    pub fn to_cfg_string(&self) -> String {
        let mut lines = Vec::with_capacity(self.total_channels() + self.sample_rates.len() + 8);

        let mut first = format!("{},{}", self.station_name, self.record_device_id);
        if let Some(year) = self.revision_year {
            let _ = write!(first, ",{}", year);
        }
        lines.push(first);

        lines.push(format!(
            "{},{}A,{}D",
            self.total_channels(),
            self.analog_count(),
            self.digital_count()
        ));
        lines.extend(self.analog_channels.iter().map(analog_line));
        lines.extend(self.digital_channels.iter().map(digital_line));

        lines.push(self.line_frequency.to_string());
        lines.push(self.sample_rates.len().to_string());
        lines.extend(
            self.sample_rates
                .iter()
                .map(|s| format!("{},{}", s.rate, s.sample_count)),
        );

        lines.push(format_timestamp(&self.start_time));
        lines.push(format_timestamp(&self.trigger_time));
        lines.push(self.data_file_type.as_tag().to_string());
        lines.push(self.time_factor.to_string());

        let mut text = lines.join(LINE_END);
        text.push_str(LINE_END);
        text
    }
}

fn analog_line(c: &AnalogChannel) -> String {
    let mut line = format!(
        "{},{},{},{},{},{},{},{},{},{}",
        c.index, c.name, c.phase, c.element, c.unit, c.a, c.b, c.skew, c.min, c.max
    );
    // 可选列：一次/二次变比
    if c.primary.is_some() || c.secondary.is_some() {
        let _ = write!(line, ",{}", c.primary.map(|v| v.to_string()).unwrap_or_default());
        if let Some(secondary) = c.secondary {
            let _ = write!(line, ",{}", secondary);
        }
    }
    line
}

fn digital_line(c: &DigitalChannel) -> String {
    let mut line = format!("{},{},{}", c.index, c.name, c.phase);
    if c.element.is_some() || c.initial_state.is_some() {
        let _ = write!(line, ",{}", c.element.as_deref().unwrap_or(""));
        if let Some(state) = c.initial_state {
            let _ = write!(line, ",{}", state);
        }
    }
    line
}

/// Writes the header text to a sink
pub fn write_cfg<W: Write>(header: &Header, mut out: W) -> Result<()> {
    out.write_all(header.to_cfg_string().as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Sequential writer for 16-bit binary data records
///
/// Sample numbers are assigned automatically, starting at 1.
///
/// # Examples
///
/// ```rust
/// use comtrade::{DatWriter, DatDecoder};
///
/// let header = comtrade::doctest_utils::sample_header();
/// let mut writer = DatWriter::new(&header, Vec::new());
/// writer.write_record(0, &[100, 0], &[0])?;
/// writer.write_record(1000, &[200, 0], &[0])?;
/// writer.write_record(2000, &[-50, 0], &[1])?;
/// let data = writer.finish()?;
///
/// assert_eq!(data.len(), 3 * header.geometry().record_bytes);
/// let values = DatDecoder::new(&header, &data).channel_series(1)?;
/// assert_eq!(values, vec![1.0, 2.0, -0.5]);
/// # Ok::<(), comtrade::ComtradeError>(())
/// ```
pub struct DatWriter<W: Write> {
    out: BufWriter<W>,
    geometry: RecordGeometry,
    records_written: usize,
    buffer: Vec<u8>,
}

impl<W: Write> DatWriter<W> {
    pub fn new(header: &Header, out: W) -> Self {
        let geometry = header.geometry();
        DatWriter {
            out: BufWriter::new(out),
            geometry,
            records_written: 0,
            buffer: vec![0u8; geometry.record_bytes],
        }
    }

    /// Appends one record
    ///
    /// # Errors
    ///
    /// * `ComtradeError::RecordShape` - value counts do not match the header
    /// * `ComtradeError::Io` - the sink failed
    pub fn write_record(&mut self, timestamp: u32, analog: &[i16], digital_words: &[u16]) -> Result<()> {
        if analog.len() != self.geometry.analog_count {
            return Err(ComtradeError::RecordShape {
                kind: "analog",
                expected: self.geometry.analog_count,
                got: analog.len(),
            });
        }
        if digital_words.len() != self.geometry.digital_words {
            return Err(ComtradeError::RecordShape {
                kind: "status word",
                expected: self.geometry.digital_words,
                got: digital_words.len(),
            });
        }

        let sample_number = (self.records_written + 1) as u32;
        self.buffer[0..4].copy_from_slice(&sample_number.to_le_bytes());
        self.buffer[4..8].copy_from_slice(&timestamp.to_le_bytes());
        for (i, value) in analog.iter().enumerate() {
            let range = self.geometry.analog_range(i);
            self.buffer[range].copy_from_slice(&value.to_le_bytes());
        }
        for (i, word) in digital_words.iter().enumerate() {
            let range = self.geometry.digital_word_range(i);
            self.buffer[range].copy_from_slice(&word.to_le_bytes());
        }

        self.out.write_all(&self.buffer)?;
        self.records_written += 1;
        Ok(())
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Flushes and returns the underlying sink
    pub fn finish(self) -> Result<W> {
        self.out.into_inner().map_err(|e| ComtradeError::Io(e.into_error()))
    }
}
