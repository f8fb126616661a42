//! Header (`.cfg`) grammar parser.
//!
//! The header is a positional grammar: no line is tagged with its meaning, and
//! the position of every section depends on counts parsed earlier in the same
//! pass. Parsing therefore walks an explicit [`Cursor`] over the lines, taking
//! one line per grammar slot in this order:
//!
//! 1. station name, recording device id, revision year
//! 2. total channel count, `<n>A`, `<m>D`
//! 3. `n` analog channel lines
//! 4. `m` digital channel lines
//! 5. line frequency
//! 6. number of sampling rates `k`
//! 7. `k` lines of `rate,sample_count`
//! 8. start timestamp, trigger timestamp
//! 9. data file type
//! 10. time multiplication factor (optional line, blank means 1)

use log::{debug, trace};

use crate::error::{ComtradeError, Result};
use crate::lexer::LineLexer;
use crate::time::parse_timestamp;
use crate::types::{AnalogChannel, DataFileType, DigitalChannel, Header, SampleRate};
use crate::utils::{
    normalize_name, parse_count_marker, parse_field, parse_float, parse_optional,
    parse_optional_float,
};

const MIN_STATION_FIELDS: usize = 2;
const MIN_COUNT_FIELDS: usize = 3;
const MIN_ANALOG_FIELDS: usize = 10;
const MIN_DIGITAL_FIELDS: usize = 3;
const MIN_SAMPLE_RATE_FIELDS: usize = 2;

/// Channel counts declared on the second header line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCounts {
    pub total: usize,
    pub analog: usize,
    pub digital: usize,
}

/// A line taken by the cursor: 1-based line number plus its fields
#[derive(Debug, Clone)]
pub struct HeaderLine<'a> {
    pub number: usize,
    pub fields: Vec<&'a str>,
}

/// Sequential cursor over header lines
///
/// Every grammar slot consumes exactly one line, so the position after a
/// section is the running sum of the counts parsed so far.
#[derive(Debug)]
pub struct Cursor<'a> {
    lexer: LineLexer<'a>,
    position: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(lexer: LineLexer<'a>) -> Self {
        Cursor { lexer, position: 0 }
    }

    /// 0-based index of the next line to be taken
    pub fn position(&self) -> usize {
        self.position
    }

    /// Takes the next line, requiring at least `min_fields` fields
    pub fn take(&mut self, section: &str, min_fields: usize) -> Result<HeaderLine<'a>> {
        let number = self.position + 1;
        let fields = self.lexer.fields(self.position).ok_or_else(|| {
            ComtradeError::InvalidSection {
                line: number,
                reason: format!("missing {} line", section),
            }
        })?;
        if fields.len() < min_fields {
            return Err(ComtradeError::InvalidSection {
                line: number,
                reason: format!(
                    "{} line needs at least {} fields, found {}",
                    section,
                    min_fields,
                    fields.len()
                ),
            });
        }
        self.position += 1;
        Ok(HeaderLine { number, fields })
    }

    /// Takes the next line if one exists, without field requirements
    pub fn take_optional(&mut self) -> Option<HeaderLine<'a>> {
        let number = self.position + 1;
        let fields = self.lexer.fields(self.position)?;
        self.position += 1;
        Some(HeaderLine { number, fields })
    }

    /// Takes `count` consecutive lines of one section
    pub fn take_section(
        &mut self,
        section: &str,
        count: usize,
        min_fields: usize,
    ) -> Result<Vec<HeaderLine<'a>>> {
        (0..count).map(|_| self.take(section, min_fields)).collect()
    }
}

/// Parses a complete header buffer into a [`Header`]
///
/// Any failure aborts the whole parse; no partially populated header is
/// ever returned.
///
/// The text is expected to be ASCII or UTF-8. Bytes that are not valid UTF-8
/// (station names written in a legacy code page, for instance) do not fail
/// the parse: each invalid sequence becomes U+FFFD in the affected names, and
/// numeric fields containing one fail with `InvalidNumber` as usual.
///
/// # Errors
///
/// * `ComtradeError::InvalidSection` - a line is missing or has too few fields,
///   the channel-count markers are malformed, or the declared total channel
///   count differs from analog + digital
/// * `ComtradeError::InvalidNumber` - a numeric field fails strict parsing
/// * `ComtradeError::InvalidTimestamp` - a timestamp line is malformed
///
/// # Examples
///
/// ```rust
/// use comtrade::Header;
///
/// let cfg = "SUB1,REL7,1999\n\
///            3,2A,1D\n\
///            1,IA,A,,A,0.01,0,0,-32767,32767,600,1,P\n\
///            2,VA,A,,kV,0.1,0,0,-32767,32767\n\
///            1,TRIP,,,0\n\
///            50\n\
///            1\n\
///            1000,3\n\
///            01/01/2020,00:00:00.000000\n\
///            01/01/2020,00:00:00.001000\n\
///            BINARY\n\
///            \n";
///
/// let header = Header::parse(cfg.as_bytes())?;
/// assert_eq!(header.analog_channels.len(), 2);
/// assert_eq!(header.digital_channels.len(), 1);
/// assert_eq!(header.analog_channels[0].primary, Some(600.0));
/// assert_eq!(header.analog_channels[1].primary, None);
/// assert_eq!(header.time_factor, 1.0);
/// # Ok::<(), comtrade::ComtradeError>(())
/// ```
pub fn parse(bytes: &[u8]) -> Result<Header> {
    let text = String::from_utf8_lossy(bytes);
    let mut cursor = Cursor::new(LineLexer::new(&text));

    // 第一行：厂站名、设备号、版本年份
    let line = cursor.take("station", MIN_STATION_FIELDS)?;
    let station_name = line.fields[0].to_string();
    let record_device_id = line.fields[1].to_string();
    let revision_year = parse_optional::<u16>(&line.fields, line.number, 2)?;

    // 第二行：通道数量
    let counts = parse_channel_counts(&cursor.take("channel count", MIN_COUNT_FIELDS)?)?;
    trace!(
        "channel counts: total {}, analog {}, digital {}",
        counts.total,
        counts.analog,
        counts.digital
    );

    let analog_channels = cursor
        .take_section("analog channel", counts.analog, MIN_ANALOG_FIELDS)?
        .iter()
        .map(parse_analog_channel)
        .collect::<Result<Vec<_>>>()?;

    let digital_channels = cursor
        .take_section("digital channel", counts.digital, MIN_DIGITAL_FIELDS)?
        .iter()
        .map(parse_digital_channel)
        .collect::<Result<Vec<_>>>()?;

    let line = cursor.take("line frequency", 1)?;
    let line_frequency = parse_line_frequency(&line)?;

    let line = cursor.take("sampling rate count", 1)?;
    let rate_count: usize = parse_field(&line.fields, line.number, 0)?;
    let sample_rates = cursor
        .take_section("sampling rate", rate_count, MIN_SAMPLE_RATE_FIELDS)?
        .iter()
        .map(parse_sample_rate)
        .collect::<Result<Vec<_>>>()?;

    let start_time = parse_timestamp_line(&cursor.take("start time", 1)?)?;
    let trigger_time = parse_timestamp_line(&cursor.take("trigger time", 1)?)?;

    let line = cursor.take("data file type", 1)?;
    let data_file_type =
        DataFileType::from_tag(line.fields[0]).ok_or_else(|| ComtradeError::InvalidSection {
            line: line.number,
            reason: format!("unknown data file type {:?}", line.fields[0]),
        })?;

    // 时间倍率因子：空白或缺失时取1
    let time_factor = match cursor.take_optional() {
        Some(line) if !line.fields[0].is_empty() => parse_float(&line.fields, line.number, 0)?,
        _ => 1.0,
    };

    debug!(
        "parsed header for {}/{}: {} analog, {} digital, {} sampling rate(s), {}",
        station_name,
        record_device_id,
        analog_channels.len(),
        digital_channels.len(),
        sample_rates.len(),
        data_file_type
    );

    Ok(Header {
        station_name,
        record_device_id,
        revision_year,
        analog_channels,
        digital_channels,
        line_frequency,
        sample_rates,
        start_time,
        trigger_time,
        data_file_type,
        time_factor,
    })
}

/// Parses `total,<n>A,<m>D`
pub fn parse_channel_counts(line: &HeaderLine<'_>) -> Result<ChannelCounts> {
    let total: usize = parse_field(&line.fields, line.number, 0)?;
    let analog = parse_count_marker(line.fields[1], 'A', line.number, 1)?;
    let digital = parse_count_marker(line.fields[2], 'D', line.number, 2)?;
    if analog + digital != total {
        return Err(ComtradeError::InvalidSection {
            line: line.number,
            reason: format!(
                "total channel count {} does not equal {} analog + {} digital",
                total, analog, digital
            ),
        });
    }
    Ok(ChannelCounts {
        total,
        analog,
        digital,
    })
}

fn parse_analog_channel(line: &HeaderLine<'_>) -> Result<AnalogChannel> {
    let f = &line.fields;
    let n = line.number;
    Ok(AnalogChannel {
        index: parse_field(f, n, 0)?,
        name: normalize_name(f[1]),
        phase: f[2].to_string(),
        element: f[3].to_string(),
        unit: f[4].to_string(),
        a: parse_float(f, n, 5)?,
        b: parse_float(f, n, 6)?,
        skew: parse_float(f, n, 7)?,
        min: parse_field(f, n, 8)?,
        max: parse_field(f, n, 9)?,
        primary: parse_optional_float(f, n, 10)?,
        secondary: parse_optional_float(f, n, 11)?,
    })
}

fn parse_digital_channel(line: &HeaderLine<'_>) -> Result<DigitalChannel> {
    let f = &line.fields;
    let n = line.number;
    let initial_state = parse_optional::<u8>(f, n, 4)?;
    if let Some(state) = initial_state {
        if state > 1 {
            return Err(ComtradeError::InvalidNumber {
                line: n,
                field: 5,
                value: f[4].to_string(),
            });
        }
    }
    Ok(DigitalChannel {
        index: parse_field(f, n, 0)?,
        name: normalize_name(f[1]),
        phase: f[2].to_string(),
        element: f
            .get(3)
            .filter(|e| !e.is_empty())
            .map(|e| e.to_string()),
        initial_state,
    })
}

/// 线路频率：接受 "50" 或 "50.0"，拒绝小数频率
fn parse_line_frequency(line: &HeaderLine<'_>) -> Result<u16> {
    let value = parse_float(&line.fields, line.number, 0)?;
    if value.fract() != 0.0 || value < 0.0 || value > f64::from(u16::MAX) {
        return Err(ComtradeError::InvalidNumber {
            line: line.number,
            field: 1,
            value: line.fields[0].to_string(),
        });
    }
    Ok(value as u16)
}

fn parse_sample_rate(line: &HeaderLine<'_>) -> Result<SampleRate> {
    Ok(SampleRate {
        rate: parse_float(&line.fields, line.number, 0)?,
        sample_count: parse_field(&line.fields, line.number, 1)?,
    })
}

fn parse_timestamp_line(line: &HeaderLine<'_>) -> Result<chrono::NaiveDateTime> {
    parse_timestamp(&line.fields).ok_or_else(|| ComtradeError::InvalidTimestamp {
        line: line.number,
        value: line.fields.join(","),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CFG: &str = "STATION A,DEVICE 7,1999\n\
                       4,2A,2D\n\
                       1,IA,A,,A,0.01,0.0,0,-32767,32767,1200,5,S\n\
                       2,V A,A,,kV,0.1,-1.5,0,-32767,32767\n\
                       1,TRIP,,,1\n\
                       2,CB OPEN,,BKR1\n\
                       50\n\
                       2\n\
                       1000,30\n\
                       500,40\n\
                       11/07/2019,17:42:01.000000\n\
                       11/07/2019,17:42:01.010000\n\
                       BINARY\n\
                       2.5\n";

    #[test]
    fn test_cursor_positions_follow_counts() {
        let lexer = LineLexer::new(CFG);
        let mut cursor = Cursor::new(lexer);
        cursor.take("station", 2).unwrap();
        let counts = parse_channel_counts(&cursor.take("count", 3).unwrap()).unwrap();
        assert_eq!(cursor.position(), 2);
        cursor.take_section("analog", counts.analog, 10).unwrap();
        assert_eq!(cursor.position(), 2 + counts.analog);
        cursor.take_section("digital", counts.digital, 3).unwrap();
        // 频率行位于 2 + 模拟量数 + 数字量数
        assert_eq!(cursor.position(), 2 + counts.analog + counts.digital);
        assert_eq!(cursor.take("frequency", 1).unwrap().fields, vec!["50"]);
    }

    #[test]
    fn test_cursor_missing_line() {
        let mut cursor = Cursor::new(LineLexer::new("a,b"));
        cursor.take("station", 2).unwrap();
        match cursor.take("channel count", 3) {
            Err(ComtradeError::InvalidSection { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_full_header() {
        let header = parse(CFG.as_bytes()).unwrap();
        assert_eq!(header.station_name, "STATION A");
        assert_eq!(header.record_device_id, "DEVICE 7");
        assert_eq!(header.revision_year, Some(1999));
        assert_eq!(header.analog_channels.len(), 2);
        assert_eq!(header.digital_channels.len(), 2);

        let ia = &header.analog_channels[0];
        assert_eq!(ia.index, 1);
        assert_eq!(ia.a, 0.01);
        assert_eq!(ia.primary, Some(1200.0));
        assert_eq!(ia.secondary, Some(5.0));

        let va = &header.analog_channels[1];
        assert_eq!(va.name, "V_A");
        assert_eq!(va.b, -1.5);
        assert_eq!(va.primary, None);
        assert_eq!(va.secondary, None);

        assert_eq!(header.digital_channels[0].element, None);
        assert_eq!(header.digital_channels[0].initial_state, Some(1));
        assert_eq!(header.digital_channels[1].name, "CB_OPEN");
        assert_eq!(header.digital_channels[1].element.as_deref(), Some("BKR1"));
        assert_eq!(header.digital_channels[1].initial_state, None);

        assert_eq!(header.line_frequency, 50);
        assert_eq!(header.sample_rates.len(), 2);
        assert_eq!(header.sample_rates[1].rate, 500.0);
        assert_eq!(header.sample_count(), Some(30));
        assert_eq!(header.data_file_type, DataFileType::Binary);
        assert_eq!(header.time_factor, 2.5);
        assert!(header.trigger_time > header.start_time);
    }

    #[test]
    fn test_missing_time_factor_line() {
        let cfg = CFG.trim_end().rsplit_once('\n').unwrap().0;
        let header = parse(cfg.as_bytes()).unwrap();
        assert_eq!(header.time_factor, 1.0);
    }

    #[test]
    fn test_count_mismatch() {
        let cfg = CFG.replacen("4,2A,2D", "5,2A,2D", 1);
        assert!(matches!(
            parse(cfg.as_bytes()),
            Err(ComtradeError::InvalidSection { line: 2, .. })
        ));
    }

    #[test]
    fn test_line_frequency_forms() {
        let cfg = CFG.replacen("\n50\n", "\n60.0\n", 1);
        assert_eq!(parse(cfg.as_bytes()).unwrap().line_frequency, 60);

        let cfg = CFG.replacen("\n50\n", "\n50.5\n", 1);
        assert!(matches!(
            parse(cfg.as_bytes()),
            Err(ComtradeError::InvalidNumber { line: 7, field: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_initial_state() {
        let cfg = CFG.replacen("1,TRIP,,,1", "1,TRIP,,,2", 1);
        assert!(matches!(
            parse(cfg.as_bytes()),
            Err(ComtradeError::InvalidNumber { line: 5, field: 5, .. })
        ));
    }

    #[test]
    fn test_unknown_file_type() {
        let cfg = CFG.replacen("BINARY", "PACKED", 1);
        assert!(matches!(
            parse(cfg.as_bytes()),
            Err(ComtradeError::InvalidSection { line: 13, .. })
        ));
        let cfg = CFG.replacen("BINARY", "ascii", 1);
        assert_eq!(parse(cfg.as_bytes()).unwrap().data_file_type, DataFileType::Ascii);
    }
}
