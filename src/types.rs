use std::fmt;

use chrono::NaiveDateTime;

use crate::geometry::RecordGeometry;

/// Encoding of the data file, as declared on the file-type line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFileType {
    Ascii,
    /// 16-bit little-endian binary, the only decodable variant
    Binary,
    Binary32,
    Float32,
}

impl DataFileType {
    /// 不区分大小写匹配文件类型标签
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "ASCII" => Some(DataFileType::Ascii),
            "BINARY" => Some(DataFileType::Binary),
            "BINARY32" => Some(DataFileType::Binary32),
            "FLOAT32" => Some(DataFileType::Float32),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            DataFileType::Ascii => "ASCII",
            DataFileType::Binary => "BINARY",
            DataFileType::Binary32 => "BINARY32",
            DataFileType::Float32 => "FLOAT32",
        }
    }

    pub fn is_decodable(&self) -> bool {
        matches!(self, DataFileType::Binary)
    }
}

impl fmt::Display for DataFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// One `(rate, sample_count)` entry of the sampling section
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRate {
    /// Sampling frequency in Hz
    pub rate: f64,
    /// Number of samples recorded at this rate
    pub sample_count: usize,
}

/// Analog channel definition from the header
#[derive(Debug, Clone, PartialEq)]
pub struct AnalogChannel {
    /// 1-based channel number as written in the header
    pub index: u16,
    /// Channel identifier with spaces replaced by underscores
    pub name: String,
    pub phase: String,
    /// Circuit component being monitored (often blank)
    pub element: String,
    pub unit: String,
    /// Multiplier of the linear conversion `raw * a + b`
    pub a: f64,
    /// Offset of the linear conversion `raw * a + b`
    pub b: f64,
    /// Time skew between channels, in microseconds
    pub skew: f64,
    pub min: i32,
    pub max: i32,
    pub primary: Option<f64>,
    pub secondary: Option<f64>,
}

impl AnalogChannel {
    /// 将原始采样值转换为物理值
    ///
    /// ```rust
    /// use comtrade::AnalogChannel;
    ///
    /// let channel = AnalogChannel {
    ///     index: 1,
    ///     name: "IA".to_string(),
    ///     phase: "A".to_string(),
    ///     element: String::new(),
    ///     unit: "A".to_string(),
    ///     a: 0.01,
    ///     b: 0.5,
    ///     skew: 0.0,
    ///     min: -32767,
    ///     max: 32767,
    ///     primary: None,
    ///     secondary: None,
    /// };
    /// assert!((channel.to_physical(200) - 2.5).abs() < 1e-12);
    /// ```
    pub fn to_physical(&self, raw: i16) -> f64 {
        f64::from(raw) * self.a + self.b
    }
}

/// Digital (status) channel definition from the header
#[derive(Debug, Clone, PartialEq)]
pub struct DigitalChannel {
    pub index: u16,
    pub name: String,
    pub phase: String,
    pub element: Option<String>,
    /// Normal state of the channel, 0 or 1
    pub initial_state: Option<u8>,
}

/// Parsed COMTRADE configuration (`.cfg`)
///
/// Built once by [`Header::parse`] and read-only afterwards.
///
/// # Start and trigger time
///
/// The first timestamp line of the header is stored in `start_time` (time of the
/// first data point) and the second in `trigger_time`, following the ordering of
/// IEEE C37.111. Some writers are known to swap the two lines; verify against a
/// recorder's own documentation before relying on the distinction.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub station_name: String,
    pub record_device_id: String,
    pub revision_year: Option<u16>,
    pub analog_channels: Vec<AnalogChannel>,
    pub digital_channels: Vec<DigitalChannel>,
    /// Nominal line frequency in Hz
    pub line_frequency: u16,
    /// All sampling-rate entries; decoding honours only the first one
    pub sample_rates: Vec<SampleRate>,
    pub start_time: NaiveDateTime,
    pub trigger_time: NaiveDateTime,
    pub data_file_type: DataFileType,
    /// Multiplier applied to the per-record timestamp field
    pub time_factor: f64,
}

impl Header {
    /// Parses header text; see [`crate::parser::parse`]
    pub fn parse(bytes: &[u8]) -> crate::Result<Header> {
        crate::parser::parse(bytes)
    }

    pub fn analog_count(&self) -> usize {
        self.analog_channels.len()
    }

    pub fn digital_count(&self) -> usize {
        self.digital_channels.len()
    }

    pub fn total_channels(&self) -> usize {
        self.analog_count() + self.digital_count()
    }

    /// Looks up an analog channel by its 1-based position
    pub fn analog_channel(&self, channel: usize) -> Option<&AnalogChannel> {
        channel.checked_sub(1).and_then(|i| self.analog_channels.get(i))
    }

    pub fn analog_channel_names(&self) -> Vec<&str> {
        self.analog_channels.iter().map(|c| c.name.as_str()).collect()
    }

    /// Rate of the first sampling entry (only one rate is taken into account)
    pub fn sampling_rate(&self) -> Option<f64> {
        self.sample_rates.first().map(|s| s.rate)
    }

    /// Sample count of the first sampling entry
    pub fn sample_count(&self) -> Option<usize> {
        self.sample_rates.first().map(|s| s.sample_count)
    }

    pub fn geometry(&self) -> RecordGeometry {
        RecordGeometry::from_header(self)
    }
}
