use std::io::Read;
use std::sync::Arc;
use std::thread;

use chrono::NaiveDateTime;
use log::{debug, warn};

use crate::error::{ComtradeError, Result};
use crate::geometry::{RecordGeometry, SAMPLE_NUMBER_OFFSET, TIMESTAMP_OFFSET};
use crate::types::Header;

/// Borrowed view over one binary data record
///
/// Nothing is decoded until a field is asked for; values are read straight
/// from the underlying bytes.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    bytes: &'a [u8],
    geometry: RecordGeometry,
}

impl<'a> RecordView<'a> {
    /// Sample number as stored in the record (1-based in conforming files)
    ///
    /// IEEE C37.111 defines the field as a 4-byte unsigned integer, so values
    /// above `i32::MAX` are kept rather than wrapping negative.
    pub fn sample_number(&self) -> u32 {
        read_u32_le(self.bytes, SAMPLE_NUMBER_OFFSET)
    }

    /// Raw timestamp field, in units of the header's time factor
    ///
    /// Unsigned for the same reason as [`RecordView::sample_number`].
    pub fn timestamp(&self) -> u32 {
        read_u32_le(self.bytes, TIMESTAMP_OFFSET)
    }

    /// Raw analog value of a 0-based channel
    pub fn analog(&self, channel: usize) -> i16 {
        let range = self.geometry.analog_range(channel);
        i16::from_le_bytes([self.bytes[range.start], self.bytes[range.start + 1]])
    }

    /// Packed status word (16 digital channels per word)
    pub fn digital_word(&self, word: usize) -> u16 {
        let range = self.geometry.digital_word_range(word);
        u16::from_le_bytes([self.bytes[range.start], self.bytes[range.start + 1]])
    }
}

fn read_u32_le(bytes: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]])
}

/// Decoder for 16-bit binary data files
///
/// Slices the data buffer into fixed-width records using the geometry derived
/// from the header. Only the first sampling-rate entry of the header is
/// honoured: its sample count is the number of records decoded.
///
/// # Examples
///
/// ```rust
/// use comtrade::DatDecoder;
///
/// let (header, data) = comtrade::doctest_utils::sample_record_parts()?;
/// let decoder = DatDecoder::new(&header, &data);
///
/// let currents = decoder.channel_series(1)?;
/// assert_eq!(currents, vec![1.0, 2.0, -0.5]);
///
/// let first = decoder.record(0)?;
/// assert_eq!(first.sample_number(), 1);
/// assert_eq!(first.analog(0), 100);
/// # Ok::<(), comtrade::ComtradeError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DatDecoder<'a> {
    header: &'a Header,
    data: &'a [u8],
    geometry: RecordGeometry,
}

impl<'a> DatDecoder<'a> {
    pub fn new(header: &'a Header, data: &'a [u8]) -> Self {
        DatDecoder {
            header,
            data,
            geometry: RecordGeometry::from_header(header),
        }
    }

    pub fn geometry(&self) -> RecordGeometry {
        self.geometry
    }

    /// Record at a 0-based position
    ///
    /// # Errors
    ///
    /// * `ComtradeError::TruncatedData` - the buffer ends before the record does
    pub fn record(&self, index: usize) -> Result<RecordView<'a>> {
        let truncated = |needed| ComtradeError::TruncatedData {
            record: index,
            needed,
            available: self.data.len(),
        };
        // 超大的记录号不能让偏移计算溢出
        let end = index
            .checked_add(1)
            .and_then(|n| n.checked_mul(self.geometry.record_bytes))
            .ok_or_else(|| truncated(usize::MAX))?;
        let bytes = self
            .data
            .get(self.geometry.record_range(index))
            .ok_or_else(|| truncated(end))?;
        Ok(RecordView {
            bytes,
            geometry: self.geometry,
        })
    }

    /// Scaled values (`raw * a + b`) of a 1-based analog channel, one per record
    ///
    /// Recomputed from the raw bytes on every call.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    ///
    /// * `ComtradeError::EmptyData` - the data buffer is empty
    /// * `ComtradeError::ChannelOutOfRange` - `channel` is outside `1..=analog_count`
    /// * `ComtradeError::MissingSampleRate` - the header has no sampling-rate entry
    /// * `ComtradeError::UnsupportedFileType` - the data file is not 16-bit binary
    /// * `ComtradeError::TruncatedData` - a record runs past the end of the buffer
    pub fn channel_series(&self, channel: usize) -> Result<Vec<f64>> {
        let analog = &self.header.analog_channels[self.check_analog(channel)?];
        let samples = self
            .raw_channel_series(channel)?
            .into_iter()
            .map(|raw| analog.to_physical(raw))
            .collect();
        Ok(samples)
    }

    /// Unscaled 16-bit values of a 1-based analog channel
    pub fn raw_channel_series(&self, channel: usize) -> Result<Vec<i16>> {
        let offset = self.check_analog(channel)?;
        let count = self.decodable_sample_count()?;

        // 声明的采样数来自头部，预分配不能超过数据中实际存在的记录数
        let available = self.geometry.records_in(self.data.len());
        let mut samples = Vec::with_capacity(count.min(available));
        for i in 0..count {
            samples.push(self.record(i)?.analog(offset));
        }
        debug!(
            "decoded {} samples of analog channel {} ({} bytes per record)",
            samples.len(),
            channel,
            self.geometry.record_bytes
        );
        Ok(samples)
    }

    /// States of a 1-based digital channel
    ///
    /// The status words are located by the record geometry, but unpacking them
    /// into per-channel states is not implemented yet. After validating its
    /// arguments this always fails with
    /// `ComtradeError::DigitalDecodingUnsupported`.
    pub fn digital_series(&self, channel: usize) -> Result<Vec<bool>> {
        if self.data.is_empty() {
            return Err(ComtradeError::EmptyData);
        }
        let total = self.header.digital_count();
        if channel < 1 || channel > total {
            return Err(ComtradeError::ChannelOutOfRange { channel, total });
        }
        Err(ComtradeError::DigitalDecodingUnsupported)
    }

    /// 检查数据和通道号，返回从0开始的通道偏移
    fn check_analog(&self, channel: usize) -> Result<usize> {
        if self.data.is_empty() {
            return Err(ComtradeError::EmptyData);
        }
        let total = self.header.analog_count();
        if channel < 1 || channel > total {
            return Err(ComtradeError::ChannelOutOfRange { channel, total });
        }
        Ok(channel - 1)
    }

    /// 只考虑第一个采样率
    fn decodable_sample_count(&self) -> Result<usize> {
        let count = self
            .header
            .sample_count()
            .ok_or(ComtradeError::MissingSampleRate)?;
        if !self.header.data_file_type.is_decodable() {
            return Err(ComtradeError::UnsupportedFileType(
                self.header.data_file_type.to_string(),
            ));
        }
        if self.header.sample_rates.len() > 1 {
            warn!(
                "header declares {} sampling rates, only the first is decoded",
                self.header.sample_rates.len()
            );
        }
        Ok(count)
    }
}

/// Scaled series of a 1-based analog channel; see [`DatDecoder::channel_series`]
pub fn channel_series(header: &Header, data: &[u8], channel: usize) -> Result<Vec<f64>> {
    DatDecoder::new(header, data).channel_series(channel)
}

/// Read-only, shareable data file contents
///
/// Clones share the same bytes. The bytes can only be taken back for
/// mutation once every other clone is gone.
#[derive(Debug, Clone, Default)]
pub struct DataFile {
    bytes: Arc<Vec<u8>>,
}

impl DataFile {
    pub fn new(bytes: Vec<u8>) -> Self {
        DataFile {
            bytes: Arc::new(bytes),
        }
    }

    /// Reads a data source to its end
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reclaims the bytes if this is the only handle, otherwise gives it back
    pub fn try_into_vec(self) -> std::result::Result<Vec<u8>, DataFile> {
        Arc::try_unwrap(self.bytes).map_err(|bytes| DataFile { bytes })
    }
}

impl From<Vec<u8>> for DataFile {
    fn from(bytes: Vec<u8>) -> Self {
        DataFile::new(bytes)
    }
}

/// A parsed header together with its data file
///
/// Cheap to clone and safe to share between threads: the header and the data
/// bytes are both immutable behind `Arc`.
///
/// # Examples
///
/// ```rust
/// use comtrade::ComtradeRecord;
///
/// # let (cfg, dat) = comtrade::doctest_utils::sample_files()?;
/// let record = ComtradeRecord::from_readers(cfg.as_bytes(), dat.as_slice())?;
///
/// println!("Station: {}", record.header().station_name);
/// for (name, series) in record.all_channel_series() {
///     let values = series?;
///     println!("{}: {} samples", name, values.len());
/// }
/// # Ok::<(), comtrade::ComtradeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ComtradeRecord {
    header: Arc<Header>,
    data: DataFile,
}

impl ComtradeRecord {
    pub fn new(header: Header, data: DataFile) -> Self {
        ComtradeRecord {
            header: Arc::new(header),
            data,
        }
    }

    /// Reads and parses a header source, then reads the data source
    pub fn from_readers<C: Read, D: Read>(mut cfg: C, dat: D) -> Result<Self> {
        let mut header_bytes = Vec::new();
        cfg.read_to_end(&mut header_bytes)?;
        let header = Header::parse(&header_bytes)?;
        let data = DataFile::from_reader(dat)?;
        Ok(Self::new(header, data))
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn data(&self) -> &DataFile {
        &self.data
    }

    pub fn decoder(&self) -> DatDecoder<'_> {
        DatDecoder::new(&self.header, self.data.as_bytes())
    }

    pub fn channel_series(&self, channel: usize) -> Result<Vec<f64>> {
        self.decoder().channel_series(channel)
    }

    /// Time axis of the first sampling entry
    pub fn timestamps(&self) -> Result<Vec<NaiveDateTime>> {
        crate::time::timestamps(&self.header)
    }

    /// Decodes every analog channel, one scoped thread per channel
    ///
    /// Results are returned in channel order, paired with the channel name.
    /// A failing channel does not affect the others.
    pub fn all_channel_series(&self) -> Vec<(String, Result<Vec<f64>>)> {
        let decoder = self.decoder();
        thread::scope(|scope| {
            let handles: Vec<_> = self
                .header
                .analog_channels
                .iter()
                .enumerate()
                .map(|(i, analog)| {
                    let handle = scope.spawn(move || decoder.channel_series(i + 1));
                    (analog.name.clone(), handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(name, handle)| {
                    let series = match handle.join() {
                        Ok(series) => series,
                        Err(payload) => std::panic::resume_unwind(payload),
                    };
                    (name, series)
                })
                .collect()
        })
    }
}
