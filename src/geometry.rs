use std::ops::Range;

use crate::types::Header;

/// Byte offset of the sample number within a record
pub const SAMPLE_NUMBER_OFFSET: usize = 0;
/// Byte offset of the timestamp within a record
pub const TIMESTAMP_OFFSET: usize = 4;
/// Sample number and timestamp, 4 bytes each
pub const RECORD_PREFIX_BYTES: usize = 8;
/// Width of one analog sample (16-bit)
pub const ANALOG_SAMPLE_BYTES: usize = 2;
/// Digital channels packed per 16-bit status word
pub const DIGITAL_BITS_PER_WORD: usize = 16;

/// Layout of one fixed-width binary data record
///
/// ```text
/// | sample number (u32) | timestamp (u32) | analog i16 x N | status u16 x ceil(M/16) |
/// ```
///
/// ```rust
/// use comtrade::RecordGeometry;
///
/// let geometry = RecordGeometry::compute(2, 17);
/// assert_eq!(geometry.record_bytes, 8 + 4 + 4);
/// assert_eq!(geometry.digital_words, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordGeometry {
    /// 每个记录的总字节数
    pub record_bytes: usize,
    /// 模拟量起始偏移
    pub analog_offset: usize,
    /// 数字量状态字起始偏移
    pub digital_offset: usize,
    pub analog_count: usize,
    pub digital_words: usize,
}

impl RecordGeometry {
    pub fn compute(analog_count: usize, digital_count: usize) -> Self {
        let digital_words = digital_count.div_ceil(DIGITAL_BITS_PER_WORD);
        let analog_offset = RECORD_PREFIX_BYTES;
        let digital_offset = analog_offset + analog_count * ANALOG_SAMPLE_BYTES;
        RecordGeometry {
            record_bytes: digital_offset + digital_words * 2,
            analog_offset,
            digital_offset,
            analog_count,
            digital_words,
        }
    }

    pub fn from_header(header: &Header) -> Self {
        Self::compute(header.analog_count(), header.digital_count())
    }

    /// Byte range of the record at a 0-based position within the data file
    pub fn record_range(&self, record: usize) -> Range<usize> {
        let start = record * self.record_bytes;
        start..start + self.record_bytes
    }

    /// Byte range of an analog value (0-based channel) within one record
    pub fn analog_range(&self, channel: usize) -> Range<usize> {
        let start = self.analog_offset + channel * ANALOG_SAMPLE_BYTES;
        start..start + ANALOG_SAMPLE_BYTES
    }

    /// Byte range of a status word (0-based) within one record
    pub fn digital_word_range(&self, word: usize) -> Range<usize> {
        let start = self.digital_offset + word * 2;
        start..start + 2
    }

    /// Number of complete records a buffer of `len` bytes holds
    pub fn records_in(&self, len: usize) -> usize {
        len / self.record_bytes
    }
}
