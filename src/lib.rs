//! # COMTRADE Library for Rust
//!
//! A pure Rust decoder for COMTRADE (IEEE C37.111) disturbance records.
//! A record is a pair of files: a text header (`.cfg`) describing the station,
//! channels and sampling, and a data file (`.dat`) holding fixed-width binary
//! samples. This library parses the header into a validated [`Header`] and
//! reconstructs scaled time series for analog channels.
//!
//! The library performs no file discovery and no I/O of its own beyond
//! reading from sources the caller provides.
//!
//! ## Quick Start
//!
//! ### Parsing a header and decoding a channel
//!
//! ```rust
//! use comtrade::{channel_series, Header, Result};
//!
//! fn main() -> Result<()> {
//!     # let (cfg_text, dat_bytes) = comtrade::doctest_utils::sample_files()?;
//!     // cfg_text: contents of the .cfg file, dat_bytes: contents of the .dat file
//!     let header = Header::parse(cfg_text.as_bytes())?;
//!
//!     println!("Station: {}", header.station_name);
//!     println!("Analog channels: {:?}", header.analog_channel_names());
//!     println!("Sampling rate: {:?} Hz", header.sampling_rate());
//!
//!     // Channels are numbered from 1, as in the header
//!     let values = channel_series(&header, &dat_bytes, 1)?;
//!     assert_eq!(values.len(), 3);
//!     Ok(())
//! }
//! ```
//!
//! ### Building the time axis
//!
//! ```rust
//! use comtrade::{timestamp_at, Header};
//!
//! # let cfg_text = comtrade::doctest_utils::sample_cfg();
//! let header = Header::parse(cfg_text.as_bytes())?;
//! for i in 0..header.sample_count().unwrap_or(0) {
//!     let t = timestamp_at(&header, i)?;
//!     println!("sample {} at {}", i, t);
//! }
//! # Ok::<(), comtrade::ComtradeError>(())
//! ```
//!
//! ### Decoding channels concurrently
//!
//! [`ComtradeRecord`] keeps the header and the data bytes behind `Arc`, so
//! clones can be sent to other threads and every channel decoded in parallel
//! without locks:
//!
//! ```rust
//! use comtrade::{ComtradeRecord, DataFile, Header};
//!
//! # let (cfg_text, dat_bytes) = comtrade::doctest_utils::sample_files()?;
//! let header = Header::parse(cfg_text.as_bytes())?;
//! let record = ComtradeRecord::new(header, DataFile::new(dat_bytes));
//!
//! let worker = {
//!     let record = record.clone();
//!     std::thread::spawn(move || record.channel_series(2))
//! };
//! let first = record.channel_series(1)?;
//! let second = worker.join().expect("worker panicked")?;
//! assert_eq!(first.len(), second.len());
//! # Ok::<(), comtrade::ComtradeError>(())
//! ```
//!
//! ## Limitations
//!
//! - Only 16-bit binary data files (`BINARY`) are decoded; `ASCII`,
//!   `BINARY32` and `FLOAT32` headers parse but decoding reports
//!   [`ComtradeError::UnsupportedFileType`].
//! - Only the first sampling-rate entry is honoured.
//! - Digital status words are located but not unpacked
//!   ([`DatDecoder::digital_series`]).

pub mod error;
pub mod geometry;
pub mod lexer;
pub mod parser;
pub mod reader;
pub mod time;
pub mod types;
pub mod utils;
pub mod writer;

#[doc(hidden)]
pub mod doctest_utils; // For internal doctest support

// Re-export main types for convenience
pub use error::{ComtradeError, Result};
pub use geometry::RecordGeometry;
pub use reader::{channel_series, ComtradeRecord, DataFile, DatDecoder, RecordView};
pub use time::{timestamp_at, timestamps};
pub use types::{AnalogChannel, DataFileType, DigitalChannel, Header, SampleRate};
pub use writer::{write_cfg, DatWriter};

/// Library version
///
/// ```rust
/// let version = comtrade::version();
/// assert!(version.contains('.'));
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
