// Internal utilities for documentation tests
// This file contains helper functions to build small COMTRADE records for doctests

use chrono::NaiveDate;

use crate::{AnalogChannel, DataFileType, DatWriter, DigitalChannel, Header, Result, SampleRate};

/// Header with two analog channels and one digital channel, 1000 Hz, 3 samples
///
/// Channel 1 scales by `0.01`, so raw values `[100, 200, -50]` decode to
/// `[1.0, 2.0, -0.5]`.
pub fn sample_header() -> Header {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|d| d.and_hms_micro_opt(12, 0, 0, 0))
        .unwrap_or_default();
    let trigger = NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|d| d.and_hms_micro_opt(12, 0, 0, 1_000))
        .unwrap_or_default();

    Header {
        station_name: "SUB1".to_string(),
        record_device_id: "REL7".to_string(),
        revision_year: Some(1999),
        analog_channels: vec![
            AnalogChannel {
                index: 1,
                name: "IA".to_string(),
                phase: "A".to_string(),
                element: String::new(),
                unit: "A".to_string(),
                a: 0.01,
                b: 0.0,
                skew: 0.0,
                min: -32767,
                max: 32767,
                primary: Some(600.0),
                secondary: Some(1.0),
            },
            AnalogChannel {
                index: 2,
                name: "VA".to_string(),
                phase: "A".to_string(),
                element: String::new(),
                unit: "kV".to_string(),
                a: 0.5,
                b: -1.0,
                skew: 0.0,
                min: -32767,
                max: 32767,
                primary: None,
                secondary: None,
            },
        ],
        digital_channels: vec![DigitalChannel {
            index: 1,
            name: "TRIP".to_string(),
            phase: String::new(),
            element: None,
            initial_state: Some(0),
        }],
        line_frequency: 50,
        sample_rates: vec![SampleRate {
            rate: 1000.0,
            sample_count: 3,
        }],
        start_time: start,
        trigger_time: trigger,
        data_file_type: DataFileType::Binary,
        time_factor: 1.0,
    }
}

/// Header text of [`sample_header`]
pub fn sample_cfg() -> String {
    sample_header().to_cfg_string()
}

/// Binary records for a header, one row of raw analog values per record
///
/// Timestamps advance by 1000 per record and all status words are zero.
pub fn sample_data<R: AsRef<[i16]>>(header: &Header, rows: &[R]) -> Result<Vec<u8>> {
    let words = vec![0u16; header.geometry().digital_words];
    let mut writer = DatWriter::new(header, Vec::new());
    for (i, row) in rows.iter().enumerate() {
        writer.write_record(i as u32 * 1000, row.as_ref(), &words)?;
    }
    writer.finish()
}

/// [`sample_header`] with its three records
pub fn sample_record_parts() -> Result<(Header, Vec<u8>)> {
    let header = sample_header();
    let data = sample_data(&header, &[[100, 10], [200, 20], [-50, 30]])?;
    Ok((header, data))
}

/// Header text and data bytes, as they would be read from disk
pub fn sample_files() -> Result<(String, Vec<u8>)> {
    let (header, data) = sample_record_parts()?;
    Ok((header.to_cfg_string(), data))
}
