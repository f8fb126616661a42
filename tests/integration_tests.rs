use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use std::thread;

use comtrade::{
    timestamp_at, write_cfg, ComtradeError, ComtradeRecord, DataFile, DatWriter, Header,
};

const FAULT_CFG: &str = "FEEDER 12,PQ METER,1999\r\n\
                         6,4A,2D\r\n\
                         1,IA,A,,A,0.02,0,0,-32767,32767,400,5,S\r\n\
                         2,IB,B,,A,0.02,0,0,-32767,32767,400,5,S\r\n\
                         3,IC,C,,A,0.02,0,0,-32767,32767,400,5,S\r\n\
                         4,VN,N,,kV,0.001,0.5,0,-32767,32767,132,0.11,P\r\n\
                         1,51 TRIP,,,0\r\n\
                         2,52 OPEN,,,1\r\n\
                         60\r\n\
                         1\r\n\
                         4800,96\r\n\
                         14/02/2023,03:21:09.500000\r\n\
                         14/02/2023,03:21:09.520000\r\n\
                         BINARY\r\n\
                         1\r\n";

// 生成一个周期的正弦波原始值
fn synth_raw(channel: usize, sample: usize) -> i16 {
    let phase = channel as f64 * 2.0 * std::f64::consts::PI / 3.0;
    let t = sample as f64 / 80.0;
    (10_000.0 * (2.0 * std::f64::consts::PI * t + phase).sin()) as i16
}

fn write_fault_files(dir: &Path) -> (Header, std::path::PathBuf, std::path::PathBuf) {
    let header = Header::parse(FAULT_CFG.as_bytes()).unwrap();
    let cfg_path = dir.join("fault.cfg");
    let dat_path = dir.join("fault.dat");

    write_cfg(&header, File::create(&cfg_path).unwrap()).unwrap();

    let mut writer = DatWriter::new(&header, File::create(&dat_path).unwrap());
    for i in 0..header.sample_count().unwrap() {
        let analog: Vec<i16> = (0..4).map(|c| synth_raw(c, i)).collect();
        let status = if i >= 48 { 0b11 } else { 0b10 };
        writer.write_record(i as u32 * 208, &analog, &[status]).unwrap();
    }
    writer.finish().unwrap();

    (header, cfg_path, dat_path)
}

#[test]
fn test_files_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let (header, cfg_path, dat_path) = write_fault_files(dir.path());

    assert_eq!(fs::metadata(&dat_path).unwrap().len(), 96 * 18);

    let record = ComtradeRecord::from_readers(
        File::open(&cfg_path).unwrap(),
        File::open(&dat_path).unwrap(),
    )
    .unwrap();

    assert_eq!(record.header(), &header);
    assert_eq!(record.header().analog_channel_names(), vec!["IA", "IB", "IC", "VN"]);
    assert_eq!(record.header().digital_channels[0].name, "51_TRIP");
    assert_eq!(record.header().line_frequency, 60);

    let ia = record.channel_series(1).unwrap();
    assert_eq!(ia.len(), 96);
    for (i, value) in ia.iter().enumerate() {
        let expected = f64::from(synth_raw(0, i)) * 0.02;
        assert!((value - expected).abs() < 1e-9);
    }

    let vn = record.channel_series(4).unwrap();
    assert!((vn[0] - (f64::from(synth_raw(3, 0)) * 0.001 + 0.5)).abs() < 1e-9);

    let decoder = record.decoder();
    assert_eq!(decoder.record(0).unwrap().sample_number(), 1);
    assert_eq!(decoder.record(95).unwrap().sample_number(), 96);
    assert_eq!(decoder.record(95).unwrap().digital_word(0), 0b11);
}

#[test]
fn test_time_axis() {
    let header = Header::parse(FAULT_CFG.as_bytes()).unwrap();
    let record = ComtradeRecord::new(header.clone(), DataFile::new(vec![0; 18]));

    let axis = record.timestamps().unwrap();
    assert_eq!(axis.len(), 96);
    assert_eq!(axis[0], header.start_time);
    assert_eq!(axis[48], timestamp_at(&header, 48).unwrap());

    // 4800Hz 下第48个采样点恰好是10ms
    let offset = axis[48] - header.start_time;
    assert_eq!(offset.num_microseconds(), Some(10_000));
    assert_eq!((axis[95] - axis[0]).num_microseconds(), Some(19_792));
}

#[test]
fn test_time_axis_without_rate() {
    let mut header = Header::parse(FAULT_CFG.as_bytes()).unwrap();
    header.sample_rates[0].rate = 0.0;
    assert!(matches!(
        timestamp_at(&header, 1),
        Err(ComtradeError::MissingSampleRate)
    ));
    header.sample_rates.clear();
    assert!(matches!(
        comtrade::timestamps(&header),
        Err(ComtradeError::MissingSampleRate)
    ));
}

#[test]
fn test_parallel_channel_decoding() {
    let dir = tempfile::tempdir().unwrap();
    let (_, cfg_path, dat_path) = write_fault_files(dir.path());
    let record = ComtradeRecord::from_readers(
        File::open(&cfg_path).unwrap(),
        File::open(&dat_path).unwrap(),
    )
    .unwrap();

    let sequential: Vec<Vec<f64>> = (1..=4)
        .map(|c| record.channel_series(c).unwrap())
        .collect();

    let parallel = record.all_channel_series();
    assert_eq!(parallel.len(), 4);
    for ((name, series), (expected_name, expected)) in parallel
        .into_iter()
        .zip(["IA", "IB", "IC", "VN"].iter().zip(&sequential))
    {
        assert_eq!(&name, expected_name);
        assert_eq!(&series.unwrap(), expected);
    }

    // 多个线程共享同一份只读数据
    let shared = Arc::new(record);
    let handles: Vec<_> = (1..=4)
        .map(|c| {
            let record = Arc::clone(&shared);
            thread::spawn(move || record.channel_series(c))
        })
        .collect();
    for (handle, expected) in handles.into_iter().zip(&sequential) {
        assert_eq!(&handle.join().unwrap().unwrap(), expected);
    }
}

#[test]
fn test_partial_failure_in_parallel_decode() {
    let header = Header::parse(FAULT_CFG.as_bytes()).unwrap();
    // 只有两条记录，远少于声明的96条
    let record = ComtradeRecord::new(header, DataFile::new(vec![0; 36]));
    for (_, series) in record.all_channel_series() {
        assert!(matches!(
            series,
            Err(ComtradeError::TruncatedData { record: 2, .. })
        ));
    }
}

#[test]
fn test_invalid_header_file() {
    let broken = FAULT_CFG.replacen("6,4A,2D", "6,4,2D", 1);
    let result = ComtradeRecord::from_readers(broken.as_bytes(), &[1u8, 2, 3][..]);
    assert!(matches!(
        result,
        Err(ComtradeError::InvalidSection { line: 2, .. })
    ));
}
