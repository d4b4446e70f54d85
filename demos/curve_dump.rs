//! Decode a synthetic curve transfer and print the points. Runs without any
//! hardware attached; useful for checking the scaling maths against a known
//! preamble.

use tracer_bench::curve::Curve;
use tracer_bench::preamble::WaveformPreamble;

const PREAMBLE: &str = "WFMPRE WFID:\"INDEX 1/VERT 500MA/HORIZ 1V/STEP 5V\
/OFFSET 0.00V/BGM 100mS/VCS 12.3/TEXT /HSNS VCE\",ENCDG:BIN,NR.PT:4,\
PT.FMT:XY,XMULT:+1.0E-2,XZERO:0,XOFF:0,XUNIT:V,YMULT:+5.0E-3,YZERO:0,\
YOFF:0,YUNIT:A,BYT/NR:2,BN.FMT:RP,BIT/NR:10,CRVCHK:CHKSMO,LN.FMT:DOT";

fn main() {
    env_logger::init();

    let preamble = WaveformPreamble::parse(PREAMBLE).expect("Failed to parse preamble");
    println!("Waveform: {preamble:#?}");

    // A four-point curve ramping up and collapsing back to the origin.
    let point_data: &[u8] = &[
        0x00, 0x64, 0x00, 0x32, // (100, 50)
        0x01, 0x2C, 0x00, 0xC8, // (300, 200)
        0x03, 0xFF, 0x03, 0xFF, // (1023, 1023)
        0x00, 0x00, 0x00, 0x00, // (0, 0)
    ];

    let mut raw = vec![b'%'; 25];
    raw.extend_from_slice(&((point_data.len() + 1) as u16).to_be_bytes());
    raw.extend_from_slice(point_data);
    let sum = raw[25..].iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    raw.push(0u8.wrapping_sub(sum));

    assert_eq!(raw.len(), Curve::expected_len(preamble.sample_count));

    let curve = Curve::decode(preamble, raw).expect("Failed to decode curve");
    println!("Checksum OK: {}", curve.checksum_ok());

    let units = (
        curve.preamble().horizontal_units.clone(),
        curve.preamble().vertical_units.clone(),
    );
    for (i, (x, y)) in curve.points().iter().enumerate() {
        println!("point {i}: {x:.4} {} / {y:.4} {}", units.0, units.1);
    }
}
