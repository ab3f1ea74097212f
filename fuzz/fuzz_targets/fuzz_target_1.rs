#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate plimsoll;

use plimsoll::{Columns, Dbs, LineReader, ReplayTransport, Rmc, SentenceParser};

fuzz_target!(|data: &[u8]| {
    let mut transport = ReplayTransport::new().feed(data);
    let reader = LineReader::default();
    let mut rmc = SentenceParser::new(Rmc::new().unwrap());
    let mut dbs = SentenceParser::new(Dbs::new().unwrap());
    let mut columns = SentenceParser::new(Columns::new(&["Scan", "Pres", "Temp"]).unwrap());

    while let Ok(line) = reader.read_line(&mut transport) {
        let content = line.content();
        if rmc.parse_bytes(content).is_err() {
            continue;
        }
        let _ = rmc.reading();
        let _ = rmc.date_time();
        let _ = dbs.parse_bytes(content);
        let _ = dbs.reading();
        let _ = columns.parse_bytes(content);
        let _ = columns.reading();
    }
});
