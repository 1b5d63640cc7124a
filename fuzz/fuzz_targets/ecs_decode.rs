#![no_main]

use libfuzzer_sys::fuzz_target;
use zeekspool_ingest::decode::{decode_record, sniff_metadata};

fuzz_target!(|data: &[u8]| {
    let metadata = sniff_metadata(data);
    let _ = decode_record(data, &metadata);
});
