#![no_main]

use libfuzzer_sys::fuzz_target;
use zeekspool_core::translate::parse_dns_answers;

fuzz_target!(|data: &[u8]| {
    // QueryResults는 UTF-8 문자열로 도착한다
    if let Ok(raw) = std::str::from_utf8(data) {
        let _ = parse_dns_answers(raw);
    }
});
