#![no_main]

use chunked_datastream::fuzz::chunking::*;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: FuzzCase| harness(data));
