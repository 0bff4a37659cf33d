#![no_main]

use chunked_datastream::fuzz::round_trip::*;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: FuzzCase| harness(data));
