#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate cdns;
use cdns::File;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut file) = File::parse(data.to_vec()) {
        while let Ok(Some(_block)) = file.open_block() {}
    }
});
