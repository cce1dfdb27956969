#![no_main]

use arc_import::intake::{FileIntake, ImportFile};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let file = ImportFile::new("input.json", data.to_vec());
    let _ = FileIntake::new().read(&file);
});
