#![no_main]

use arc_import::Normalizer;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(runtime) = tokio::runtime::Builder::new_current_thread().build() else {
        return;
    };
    // Any recognized input must come out marked and serializable.
    if let Ok(out) = runtime.block_on(Normalizer::new(3).normalize_str(text)) {
        assert!(out.bundle.is_ready());
        let _ = serde_json::to_string(&out.bundle);
    }
});
