#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Lie about the size in both directions as well as telling the truth.
    let n = data.len() as u64;
    let _ = autosign::classify(data, n);
    let _ = autosign::classify(data, n / 2);
    let _ = autosign::classify(data, u64::MAX);
});
