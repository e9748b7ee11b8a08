#![no_main]
use libfuzzer_sys::fuzz_target;
use zenpict::*;

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(16 * 1024 * 1024),
        ..Default::default()
    };

    // Every permissiveness, with and without the platform prefix: must never panic
    for p in [Permissiveness::Strict, Permissiveness::Standard, Permissiveness::Permissive] {
        let request = DecodeRequest::new(data).with_limits(&limits).with_permissiveness(p);
        let _ = request.decode(enough::Unstoppable);
        let _ = request.without_platform_prefix().decode(enough::Unstoppable);
    }

    let _ = PictInfo::from_bytes(data);
    let _ = PictInfo::from_bytes_without_prefix(data);
});
