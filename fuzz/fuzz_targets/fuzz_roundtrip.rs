#![no_main]
use libfuzzer_sys::fuzz_target;
use zenpict::*;

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(4 * 1024 * 1024),
        ..Default::default()
    };
    let Ok(surface) = DecodeRequest::new(data)
        .with_limits(&limits)
        .with_permissiveness(Permissiveness::Permissive)
        .decode(enough::Unstoppable)
    else {
        return;
    };

    // A decoded surface always converts and always encodes
    let rgb = surface.to_rgb8().expect("decoded surface must convert");
    assert_eq!(rgb.len(), surface.width() as usize * surface.height() as usize * 3);

    let raw = encode(&surface, false, enough::Unstoppable);
    let packed = encode(&surface, true, enough::Unstoppable);
    let (raw, packed) = match (raw, packed) {
        (Ok(r), Ok(p)) => (r, p),
        (Err(EncodeError::PreconditionViolation(_)), _) => return,
        (r, p) => panic!("encode failed: {:?} / {:?}", r.err(), p.err()),
    };

    assert_eq!(&raw[..4], b"8BPS");
    assert_eq!(raw[..26], packed[..26], "headers differ between compression modes");

    // The length table must account for exactly the packed payload
    let palette_len = u32::from_be_bytes([raw[26], raw[27], raw[28], raw[29]]) as usize;
    let flag_at = 26 + 4 + palette_len + 8;
    assert_eq!(&packed[flag_at..flag_at + 2], &[0, 1]);
    let channels = u16::from_be_bytes([raw[12], raw[13]]) as usize;
    let entries = channels * surface.height() as usize;
    let table_end = flag_at + 2 + entries * 2;
    let total: usize = packed[flag_at + 2..table_end]
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]) as usize)
        .sum();
    assert_eq!(packed.len() - table_end, total, "length table does not match payload");
});
