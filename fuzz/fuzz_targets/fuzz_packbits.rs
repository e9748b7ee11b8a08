#![no_main]
use libfuzzer_sys::fuzz_target;
use zenpict::packbits;

fuzz_target!(|data: &[u8]| {
    // Arbitrary input must never panic the decoders
    let mut out = vec![0u8; data.len() * 2];
    let _ = packbits::decode_into(data, &mut out);
    let mut words = vec![0u16; data.len()];
    let _ = packbits::decode16_into(data, &mut words);

    // Encoding is lossless and the dry run agrees with the real encode
    let encoded = packbits::encode(data);
    assert!(encoded.len() <= packbits::max_encoded_len(data.len()));
    let mut scratch = Vec::new();
    assert_eq!(packbits::encoded_len(data, &mut scratch), encoded.len());
    let decoded = packbits::decode(&encoded, data.len()).expect("own output must decode");
    assert_eq!(decoded, data);
});
