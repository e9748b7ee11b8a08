#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn be16(v: &mut Vec<u8>, x: u16) {
    v.extend_from_slice(&x.to_be_bytes());
}

fn rect(v: &mut Vec<u8>, h: u16, w: u16) {
    for x in [0, 0, h, w] {
        be16(v, x);
    }
}

fn v1(h: u16, w: u16) -> Vec<u8> {
    let mut v = vec![0u8; 512];
    be16(&mut v, 0);
    rect(&mut v, h, w);
    v.extend_from_slice(&[0x11, 0x01]);
    v
}

fn v2(h: u16, w: u16) -> Vec<u8> {
    let mut v = vec![0u8; 512];
    be16(&mut v, 0);
    rect(&mut v, h, w);
    v.extend_from_slice(&[0x00, 0x11, 0x02, 0xFF, 0x0C, 0x00, 0xFF, 0xFE, 0x00, 0x00]);
    v.extend_from_slice(&(72u32 << 16).to_be_bytes());
    v.extend_from_slice(&(72u32 << 16).to_be_bytes());
    rect(&mut v, h, w);
    v.extend_from_slice(&[0; 4]);
    v
}

fn end_v2(v: &mut Vec<u8>) {
    if v.len() % 2 == 1 {
        v.push(0);
    }
    be16(v, 0x00FF);
}

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    // V1 bitmap 8x4, raw rows
    let mut bitmap = v1(4, 8);
    bitmap.push(0x90);
    be16(&mut bitmap, 1);
    rect(&mut bitmap, 4, 8);
    rect(&mut bitmap, 4, 8);
    rect(&mut bitmap, 4, 8);
    be16(&mut bitmap, 0);
    bitmap.extend_from_slice(&[0x00, 0xFF, 0xAA, 0x55]);
    bitmap.push(0xFF);
    fs::write(format!("{dir}/v1_bitmap_8x4.pict"), &bitmap).unwrap();

    // V2 bitmap 8x3 ending on an odd offset
    let mut odd = v2(3, 8);
    be16(&mut odd, 0x0090);
    be16(&mut odd, 1);
    for _ in 0..3 {
        rect(&mut odd, 3, 8);
    }
    be16(&mut odd, 0);
    odd.extend_from_slice(&[0xFF, 0x00, 0x0F]);
    end_v2(&mut odd);
    fs::write(format!("{dir}/v2_bitmap_odd.pict"), &odd).unwrap();

    // V2 8-bit indexed 8x2, packed rows, with a clip region and comment
    let mut indexed = v2(2, 8);
    be16(&mut indexed, 0x0001);
    be16(&mut indexed, 10);
    rect(&mut indexed, 2, 8);
    be16(&mut indexed, 0x00A1);
    be16(&mut indexed, 100);
    be16(&mut indexed, 2);
    indexed.extend_from_slice(b"hi");
    be16(&mut indexed, 0x0098);
    be16(&mut indexed, 0x8008);
    rect(&mut indexed, 2, 8);
    indexed.extend_from_slice(&[0; 18]);
    be16(&mut indexed, 8);
    be16(&mut indexed, 1);
    indexed.extend_from_slice(&[0; 14]);
    indexed.extend_from_slice(&[0; 4]);
    be16(&mut indexed, 0x8000);
    be16(&mut indexed, 1);
    for (i, c) in [0u16, 0xFFFF].iter().enumerate() {
        for x in [i as u16, *c, *c, *c] {
            be16(&mut indexed, x);
        }
    }
    rect(&mut indexed, 2, 8);
    rect(&mut indexed, 2, 8);
    be16(&mut indexed, 0);
    // literal of 8, then a run of 8
    indexed.extend_from_slice(&[9, 7, 0, 1, 0, 1, 0, 1, 0, 1]);
    indexed.extend_from_slice(&[2, 0xF9, 1]);
    end_v2(&mut indexed);
    fs::write(format!("{dir}/v2_indexed_8x2.pict"), &indexed).unwrap();

    // V2 32-bit direct 4x1, RGB planes, and 16-bit direct 2x1
    for (name, pixel_size, cmp, row_bytes, row) in [
        ("v2_direct32_4x1.pict", 32u16, 3u16, 16u16, vec![13u8, 11, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]),
        ("v2_direct16_2x1.pict", 16, 3, 4, vec![0x7C, 0x00, 0x03, 0xE0]),
    ] {
        let w = row_bytes / (pixel_size / 8);
        let mut d = v2(1, w);
        be16(&mut d, 0x009A);
        d.extend_from_slice(&0xFFu32.to_be_bytes());
        be16(&mut d, 0x8000 | row_bytes);
        rect(&mut d, 1, w);
        be16(&mut d, 0);
        be16(&mut d, 4);
        d.extend_from_slice(&[0; 4]);
        d.extend_from_slice(&(72u32 << 16).to_be_bytes());
        d.extend_from_slice(&(72u32 << 16).to_be_bytes());
        be16(&mut d, 16);
        be16(&mut d, pixel_size);
        be16(&mut d, cmp);
        be16(&mut d, 8);
        d.extend_from_slice(&[0; 12]);
        rect(&mut d, 1, w);
        rect(&mut d, 1, w);
        be16(&mut d, 0);
        d.extend_from_slice(&row);
        end_v2(&mut d);
        fs::write(format!("{dir}/{name}"), &d).unwrap();
    }

    // Truncated/malformed seeds for edge coverage
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/prefix_only.bin"), vec![0u8; 512]).unwrap();
    let mut bad_marker = v1(4, 8);
    let n = bad_marker.len();
    bad_marker[n - 2..].copy_from_slice(&[0x05, 0x02]);
    fs::write(format!("{dir}/bad_marker.bin"), &bad_marker).unwrap();
    fs::write(format!("{dir}/v2_header_only.bin"), v2(4, 8)).unwrap();

    println!("Generated seed corpus in {dir}/");
}
