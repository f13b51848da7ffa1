#![allow(dead_code)]

use std::io::Cursor;

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// 左半分が黒、右半分が白のRGB画像をJPEGにエンコードします（先頭にJFIFのAPP0を含む）
pub fn encoded_jpeg(width: u16, height: u16) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
    for _y in 0..height {
        for x in 0..width {
            let v = if x < width / 2 { 0 } else { 255 };
            pixels.extend_from_slice(&[v, v, v]);
        }
    }
    let mut output = Vec::new();
    let encoder = jpeg_encoder::Encoder::new(&mut output, 95);
    encoder
        .encode(&pixels, width, height, jpeg_encoder::ColorType::Rgb)
        .expect("Failed to encode test JPEG");
    output
}

/// 擬似乱数ノイズの画像をJPEGにエンコードします（品質による差が出やすい）
pub fn noisy_jpeg(width: u16, height: u16) -> Vec<u8> {
    let mut state: u32 = 0x1234_5678;
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let noise = (state >> 24) as u8;
            pixels.extend_from_slice(&[
                noise,
                (x as u8).wrapping_mul(3) ^ noise,
                (y as u8).wrapping_mul(5),
            ]);
        }
    }
    let mut output = Vec::new();
    let encoder = jpeg_encoder::Encoder::new(&mut output, 100);
    encoder
        .encode(&pixels, width, height, jpeg_encoder::ColorType::Rgb)
        .expect("Failed to encode test JPEG");
    output
}

/// SOI直後のAPPnセグメントを取り除きます
pub fn without_app_segments(data: &[u8]) -> Vec<u8> {
    let mut pos = 2;
    while pos + 4 <= data.len() && data[pos] == 0xFF && (0xE0..=0xEF).contains(&data[pos + 1]) {
        let size = ((data[pos + 2] as usize) << 8) | data[pos + 3] as usize;
        pos += 2 + size;
    }
    let mut output = vec![0xFF, 0xD8];
    output.extend_from_slice(&data[pos..]);
    output
}

/// APPnセグメントを作成します
pub fn app_segment(marker: u8, payload: &[u8]) -> Vec<u8> {
    let size = (payload.len() + 2) as u16;
    let mut segment = vec![0xFF, marker];
    segment.extend_from_slice(&size.to_be_bytes());
    segment.extend_from_slice(payload);
    segment
}

/// SOIの直後にセグメントを挿入します
pub fn insert_after_soi(data: &[u8], segments: &[Vec<u8>]) -> Vec<u8> {
    let mut output = data[0..2].to_vec();
    for segment in segments {
        output.extend_from_slice(segment);
    }
    output.extend_from_slice(&data[2..]);
    output
}

/// オリエンテーションのみを含むTIFFデータ
pub fn orientation_tiff(orientation: u16, little_endian: bool) -> Vec<u8> {
    let field = Field {
        tag: Tag::Orientation,
        ifd_num: In::PRIMARY,
        value: Value::Short(vec![orientation]),
    };
    let mut writer = Writer::new();
    writer.push_field(&field);
    let mut buf = Cursor::new(Vec::new());
    writer
        .write(&mut buf, little_endian)
        .expect("Failed to write EXIF");
    buf.into_inner()
}

/// "Exif\0\0" + TIFF のAPP1ペイロード
pub fn exif_payload(orientation: u16, little_endian: bool) -> Vec<u8> {
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&orientation_tiff(orientation, little_endian));
    payload
}

/// SOSより前にAPPnマーカーが存在するか
pub fn has_app_marker(data: &[u8]) -> bool {
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return false;
        }
        let marker = data[pos + 1];
        if (0xE0..=0xEF).contains(&marker) {
            return true;
        }
        // SOSマーカー以降は画像データ
        if marker == 0xDA {
            return false;
        }
        let size = ((data[pos + 2] as usize) << 8) | data[pos + 3] as usize;
        pos += 2 + size;
    }
    false
}
