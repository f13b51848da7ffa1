use crate::orientation::{self, Orientation};
use crate::Error;
use std::fmt;
use std::io::{self, Write};

pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const MARKER_PREFIX: u8 = 0xFF;
const MARKER_APP0: u8 = 0xE0;
const MARKER_APP1: u8 = 0xE1;
const MARKER_APP15: u8 = 0xEF;

/// スプライス時の書き込み単位
pub const SPLICE_CHUNK_SIZE: usize = 4096;

/// 削除されたAPPnセグメントの情報
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrippedSegment {
    /// マーカーの2バイト目 (0xE0..=0xEF)
    pub marker: u8,
    /// マーカー先頭のバイトオフセット
    pub offset: usize,
    /// セグメント長（長さフィールド自身の2バイトを含む）
    pub length: u16,
}

/// `scan` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan<'a> {
    /// 最後のAPPnセグメント以降のバイト列（未加工）
    pub tail: &'a [u8],
    pub orientation: Orientation,
    pub segments: Vec<StrippedSegment>,
}

/// `inspect` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub segments: Vec<StrippedSegment>,
    pub orientation: Orientation,
    /// 残りのバイト列が始まるオフセット
    pub tail_offset: usize,
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            writeln!(
                f,
                "APP{:<2} offset={:<8} length={}",
                segment.marker - MARKER_APP0,
                segment.offset,
                segment.length
            )?;
        }
        writeln!(
            f,
            "orientation={} ({:?})",
            self.orientation.exif_value(),
            self.orientation
        )?;
        write!(
            f,
            "image data starts at offset {} ({} bytes removed)",
            self.tail_offset,
            self.tail_offset.saturating_sub(JPEG_SOI.len())
        )
    }
}

/// 読み取り位置を持つバイト列
struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    /// 2バイト読めない場合は位置を動かさずに `None` を返す
    fn read_marker(&mut self) -> Option<[u8; 2]> {
        if self.remaining() < 2 {
            return None;
        }
        let first = self.read_u8()?;
        let second = self.read_u8()?;
        Some([first, second])
    }

    fn read_u16_be(&mut self) -> Option<u16> {
        self.read_marker().map(u16::from_be_bytes)
    }

    /// `n` バイト進めて読み飛ばした範囲を返す。末尾を超える場合は `None`
    fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        if n > self.remaining() {
            return None;
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Some(bytes)
    }

    fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    fn rewind(&mut self, n: usize) {
        self.seek(self.pos.saturating_sub(n));
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

fn is_app_marker(marker: [u8; 2]) -> bool {
    marker[0] == MARKER_PREFIX && (MARKER_APP0..=MARKER_APP15).contains(&marker[1])
}

/// JPEGの先頭に連続するAPPnセグメント（EXIF, JFIF, XMP, ICC等）を読み飛ばします
///
/// # Arguments
/// * `data` - JPEG画像のバイトデータ
///
/// # Returns
/// * `Ok(Scan)` - 残りのバイト列とEXIFのオリエンテーション
/// * `Err(Error)` - エラー
///
/// # Details
/// - SOIで始まらないデータは `InvalidFormat`
/// - 長さが2未満、または末尾を超えるセグメントは `MalformedSegment`
/// - APP1のEXIFからオリエンテーションを抽出（複数ある場合は最後のものを採用）
/// - APPn以外のマーカーに到達した時点で走査を終了
pub fn scan(data: &[u8]) -> Result<Scan<'_>, Error> {
    let mut cursor = ByteCursor::new(data);

    if cursor.read_marker() != Some(JPEG_SOI) {
        return Err(Error::InvalidFormat("Not a valid JPEG file".to_string()));
    }

    let mut segments = Vec::new();
    let mut orientation_value: Option<u16> = None;

    while let Some(marker) = cursor.read_marker() {
        if !is_app_marker(marker) {
            // APPn以外のマーカーは残りのデータとしてそのまま残す
            cursor.rewind(2);
            break;
        }

        let offset = cursor.position() - 2;
        let length = cursor.read_u16_be().ok_or_else(|| {
            Error::MalformedSegment(format!(
                "Truncated length field for marker 0x{:02X} at offset {offset}",
                marker[1]
            ))
        })?;

        if length < 2 {
            return Err(Error::MalformedSegment(format!(
                "Invalid segment size {length} for marker 0x{:02X} at offset {offset}",
                marker[1]
            )));
        }

        let payload = cursor.read_bytes(length as usize - 2).ok_or_else(|| {
            Error::MalformedSegment(format!(
                "Segment 0x{:02X} at offset {offset} extends beyond file",
                marker[1]
            ))
        })?;

        if marker[1] == MARKER_APP1 {
            if let Some(value) = orientation::find_orientation(payload) {
                orientation_value = Some(value);
            }
        }

        tracing::debug!(marker = marker[1], offset, length, "skip APPn segment");
        segments.push(StrippedSegment {
            marker: marker[1],
            offset,
            length,
        });
    }

    let orientation = orientation_value
        .map(Orientation::from_exif)
        .unwrap_or_default();
    tracing::debug!(?orientation, tail = cursor.remaining(), "scan finished");

    Ok(Scan {
        tail: cursor.rest(),
        orientation,
        segments,
    })
}

/// SOIマーカーに続けて `tail` をそのまま書き込みます
///
/// 書き込んだバイト数を返します。
pub fn splice<W: Write>(tail: &[u8], mut writer: W) -> io::Result<usize> {
    writer.write_all(&JPEG_SOI)?;
    let mut written = JPEG_SOI.len();
    for chunk in tail.chunks(SPLICE_CHUNK_SIZE) {
        writer.write_all(chunk)?;
        written += chunk.len();
    }
    writer.flush()?;
    Ok(written)
}

/// `splice` のメモリ版
pub fn splice_to_vec(tail: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(tail.len() + JPEG_SOI.len());
    output.extend_from_slice(&JPEG_SOI);
    output.extend_from_slice(tail);
    output
}

/// JPEG画像からAPPnメタデータセグメントを削除します
///
/// デコードは行わず、バイト列のみを扱います。オリエンテーションも削除されるため、
/// 向きを保持したい場合は [`crate::remove_metadata`] を使用してください。
pub fn strip_metadata(data: &[u8]) -> Result<Vec<u8>, Error> {
    let scan = scan(data)?;
    Ok(splice_to_vec(scan.tail))
}

/// 削除対象のセグメントとオリエンテーションを調べます
pub fn inspect(data: &[u8]) -> Result<ScanReport, Error> {
    let scan = scan(data)?;
    Ok(ScanReport {
        tail_offset: data.len() - scan.tail.len(),
        segments: scan.segments,
        orientation: scan.orientation,
    })
}
