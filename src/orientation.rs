use image::DynamicImage;

const EXIF_HEADER: &[u8] = b"Exif\0\0";
const TAG_ORIENTATION: u16 = 0x0112;
const IFD_ENTRY_SIZE: usize = 12;

/// EXIFのオリエンテーション (0x0112) に対応する回転・反転
///
/// 回転はすべて時計回り。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// 1: 変換なし
    #[default]
    Identity,
    /// 2: 左右反転
    FlipHorizontal,
    /// 3: 180度回転
    Rotate180,
    /// 4: 180度回転 + 左右反転
    Rotate180FlipHorizontal,
    /// 5: 90度回転 + 左右反転
    Rotate90FlipHorizontal,
    /// 6: 90度回転
    Rotate90,
    /// 7: 270度回転 + 左右反転
    Rotate270FlipHorizontal,
    /// 8: 270度回転
    Rotate270,
}

impl Orientation {
    /// EXIFの値から変換します。1..=8以外は `Identity`
    pub fn from_exif(value: u16) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::Rotate180FlipHorizontal,
            5 => Orientation::Rotate90FlipHorizontal,
            6 => Orientation::Rotate90,
            7 => Orientation::Rotate270FlipHorizontal,
            8 => Orientation::Rotate270,
            _ => Orientation::Identity,
        }
    }

    pub fn exif_value(self) -> u16 {
        match self {
            Orientation::Identity => 1,
            Orientation::FlipHorizontal => 2,
            Orientation::Rotate180 => 3,
            Orientation::Rotate180FlipHorizontal => 4,
            Orientation::Rotate90FlipHorizontal => 5,
            Orientation::Rotate90 => 6,
            Orientation::Rotate270FlipHorizontal => 7,
            Orientation::Rotate270 => 8,
        }
    }

    /// 幅と高さが入れ替わるか
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Rotate90
                | Orientation::Rotate90FlipHorizontal
                | Orientation::Rotate270
                | Orientation::Rotate270FlipHorizontal
        )
    }

    /// 画像に変換を適用します
    pub fn apply(self, image: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Identity => image,
            Orientation::FlipHorizontal => image.fliph(),
            Orientation::Rotate180 => image.rotate180(),
            Orientation::Rotate180FlipHorizontal => image.rotate180().fliph(),
            Orientation::Rotate90FlipHorizontal => image.rotate90().fliph(),
            Orientation::Rotate90 => image.rotate90(),
            Orientation::Rotate270FlipHorizontal => image.rotate270().fliph(),
            Orientation::Rotate270 => image.rotate270(),
        }
    }
}

/// APP1ペイロードからオリエンテーションを抽出します
///
/// 見つからない場合は `Identity`。
pub fn extract_orientation(payload: &[u8]) -> Orientation {
    find_orientation(payload)
        .map(Orientation::from_exif)
        .unwrap_or_default()
}

#[derive(Clone, Copy)]
enum Endian {
    Little,
    Big,
}

impl Endian {
    fn u16(self, bytes: &[u8], offset: usize) -> Option<u16> {
        let raw = [*bytes.get(offset)?, *bytes.get(offset.checked_add(1)?)?];
        Some(match self {
            Endian::Little => u16::from_le_bytes(raw),
            Endian::Big => u16::from_be_bytes(raw),
        })
    }

    fn u32(self, bytes: &[u8], offset: usize) -> Option<u32> {
        let raw: [u8; 4] = bytes.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
        Some(match self {
            Endian::Little => u32::from_le_bytes(raw),
            Endian::Big => u32::from_be_bytes(raw),
        })
    }
}

/// APP1ペイロード（"Exif\0\0" + TIFF）のIFD0からオリエンテーションの生の値を探します
///
/// 同じタグが複数ある場合は最後のものを採用します。
pub(crate) fn find_orientation(payload: &[u8]) -> Option<u16> {
    let tiff = payload.strip_prefix(EXIF_HEADER)?;

    // Tiffヘッダーを確認 (II or MM)
    let endian = match tiff.get(0..2)? {
        b"II" => Endian::Little,
        b"MM" => Endian::Big,
        _ => return None,
    };

    if endian.u16(tiff, 2)? != 42 {
        return None;
    }

    let ifd0_offset = usize::try_from(endian.u32(tiff, 4)?).ok()?;
    if ifd0_offset > tiff.len() {
        return None;
    }
    let entry_count = endian.u16(tiff, ifd0_offset)? as usize;

    let mut orientation = None;
    for i in 0..entry_count {
        // ifd0_offset <= tiff.len() なので以降の加算は溢れない
        let entry_offset = ifd0_offset + 2 + i * IFD_ENTRY_SIZE;
        if entry_offset + IFD_ENTRY_SIZE > tiff.len() {
            break;
        }

        if endian.u16(tiff, entry_offset)? == TAG_ORIENTATION {
            // SHORT型の値は値フィールドの先頭2バイトに格納される
            orientation = endian.u16(tiff, entry_offset + 8);
        }
    }

    tracing::debug!(?orientation, entries = entry_count, "read IFD0");
    orientation
}
