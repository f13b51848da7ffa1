use crate::codec::{self, ImageFormat};
use crate::jpeg::ScanReport;
use crate::resize::{self, ResizeTarget};
use crate::{jpeg, Error};
use image::DynamicImage;
use std::fs;
use std::path::Path;

fn read_file(path: &Path) -> Result<Vec<u8>, Error> {
    fs::read(path).map_err(|err| Error::from_fs(err, path))
}

fn write_file(path: &Path, data: &[u8]) -> Result<(), Error> {
    fs::write(path, data).map_err(|err| Error::from_fs(err, path))
}

/// JPEGファイルからメタデータを削除してデコードします
///
/// EXIFのオリエンテーションは削除前に読み取り、デコード後の画像に適用します。
///
/// # Errors
/// * `NotFound` - ファイルが存在しない
/// * `InvalidFormat` - JPEGではない
/// * `MalformedSegment` - セグメント長が不正
/// * `Decode` - メタデータ削除後のデータをデコードできない
#[tracing::instrument(skip_all)]
pub fn remove_metadata(path: impl AsRef<Path>) -> Result<DynamicImage, Error> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "remove metadata");
    let data = read_file(path)?;
    remove_metadata_from_bytes(&data)
}

/// `remove_metadata` のメモリ版
pub fn remove_metadata_from_bytes(data: &[u8]) -> Result<DynamicImage, Error> {
    let scan = jpeg::scan(data)?;
    let cleaned = jpeg::splice_to_vec(scan.tail);
    let image = codec::decode_jpeg(&cleaned)?;

    tracing::debug!(
        stripped = scan.segments.len(),
        removed_bytes = data.len() - cleaned.len(),
        orientation = ?scan.orientation,
        "metadata removed"
    );
    Ok(scan.orientation.apply(image))
}

/// 画像ファイルを正しい向きで読み込みます
///
/// JPEGはメタデータを削除してオリエンテーションを適用し、PNGはそのままデコードします。
pub fn load(path: impl AsRef<Path>) -> Result<DynamicImage, Error> {
    let data = read_file(path.as_ref())?;
    match ImageFormat::detect(&data) {
        Some(ImageFormat::Jpeg) => remove_metadata_from_bytes(&data),
        _ => codec::decode(&data),
    }
}

/// 画像を指定した品質で再エンコードして保存します
///
/// # Arguments
/// * `source` - 元画像のパス（JPEG / PNG）
/// * `dest` - 保存先のパス
/// * `quality` - 品質 (0-100)
/// * `format` - 出力フォーマット
#[tracing::instrument(skip_all)]
pub fn compress(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    quality: u8,
    format: ImageFormat,
) -> Result<(), Error> {
    if quality > 100 {
        return Err(Error::InvalidArgument(format!(
            "Quality must be between 0 and 100: {quality}"
        )));
    }

    let (source, dest) = (source.as_ref(), dest.as_ref());
    let image = load(source)?;
    let encoded = codec::encode(&image, format, quality)?;
    write_file(dest, &encoded)?;

    tracing::debug!(
        source = %source.display(),
        dest = %dest.display(),
        size = encoded.len(),
        "compressed image written"
    );
    Ok(())
}

/// 元のファイルを上書きして再エンコードします
pub fn compress_in_place(
    path: impl AsRef<Path>,
    quality: u8,
    format: ImageFormat,
) -> Result<(), Error> {
    compress(path.as_ref(), path.as_ref(), quality, format)
}

/// メタデータを削除し、正しい向きの画像を指定フォーマットで保存します
pub fn strip_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    format: ImageFormat,
    quality: u8,
) -> Result<(), Error> {
    let image = remove_metadata(input)?;
    write_file(output.as_ref(), &codec::encode(&image, format, quality)?)
}

/// 画像を読み込んでリサイズし、指定フォーマットで保存します
pub fn resize_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    target: ResizeTarget,
    format: ImageFormat,
    quality: u8,
) -> Result<(), Error> {
    let image = resize::resize_to(load(input)?, target)?;
    write_file(output.as_ref(), &codec::encode(&image, format, quality)?)
}

/// JPEGファイルの削除対象セグメントを調べます
pub fn inspect_file(path: impl AsRef<Path>) -> Result<ScanReport, Error> {
    let data = read_file(path.as_ref())?;
    jpeg::inspect(&data)
}
