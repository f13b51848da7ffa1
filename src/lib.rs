pub mod codec;
pub mod jpeg;
pub mod orientation;
pub mod pipeline;
pub mod resize;

use std::path::PathBuf;

pub use codec::ImageFormat;
pub use image::DynamicImage;
pub use orientation::Orientation;
pub use pipeline::{compress, compress_in_place, remove_metadata, remove_metadata_from_bytes};
pub use resize::{resize, resize_to_fit};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 無効な画像フォーマット
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    /// セグメント長が不正
    #[error("Malformed segment: {0}")]
    MalformedSegment(String),
    /// デコードエラー
    #[error("Decode error: {0}")]
    Decode(String),
    /// エンコードエラー
    #[error("Encode error: {0}")]
    Encode(String),
    /// 未対応のフォーマット
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    /// 不正な引数
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// ファイルが存在しない
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/Oエラー
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// ファイル操作のI/Oエラーを変換します（NotFoundはパス付きで返す）
    pub(crate) fn from_fs(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(path.into())
        } else {
            Error::Io(err)
        }
    }
}

impl From<jpeg_decoder::Error> for Error {
    fn from(err: jpeg_decoder::Error) -> Self {
        Error::Decode(format!("JPEG decode error: {err}"))
    }
}

impl From<jpeg_encoder::EncodingError> for Error {
    fn from(err: jpeg_encoder::EncodingError) -> Self {
        Error::Encode(format!("JPEG encode error: {err}"))
    }
}

impl From<png::DecodingError> for Error {
    fn from(err: png::DecodingError) -> Self {
        Error::Decode(format!("PNG decode error: {err}"))
    }
}

impl From<png::EncodingError> for Error {
    fn from(err: png::EncodingError) -> Self {
        Error::Encode(format!("PNG encode error: {err}"))
    }
}
