use crate::Error;
use image::imageops::FilterType;
use image::DynamicImage;

/// 高品質なバイキュービック補間
pub const RESAMPLE_FILTER: FilterType = FilterType::CatmullRom;

/// リサイズの指定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeTarget {
    /// 長辺の最大値（縦横比を保持）
    MaxLength(u32),
    /// 幅と高さを直接指定
    Exact { width: u32, height: u32 },
}

/// 長辺を `max_length` に収めたときの寸法を計算します
///
/// 長辺がすでに `max_length` 以下の場合は元の寸法を返します。
/// 短辺は縦横比を保ったまま切り捨て（最小1px）。
pub fn fit_dimensions(width: u32, height: u32, max_length: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_length {
        return (width, height);
    }

    let shortest = width.min(height);
    let scaled = (u64::from(shortest) * u64::from(max_length) / u64::from(longest)).max(1) as u32;

    if width >= height {
        (max_length, scaled)
    } else {
        (scaled, max_length)
    }
}

/// 長辺が `max_length` になるよう縦横比を保ってリサイズします
///
/// 長辺が `max_length` 以下の画像はそのまま返します。
pub fn resize_to_fit(image: DynamicImage, max_length: u32) -> Result<DynamicImage, Error> {
    if max_length == 0 {
        return Err(Error::InvalidArgument(
            "Max length must be greater than 0".to_string(),
        ));
    }

    let (width, height) = fit_dimensions(image.width(), image.height(), max_length);
    if (width, height) == (image.width(), image.height()) {
        return Ok(image);
    }

    resize(&image, width, height)
}

/// 指定した寸法にリサイズします（縦横比は保持しない）
pub fn resize(image: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage, Error> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidArgument(format!(
            "Invalid target dimensions: {width}x{height}"
        )));
    }

    tracing::debug!(
        from_width = image.width(),
        from_height = image.height(),
        width,
        height,
        "resample image"
    );
    Ok(image.resize_exact(width, height, RESAMPLE_FILTER))
}

/// `ResizeTarget` に従ってリサイズします
pub fn resize_to(image: DynamicImage, target: ResizeTarget) -> Result<DynamicImage, Error> {
    match target {
        ResizeTarget::MaxLength(max_length) => resize_to_fit(image, max_length),
        ResizeTarget::Exact { width, height } => resize(&image, width, height),
    }
}
