use crate::{jpeg::JPEG_SOI, Error};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, LumaA, RgbImage, RgbaImage};
use jpeg_decoder::PixelFormat;
use std::fmt;
use std::str::FromStr;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// 入出力に対応している画像フォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// 先頭のシグネチャからフォーマットを判定します
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(&JPEG_SOI) {
            Some(ImageFormat::Jpeg)
        } else if data.starts_with(&PNG_SIGNATURE) {
            Some(ImageFormat::Png)
        } else {
            None
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Jpeg => f.write_str("jpeg"),
            ImageFormat::Png => f.write_str("png"),
        }
    }
}

impl FromStr for ImageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "png" => Ok(ImageFormat::Png),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// 画像データをデコードします（JPEG / PNG）
pub fn decode(data: &[u8]) -> Result<DynamicImage, Error> {
    match ImageFormat::detect(data) {
        Some(ImageFormat::Jpeg) => decode_jpeg(data),
        Some(ImageFormat::Png) => decode_png(data),
        None => Err(Error::UnsupportedFormat(
            "Unknown image signature".to_string(),
        )),
    }
}

/// JPEGデータをデコードします
pub fn decode_jpeg(data: &[u8]) -> Result<DynamicImage, Error> {
    let mut decoder = jpeg_decoder::Decoder::new(data);
    let pixels = decoder.decode()?;
    let info = decoder
        .info()
        .ok_or_else(|| Error::Decode("Failed to get JPEG info".to_string()))?;

    let width = u32::from(info.width);
    let height = u32::from(info.height);
    if width == 0 || height == 0 {
        return Err(Error::Decode("Invalid image dimensions".to_string()));
    }

    let image = match info.pixel_format {
        PixelFormat::L8 => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
        PixelFormat::L16 => {
            let samples = pixels
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(width, height, samples)
                .map(DynamicImage::ImageLuma16)
        }
        PixelFormat::RGB24 => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
        PixelFormat::CMYK32 => {
            RgbImage::from_raw(width, height, cmyk_to_rgb(&pixels)).map(DynamicImage::ImageRgb8)
        }
        #[allow(unreachable_patterns)]
        other => {
            return Err(Error::UnsupportedFormat(format!(
                "JPEG pixel format {other:?}"
            )));
        }
    };

    tracing::debug!(width, height, format = ?info.pixel_format, "decoded JPEG");
    image.ok_or_else(|| Error::Decode("Pixel buffer does not match image size".to_string()))
}

fn cmyk_to_rgb(pixels: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(pixels.len() / 4 * 3);
    for cmyk in pixels.chunks_exact(4) {
        let k = 255 - u32::from(cmyk[3]);
        for &c in &cmyk[..3] {
            rgb.push(((255 - u32::from(c)) * k / 255) as u8);
        }
    }
    rgb
}

/// PNGデータをデコードします（8bitに正規化）
pub fn decode_png(data: &[u8]) -> Result<DynamicImage, Error> {
    let mut decoder = png::Decoder::new(data);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buf)?;
    buf.truncate(frame.buffer_size());

    let (width, height) = (frame.width, frame.height);
    let image = match frame.color_type {
        png::ColorType::Grayscale => GrayImage::from_raw(width, height, buf).map(DynamicImage::ImageLuma8),
        png::ColorType::GrayscaleAlpha => ImageBuffer::<LumaA<u8>, Vec<u8>>::from_raw(width, height, buf)
            .map(DynamicImage::ImageLumaA8),
        png::ColorType::Rgb => RgbImage::from_raw(width, height, buf).map(DynamicImage::ImageRgb8),
        png::ColorType::Rgba => RgbaImage::from_raw(width, height, buf).map(DynamicImage::ImageRgba8),
        png::ColorType::Indexed => {
            return Err(Error::Decode("Indexed PNG was not expanded".to_string()));
        }
    };

    tracing::debug!(width, height, color = ?frame.color_type, "decoded PNG");
    image.ok_or_else(|| Error::Decode("Pixel buffer does not match image size".to_string()))
}

/// 画像を指定フォーマットでエンコードします
///
/// # Arguments
/// * `image` - 画像
/// * `format` - 出力フォーマット
/// * `quality` - 品質 (0-100)。JPEGでは量子化品質（0は1として扱う）、
///   PNGでは可逆圧縮のため圧縮レベルの選択にのみ使用
pub fn encode(image: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>, Error> {
    if quality > 100 {
        return Err(Error::InvalidArgument(format!(
            "Quality must be between 0 and 100: {quality}"
        )));
    }

    let encoded = match format {
        ImageFormat::Jpeg => encode_jpeg(image, quality)?,
        ImageFormat::Png => encode_png(image, quality)?,
    };

    tracing::debug!(%format, quality, size = encoded.len(), "encoded image");
    Ok(encoded)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, Error> {
    let too_large = || Error::InvalidArgument("Image is too large for JPEG".to_string());
    let width = u16::try_from(image.width()).map_err(|_| too_large())?;
    let height = u16::try_from(image.height()).map_err(|_| too_large())?;

    let mut output = Vec::new();
    let encoder = jpeg_encoder::Encoder::new(&mut output, quality.max(1));
    match image {
        DynamicImage::ImageLuma8(gray) => {
            encoder.encode(gray.as_raw(), width, height, jpeg_encoder::ColorType::Luma)?
        }
        other => {
            let rgb = other.to_rgb8();
            encoder.encode(rgb.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)?
        }
    }
    Ok(output)
}

fn png_compression(quality: u8) -> png::Compression {
    match quality {
        90..=u8::MAX => png::Compression::Fast,
        50..=89 => png::Compression::Default,
        _ => png::Compression::Best,
    }
}

fn encode_png(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, Error> {
    let color = image.color();
    let (color_type, data) = match (color.has_color(), color.has_alpha()) {
        (false, false) => (png::ColorType::Grayscale, image.to_luma8().into_raw()),
        (false, true) => (png::ColorType::GrayscaleAlpha, image.to_luma_alpha8().into_raw()),
        (true, false) => (png::ColorType::Rgb, image.to_rgb8().into_raw()),
        (true, true) => (png::ColorType::Rgba, image.to_rgba8().into_raw()),
    };

    let mut output = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut output, image.width(), image.height());
        encoder.set_color(color_type);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png_compression(quality));
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&data)?;
        writer.finish()?;
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_str() {
        assert_eq!("JPG".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("jpeg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("png".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert!(matches!(
            "gif".parse::<ImageFormat>(),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn detect_signature() {
        assert_eq!(ImageFormat::detect(&[0xFF, 0xD8, 0xFF]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::detect(&PNG_SIGNATURE), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::detect(b"GIF89a"), None);
    }

    #[test]
    fn cmyk_conversion() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0]), vec![255, 255, 255]);
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 255]), vec![0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[255, 0, 255, 0]), vec![0, 255, 0]);
    }

    #[test]
    fn png_effort_follows_quality() {
        assert!(matches!(png_compression(10), png::Compression::Best));
        assert!(matches!(png_compression(50), png::Compression::Default));
        assert!(matches!(png_compression(100), png::Compression::Fast));
    }

    #[test]
    fn jpeg_round_trip_dimensions() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(20, 10, |x, y| {
            image::Rgb([(x * 10) as u8, (y * 20) as u8, 128])
        }));
        let encoded = encode(&image, ImageFormat::Jpeg, 80).unwrap();
        let decoded = decode(&encoded).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_fn(7, 5, |x, y| {
            image::Rgba([x as u8, y as u8, 3, 200])
        }));
        let encoded = encode(&image, ImageFormat::Png, 50).unwrap();
        assert_eq!(decode(&encoded).unwrap(), image);
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let image = DynamicImage::ImageLuma8(GrayImage::new(2, 2));
        assert!(matches!(
            encode(&image, ImageFormat::Jpeg, 101),
            Err(Error::InvalidArgument(_))
        ));
    }
}
