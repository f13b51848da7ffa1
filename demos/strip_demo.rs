use std::env;
use std::fs;
use web_image_strip::{codec, jpeg, remove_metadata, resize_to_fit, ImageFormat};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let input = env::args().nth(1).ok_or("usage: strip_demo <input.jpg>")?;

    println!("=== Metadata Strip Demo ===\n");

    let data = fs::read(&input)?;
    println!("Original JPEG size: {} bytes", data.len());

    let report = jpeg::inspect(&data)?;
    for segment in &report.segments {
        println!(
            "  APP{} at offset {} ({} bytes)",
            segment.marker - 0xE0,
            segment.offset,
            segment.length as usize + 2
        );
    }
    println!("Orientation: {:?}", report.orientation);

    let stripped = jpeg::strip_metadata(&data)?;
    println!("Stripped size:      {} bytes", stripped.len());

    let image = remove_metadata(&input)?;
    println!("Upright image:      {}x{}", image.width(), image.height());

    let thumbnail = resize_to_fit(image, 512)?;
    println!(
        "Thumbnail:          {}x{}",
        thumbnail.width(),
        thumbnail.height()
    );

    for quality in [10u8, 50, 90] {
        let encoded = codec::encode(&thumbnail, ImageFormat::Jpeg, quality)?;
        println!("  quality {quality:>3}: {} bytes", encoded.len());
    }

    Ok(())
}
