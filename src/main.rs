use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use web_image_strip::resize::ResizeTarget;
use web_image_strip::{pipeline, ImageFormat};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Remove APPn metadata and write the upright image
    Strip {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value = "jpeg")]
        format: ImageFormat,
        #[arg(long, default_value_t = 90, value_parser = clap::value_parser!(u8).range(0..=100))]
        quality: u8,
    },
    /// Resize by the longest side or to exact dimensions
    Resize {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, conflicts_with_all = ["width", "height"], required_unless_present_all = ["width", "height"])]
        max: Option<u32>,
        #[arg(long, requires = "height")]
        width: Option<u32>,
        #[arg(long, requires = "width")]
        height: Option<u32>,
        #[arg(long, default_value = "jpeg")]
        format: ImageFormat,
        #[arg(long, default_value_t = 90, value_parser = clap::value_parser!(u8).range(0..=100))]
        quality: u8,
    },
    /// Re-encode at a quality factor (overwrites the input without an output path)
    Compress {
        input: PathBuf,
        output: Option<PathBuf>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        quality: u8,
        #[arg(long, default_value = "jpeg")]
        format: ImageFormat,
    },
    /// List the metadata segments that would be removed
    Inspect { input: PathBuf },
}

/// 実行結果として標準出力に表示する文字列を返す
fn run(command: Command) -> Result<Option<String>, Box<dyn Error>> {
    match command {
        Command::Strip {
            input,
            output,
            format,
            quality,
        } => pipeline::strip_file(&input, &output, format, quality)?,
        Command::Resize {
            input,
            output,
            max,
            width,
            height,
            format,
            quality,
        } => {
            let target = match (max, width, height) {
                (Some(max), _, _) => ResizeTarget::MaxLength(max),
                (None, Some(width), Some(height)) => ResizeTarget::Exact { width, height },
                _ => return Err("either --max or --width and --height is required".into()),
            };
            pipeline::resize_file(&input, &output, target, format, quality)?
        }
        Command::Compress {
            input,
            output,
            quality,
            format,
        } => match output {
            Some(output) => pipeline::compress(&input, &output, quality, format)?,
            None => pipeline::compress_in_place(&input, quality, format)?,
        },
        Command::Inspect { input } => {
            return Ok(Some(pipeline::inspect_file(&input)?.to_string()));
        }
    }
    Ok(None)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Some(report) = run(cli.command)? {
        println!("{report}");
    }
    Ok(())
}
