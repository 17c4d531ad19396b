use image::{ImageFormat, RgbaImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// Writes a row-major RGBA8 buffer, the format is picked from the file extension.
pub fn save_image(path: &Path, width: u32, height: u32, rgba: &[u8]) -> Result<(), OutputError> {
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(OutputError::BufferSize {
            expected,
            actual: rgba.len(),
        });
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => dump_rendered_to_png(path, width, height, rgba),
        "ppm" => {
            let mut out_file = BufWriter::new(File::create(path)?);
            dump_rendered_to_ppm(&mut out_file, width, height, rgba)?;
            out_file.flush()?;
            Ok(())
        }
        _ => Err(OutputError::UnsupportedFormat(extension)),
    }
}

fn dump_rendered_to_png(
    path: &Path,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> Result<(), OutputError> {
    let img = RgbaImage::from_raw(width, height, rgba.to_vec()).ok_or(
        OutputError::BufferSize {
            expected: width as usize * height as usize * 4,
            actual: rgba.len(),
        },
    )?;
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Binary PPM, alpha is dropped.
pub fn dump_rendered_to_ppm<W: Write>(
    out: &mut W,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> Result<(), OutputError> {
    out.write_all(b"P6\n")?;
    out.write_all(format!("{} {}\n", width, height).as_bytes())?;
    out.write_all(b"255\n")?;
    let rgb = rgba
        .chunks_exact(4)
        .flat_map(|pixel| pixel[..3].iter().copied())
        .collect::<Vec<u8>>();
    out.write_all(&rgb)?;
    Ok(())
}
