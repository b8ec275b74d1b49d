use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use renderer::decode_texture_with_info;

/// Decodes `path` the same way the renderer would and describes the result.
pub fn inspect(path: &Path, out: &mut impl Write) -> Result<()> {
    let decoded = decode_texture_with_info(path)
        .with_context(|| format!("failed to decode texture {}", path.display()))?;
    let image = &decoded.image;

    writeln!(out, "file:   {}", path.display())?;
    writeln!(out, "size:   {}x{}", image.width(), image.height())?;

    match &decoded.pcx_header {
        Some(header) => {
            writeln!(out, "format: pcx v{}", header.version)?;
            writeln!(
                out,
                "layout: {} plane(s) x {} bpp, {} bytes per line, {}",
                header.planes,
                header.bits_per_pixel,
                header.bytes_per_line,
                if header.rle { "rle" } else { "raw" }
            )?;
        }
        None => writeln!(out, "format: image")?,
    }

    let pixels = image.width() as u64 * image.height() as u64;
    if pixels > 0 {
        let mut sum = [0u64; 3];
        for pixel in image.pixels() {
            for (total, channel) in sum.iter_mut().zip(pixel.0) {
                *total += u64::from(channel);
            }
        }
        writeln!(
            out,
            "mean:   ({}, {}, {})",
            sum[0] / pixels,
            sum[1] / pixels,
            sum[2] / pixels
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// 2x1 single-plane PCX, RLE, with a palette mapping 0 to red and 1 to blue.
    fn tiny_pcx() -> Vec<u8> {
        let mut bytes = vec![0u8; 128];
        bytes[0] = 0x0A;
        bytes[1] = 5;
        bytes[2] = 1;
        bytes[3] = 8;
        bytes[8] = 1; // xmax
        bytes[65] = 1;
        bytes[66] = 2; // bytes per line
        bytes.extend_from_slice(&[0x00, 0x01]);
        bytes.push(0x0C);
        let mut palette = vec![0u8; 768];
        palette[0] = 255;
        palette[5] = 255;
        bytes.extend_from_slice(&palette);
        bytes
    }

    #[test]
    fn describes_pcx_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.PCX");
        fs::write(&path, tiny_pcx()).unwrap();

        let mut out = Vec::new();
        inspect(&path, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("size:   2x1"), "{text}");
        assert!(text.contains("format: pcx v5"), "{text}");
        assert!(text.contains("1 plane(s) x 8 bpp, 2 bytes per line, rle"), "{text}");
        assert!(text.contains("mean:   (127, 0, 127)"), "{text}");
    }

    #[test]
    fn missing_files_fail() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();
        assert!(inspect(&dir.path().join("nope.pcx"), &mut out).is_err());
        assert!(out.is_empty());
    }
}
