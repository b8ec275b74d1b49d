//! Decoder for ZSoft PCX images.
//!
//! Handles the layouts seen in practice for texture art: 8-bit paletted
//! (one plane with a trailing 256-color palette), 24-bit RGB (three planes)
//! and 32-bit RGBA (four planes, alpha discarded). Scanlines are RLE encoded
//! per plane and padded to `bytes_per_line`.

use std::path::Path;

use image::RgbImage;

const HEADER_LEN: usize = 128;
const MANUFACTURER: u8 = 0x0A;
const PALETTE_MARKER: u8 = 0x0C;
const PALETTE_LEN: usize = 256 * 3;
/// Longest run a single RLE count byte can encode.
const MAX_RUN: usize = 0x3F;

#[derive(Debug, thiserror::Error)]
pub enum PcxError {
    #[error("file is {0} bytes, shorter than a PCX header")]
    Truncated(usize),
    #[error("not a PCX file (manufacturer byte {0:#04x})")]
    BadMagic(u8),
    #[error("unsupported PCX encoding {0}")]
    UnsupportedEncoding(u8),
    #[error("unsupported PCX layout: {bits_per_pixel} bits per pixel, {planes} planes")]
    UnsupportedLayout { bits_per_pixel: u8, planes: u8 },
    #[error("invalid PCX window {xmin},{ymin}..{xmax},{ymax}")]
    BadWindow {
        xmin: u16,
        ymin: u16,
        xmax: u16,
        ymax: u16,
    },
    #[error("bytes per line ({bytes_per_line}) is smaller than the image width ({width})")]
    ShortScanline { bytes_per_line: u16, width: u32 },
    #[error("pixel data ended after {decoded} of {expected} bytes")]
    ShortData { decoded: usize, expected: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Parsed fixed header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcxHeader {
    pub version: u8,
    /// Scanlines are run-length encoded (encoding 1) rather than raw (0).
    pub rle: bool,
    pub bits_per_pixel: u8,
    pub planes: u8,
    pub bytes_per_line: u16,
    pub width: u32,
    pub height: u32,
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

impl PcxHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, PcxError> {
        if bytes.len() < HEADER_LEN {
            return Err(PcxError::Truncated(bytes.len()));
        }
        if bytes[0] != MANUFACTURER {
            return Err(PcxError::BadMagic(bytes[0]));
        }
        let encoding = bytes[2];
        if encoding > 1 {
            return Err(PcxError::UnsupportedEncoding(encoding));
        }

        let bits_per_pixel = bytes[3];
        let planes = bytes[65];
        if bits_per_pixel != 8 || !matches!(planes, 1 | 3 | 4) {
            return Err(PcxError::UnsupportedLayout {
                bits_per_pixel,
                planes,
            });
        }

        let (xmin, ymin, xmax, ymax) = (
            read_u16(bytes, 4),
            read_u16(bytes, 6),
            read_u16(bytes, 8),
            read_u16(bytes, 10),
        );
        if xmax < xmin || ymax < ymin {
            return Err(PcxError::BadWindow {
                xmin,
                ymin,
                xmax,
                ymax,
            });
        }
        let width = u32::from(xmax - xmin) + 1;
        let height = u32::from(ymax - ymin) + 1;

        let bytes_per_line = read_u16(bytes, 66);
        if u32::from(bytes_per_line) < width {
            return Err(PcxError::ShortScanline {
                bytes_per_line,
                width,
            });
        }

        Ok(Self {
            version: bytes[1],
            rle: encoding == 1,
            bits_per_pixel,
            planes,
            bytes_per_line,
            width,
            height,
        })
    }

    fn scanline_len(&self) -> usize {
        usize::from(self.bytes_per_line) * usize::from(self.planes)
    }
}

/// Reads and decodes the PCX file at `path`.
pub fn read_pcx(path: &Path) -> Result<RgbImage, PcxError> {
    read_pcx_with_header(path).map(|(_, image)| image)
}

/// Like [`read_pcx`], also returning the parsed header.
pub fn read_pcx_with_header(path: &Path) -> Result<(PcxHeader, RgbImage), PcxError> {
    let bytes = std::fs::read(path)?;
    decode_pcx_with_header(&bytes)
}

/// Decodes an in-memory PCX file into an RGB image.
pub fn decode_pcx(bytes: &[u8]) -> Result<RgbImage, PcxError> {
    decode_pcx_with_header(bytes).map(|(_, image)| image)
}

/// Like [`decode_pcx`], also returning the parsed header.
pub fn decode_pcx_with_header(bytes: &[u8]) -> Result<(PcxHeader, RgbImage), PcxError> {
    let header = PcxHeader::parse(bytes)?;
    let body = &bytes[HEADER_LEN..];

    let palette = if header.planes == 1 {
        Some(trailing_palette(body))
    } else {
        None
    };

    let scanline_len = header.scanline_len();
    let expected = scanline_len * header.height as usize;
    let raw = if header.rle {
        unpack_rle(body, expected)?
    } else {
        body.get(..expected)
            .ok_or(PcxError::ShortData {
                decoded: body.len(),
                expected,
            })?
            .to_vec()
    };

    let mut image = RgbImage::new(header.width, header.height);
    let bpl = usize::from(header.bytes_per_line);
    for (y, scanline) in raw.chunks_exact(scanline_len).enumerate() {
        for x in 0..header.width as usize {
            let rgb = match &palette {
                Some(palette) => {
                    let index = usize::from(scanline[x]) * 3;
                    [palette[index], palette[index + 1], palette[index + 2]]
                }
                None => [scanline[x], scanline[bpl + x], scanline[2 * bpl + x]],
            };
            image.put_pixel(x as u32, y as u32, image::Rgb(rgb));
        }
    }

    Ok((header, image))
}

/// Returns the 256-color palette stored after the pixel data, or a greyscale
/// ramp when the file carries none.
fn trailing_palette(body: &[u8]) -> [u8; PALETTE_LEN] {
    let mut palette = [0u8; PALETTE_LEN];
    if body.len() > PALETTE_LEN && body[body.len() - PALETTE_LEN - 1] == PALETTE_MARKER {
        palette.copy_from_slice(&body[body.len() - PALETTE_LEN..]);
    } else {
        for (index, entry) in palette.chunks_exact_mut(3).enumerate() {
            entry.fill(index as u8);
        }
    }
    palette
}

/// Expands RLE data until `expected` bytes are produced. Runs may cross
/// scanline boundaries, which some writers emit.
///
/// `expected` comes from untrusted header fields, so the reservation is
/// bounded by what `body` can expand to.
fn unpack_rle(body: &[u8], expected: usize) -> Result<Vec<u8>, PcxError> {
    let mut out = Vec::with_capacity(expected.min(body.len().saturating_mul(MAX_RUN)));
    let mut input = body.iter();
    while out.len() < expected {
        let Some(&byte) = input.next() else {
            return Err(PcxError::ShortData {
                decoded: out.len(),
                expected,
            });
        };
        if byte & 0xC0 == 0xC0 {
            let count = usize::from(byte & 0x3F);
            let Some(&value) = input.next() else {
                return Err(PcxError::ShortData {
                    decoded: out.len(),
                    expected,
                });
            };
            let count = count.min(expected - out.len());
            out.extend(std::iter::repeat(value).take(count));
        } else {
            out.push(byte);
        }
    }
    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a PCX file from uncompressed scanline data, RLE encoding each
    /// byte run.
    pub(crate) fn encode(width: u16, height: u16, planes: u8, raw: &[u8], palette: Option<&[u8]>) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes[0] = MANUFACTURER;
        bytes[1] = 5;
        bytes[2] = 1;
        bytes[3] = 8;
        bytes[8..10].copy_from_slice(&(width - 1).to_le_bytes());
        bytes[10..12].copy_from_slice(&(height - 1).to_le_bytes());
        bytes[65] = planes;
        bytes[66..68].copy_from_slice(&width.to_le_bytes());

        let mut index = 0;
        while index < raw.len() {
            let value = raw[index];
            let mut run = 1;
            while index + run < raw.len() && raw[index + run] == value && run < 63 {
                run += 1;
            }
            if run > 1 || value & 0xC0 == 0xC0 {
                bytes.push(0xC0 | run as u8);
            }
            bytes.push(value);
            index += run;
        }

        if let Some(palette) = palette {
            bytes.push(PALETTE_MARKER);
            bytes.extend_from_slice(palette);
        }
        bytes
    }

    #[test]
    fn decodes_rgb_planes() {
        // 2x1: red plane, green plane, blue plane.
        let raw = [255, 0, 0, 255, 10, 20];
        let image = decode_pcx(&encode(2, 1, 3, &raw, None)).unwrap();
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 10]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 255, 20]);
    }

    #[test]
    fn decodes_paletted_image() {
        let mut palette = vec![0u8; PALETTE_LEN];
        palette[3..6].copy_from_slice(&[1, 2, 3]);
        palette[600..603].copy_from_slice(&[200, 201, 202]);
        let raw = [1, 200, 200, 1];
        let image = decode_pcx(&encode(2, 2, 1, &raw, Some(&palette))).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3]);
        assert_eq!(image.get_pixel(1, 0).0, [200, 201, 202]);
        assert_eq!(image.get_pixel(0, 1).0, [200, 201, 202]);
        assert_eq!(image.get_pixel(1, 1).0, [1, 2, 3]);
    }

    #[test]
    fn paletted_image_without_palette_is_greyscale() {
        let image = decode_pcx(&encode(1, 1, 1, &[77], None)).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [77, 77, 77]);
    }

    #[test]
    fn drops_alpha_plane() {
        let raw = [9, 8, 7, 6];
        let image = decode_pcx(&encode(1, 1, 4, &raw, None)).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [9, 8, 7]);
    }

    #[test]
    fn long_runs_expand() {
        let raw = vec![0xC5; 3 * 100];
        let image = decode_pcx(&encode(100, 1, 3, &raw, None)).unwrap();
        assert!(image.pixels().all(|pixel| pixel.0 == [0xC5; 3]));
    }

    #[test]
    fn decodes_uncompressed_scanlines() {
        let mut bytes = encode(1, 1, 3, &[], None);
        bytes[2] = 0;
        bytes.extend_from_slice(&[0xC1, 0xC2, 0xC3]);
        let image = decode_pcx(&bytes).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [0xC1, 0xC2, 0xC3]);
    }

    #[test]
    fn rejects_non_pcx_data() {
        let mut bytes = encode(1, 1, 3, &[0, 0, 0], None);
        bytes[0] = b'P';
        assert!(matches!(decode_pcx(&bytes), Err(PcxError::BadMagic(b'P'))));
        assert!(matches!(decode_pcx(b"short"), Err(PcxError::Truncated(5))));
    }

    #[test]
    fn rejects_unsupported_layout() {
        let mut bytes = encode(1, 1, 3, &[0, 0, 0], None);
        bytes[3] = 1;
        assert!(matches!(
            decode_pcx(&bytes),
            Err(PcxError::UnsupportedLayout {
                bits_per_pixel: 1,
                planes: 3
            })
        ));
    }

    #[test]
    fn truncated_pixel_data_is_an_error() {
        let mut bytes = encode(4, 4, 3, &[1; 48], None);
        bytes.truncate(HEADER_LEN + 1);
        assert!(matches!(decode_pcx(&bytes), Err(PcxError::ShortData { .. })));
    }

    #[test]
    fn oversized_header_with_tiny_body_is_short_data() {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes[0] = MANUFACTURER;
        bytes[1] = 5;
        bytes[2] = 1;
        bytes[3] = 8;
        bytes[8..10].copy_from_slice(&65534u16.to_le_bytes());
        bytes[10..12].copy_from_slice(&65534u16.to_le_bytes());
        bytes[65] = 4;
        bytes[66..68].copy_from_slice(&65535u16.to_le_bytes());
        bytes.extend_from_slice(&[0xC3, 7, 9]);

        match decode_pcx(&bytes) {
            Err(PcxError::ShortData { decoded, expected }) => {
                assert_eq!(decoded, 4);
                assert_eq!(expected, 65535 * 4 * 65535);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn decodes_padded_scanlines_with_offset_window() {
        // 3x1 RGB inside the window x=10..=12, each plane padded to 4 bytes.
        let raw = [1, 2, 3, 0, 4, 5, 6, 0, 7, 8, 9, 0];
        let mut bytes = encode(4, 1, 3, &raw, None);
        bytes[4..6].copy_from_slice(&10u16.to_le_bytes());
        bytes[8..10].copy_from_slice(&12u16.to_le_bytes());

        let (header, image) = decode_pcx_with_header(&bytes).unwrap();
        assert_eq!(header.width, 3);
        assert_eq!(header.bytes_per_line, 4);
        assert_eq!(image.dimensions(), (3, 1));
        assert_eq!(image.as_raw().as_slice(), &[1, 4, 7, 2, 5, 8, 3, 6, 9]);
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wall.pcx");
        std::fs::write(&path, encode(1, 1, 3, &[1, 2, 3], None)).unwrap();
        let image = read_pcx(&path).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3]);
        assert!(matches!(
            read_pcx(&dir.path().join("missing.pcx")),
            Err(PcxError::Io(_))
        ));
    }
}
