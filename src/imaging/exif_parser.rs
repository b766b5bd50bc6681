//! Minimal EXIF reader for the capture timestamp.
//!
//! Extracts one value: when the photo was taken. Lookup order:
//! - DateTimeOriginal (tag 0x9003) in the Exif sub-IFD
//! - DateTime (tag 0x0132) in IFD0
//!
//! Containers:
//! - JPEG: APP1 segment starting with `Exif\0\0`, followed by a TIFF block.
//! - TIFF: the file itself is the TIFF block.
//! - PNG: `eXIf` chunk holding a TIFF block.
//! - WebP: RIFF `EXIF` chunk holding a TIFF block (optionally `Exif\0\0`-prefixed).
//!
//! Any structural problem yields `None`; a photo without a readable date is
//! ordinary, not an error.

use chrono::NaiveDateTime;

const EXIF_HEADER: &[u8] = b"Exif\0\0";
const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

const TAG_DATE_TIME: u16 = 0x0132;
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;

const TYPE_ASCII: u16 = 2;

/// Read the capture timestamp from encoded image bytes.
pub fn read_capture_date(data: &[u8]) -> Option<NaiveDateTime> {
    let tiff = if data.starts_with(&[0xFF, 0xD8]) {
        find_jpeg_app1_exif(data)?
    } else if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        data
    } else if data.starts_with(PNG_SIGNATURE) {
        find_png_exif(data)?
    } else if data.starts_with(b"RIFF") && data.get(8..12) == Some(b"WEBP") {
        find_webp_exif(data)?
    } else {
        return None;
    };
    parse_tiff_date(tiff)
}

/// Parse an EXIF date string (`YYYY:MM:DD HH:MM:SS`).
///
/// Cameras write `0000:00:00 00:00:00` or blanks when the clock was never
/// set; those fail to parse and come back as `None`.
pub fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    NaiveDateTime::parse_from_str(trimmed, "%Y:%m:%d %H:%M:%S").ok()
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

/// Find the TIFF block inside a JPEG's EXIF APP1 segment.
fn find_jpeg_app1_exif(data: &[u8]) -> Option<&[u8]> {
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        // Fill bytes
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // SOS or EOI: no metadata past this point
        if marker == 0xDA || marker == 0xD9 {
            return None;
        }
        if (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }

        let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if seg_len < 2 {
            return None;
        }
        let seg_start = pos + 4;
        let seg_end = (pos + 2 + seg_len).min(data.len());

        if marker == 0xE1
            && let Some(tiff) = data.get(seg_start..seg_end)?.strip_prefix(EXIF_HEADER)
        {
            return Some(tiff);
        }
        pos += 2 + seg_len;
    }
    None
}

/// Find the `eXIf` chunk of a PNG.
fn find_png_exif(data: &[u8]) -> Option<&[u8]> {
    let mut pos = PNG_SIGNATURE.len();
    while pos + 8 <= data.len() {
        let len = u32::from_be_bytes(data[pos..pos + 4].try_into().ok()?) as usize;
        let kind = &data[pos + 4..pos + 8];
        let body_start = pos + 8;
        let body_end = body_start.checked_add(len)?;
        if body_end > data.len() {
            return None;
        }
        match kind {
            b"eXIf" => return Some(&data[body_start..body_end]),
            b"IDAT" | b"IEND" => return None,
            _ => {}
        }
        // chunk body + CRC
        pos = body_end + 4;
    }
    None
}

/// Find the `EXIF` chunk of a WebP (RIFF) file.
fn find_webp_exif(data: &[u8]) -> Option<&[u8]> {
    let mut pos = 12;
    while pos + 8 <= data.len() {
        let kind = &data[pos..pos + 4];
        let len = u32::from_le_bytes(data[pos + 4..pos + 8].try_into().ok()?) as usize;
        let body_start = pos + 8;
        let body_end = body_start.checked_add(len)?;
        if body_end > data.len() {
            return None;
        }
        if kind == b"EXIF" {
            let body = &data[body_start..body_end];
            return Some(body.strip_prefix(EXIF_HEADER).unwrap_or(body));
        }
        // RIFF chunks are padded to even length
        pos = body_end + (len % 2);
    }
    None
}

// ---------------------------------------------------------------------------
// TIFF structure
// ---------------------------------------------------------------------------

/// Bounds-checked reader over a TIFF block in either byte order.
struct Tiff<'a> {
    data: &'a [u8],
    big_endian: bool,
}

/// One 12-byte IFD entry.
struct IfdEntry {
    tag: u16,
    typ: u16,
    count: u32,
    /// Value offset, or the value itself when it fits in 4 bytes.
    value: u32,
    /// Position of the 4-byte value field within the block.
    value_pos: usize,
}

impl<'a> Tiff<'a> {
    fn new(data: &'a [u8]) -> Option<Self> {
        let big_endian = match data.get(0..2)? {
            b"MM" => true,
            b"II" => false,
            _ => return None,
        };
        let tiff = Self { data, big_endian };
        // TIFF magic
        (tiff.u16_at(2)? == 42).then_some(tiff)
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        let bytes: [u8; 2] = self.data.get(offset..offset + 2)?.try_into().ok()?;
        Some(if self.big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        })
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let bytes: [u8; 4] = self.data.get(offset..offset + 4)?.try_into().ok()?;
        Some(if self.big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    }

    fn first_ifd(&self) -> Option<usize> {
        self.u32_at(4).map(|o| o as usize)
    }

    fn entries(&self, ifd_offset: usize) -> Option<Vec<IfdEntry>> {
        let count = self.u16_at(ifd_offset)? as usize;
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let at = ifd_offset + 2 + i * 12;
            entries.push(IfdEntry {
                tag: self.u16_at(at)?,
                typ: self.u16_at(at + 2)?,
                count: self.u32_at(at + 4)?,
                value: self.u32_at(at + 8)?,
                value_pos: at + 8,
            });
        }
        Some(entries)
    }

    fn ascii(&self, entry: &IfdEntry) -> Option<&'a str> {
        if entry.typ != TYPE_ASCII {
            return None;
        }
        let len = entry.count as usize;
        let start = if len <= 4 {
            entry.value_pos
        } else {
            entry.value as usize
        };
        let bytes = self.data.get(start..start.checked_add(len)?)?;
        std::str::from_utf8(bytes).ok()
    }
}

/// Capture date from a TIFF block: Exif DateTimeOriginal, then IFD0 DateTime.
fn parse_tiff_date(data: &[u8]) -> Option<NaiveDateTime> {
    let tiff = Tiff::new(data)?;
    let ifd0 = tiff.entries(tiff.first_ifd()?)?;

    let original = ifd0
        .iter()
        .find(|e| e.tag == TAG_EXIF_IFD)
        .and_then(|e| tiff.entries(e.value as usize))
        .and_then(|exif| {
            exif.iter()
                .find(|e| e.tag == TAG_DATE_TIME_ORIGINAL)
                .and_then(|e| tiff.ascii(e))
                .and_then(parse_exif_datetime)
        });

    original.or_else(|| {
        ifd0.iter()
            .find(|e| e.tag == TAG_DATE_TIME)
            .and_then(|e| tiff.ascii(e))
            .and_then(parse_exif_datetime)
    })
}
