//! Reader for NumPy `.npz` archives.
//!
//! An `.npz` file is a ZIP archive whose entries are `.npy` arrays. Only the
//! subset produced by prediction pipelines is supported: stored or deflated
//! entries holding little-endian `f4`/`f8` arrays in C order. Entries are
//! located through the central directory at the end of the archive.

use flate2::read::DeflateDecoder;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NpzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Not a ZIP archive (missing end-of-central-directory record)")]
    NotAnArchive,
    #[error("Malformed ZIP entry '{name}': {reason}")]
    BadEntry { name: String, reason: String },
    #[error("Unsupported compression method {method} for entry '{name}'")]
    UnsupportedCompression { name: String, method: u16 },
    #[error("Array '{0}' not found in archive")]
    MissingArray(String),
    #[error("Malformed NPY data in '{name}': {reason}")]
    BadNpy { name: String, reason: String },
    #[error("Unsupported dtype '{dtype}' in '{name}' (expected <f4 or <f8)")]
    UnsupportedDtype { name: String, dtype: String },
}

/// One decoded array: its shape and the values flattened in C order.
///
/// Values are narrowed to `f32`; confidence arrays are written as `f4` and
/// the viewer payloads re-encode them as `f32` anyway.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl NpyArray {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Mean of the values, or 0.0 for an empty array.
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&v| v as f64).sum::<f64>() / self.data.len() as f64
    }
}

/// An open `.npz` archive with its entries decoded into memory.
#[derive(Debug)]
pub struct NpzFile {
    arrays: HashMap<String, NpyArray>,
}

impl NpzFile {
    /// Reads and decodes every array entry in the archive at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a ZIP archive,
    /// uses an unsupported compression method, or holds arrays that are not
    /// little-endian C-order floats.
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, NpzError> {
        let bytes = fs::read(path)?;
        Self::read_from_bytes(&bytes)
    }

    /// Decodes an archive already held in memory.
    pub fn read_from_bytes(bytes: &[u8]) -> Result<Self, NpzError> {
        let mut arrays = HashMap::new();
        for entry in central_directory(bytes)? {
            let raw = extract_entry(bytes, &entry)?;
            let key = entry
                .name
                .strip_suffix(".npy")
                .unwrap_or(&entry.name)
                .to_string();
            arrays.insert(key.clone(), parse_npy(&raw, &key)?);
        }
        Ok(Self { arrays })
    }

    /// Returns the array stored under `name` (without the `.npy` suffix).
    pub fn array(&self, name: &str) -> Result<&NpyArray, NpzError> {
        self.arrays
            .get(name)
            .ok_or_else(|| NpzError::MissingArray(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arrays.contains_key(name)
    }

    /// Array names in the archive, in arbitrary order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(String::as_str)
    }
}

const EOCD_SIGNATURE: u32 = 0x0605_4b50;
const CENTRAL_SIGNATURE: u32 = 0x0201_4b50;
const LOCAL_SIGNATURE: u32 = 0x0403_4b50;

struct ZipEntry {
    name: String,
    method: u16,
    compressed_size: usize,
    local_offset: usize,
}

fn read_u16(bytes: &[u8], offset: usize) -> Option<u16> {
    bytes
        .get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    bytes
        .get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Locates the end-of-central-directory record and walks the directory.
fn central_directory(bytes: &[u8]) -> Result<Vec<ZipEntry>, NpzError> {
    // The EOCD record is at least 22 bytes and sits at the end of the file,
    // possibly followed by a comment of up to 65535 bytes.
    let eocd_pos = (0..=bytes.len().saturating_sub(22))
        .rev()
        .take(65_557)
        .find(|&pos| read_u32(bytes, pos) == Some(EOCD_SIGNATURE))
        .ok_or(NpzError::NotAnArchive)?;

    let entry_count = read_u16(bytes, eocd_pos + 10).ok_or(NpzError::NotAnArchive)? as usize;
    let mut offset = read_u32(bytes, eocd_pos + 16).ok_or(NpzError::NotAnArchive)? as usize;

    let mut entries = Vec::with_capacity(entry_count);
    for _ in 0..entry_count {
        if read_u32(bytes, offset) != Some(CENTRAL_SIGNATURE) {
            return Err(NpzError::BadEntry {
                name: format!("<central directory @{offset}>"),
                reason: "bad central directory signature".into(),
            });
        }
        let method = read_u16(bytes, offset + 10).unwrap_or(0);
        let compressed_size = read_u32(bytes, offset + 20).unwrap_or(0) as usize;
        let name_len = read_u16(bytes, offset + 28).unwrap_or(0) as usize;
        let extra_len = read_u16(bytes, offset + 30).unwrap_or(0) as usize;
        let comment_len = read_u16(bytes, offset + 32).unwrap_or(0) as usize;
        let local_offset = read_u32(bytes, offset + 42).unwrap_or(0) as usize;

        let name_bytes = bytes
            .get(offset + 46..offset + 46 + name_len)
            .ok_or_else(|| NpzError::BadEntry {
                name: format!("<central directory @{offset}>"),
                reason: "entry name runs past end of file".into(),
            })?;
        let name = String::from_utf8_lossy(name_bytes).into_owned();

        entries.push(ZipEntry {
            name,
            method,
            compressed_size,
            local_offset,
        });
        offset += 46 + name_len + extra_len + comment_len;
    }
    Ok(entries)
}

/// Reads and, if needed, inflates one entry's bytes via its local header.
fn extract_entry(bytes: &[u8], entry: &ZipEntry) -> Result<Vec<u8>, NpzError> {
    let pos = entry.local_offset;
    if read_u32(bytes, pos) != Some(LOCAL_SIGNATURE) {
        return Err(NpzError::BadEntry {
            name: entry.name.clone(),
            reason: "bad local header signature".into(),
        });
    }
    // Name and extra lengths in the local header may differ from the central
    // directory's, so they are re-read here.
    let name_len = read_u16(bytes, pos + 26).unwrap_or(0) as usize;
    let extra_len = read_u16(bytes, pos + 28).unwrap_or(0) as usize;
    let data_start = pos + 30 + name_len + extra_len;
    let data = bytes
        .get(data_start..data_start + entry.compressed_size)
        .ok_or_else(|| NpzError::BadEntry {
            name: entry.name.clone(),
            reason: "entry data runs past end of file".into(),
        })?;

    match entry.method {
        0 => Ok(data.to_vec()),
        8 => {
            let mut out = Vec::new();
            DeflateDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(|e| NpzError::BadEntry {
                    name: entry.name.clone(),
                    reason: format!("deflate failed: {e}"),
                })?;
            Ok(out)
        }
        method => Err(NpzError::UnsupportedCompression {
            name: entry.name.clone(),
            method,
        }),
    }
}

/// Parses an NPY v1/v2 payload into shape and f32 values.
fn parse_npy(raw: &[u8], name: &str) -> Result<NpyArray, NpzError> {
    let bad = |reason: &str| NpzError::BadNpy {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if raw.len() < 10 || &raw[0..6] != b"\x93NUMPY" {
        return Err(bad("missing NPY magic"));
    }
    let major = raw[6];
    let (header_len, header_start) = match major {
        1 => (
            read_u16(raw, 8).ok_or_else(|| bad("truncated header length"))? as usize,
            10,
        ),
        2 | 3 => (
            read_u32(raw, 8).ok_or_else(|| bad("truncated header length"))? as usize,
            12,
        ),
        _ => return Err(bad("unsupported NPY version")),
    };
    let header_bytes = raw
        .get(header_start..header_start + header_len)
        .ok_or_else(|| bad("truncated header"))?;
    let header = String::from_utf8_lossy(header_bytes);

    let descr = header_field(&header, "descr").ok_or_else(|| bad("header lacks 'descr'"))?;
    let fortran =
        header_field(&header, "fortran_order").ok_or_else(|| bad("header lacks 'fortran_order'"))?;
    if fortran != "False" {
        return Err(bad("Fortran-order arrays are not supported"));
    }
    let shape = parse_shape(&header).ok_or_else(|| bad("header lacks a shape tuple"))?;

    let item_size = match descr.as_str() {
        "<f4" | "|f4" => 4,
        "<f8" | "|f8" => 8,
        _ => {
            return Err(NpzError::UnsupportedDtype {
                name: name.to_string(),
                dtype: descr,
            });
        }
    };

    let expected: usize = shape.iter().product::<usize>() * item_size;
    let payload = raw
        .get(header_start + header_len..)
        .ok_or_else(|| bad("missing data section"))?;
    if payload.len() < expected {
        return Err(bad("data section shorter than shape implies"));
    }

    let data = payload[..expected]
        .chunks_exact(item_size)
        .map(|chunk| {
            if item_size == 4 {
                f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
            } else {
                f64::from_le_bytes([
                    chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
                ]) as f32
            }
        })
        .collect();

    Ok(NpyArray { shape, data })
}

/// Pulls a quoted or bare value for `key` out of the NPY header dict.
fn header_field(header: &str, key: &str) -> Option<String> {
    let pattern = format!("'{key}':");
    let start = header.find(&pattern)? + pattern.len();
    let rest = header[start..].trim_start();
    if let Some(stripped) = rest.strip_prefix('\'') {
        let end = stripped.find('\'')?;
        Some(stripped[..end].to_string())
    } else {
        let end = rest.find([',', '}'])?;
        Some(rest[..end].trim().to_string())
    }
}

/// Parses the `'shape': (...)` tuple. A scalar `()` yields an empty shape.
fn parse_shape(header: &str) -> Option<Vec<usize>> {
    let start = header.find("'shape':")? + "'shape':".len();
    let rest = header[start..].trim_start();
    let open = rest.strip_prefix('(')?;
    let end = open.find(')')?;
    open[..end]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::DeflateEncoder;
    use std::io::Write;

    fn npy_bytes(shape: &[usize], values: &[f32]) -> Vec<u8> {
        let shape_str = match shape.len() {
            0 => "()".to_string(),
            1 => format!("({},)", shape[0]),
            _ => format!(
                "({})",
                shape
                    .iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };
        let mut header = format!(
            "{{'descr': '<f4', 'fortran_order': False, 'shape': {shape_str}, }}"
        );
        // Pad so magic + header ends on a 64-byte boundary, newline-terminated.
        let total = 10 + header.len() + 1;
        let pad = (64 - total % 64) % 64;
        header.push_str(&" ".repeat(pad));
        header.push('\n');

        let mut out = Vec::new();
        out.extend_from_slice(b"\x93NUMPY\x01\x00");
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(header.as_bytes());
        for v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    fn zip_bytes(entries: &[(&str, Vec<u8>, bool)]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();
        let mut count = 0u16;

        for (name, data, deflate) in entries {
            let offset = out.len() as u32;
            let payload = if *deflate {
                let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
                enc.write_all(data).unwrap();
                enc.finish().unwrap()
            } else {
                data.clone()
            };
            let method: u16 = if *deflate { 8 } else { 0 };

            out.extend_from_slice(&LOCAL_SIGNATURE.to_le_bytes());
            out.extend_from_slice(&[20, 0, 0, 0]); // version, flags
            out.extend_from_slice(&method.to_le_bytes());
            out.extend_from_slice(&[0; 8]); // time, date, crc
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(&payload);

            central.extend_from_slice(&CENTRAL_SIGNATURE.to_le_bytes());
            central.extend_from_slice(&[20, 0, 20, 0, 0, 0]); // versions, flags
            central.extend_from_slice(&method.to_le_bytes());
            central.extend_from_slice(&[0; 8]); // time, date, crc
            central.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            central.extend_from_slice(&(data.len() as u32).to_le_bytes());
            central.extend_from_slice(&(name.len() as u16).to_le_bytes());
            central.extend_from_slice(&[0; 8]); // extra, comment, disk, attrs
            central.extend_from_slice(&[0; 4]); // external attrs
            central.extend_from_slice(&offset.to_le_bytes());
            central.extend_from_slice(name.as_bytes());
            count += 1;
        }

        let central_offset = out.len() as u32;
        out.extend_from_slice(&central);
        let central_size = out.len() as u32 - central_offset;

        out.extend_from_slice(&EOCD_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&[0; 4]); // disk numbers
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&central_size.to_le_bytes());
        out.extend_from_slice(&central_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // comment length
        out
    }

    #[test]
    fn reads_stored_entries() {
        let npy = npy_bytes(&[3], &[0.1, 0.5, 0.9]);
        let archive = zip_bytes(&[("plddt.npy", npy, false)]);

        let npz = NpzFile::read_from_bytes(&archive).unwrap();
        let arr = npz.array("plddt").unwrap();
        assert_eq!(arr.shape, vec![3]);
        assert_eq!(arr.data, vec![0.1, 0.5, 0.9]);
    }

    #[test]
    fn reads_deflated_matrix_entries() {
        let npy = npy_bytes(&[2, 2], &[1.0, 2.0, 3.0, 4.0]);
        let archive = zip_bytes(&[("pae.npy", npy, true)]);

        let npz = NpzFile::read_from_bytes(&archive).unwrap();
        let arr = npz.array("pae").unwrap();
        assert_eq!(arr.shape, vec![2, 2]);
        assert_eq!(arr.data, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(arr.mean(), 2.5);
    }

    #[test]
    fn scalar_arrays_have_empty_shape() {
        let npy = npy_bytes(&[], &[0.87]);
        let archive = zip_bytes(&[("confidence_score.npy", npy, false)]);

        let npz = NpzFile::read_from_bytes(&archive).unwrap();
        let arr = npz.array("confidence_score").unwrap();
        assert!(arr.shape.is_empty());
        assert_eq!(arr.data, vec![0.87]);
    }

    #[test]
    fn missing_array_error_names_the_key() {
        let npy = npy_bytes(&[1], &[1.0]);
        let archive = zip_bytes(&[("plddt.npy", npy, false)]);

        let npz = NpzFile::read_from_bytes(&archive).unwrap();
        let err = npz.array("pde").unwrap_err();
        assert!(matches!(err, NpzError::MissingArray(k) if k == "pde"));
    }

    #[test]
    fn rejects_non_zip_input() {
        let err = NpzFile::read_from_bytes(b"not a zip file").unwrap_err();
        assert!(matches!(err, NpzError::NotAnArchive));
    }

    #[test]
    fn rejects_unsupported_dtypes() {
        let mut npy = npy_bytes(&[1], &[1.0]);
        // Corrupt the descr in place: '<f4' becomes '<i4'.
        let pos = npy.windows(3).position(|w| w == b"<f4").unwrap();
        npy[pos + 1] = b'i';
        let archive = zip_bytes(&[("x.npy", npy, false)]);

        let err = NpzFile::read_from_bytes(&archive).unwrap_err();
        assert!(matches!(err, NpzError::UnsupportedDtype { .. }));
    }
}
