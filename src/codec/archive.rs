//! The archive element stream: entry, filename, payload, symlink, device,
//! xattr, user, group, selinux, goodbye (§4.8).
//!
//! Every element is `(size: u64 LE, type: u64 LE)` followed by its payload,
//! then zero padding up to the next 8-byte boundary. `entry` happens to
//! never need padding since its size (64) is already 8-aligned, so no
//! special case is needed in the wire-layout code below -- only in how
//! `Entry` itself is shaped.

use super::magic;
use crate::error::CodecError;

const HEADER_LEN: u64 = 16;

/// `entry`'s fixed fields (§4.8): 16-byte header + 5 `u64` fields + one
/// reserved `u64` = 64 bytes total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub feature_flags: u64,
    pub mode: u64,
    pub uid: u64,
    pub gid: u64,
    pub mtime: u64,
}

/// One 24-byte record of a `goodbye` element's random-access table (§4.8).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GoodbyeItem {
    pub offset: u64,
    pub size: u64,
    pub hash: u64,
}

/// One element of the archive byte stream (§4.8).
#[derive(Clone, Debug, PartialEq)]
pub enum ArchiveElement {
    Entry(Entry),
    Filename(String),
    User(String),
    Group(String),
    Selinux(String),
    Payload(Vec<u8>),
    Symlink(String),
    Device { major: u64, minor: u64 },
    /// Opaque key/value blob; the spec leaves its internal layout
    /// unspecified beyond "opaque", so this crate carries it as raw bytes.
    Xattr(Vec<u8>),
    /// The random-access table closing a directory, including its trailing
    /// marker record referencing the directory's start offset (§4.8).
    Goodbye(Vec<GoodbyeItem>),
}

fn round_up_8(n: u64) -> u64 {
    (n + 7) & !7
}

fn write_header(out: &mut Vec<u8>, size: u64, type_tag: u64) {
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&type_tag.to_le_bytes());
}

fn pad_to_boundary(out: &mut Vec<u8>, payload_start: usize) {
    let written = (out.len() - payload_start) as u64 + HEADER_LEN;
    let padded = round_up_8(written);
    out.resize(payload_start + (padded - HEADER_LEN) as usize, 0);
}

fn write_nul_string(out: &mut Vec<u8>, type_tag: u64, s: &str) {
    let size = HEADER_LEN + s.len() as u64 + 1;
    let start = out.len();
    write_header(out, size, type_tag);
    out.extend_from_slice(s.as_bytes());
    out.push(0);
    pad_to_boundary(out, start + HEADER_LEN as usize);
}

/// Serialize `elements` to the archive byte stream (§4.8, §6).
#[must_use]
pub fn encode_archive(elements: &[ArchiveElement]) -> Vec<u8> {
    let mut out = Vec::new();
    for element in elements {
        match element {
            ArchiveElement::Entry(e) => {
                write_header(&mut out, 64, magic::ENTRY);
                out.extend_from_slice(&e.feature_flags.to_le_bytes());
                out.extend_from_slice(&e.mode.to_le_bytes());
                out.extend_from_slice(&e.uid.to_le_bytes());
                out.extend_from_slice(&e.gid.to_le_bytes());
                out.extend_from_slice(&e.mtime.to_le_bytes());
                out.extend_from_slice(&0u64.to_le_bytes());
            }
            ArchiveElement::Filename(s) => write_nul_string(&mut out, magic::FILENAME, s),
            ArchiveElement::User(s) => write_nul_string(&mut out, magic::USER, s),
            ArchiveElement::Group(s) => write_nul_string(&mut out, magic::GROUP, s),
            ArchiveElement::Selinux(s) => write_nul_string(&mut out, magic::SELINUX, s),
            ArchiveElement::Symlink(s) => write_nul_string(&mut out, magic::SYMLINK, s),
            ArchiveElement::Payload(bytes) => {
                let size = HEADER_LEN + bytes.len() as u64;
                let start = out.len();
                write_header(&mut out, size, magic::PAYLOAD);
                out.extend_from_slice(bytes);
                pad_to_boundary(&mut out, start + HEADER_LEN as usize);
            }
            ArchiveElement::Device { major, minor } => {
                write_header(&mut out, HEADER_LEN + 16, magic::DEVICE);
                out.extend_from_slice(&major.to_le_bytes());
                out.extend_from_slice(&minor.to_le_bytes());
            }
            ArchiveElement::Xattr(bytes) => {
                let size = HEADER_LEN + bytes.len() as u64;
                let start = out.len();
                write_header(&mut out, size, magic::XATTR);
                out.extend_from_slice(bytes);
                pad_to_boundary(&mut out, start + HEADER_LEN as usize);
            }
            ArchiveElement::Goodbye(items) => {
                let size = HEADER_LEN + (items.len() as u64) * 24;
                write_header(&mut out, size, magic::GOODBYE);
                for item in items {
                    out.extend_from_slice(&item.offset.to_le_bytes());
                    out.extend_from_slice(&item.size.to_le_bytes());
                    out.extend_from_slice(&item.hash.to_le_bytes());
                }
            }
        }
    }
    out
}

fn read_u64(bytes: &[u8], offset: usize) -> Result<u64, CodecError> {
    bytes
        .get(offset..offset + 8)
        .map(|s| u64::from_le_bytes(s.try_into().expect("8-byte slice")))
        .ok_or(CodecError::Truncated { offset: offset as u64 })
}

fn read_nul_string(bytes: &[u8], payload_start: usize, payload_len: usize, offset: u64) -> Result<String, CodecError> {
    let payload = &bytes[payload_start..payload_start + payload_len];
    let nul_pos = payload.iter().position(|&b| b == 0).ok_or(CodecError::Malformed {
        offset,
        reason: "string payload missing NUL terminator".to_string(),
    })?;
    String::from_utf8(payload[..nul_pos].to_vec()).map_err(|_| CodecError::Malformed {
        offset,
        reason: "string payload is not valid UTF-8".to_string(),
    })
}

/// Parse an archive byte stream into its elements (§4.8, §6).
///
/// # Errors
///
/// Returns [`CodecError::Truncated`] if a header or payload runs past the end
/// of `bytes`, or [`CodecError::Malformed`] if a known element's payload size
/// is inconsistent with its fixed layout.
pub fn decode_archive(bytes: &[u8]) -> Result<Vec<ArchiveElement>, CodecError> {
    let mut elements = Vec::new();
    let mut offset: u64 = 0;
    let len = bytes.len() as u64;

    while offset < len {
        if offset + HEADER_LEN > len {
            return Err(CodecError::Truncated { offset });
        }
        let size = read_u64(bytes, offset as usize)?;
        let type_tag = read_u64(bytes, offset as usize + 8)?;
        if size < HEADER_LEN {
            return Err(CodecError::Malformed {
                offset,
                reason: format!("element size {size} smaller than header"),
            });
        }
        let payload_start = (offset + HEADER_LEN) as usize;
        let payload_len = (size - HEADER_LEN) as usize;
        if payload_start + payload_len > bytes.len() {
            return Err(CodecError::Truncated { offset });
        }

        let element = match type_tag {
            magic::ENTRY => {
                if size != 64 {
                    return Err(CodecError::Malformed {
                        offset,
                        reason: format!("entry element size {size} != 64"),
                    });
                }
                ArchiveElement::Entry(Entry {
                    feature_flags: read_u64(bytes, payload_start)?,
                    mode: read_u64(bytes, payload_start + 8)?,
                    uid: read_u64(bytes, payload_start + 16)?,
                    gid: read_u64(bytes, payload_start + 24)?,
                    mtime: read_u64(bytes, payload_start + 32)?,
                })
            }
            magic::FILENAME => ArchiveElement::Filename(read_nul_string(bytes, payload_start, payload_len, offset)?),
            magic::USER => ArchiveElement::User(read_nul_string(bytes, payload_start, payload_len, offset)?),
            magic::GROUP => ArchiveElement::Group(read_nul_string(bytes, payload_start, payload_len, offset)?),
            magic::SELINUX => ArchiveElement::Selinux(read_nul_string(bytes, payload_start, payload_len, offset)?),
            magic::SYMLINK => ArchiveElement::Symlink(read_nul_string(bytes, payload_start, payload_len, offset)?),
            magic::PAYLOAD => ArchiveElement::Payload(bytes[payload_start..payload_start + payload_len].to_vec()),
            magic::DEVICE => {
                if payload_len != 16 {
                    return Err(CodecError::Malformed {
                        offset,
                        reason: format!("device payload size {payload_len} != 16"),
                    });
                }
                ArchiveElement::Device {
                    major: read_u64(bytes, payload_start)?,
                    minor: read_u64(bytes, payload_start + 8)?,
                }
            }
            magic::XATTR => ArchiveElement::Xattr(bytes[payload_start..payload_start + payload_len].to_vec()),
            magic::GOODBYE => {
                if payload_len % 24 != 0 {
                    return Err(CodecError::Malformed {
                        offset,
                        reason: format!("goodbye payload size {payload_len} not a multiple of 24"),
                    });
                }
                let mut items = Vec::with_capacity(payload_len / 24);
                for i in 0..payload_len / 24 {
                    let item_start = payload_start + i * 24;
                    items.push(GoodbyeItem {
                        offset: read_u64(bytes, item_start)?,
                        size: read_u64(bytes, item_start + 8)?,
                        hash: read_u64(bytes, item_start + 16)?,
                    });
                }
                ArchiveElement::Goodbye(items)
            }
            other => {
                return Err(CodecError::Malformed {
                    offset,
                    reason: format!("unknown element type tag {other:#x}"),
                })
            }
        };
        elements.push(element);

        let on_wire = round_up_8(size);
        offset += on_wire;
    }

    Ok(elements)
}
