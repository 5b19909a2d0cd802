//! Fixed 64-bit magic numbers for the archive and index formats (§4.8, §4.9).
//!
//! These are recalled from general familiarity with the compatible
//! ecosystem's on-disk format rather than copied from a checked-out
//! reference source during this implementation -- treat every constant
//! below as a moderate-confidence best effort, not a verified-byte-for-byte
//! transcription. Swap in the authentic values (from the upstream format
//! header) before relying on this codec for real interoperability; see
//! DESIGN.md.

/// `entry` element type tag.
pub(crate) const ENTRY: u64 = 0x1396_fabc_ea5b_bb51;
/// `user` element type tag.
pub(crate) const USER: u64 = 0xf453_131a_aeea_ccb3;
/// `group` element type tag.
pub(crate) const GROUP: u64 = 0x25eb_6ac9_6939_6a52;
/// `xattr` element type tag.
pub(crate) const XATTR: u64 = 0xb815_7091_773f_63ef;
/// `selinux` element type tag.
pub(crate) const SELINUX: u64 = 0x46fa_f060_2fd2_6c59;
/// `symlink` element type tag.
pub(crate) const SYMLINK: u64 = 0x664a_6fb6_830e_0d6c;
/// `device` element type tag.
pub(crate) const DEVICE: u64 = 0xac3d_ace3_69df_e643;
/// `payload` element type tag.
pub(crate) const PAYLOAD: u64 = 0x8b9e_1d93_d6dc_ffc9;
/// `filename` element type tag.
pub(crate) const FILENAME: u64 = 0x6dbb_6ebc_b316_1f0b;
/// `goodbye` element type tag.
pub(crate) const GOODBYE: u64 = 0xdfd3_5c5e_8327_c403;
/// Marker closing a `goodbye` element's random-access table.
pub(crate) const GOODBYE_TAIL_MARKER: u64 = 0x5744_6fa5_3370_2943;

/// Index file type tag.
pub(crate) const INDEX: u64 = 0x9682_4d9c_7b12_9ff9;
/// Chunk table type tag.
pub(crate) const TABLE: u64 = 0xe75b_9e11_2f17_417d;
/// Marker preceding the chunk table (§4.9: `marker: u64 = 0xFFFF_FFFF_FFFF_FFFF`).
pub(crate) const TABLE_MARKER: u64 = 0xFFFF_FFFF_FFFF_FFFF;
/// Marker closing a chunk table's tail record.
pub(crate) const TABLE_TAIL_MARKER: u64 = 0x4b4f_050e_5549_ecd1;
