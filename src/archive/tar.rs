//! Uncompressed ustar serialization.
//!
//! Header layout (offsets in bytes):
//!
//! | Field    | Offset | Width |
//! |----------|--------|-------|
//! | name     | 0      | 100   |
//! | mode     | 100    | 8     |
//! | uid      | 108    | 8     |
//! | gid      | 116    | 8     |
//! | size     | 124    | 12    |
//! | mtime    | 136    | 12    |
//! | checksum | 148    | 8     |
//! | typeflag | 156    | 1     |
//! | magic    | 257    | 6     |
//! | version  | 263    | 2     |

use chrono::Utc;

/// Archive block size. Headers and padded contents are multiples of it.
pub const BLOCK_SIZE: usize = 512;

/// Two zero blocks terminate the archive.
pub const TRAILER_SIZE: usize = 2 * BLOCK_SIZE;

/// Width of the header name field. Longer names are truncated.
pub const NAME_FIELD_LEN: usize = 100;

const MODE: &[u8] = b"0000644\0";
const OWNER: &[u8] = b"0000000\0";
const CHECKSUM_RANGE: std::ops::Range<usize> = 148..156;
const TYPEFLAG_OFFSET: usize = 156;
const REGULAR_FILE: u8 = b'0';
const MAGIC: &[u8] = b"ustar\0";
const VERSION: &[u8] = b"00";

/// One file inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path within the archive
    pub name: String,
    /// Raw payload
    pub content: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Bytes this entry occupies: header plus block-padded content.
    pub fn archived_len(&self) -> usize {
        BLOCK_SIZE + padded_len(self.content.len())
    }
}

/// `len` rounded up to the next multiple of [`BLOCK_SIZE`].
pub fn padded_len(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

/// Exact byte length of the archive holding `entries`, trailer included.
pub fn archive_len(entries: &[ArchiveEntry]) -> usize {
    entries.iter().map(ArchiveEntry::archived_len).sum::<usize>() + TRAILER_SIZE
}

/// Writes entries into a single in-memory archive.
#[derive(Debug, Clone)]
pub struct TarWriter {
    mtime: u64,
}

impl Default for TarWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TarWriter {
    /// Writer stamping entries with the current time.
    pub fn new() -> Self {
        Self {
            mtime: Utc::now().timestamp().max(0) as u64,
        }
    }

    /// Writer with a fixed modification time, in seconds since the epoch.
    pub fn with_mtime(mtime: u64) -> Self {
        Self { mtime }
    }

    /// Serialize `entries` in order.
    ///
    /// The buffer is allocated zeroed at its final size, so padding and the
    /// trailer are whatever was never written.
    pub fn write(&self, entries: &[ArchiveEntry]) -> Vec<u8> {
        let mut out = vec![0u8; archive_len(entries)];
        let mut offset = 0;

        for entry in entries {
            out[offset..offset + BLOCK_SIZE].copy_from_slice(&self.header(entry));
            offset += BLOCK_SIZE;
            out[offset..offset + entry.content.len()].copy_from_slice(&entry.content);
            offset += padded_len(entry.content.len());
        }

        out
    }

    /// Header block for one entry.
    pub fn header(&self, entry: &ArchiveEntry) -> [u8; BLOCK_SIZE] {
        let mut header = [0u8; BLOCK_SIZE];

        let name = entry.name.as_bytes();
        let name_len = name.len().min(NAME_FIELD_LEN);
        header[..name_len].copy_from_slice(&name[..name_len]);

        header[100..108].copy_from_slice(MODE);
        header[108..116].copy_from_slice(OWNER);
        header[116..124].copy_from_slice(OWNER);
        header[124..136].copy_from_slice(&octal_field(entry.content.len() as u64));
        header[136..148].copy_from_slice(&octal_field(self.mtime));
        header[TYPEFLAG_OFFSET] = REGULAR_FILE;
        header[257..263].copy_from_slice(MAGIC);
        header[263..265].copy_from_slice(VERSION);

        // Checksum is computed with its own field filled with spaces.
        header[CHECKSUM_RANGE].fill(b' ');
        let sum: u32 = header.iter().map(|&b| u32::from(b)).sum();
        let checksum = format!("{:06o}\0 ", sum);
        header[CHECKSUM_RANGE].copy_from_slice(checksum.as_bytes());

        header
    }
}

/// 11 zero-padded octal digits followed by NUL.
fn octal_field(value: u64) -> [u8; 12] {
    let mut field = [0u8; 12];
    let digits = format!("{:011o}", value);
    let digits = digits.as_bytes();
    // Values past 8 GiB keep their low-order digits.
    let start = digits.len().saturating_sub(11);
    field[..11].copy_from_slice(&digits[start..]);
    field
}
