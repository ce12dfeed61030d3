//! Reader for GEARSET.DAT, the on-disk copy of a character's gearset table.
//!
//! The file starts with a 21 byte header whose first four bytes are a
//! magic/version word. It is followed by a fixed number of records that have
//! the same layout as the game's in-memory gearset entries, each XORed byte by
//! byte with a constant key. Trailing data after the last record is ignored.

use crate::models::{GearsetInfo, GearsetLayout, GearsetName};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use thiserror::Error;

/// Name of the gearset file inside a character folder
pub const GEARSET_FILE_NAME: &str = "GEARSET.DAT";

/// Errors that can occur while reading a gearset file
#[derive(Error, Debug)]
pub enum GearsetError {
    #[error("Unsupported gearset file magic {found:02X?}, expected {expected:02X?}")]
    Format { found: [u8; 4], expected: [u8; 4] },

    #[error("Unexpected content in gearset record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("Invalid gearset layout: {0}")]
    InvalidLayout(String),

    #[error(
        "Unable to read gearset file {}",
        .path.as_ref().map_or("<stream>", |p| p.as_str())
    )]
    Io {
        path: Option<Utf8PathBuf>,
        #[source]
        source: io::Error,
    },
}

impl GearsetError {
    /// Whether the file content (or the layout describing it) is at fault,
    /// as opposed to reading it.
    pub fn is_format_error(&self) -> bool {
        !matches!(self, GearsetError::Io { .. })
    }

    fn with_path(self, file_path: &Utf8Path) -> Self {
        match self {
            GearsetError::Io { path: None, source } => GearsetError::Io {
                path: Some(file_path.to_owned()),
                source,
            },
            other => other,
        }
    }
}

impl From<io::Error> for GearsetError {
    fn from(source: io::Error) -> Self {
        GearsetError::Io { path: None, source }
    }
}

/// Path of a character's gearset file under the user-data root.
pub fn gearset_file_path(userdata: &Utf8Path, character_id: u64) -> Utf8PathBuf {
    userdata
        .join(crate::services::path_classifier::character_dir_name(character_id))
        .join(GEARSET_FILE_NAME)
}

/// Read the existing gearsets from a file on disk.
///
/// The file is opened read-only and shared, so the game can keep it open.
pub fn read_gearsets(
    path: &Utf8Path,
    layout: &GearsetLayout,
) -> Result<Vec<GearsetInfo>, GearsetError> {
    let file = open_shared(path).map_err(|source| GearsetError::Io {
        path: Some(path.to_owned()),
        source,
    })?;

    read_gearsets_from(BufReader::new(file), layout).map_err(|e| e.with_path(path))
}

/// Read the existing gearsets from a stream positioned at the start of a file.
///
/// Returns them in file order, skipping unused slots. Nothing is returned
/// unless every record could be read.
pub fn read_gearsets_from<R: Read + Seek>(
    mut reader: R,
    layout: &GearsetLayout,
) -> Result<Vec<GearsetInfo>, GearsetError> {
    check_layout(layout)?;

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != layout.magic {
        return Err(GearsetError::Format {
            found: magic,
            expected: layout.magic,
        });
    }

    // The rest of the header is not interpreted
    reader.seek(SeekFrom::Start(layout.header_len))?;

    let mut gearsets = Vec::new();
    let mut record = vec![0u8; layout.record_size];

    for index in 0..layout.max_count {
        reader.read_exact(&mut record)?;
        deobfuscate(&mut record, layout.xor_key);

        let Some(gearset) = decode_record(&record, layout) else {
            continue;
        };

        // Records are stored by position, so a mismatch means the layout is off
        if usize::from(gearset.id) != index {
            return Err(GearsetError::InvalidRecord {
                index,
                reason: format!("slot id {} does not match its position", gearset.id),
            });
        }
        gearsets.push(gearset);
    }

    tracing::debug!("Read {} gearsets", gearsets.len());
    Ok(gearsets)
}

/// XOR the whole record with the obfuscation key.
fn deobfuscate(record: &mut [u8], key: u8) {
    for byte in record.iter_mut() {
        *byte ^= key;
    }
}

/// Interpret a plain record, returning `None` for unused slots.
///
/// The record must be at least `layout.record_size` bytes, which
/// [`check_layout`] guarantees covers every field.
fn decode_record(record: &[u8], layout: &GearsetLayout) -> Option<GearsetInfo> {
    if record[layout.flags_offset] & layout.exists_mask == 0 {
        return None;
    }

    let name_end = layout.name_offset + layout.name_len;
    Some(GearsetInfo {
        id: record[layout.id_offset],
        job_id: record[layout.job_offset],
        name: GearsetName::from_padded(&record[layout.name_offset..name_end]),
    })
}

/// Reject layouts that would read outside a record.
pub fn check_layout(layout: &GearsetLayout) -> Result<(), GearsetError> {
    let invalid = |reason: String| Err(GearsetError::InvalidLayout(reason));

    if layout.record_size == 0 {
        return invalid("record size is zero".to_string());
    }
    if layout.header_len < layout.magic.len() as u64 {
        return invalid(format!("header length {} is shorter than the magic", layout.header_len));
    }
    if layout.max_count > usize::from(u8::MAX) + 1 {
        return invalid(format!("{} slots do not fit 8-bit slot ids", layout.max_count));
    }
    if layout.exists_mask == 0 {
        return invalid("exists mask is empty".to_string());
    }

    for (field, offset) in [
        ("id", layout.id_offset),
        ("job", layout.job_offset),
        ("flags", layout.flags_offset),
    ] {
        if offset >= layout.record_size {
            return invalid(format!(
                "{} offset {:#x} is outside the {} byte record",
                field, offset, layout.record_size
            ));
        }
    }

    match layout.name_offset.checked_add(layout.name_len) {
        Some(end) if end <= layout.record_size => Ok(()),
        _ => invalid(format!(
            "name field {:#x}+{} is outside the {} byte record",
            layout.name_offset, layout.name_len, layout.record_size
        )),
    }
}

#[cfg(windows)]
fn open_shared(path: &Utf8Path) -> io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;

    const FILE_SHARE_READ: u32 = 0x1;
    const FILE_SHARE_WRITE: u32 = 0x2;

    std::fs::OpenOptions::new()
        .read(true)
        .share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE)
        .open(path)
}

#[cfg(not(windows))]
fn open_shared(path: &Utf8Path) -> io::Result<File> {
    File::open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn small_layout() -> GearsetLayout {
        GearsetLayout {
            header_len: 8,
            record_size: 16,
            max_count: 3,
            id_offset: 0,
            name_offset: 1,
            name_len: 8,
            job_offset: 10,
            flags_offset: 11,
            ..GearsetLayout::default()
        }
    }

    fn encode(layout: &GearsetLayout, slots: &[Option<(u8, u8, &str)>]) -> Vec<u8> {
        let mut data = layout.magic.to_vec();
        data.resize(layout.header_len as usize, 0xEE);
        for slot in slots {
            let mut record = vec![0u8; layout.record_size];
            if let Some((id, job, name)) = slot {
                record[layout.id_offset] = *id;
                record[layout.job_offset] = *job;
                record[layout.flags_offset] = layout.exists_mask;
                record[layout.name_offset..layout.name_offset + name.len()].copy_from_slice(name.as_bytes());
            }
            data.extend(record.iter().map(|b| b ^ layout.xor_key));
        }
        data
    }

    #[test]
    fn test_reads_existing_slots_in_file_order() {
        let layout = small_layout();
        let data = encode(&layout, &[Some((0, 4, "Lancer")), None, Some((2, 13, "Weaver"))]);

        let gearsets = read_gearsets_from(Cursor::new(data), &layout).unwrap();
        assert_eq!(
            gearsets,
            vec![GearsetInfo::new(0, 4, "Lancer"), GearsetInfo::new(2, 13, "Weaver")]
        );
    }

    #[test]
    fn test_name_fills_whole_field() {
        let layout = small_layout();
        let data = encode(&layout, &[Some((0, 1, "ABCDEFGH")), None, None]);

        let gearsets = read_gearsets_from(Cursor::new(data), &layout).unwrap();
        assert_eq!(gearsets[0].name, "ABCDEFGH");
    }

    #[test]
    fn test_wrong_magic_is_format_error() {
        let layout = small_layout();
        let mut data = encode(&layout, &[Some((0, 4, "Lancer")), None, None]);
        data[..4].copy_from_slice(&[0x04, 0x00, 0x6C, 0x00]);

        let err = read_gearsets_from(Cursor::new(data), &layout).unwrap_err();
        assert!(err.is_format_error());
        assert!(matches!(err, GearsetError::Format { found: [0x04, 0x00, 0x6C, 0x00], .. }));
    }

    #[test]
    fn test_truncated_file_is_io_error() {
        let layout = small_layout();
        let mut data = encode(&layout, &[Some((0, 4, "Lancer")), None, None]);
        data.truncate(data.len() - 1);

        let err = read_gearsets_from(Cursor::new(data), &layout).unwrap_err();
        assert!(matches!(
            err,
            GearsetError::Io { path: None, ref source } if source.kind() == io::ErrorKind::UnexpectedEof
        ));
    }

    #[test]
    fn test_repeated_slot_id_is_rejected() {
        let layout = small_layout();
        let data = encode(&layout, &[Some((0, 4, "A")), Some((0, 5, "B")), None]);

        let err = read_gearsets_from(Cursor::new(data), &layout).unwrap_err();
        assert!(matches!(err, GearsetError::InvalidRecord { index: 1, .. }));
    }

    #[test]
    fn test_record_away_from_its_slot_is_rejected() {
        let layout = small_layout();
        let data = encode(&layout, &[None, None, Some((1, 4, "A"))]);

        let err = read_gearsets_from(Cursor::new(data), &layout).unwrap_err();
        assert!(err.is_format_error());
        assert!(matches!(err, GearsetError::InvalidRecord { index: 2, .. }));
    }

    #[test]
    fn test_layout_outside_record_is_rejected() {
        let layout = GearsetLayout {
            record_size: 0x30,
            ..GearsetLayout::default()
        };
        let err = check_layout(&layout).unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn test_default_layout_is_valid() {
        check_layout(&GearsetLayout::default()).unwrap();
    }

    #[test]
    fn test_gearset_file_path() {
        let path = gearset_file_path(Utf8Path::new("/data"), 0x1234);
        assert_eq!(path, Utf8PathBuf::from("/data/FFXIV_CHR0000000000001234/GEARSET.DAT"));
    }
}
