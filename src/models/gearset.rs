use std::borrow::Cow;
use std::fmt;

/// Display name of a gearset, kept as the raw bytes found in the slot.
///
/// The game stores names as UTF-8 limited to 3-byte sequences, including
/// private-use codepoints for its own glyphs. Names are only ever compared,
/// so the bytes are kept verbatim and equality is byte equality. Decoding to
/// text only happens for display, and is lossy for sequences that are not
/// valid UTF-8.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct GearsetName(Vec<u8>);

impl GearsetName {
    /// Build a name from a fixed-width, null-padded buffer.
    ///
    /// Stops at the first zero byte, or takes the whole buffer when there is none.
    pub fn from_padded(buffer: &[u8]) -> Self {
        let len = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
        Self(buffer[..len].to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The name as text, if the bytes are valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl From<&str> for GearsetName {
    fn from(name: &str) -> Self {
        Self(name.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for GearsetName {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl PartialEq<str> for GearsetName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for GearsetName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Display for GearsetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl fmt::Debug for GearsetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

/// Summary of one existing gearset: slot id, job and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GearsetInfo {
    pub id: u8,
    pub job_id: u8,
    pub name: GearsetName,
}

impl GearsetInfo {
    pub fn new(id: u8, job_id: u8, name: impl Into<GearsetName>) -> Self {
        Self {
            id,
            job_id,
            name: name.into(),
        }
    }
}

impl fmt::Display for GearsetInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gearset #{} '{}' ({})", self.id, self.name, self.job_id)
    }
}

/// One position of a live gearset table.
///
/// Slots without the exists flag carry no meaningful job or name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GearsetSlot {
    pub exists: bool,
    pub id: u8,
    pub job_id: u8,
    pub name: GearsetName,
}

impl GearsetSlot {
    pub fn empty(id: u8) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// The slot contents as a [`GearsetInfo`], or `None` when the slot is empty.
    pub fn info(&self) -> Option<GearsetInfo> {
        self.exists.then(|| GearsetInfo {
            id: self.id,
            job_id: self.job_id,
            name: self.name.clone(),
        })
    }
}

impl From<GearsetInfo> for GearsetSlot {
    fn from(info: GearsetInfo) -> Self {
        Self {
            exists: true,
            id: info.id,
            job_id: info.job_id,
            name: info.name,
        }
    }
}
