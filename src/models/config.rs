use serde::{Deserialize, Serialize};

/// User configuration from CharacterSync.yaml
///
/// Holds the main character and the per-file sync switches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Content id of the main character, 0 when none is configured
    #[serde(default)]
    pub main_character_id: u64,

    #[serde(default)]
    pub sync: SyncFlags,

    #[serde(default)]
    pub gearset_layout: GearsetLayout,
}

impl SyncConfig {
    /// The configured main character, if any.
    pub fn main_character(&self) -> Option<u64> {
        (self.main_character_id != 0).then_some(self.main_character_id)
    }
}

/// Which per-character files are shared with the main character.
///
/// `ADDON.DAT` has no switch, it follows the main character whenever one is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFlags {
    /// HOTBAR.DAT
    #[serde(default = "enabled")]
    pub hotbars: bool,

    /// MACRO.DAT
    #[serde(rename = "macro", default = "enabled")]
    pub macro_: bool,

    /// KEYBIND.DAT
    #[serde(default = "enabled")]
    pub keybind: bool,

    /// LOGFLTR.DAT
    #[serde(default)]
    pub log_filter: bool,

    /// COMMON.DAT
    #[serde(default)]
    pub character_settings: bool,

    /// CONTROL0.DAT
    #[serde(default)]
    pub keyboard_settings: bool,

    /// CONTROL1.DAT
    #[serde(default)]
    pub gamepad_settings: bool,

    /// GS.DAT
    #[serde(default)]
    pub card_sets: bool,
}

impl Default for SyncFlags {
    fn default() -> Self {
        Self {
            hotbars: true,
            macro_: true,
            keybind: true,
            log_filter: false,
            character_settings: false,
            keyboard_settings: false,
            gamepad_settings: false,
            card_sets: false,
        }
    }
}

fn enabled() -> bool {
    true
}

/// Binary layout of GEARSET.DAT and of a single gearset record.
///
/// Records share the layout of the game's in-memory gearset entries, so these
/// values move with game patches. Defaults match patch 6.5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GearsetLayout {
    /// Magic/version word at the start of the file
    pub magic: [u8; 4],

    /// Absolute offset of the first record
    pub header_len: u64,

    /// Size of one record, in bytes
    pub record_size: usize,

    /// Number of records in the file
    pub max_count: usize,

    /// Every record byte is XORed with this key on disk
    pub xor_key: u8,

    pub id_offset: usize,
    pub name_offset: usize,
    pub name_len: usize,
    pub job_offset: usize,
    pub flags_offset: usize,

    /// Bit of the flags byte telling whether the slot is in use
    pub exists_mask: u8,
}

impl Default for GearsetLayout {
    fn default() -> Self {
        Self {
            magic: [0x05, 0x00, 0x6C, 0x00],
            header_len: 21,
            record_size: 448,
            max_count: 100,
            xor_key: 0x73,
            id_offset: 0x00,
            name_offset: 0x01,
            name_len: 48,
            job_offset: 0x31,
            flags_offset: 0x37,
            exists_mask: 0x01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_flags_defaults() {
        let flags = SyncFlags::default();
        assert!(flags.hotbars);
        assert!(flags.macro_);
        assert!(flags.keybind);
        assert!(!flags.log_filter);
        assert!(!flags.card_sets);
    }

    #[test]
    fn test_main_character_unset() {
        let mut config = SyncConfig::default();
        assert_eq!(config.main_character(), None);

        config.main_character_id = 0x0040_0000_1234_5678;
        assert_eq!(config.main_character(), Some(0x0040_0000_1234_5678));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: SyncConfig =
            serde_yaml_ng::from_str("main_character_id: 5\nsync:\n  card_sets: true\n").unwrap();

        assert_eq!(config.main_character_id, 5);
        assert!(config.sync.card_sets);
        assert!(config.sync.hotbars);
        assert_eq!(config.gearset_layout, GearsetLayout::default());
    }

    #[test]
    fn test_default_layout_fits_record() {
        let layout = GearsetLayout::default();
        assert!(layout.name_offset + layout.name_len <= layout.record_size);
        assert!(layout.flags_offset < layout.record_size);
        assert_eq!(layout.header_len, 21);
    }
}
