//! Recognition of per-character save files from the paths the game opens.
//!
//! Character folders live under the user-data root as `FFXIV_CHR<cid>` where
//! `<cid>` is the 64-bit content id in hex. Paths use forward slashes.

use regex::Regex;
use std::sync::LazyLock;

/// Folder name prefix of a character's save directory
pub const CHARACTER_DIR_PREFIX: &str = "FFXIV_CHR";

/// Files that hold per-character data and must never be shared.
pub const DENYLISTED_FILES: [&str; 4] = ["ITEMODR.DAT", "ITEMFDR.DAT", "GEARSET.DAT", "UISAVE.DAT"];

static SAVE_PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<root>.*)FFXIV_CHR(?P<cid>[0-9A-Fa-f]{1,16})/(?P<file>[^/]+)$")
        .expect("save path regex is valid")
});

/// Save-data root, character and file of an intercepted path.
///
/// `root` keeps its trailing separator, so `{root}FFXIV_CHR{cid}/{file_name}`
/// rebuilds the original path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterSaveIdentity<'a> {
    pub root: &'a str,
    pub character_id: u64,
    pub file_name: &'a str,
}

/// Classify a path opened by the game.
///
/// Returns `None` for anything outside a character save folder and for
/// denylisted files. Never fails: malformed input is simply not applicable.
pub fn classify(path: &str) -> Option<CharacterSaveIdentity<'_>> {
    let captures = SAVE_PATH_PATTERN.captures(path)?;
    let root = captures.name("root")?.as_str();
    let cid = captures.name("cid")?.as_str();
    let file_name = captures.name("file")?.as_str();

    if is_denylisted(file_name) {
        return None;
    }

    let character_id = u64::from_str_radix(cid, 16).ok()?;

    Some(CharacterSaveIdentity {
        root,
        character_id,
        file_name,
    })
}

/// Whether a file name must never be redirected.
pub fn is_denylisted(file_name: &str) -> bool {
    DENYLISTED_FILES.contains(&file_name) || file_name.ends_with(".log")
}

/// Name of a character's save folder, with the id as 16 uppercase hex digits.
pub fn character_dir_name(character_id: u64) -> String {
    format!("{}{:016X}", CHARACTER_DIR_PREFIX, character_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "C:/Users/me/Documents/My Games/FINAL FANTASY XIV - A Realm Reborn/";

    #[test]
    fn test_classify_hotbar() {
        let path = format!("{ROOT}FFXIV_CHR0000000000000001/HOTBAR.DAT");
        let identity = classify(&path).unwrap();

        assert_eq!(identity.root, ROOT);
        assert_eq!(identity.character_id, 1);
        assert_eq!(identity.file_name, "HOTBAR.DAT");
    }

    #[test]
    fn test_classify_mixed_case_hex() {
        let path = format!("{ROOT}FFXIV_CHR004000001aBcDeF0/MACRO.DAT");
        let identity = classify(&path).unwrap();
        assert_eq!(identity.character_id, 0x0040_0000_1ABC_DEF0);
    }

    #[test]
    fn test_denylisted_files_are_not_applicable() {
        for name in DENYLISTED_FILES {
            let path = format!("{ROOT}FFXIV_CHR0000000000000001/{name}");
            assert_eq!(classify(&path), None, "{name} should be denylisted");
        }
    }

    #[test]
    fn test_log_files_are_not_applicable() {
        let path = format!("{ROOT}FFXIV_CHR0000000000000001/chat_2023.log");
        assert_eq!(classify(&path), None);
    }

    #[test]
    fn test_paths_outside_save_tree() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("C:/Games/ffxiv/game/sqpack/ffxiv/000000.win32.index"), None);
        assert_eq!(classify(&format!("{ROOT}FFXIV.cfg")), None);
        assert_eq!(classify(&format!("{ROOT}FFXIV_CHR0000000000000001/")), None);
        assert_eq!(classify(&format!("{ROOT}FFXIV_CHR0000000000000001/sub/HOTBAR.DAT")), None);
    }

    #[test]
    fn test_malformed_character_ids() {
        assert_eq!(classify(&format!("{ROOT}FFXIV_CHR/HOTBAR.DAT")), None);
        assert_eq!(classify(&format!("{ROOT}FFXIV_CHRnothex/HOTBAR.DAT")), None);
        assert_eq!(classify(&format!("{ROOT}FFXIV_CHR00000000000000001/HOTBAR.DAT")), None);
    }

    #[test]
    fn test_character_dir_name_is_zero_padded() {
        assert_eq!(character_dir_name(5), "FFXIV_CHR0000000000000005");
        assert_eq!(character_dir_name(0xABCDEF), "FFXIV_CHR0000000000ABCDEF");
        assert_eq!(character_dir_name(u64::MAX), "FFXIV_CHRFFFFFFFFFFFFFFFF");
    }
}
