//! Shared fixtures: builds obfuscated gearset files the way the game writes them.

#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use charsync::GearsetLayout;
use std::fs;
use tempfile::TempDir;

/// Exotic name with private-use glyphs and multi-byte characters
pub const EXOTIC_NAME: &str = "\u{2665}\u{2573}üñîçó\u{e074}Ｅ\u{e04c}\u{2661}タタル\u{e03c}";

/// Longest name the game lets you type: 15 three-byte characters
pub const LONGEST_TYPED_NAME: &str = "タタルタタルタタルタタルタタル";

pub struct GearsetFileBuilder {
    layout: GearsetLayout,
    records: Vec<Vec<u8>>,
}

impl GearsetFileBuilder {
    pub fn new(layout: GearsetLayout) -> Self {
        let records = vec![vec![0u8; layout.record_size]; layout.max_count];
        Self { layout, records }
    }

    /// Put an existing gearset in the record matching its slot id.
    pub fn gearset(self, id: u8, job_id: u8, name: &str) -> Self {
        self.gearset_bytes(id, job_id, name.as_bytes())
    }

    pub fn gearset_bytes(mut self, id: u8, job_id: u8, name: &[u8]) -> Self {
        let layout = &self.layout;
        let record = &mut self.records[usize::from(id)];
        record[layout.id_offset] = id;
        record[layout.job_offset] = job_id;
        // Unrelated flag bits are set too, only the exists bit matters
        record[layout.flags_offset] = layout.exists_mask | 0x40;
        let name_field = &mut record[layout.name_offset..layout.name_offset + layout.name_len];
        name_field.fill(0);
        name_field[..name.len()].copy_from_slice(name);
        self
    }

    /// A slot whose exists bit is clear but whose data is not blank.
    pub fn deleted(mut self, id: u8, job_id: u8, name: &str) -> Self {
        self = self.gearset(id, job_id, name);
        let layout = &self.layout;
        self.records[usize::from(id)][layout.flags_offset] &= !layout.exists_mask;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = self.layout.magic.to_vec();
        // Header bytes after the magic are never interpreted
        data.extend((data.len() as u64..self.layout.header_len).map(|i| i as u8 ^ 0x5A));
        for record in &self.records {
            data.extend(record.iter().map(|b| b ^ self.layout.xor_key));
        }
        // Footer data is ignored
        data.extend_from_slice(&[0xAB; 32]);
        data
    }

    pub fn write_to(&self, path: &Utf8Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, self.build()).unwrap();
    }
}

/// The 26 gearsets of a real character: slots 0-22, then 29, 30 and 99.
pub fn sample_character() -> GearsetFileBuilder {
    let mut builder = GearsetFileBuilder::new(GearsetLayout::default())
        .gearset(0, 4, "Lancer")
        .gearset(1, 13, "Weaver");
    for id in 2..=22u8 {
        builder = builder.gearset(id, 8 + id, &format!("Set {}", id));
    }
    builder
        .deleted(25, 19, "Old paladin")
        .gearset(29, 31, EXOTIC_NAME)
        .gearset(30, 31, LONGEST_TYPED_NAME)
        .gearset(99, 31, "Last")
}

pub fn temp_utf8_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, path)
}
