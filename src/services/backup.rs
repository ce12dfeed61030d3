//! Backups of every character's DAT files, taken when the plugin loads.
//!
//! Each backup is a folder named after the current Unix time, holding one
//! sub-folder per character. Only the most recent few backups are kept.

use crate::services::path_classifier::CHARACTER_DIR_PREFIX;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

/// Service copying character save folders into a rotating backup directory
#[derive(Debug, Clone)]
pub struct BackupService {
    backup_dir: Utf8PathBuf,
}

/// What a backup run copied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupSummary {
    pub folder: Option<Utf8PathBuf>,
    pub characters: usize,
    pub files: usize,
}

impl BackupService {
    /// Backups older than the newest this many are pruned before a new one is taken
    pub const RETAINED_BACKUPS: usize = 2;

    pub fn new(backup_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    pub fn backup_dir(&self) -> &Utf8Path {
        &self.backup_dir
    }

    /// Back up the DAT files of all characters under `userdata`, stamped with the current time.
    pub fn run(&self, userdata: &Utf8Path) -> Result<BackupSummary> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("System clock is before the Unix epoch")?
            .as_secs();
        self.run_at(userdata, stamp)
    }

    /// Back up into a folder named `stamp`.
    pub fn run_at(&self, userdata: &Utf8Path, stamp: u64) -> Result<BackupSummary> {
        fs::create_dir_all(&self.backup_dir)
            .with_context(|| format!("Failed to create backup directory: {}", self.backup_dir))?;

        self.prune()?;

        let this_backup = self.backup_dir.join(stamp.to_string());
        fs::create_dir_all(&this_backup)
            .with_context(|| format!("Failed to create backup folder: {}", this_backup))?;

        if !userdata.is_dir() {
            tracing::error!("Could not find XIV folder at {}", userdata);
            return Ok(BackupSummary::default());
        }

        let mut summary = BackupSummary {
            folder: Some(this_backup.clone()),
            ..BackupSummary::default()
        };

        for character_dir in character_dirs(userdata)? {
            let Some(dir_name) = character_dir.file_name() else {
                continue;
            };
            let target_dir = this_backup.join(dir_name);
            tracing::info!("{}", target_dir);
            fs::create_dir_all(&target_dir)
                .with_context(|| format!("Failed to create backup folder: {}", target_dir))?;

            for dat in dat_files(&character_dir)? {
                let Some(file_name) = dat.file_name() else {
                    continue;
                };
                fs::copy(&dat, target_dir.join(file_name))
                    .with_context(|| format!("Failed to back up {}", dat))?;
                summary.files += 1;
            }
            summary.characters += 1;
        }

        tracing::info!(
            "Backup OK! {} files from {} characters",
            summary.files,
            summary.characters
        );
        Ok(summary)
    }

    /// Existing backup folders, oldest first. Folders not named by a timestamp are ignored.
    pub fn list_backups(&self) -> Result<Vec<(u64, Utf8PathBuf)>> {
        let mut backups = Vec::new();
        if !self.backup_dir.is_dir() {
            return Ok(backups);
        }

        for entry in self
            .backup_dir
            .read_dir_utf8()
            .with_context(|| format!("Failed to list backups in {}", self.backup_dir))?
        {
            let entry = entry.context("Failed to read backup folder entry")?;
            if !entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }
            if let Ok(stamp) = entry.file_name().parse::<u64>() {
                backups.push((stamp, entry.path().to_owned()));
            }
        }

        backups.sort_by_key(|(stamp, _)| *stamp);
        Ok(backups)
    }

    /// Delete the oldest backup when more than the retained count exist.
    fn prune(&self) -> Result<()> {
        let backups = self.list_backups()?;
        if backups.len() > Self::RETAINED_BACKUPS {
            if let Some((_, oldest)) = backups.first() {
                tracing::debug!("Removing old backup {}", oldest);
                fs::remove_dir_all(oldest)
                    .with_context(|| format!("Failed to remove old backup: {}", oldest))?;
            }
        }
        Ok(())
    }
}

fn character_dirs(userdata: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let mut dirs = Vec::new();
    for entry in userdata
        .read_dir_utf8()
        .with_context(|| format!("Failed to list {}", userdata))?
    {
        let entry = entry.context("Failed to read user data entry")?;
        if entry.file_type().is_ok_and(|t| t.is_dir())
            && entry.file_name().starts_with(CHARACTER_DIR_PREFIX)
        {
            dirs.push(entry.path().to_owned());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn dat_files(character_dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();
    for entry in character_dir
        .read_dir_utf8()
        .with_context(|| format!("Failed to list {}", character_dir))?
    {
        let entry = entry.context("Failed to read character folder entry")?;
        if entry.file_type().is_ok_and(|t| t.is_file())
            && entry.path().extension().is_some_and(|ext| ext.eq_ignore_ascii_case("DAT"))
        {
            files.push(entry.path().to_owned());
        }
    }
    Ok(files)
}
