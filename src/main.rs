//! CharacterSync - Share game settings between characters
//!
//! Command line front end for inspecting what the plugin does.
//!
//! # Commands
//!
//! - `classify <PATH>`: Show how a path opened by the game would be routed
//! - `gearsets <FILE>`: List the gearsets stored in a `GEARSET.DAT`
//! - `plan --userdata <DIR> --alt <CID>`: Dry-run gearset reconciliation of an
//!   alt character against the main character, using their files on disk
//! - `backup --userdata <DIR>`: Back up every character's DAT files
//! - `set-main <CID>`: Persist the main character
//!
//! Character ids are given in hex, as they appear in `FFXIV_CHR<cid>` folder names.
//! Nothing here writes game files.

use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use charsync::logging::{LoggingOptions, setup_logging};
use charsync::services::gearset_file::{gearset_file_path, read_gearsets};
use charsync::services::{
    BackupService, FileRedirector, GearsetStore, GearsetTable, RedirectDecision, SafeMode,
    classify, reconcile,
};
use charsync::{APP_NAME, ConfigManager, SharedConfig, SyncMetrics, VERSION};
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "charsync", version, about = "Share game settings between characters")]
struct Cli {
    /// Directory holding CharacterSync.yaml, backups and logs
    #[arg(long, global = true, default_value = "CharacterSync Data")]
    config_dir: Utf8PathBuf,

    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show how a save path would be routed with the current configuration
    Classify { path: String },

    /// List the gearsets stored in a gearset file
    Gearsets { file: Utf8PathBuf },

    /// Dry-run gearset reconciliation between two characters
    Plan {
        /// Game user-data root holding the FFXIV_CHR folders
        #[arg(long)]
        userdata: Utf8PathBuf,

        /// Character whose gearsets get renumbered
        #[arg(long, value_parser = parse_character_id)]
        alt: u64,

        /// Main character, defaults to the configured one
        #[arg(long, value_parser = parse_character_id)]
        main: Option<u64>,
    },

    /// Back up the DAT files of every character
    Backup {
        #[arg(long)]
        userdata: Utf8PathBuf,
    },

    /// Set the main character (0 to disable syncing)
    SetMain {
        #[arg(value_parser = parse_character_id)]
        character_id: u64,
    },
}

fn parse_character_id(value: &str) -> Result<u64> {
    let hex = value.strip_prefix("FFXIV_CHR").unwrap_or(value);
    u64::from_str_radix(hex, 16).with_context(|| format!("'{}' is not a hex character id", value))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::new(&cli.config_dir)?;
    let mut logging = LoggingOptions::new(config_manager.log_dir());
    logging.debug_mode = cli.debug;
    let _guard = setup_logging(&logging)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let config = config_manager.load()?;

    match cli.command {
        Command::Classify { path } => {
            let Some(identity) = classify(&path) else {
                println!("not applicable: outside a character folder or never shared");
                return Ok(());
            };
            println!(
                "root={} character={:016X} file={}",
                identity.root, identity.character_id, identity.file_name
            );

            let redirector = FileRedirector::new(
                SharedConfig::new(config),
                SafeMode::inactive(),
                Arc::new(SyncMetrics::new()),
            );
            match redirector.decide(&path) {
                RedirectDecision::Redirect { target } => println!("redirect -> {}", target),
                other => println!("{:?}", other),
            }
        }

        Command::Gearsets { file } => {
            let gearsets = read_gearsets(&file, &config.gearset_layout)?;
            println!("Parsed {} gearsets:", gearsets.len());
            for gearset in gearsets {
                println!("{}", gearset);
            }
        }

        Command::Plan {
            userdata,
            alt,
            main,
        } => {
            let Some(main) = main.or(config.main_character()) else {
                bail!("No main character given or configured");
            };
            if main == alt {
                bail!("Main and alt character are the same");
            }

            let layout = &config.gearset_layout;
            let main_gearsets = read_gearsets(&gearset_file_path(&userdata, main), layout)?;
            let alt_gearsets = read_gearsets(&gearset_file_path(&userdata, alt), layout)?;
            let mut table = GearsetTable::from_gearsets(layout.max_count, alt_gearsets)?;

            let report = reconcile(&main_gearsets, &mut table)?;
            for matched in &report.matches {
                let action = if matched.needs_swap() { "swap" } else { "keep" };
                println!(
                    "{} #{} -> #{} (by {})",
                    action, matched.alt_id, matched.main_id, matched.kind
                );
            }
            for id in &report.unmatched {
                println!("no counterpart for main #{}", id);
            }
            println!("{} swaps; resulting table:", report.swap_count());
            for gearset in table.existing_gearsets()? {
                println!("{}", gearset);
            }
        }

        Command::Backup { userdata } => {
            let summary = BackupService::new(config_manager.backup_dir()).run(&userdata)?;
            println!(
                "Backed up {} files from {} characters",
                summary.files, summary.characters
            );
        }

        Command::SetMain { character_id } => {
            let mut config = config;
            config.main_character_id = character_id;
            config_manager.save(&config)?;
            println!("Main character set to {:016X}", character_id);
        }
    }

    Ok(())
}
