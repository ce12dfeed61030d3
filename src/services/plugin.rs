//! Host-facing entry points: boot, file-open hook, login event and chat command.
//!
//! The host owns the hook trampoline, the login notification and the live
//! gearset table; it calls into [`CharacterSync`] and passes the table in as a
//! [`GearsetStore`].

use crate::config::ConfigManager;
use crate::metrics::SyncMetrics;
use crate::services::backup::BackupService;
use crate::services::gearset_file;
use crate::services::reconcile::{self, GearsetStore, ReconcileReport};
use crate::services::redirect::{FileRedirector, LoadReason, SafeMode};
use crate::state::SharedConfig;
use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

/// Chat command registered by the host
pub const COMMAND: &str = "/pcharsync";

/// What the host knows when it loads the plugin.
#[derive(Debug, Clone)]
pub struct BootContext {
    /// Plugin configuration directory
    pub config_dir: Utf8PathBuf,
    /// Game user-data root holding the `FFXIV_CHR*` folders
    pub userdata_dir: Utf8PathBuf,
    pub load_reason: LoadReason,
    /// Whether a character is already logged in
    pub logged_in: bool,
}

/// Result of a chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// `fix-gearsets` ran; `None` when it was skipped or failed
    FixedGearsets(Option<ReconcileReport>),
    /// Anything else toggles the configuration window
    ToggleConfigWindow,
}

/// The plugin core.
pub struct CharacterSync {
    config_manager: ConfigManager,
    config: SharedConfig,
    redirector: FileRedirector,
    userdata_dir: Utf8PathBuf,
    metrics: Arc<SyncMetrics>,
    show_safe_mode_warning: bool,
}

impl CharacterSync {
    /// Load the configuration, decide safe mode and back up the save folders.
    ///
    /// Only a config directory that cannot be created is fatal; a broken
    /// config file falls back to defaults and a failed backup is logged.
    pub fn boot(context: BootContext) -> Result<Self> {
        let config_manager = ConfigManager::new(&context.config_dir)?;
        let config = match config_manager.load() {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Could not load configuration, using defaults: {:#}", e);
                Default::default()
            }
        };
        let config = SharedConfig::new(config);

        let safe_mode = SafeMode::detect(context.load_reason, context.logged_in);
        let show_safe_mode_warning = safe_mode.is_active() && context.load_reason != LoadReason::Installer;

        let backups = BackupService::new(config_manager.backup_dir());
        if let Err(e) = backups.run(&context.userdata_dir) {
            tracing::error!("Could not backup character data files: {:#}", e);
        }

        let metrics = Arc::new(SyncMetrics::new());
        let redirector = FileRedirector::new(config.clone(), safe_mode, Arc::clone(&metrics));

        Ok(Self {
            config_manager,
            config,
            redirector,
            userdata_dir: context.userdata_dir,
            metrics,
            show_safe_mode_warning,
        })
    }

    /// Called for every file the game opens; returns the path to actually open.
    pub fn on_file_open<'a>(&self, path: &'a str) -> Cow<'a, str> {
        self.redirector.intercept(path)
    }

    /// Called once the logged-in character is known.
    pub fn on_login<S>(&self, current_character_id: u64, store: &mut S) -> Option<ReconcileReport>
    where
        S: GearsetStore + ?Sized,
    {
        tracing::info!("OnLogin with {:016X}", current_character_id);
        self.fix_gearsets(current_character_id, store)
    }

    /// Handle `/pcharsync <arguments>`.
    pub fn on_command<S>(&self, arguments: &str, current_character_id: u64, store: &mut S) -> CommandOutcome
    where
        S: GearsetStore + ?Sized,
    {
        if arguments.trim() == "fix-gearsets" {
            CommandOutcome::FixedGearsets(self.fix_gearsets(current_character_id, store))
        } else {
            CommandOutcome::ToggleConfigWindow
        }
    }

    /// Renumber the current character's gearsets to match the main character.
    ///
    /// Skipped without touching any file when no main character is set or the
    /// main character is the one logged in. Errors are logged, not returned;
    /// swaps applied before an error are kept.
    pub fn fix_gearsets<S>(&self, current_character_id: u64, store: &mut S) -> Option<ReconcileReport>
    where
        S: GearsetStore + ?Sized,
    {
        let (main_character_id, layout) = self
            .config
            .read(|config| (config.main_character_id, config.gearset_layout.clone()));
        let timings = Instant::now();
        tracing::info!("Starting FixGearsets with mainCid={:016X}", main_character_id);

        if main_character_id == 0 || main_character_id == current_character_id {
            tracing::info!("No main character configured or already logged in, skipping");
            return None;
        }

        let main_file = gearset_file::gearset_file_path(&self.userdata_dir, main_character_id);
        let result = reconcile::reconcile_from_file(&main_file, &layout, store);
        let elapsed = timings.elapsed();

        let report = match result {
            Ok(report) => {
                self.metrics.record_reconciliation(report.swap_count(), elapsed);
                Some(report)
            }
            Err(e) => {
                tracing::error!(
                    "Unable to fix gearset numbers for main {:016X}: {:#}",
                    main_character_id,
                    anyhow::Error::from(e)
                );
                self.metrics.record_reconcile_failure();
                None
            }
        };

        tracing::info!("FixGearsets done in {}µs", elapsed.as_micros());
        report
    }

    /// Change the main character and persist the configuration.
    pub fn set_main_character(&self, character_id: u64) -> Result<()> {
        self.config.set_main_character(character_id);
        self.config_manager.save(&self.config.snapshot())
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    pub fn userdata_dir(&self) -> &Utf8Path {
        &self.userdata_dir
    }

    pub fn safe_mode(&self) -> SafeMode {
        self.redirector.safe_mode()
    }

    /// Whether the host should tell the user that safe mode is on until restart.
    pub fn show_safe_mode_warning(&self) -> bool {
        self.show_safe_mode_warning
    }

    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    /// Called when the host unloads the plugin.
    pub fn shutdown(&self) {
        self.metrics.log_summary();
    }
}
