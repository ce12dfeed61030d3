//! Redirect policy and the file-open interception boundary.
//!
//! Every save file the game opens goes through [`FileRedirector::intercept`].
//! Shared files of any character are rewritten to point at the main
//! character's folder, everything else passes through untouched.

use crate::metrics::SyncMetrics;
use crate::models::SyncFlags;
use crate::services::path_classifier::{self, CharacterSaveIdentity};
use crate::state::SharedConfig;
use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Files that can follow the main character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncedFile {
    Hotbar,
    Macro,
    Keybind,
    LogFilter,
    CharacterSettings,
    KeyboardSettings,
    GamepadSettings,
    CardSets,
    /// HUD layout, always shared once a main character is set
    Addon,
}

impl SyncedFile {
    pub const ALL: [SyncedFile; 9] = [
        SyncedFile::Hotbar,
        SyncedFile::Macro,
        SyncedFile::Keybind,
        SyncedFile::LogFilter,
        SyncedFile::CharacterSettings,
        SyncedFile::KeyboardSettings,
        SyncedFile::GamepadSettings,
        SyncedFile::CardSets,
        SyncedFile::Addon,
    ];

    /// Look up a file by its exact on-disk name. Unknown names map to `None`.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|file| file.file_name() == file_name)
    }

    pub fn file_name(self) -> &'static str {
        match self {
            SyncedFile::Hotbar => "HOTBAR.DAT",
            SyncedFile::Macro => "MACRO.DAT",
            SyncedFile::Keybind => "KEYBIND.DAT",
            SyncedFile::LogFilter => "LOGFLTR.DAT",
            SyncedFile::CharacterSettings => "COMMON.DAT",
            SyncedFile::KeyboardSettings => "CONTROL0.DAT",
            SyncedFile::GamepadSettings => "CONTROL1.DAT",
            SyncedFile::CardSets => "GS.DAT",
            SyncedFile::Addon => "ADDON.DAT",
        }
    }

    /// Whether the user enabled sharing for this file.
    pub fn is_enabled(self, flags: &SyncFlags) -> bool {
        match self {
            SyncedFile::Hotbar => flags.hotbars,
            SyncedFile::Macro => flags.macro_,
            SyncedFile::Keybind => flags.keybind,
            SyncedFile::LogFilter => flags.log_filter,
            SyncedFile::CharacterSettings => flags.character_settings,
            SyncedFile::KeyboardSettings => flags.keyboard_settings,
            SyncedFile::GamepadSettings => flags.gamepad_settings,
            SyncedFile::CardSets => flags.card_sets,
            SyncedFile::Addon => true,
        }
    }
}

/// Decide whether an access to `file_name` goes to the main character's copy.
///
/// `main_character_id` of 0 means no main character is configured.
pub fn should_redirect(file_name: &str, flags: &SyncFlags, main_character_id: u64) -> bool {
    if main_character_id == 0 {
        return false;
    }

    SyncedFile::from_file_name(file_name).is_some_and(|file| file.is_enabled(flags))
}

/// Path of the same file in the main character's folder.
pub fn redirect_target(identity: &CharacterSaveIdentity<'_>, main_character_id: u64) -> String {
    format!(
        "{}{}/{}",
        identity.root,
        path_classifier::character_dir_name(main_character_id),
        identity.file_name
    )
}

/// Why the plugin was loaded, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadReason {
    /// Loaded with the game
    Boot,
    /// Freshly installed from the plugin installer
    Installer,
    /// Reloaded or enabled by the user
    Reload,
    /// Reloaded after an update
    Update,
}

/// Process-lifetime switch that disables rewrites.
///
/// Set when the plugin was just installed, or when it loaded while a
/// character was already logged in: the game already holds that character's
/// files, and swapping them mid-session would overwrite the main character's
/// data on the next save. Decided once at startup and never reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SafeMode(bool);

impl SafeMode {
    pub fn detect(reason: LoadReason, logged_in: bool) -> Self {
        if reason == LoadReason::Installer {
            tracing::warn!("Installer, safe mode...");
            Self(true)
        } else if logged_in {
            tracing::warn!("Boot while logged in, safe mode...");
            Self(true)
        } else {
            Self(false)
        }
    }

    pub const fn inactive() -> Self {
        Self(false)
    }

    pub const fn active() -> Self {
        Self(true)
    }

    pub fn is_active(self) -> bool {
        self.0
    }
}

/// Outcome of routing one intercepted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    /// Not a shareable character save file
    NotApplicable,
    /// A character save file that stays with its own character
    PassThrough,
    /// Would have been considered, but safe mode is on
    SafeMode,
    /// Open this path instead
    Redirect { target: String },
}

/// The interception boundary in front of the game's file-open call.
#[derive(Clone)]
pub struct FileRedirector {
    config: SharedConfig,
    safe_mode: SafeMode,
    metrics: Arc<SyncMetrics>,
}

impl FileRedirector {
    pub fn new(config: SharedConfig, safe_mode: SafeMode, metrics: Arc<SyncMetrics>) -> Self {
        Self {
            config,
            safe_mode,
            metrics,
        }
    }

    pub fn safe_mode(&self) -> SafeMode {
        self.safe_mode
    }

    /// Route a path without side effects other than reading the config.
    pub fn decide(&self, path: &str) -> RedirectDecision {
        let (main_character_id, flags) =
            self.config.read(|config| (config.main_character_id, config.sync.clone()));

        if main_character_id == 0 {
            return RedirectDecision::PassThrough;
        }

        let Some(identity) = path_classifier::classify(path) else {
            return RedirectDecision::NotApplicable;
        };

        if self.safe_mode.is_active() {
            return RedirectDecision::SafeMode;
        }

        if !should_redirect(identity.file_name, &flags, main_character_id) {
            return RedirectDecision::PassThrough;
        }

        RedirectDecision::Redirect {
            target: redirect_target(&identity, main_character_id),
        }
    }

    /// Return the path the game should actually open.
    ///
    /// Never fails: any panic while routing is logged and the original path is
    /// returned, since failing the file open would be worse than skipping a
    /// redirect.
    pub fn intercept<'a>(&self, path: &'a str) -> Cow<'a, str> {
        self.route(path, || self.decide(path))
    }

    /// Apply a routing decision, containing any panic raised while making it.
    fn route<'a>(&self, path: &'a str, decide: impl FnOnce() -> RedirectDecision) -> Cow<'a, str> {
        self.metrics.record_path_intercepted();

        match panic::catch_unwind(AssertUnwindSafe(decide)) {
            Ok(RedirectDecision::Redirect { target }) => {
                tracing::info!("REWRITE: {}", target);
                self.metrics.record_redirect();
                Cow::Owned(target)
            }
            Ok(RedirectDecision::SafeMode) => {
                tracing::info!("SAFE MODE: {}", path);
                self.metrics.record_safe_mode_skip();
                Cow::Borrowed(path)
            }
            Ok(_) => Cow::Borrowed(path),
            Err(_) => {
                tracing::error!("ERROR while routing {}, opening it unchanged", path);
                self.metrics.record_intercept_error();
                Cow::Borrowed(path)
            }
        }
    }
}
