// CLI module for argument parsing and configuration

use crate::config::UserConfig;
use crate::domain::triage::DeniedConsentPolicy;
use crate::domain::{FolderId, SortKey};
use crate::error::{MswpError, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// Mswp - swipe through a media library and clear out what you don't want
///
/// Swipe left to queue a photo or video for deletion, right to keep it.
/// Nothing is deleted until you confirm the queue.
#[derive(Parser, Debug, Clone)]
#[command(name = "mswp")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Media library directory
    ///
    /// Its immediate sub-directories are offered as folders.
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Initial sort order (overrides the saved preference)
    #[arg(short = 's', long = "sort", value_enum)]
    pub sort: Option<SortOrder>,

    /// Only show one folder (sub-directory name, or "." for the root)
    #[arg(short = 'f', long = "folder")]
    pub folder: Option<String>,

    /// Dry run mode - go through the motions without deleting anything
    #[arg(short = 'n', long = "dry-run", action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Ask for consent before every deletion
    #[arg(long = "always-confirm", action = ArgAction::SetTrue)]
    pub always_confirm: bool,

    /// What to do with queued items when deletion consent is refused
    #[arg(long = "on-denied", value_enum)]
    pub on_denied: Option<DeniedAction>,

    /// Show items already kept in earlier sessions
    #[arg(long = "show-kept", action = ArgAction::SetTrue)]
    pub show_kept: bool,

    /// Do not remember keep decisions between sessions
    #[arg(long = "no-persist-keeps", action = ArgAction::SetTrue)]
    pub no_persist_keeps: bool,

    /// Include hidden files and directories (names starting with .)
    #[arg(long = "hidden", action = ArgAction::SetTrue)]
    pub show_hidden: bool,
}

/// Sort order options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    /// Newest first
    Newest,
    /// Oldest first
    Oldest,
    /// Largest first
    Largest,
    /// Smallest first
    Smallest,
}

impl From<SortOrder> for SortKey {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Newest => SortKey::DateDesc,
            SortOrder::Oldest => SortKey::DateAsc,
            SortOrder::Largest => SortKey::SizeDesc,
            SortOrder::Smallest => SortKey::SizeAsc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeniedAction {
    /// Leave the items queued so the confirm can be retried
    Keep,
    /// Put the items back in front of the remaining cards
    Restore,
}

impl From<DeniedAction> for DeniedConsentPolicy {
    fn from(action: DeniedAction) -> Self {
        match action {
            DeniedAction::Keep => DeniedConsentPolicy::KeepQueued,
            DeniedAction::Restore => DeniedConsentPolicy::RestoreToActive,
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate the arguments and return any errors
    pub fn validate(&self) -> Result<()> {
        if !self.directory.exists() {
            return Err(MswpError::InvalidArgument(format!(
                "Directory does not exist: {}",
                self.directory.display()
            )));
        }

        if !self.directory.is_dir() {
            return Err(MswpError::InvalidArgument(format!(
                "Path is not a directory: {}",
                self.directory.display()
            )));
        }

        if let Some(ref folder) = self.folder {
            if folder.is_empty() || folder.contains(std::path::MAIN_SEPARATOR) {
                return Err(MswpError::InvalidArgument(format!(
                    "Invalid folder '{}': use a sub-directory name or '.'",
                    folder
                )));
            }
            let dir = self.directory.join(folder);
            if !dir.is_dir() {
                return Err(MswpError::InvalidArgument(format!(
                    "Folder does not exist: {}",
                    dir.display()
                )));
            }
        }

        Ok(())
    }
}

/// Configuration derived from CLI arguments and saved preferences
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub directory: PathBuf,
    pub sort_key: SortKey,
    pub folder: Option<FolderId>,
    pub dry_run: bool,
    pub always_confirm: bool,
    pub denied_policy: DeniedConsentPolicy,
    pub show_kept: bool,
    pub persist_keeps: bool,
    pub show_hidden: bool,
}

impl AppConfig {
    /// Command line flags win over the saved preferences
    pub fn from_args(args: Args, user: &UserConfig) -> Self {
        AppConfig {
            directory: args.directory,
            sort_key: args.sort.map(SortKey::from).unwrap_or(user.sort_key),
            folder: args.folder.map(FolderId),
            dry_run: args.dry_run,
            always_confirm: args.always_confirm || user.always_confirm,
            denied_policy: args
                .on_denied
                .map(DeniedConsentPolicy::from)
                .unwrap_or(user.denied_policy),
            show_kept: args.show_kept,
            persist_keeps: !args.no_persist_keeps,
            show_hidden: args.show_hidden,
        }
    }
}

impl From<Args> for AppConfig {
    fn from(args: Args) -> Self {
        AppConfig::from_args(args, &UserConfig::default())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            directory: PathBuf::from("."),
            sort_key: SortKey::default(),
            folder: None,
            dry_run: false,
            always_confirm: false,
            denied_policy: DeniedConsentPolicy::default(),
            show_kept: false,
            persist_keeps: true,
            show_hidden: false,
        }
    }
}
