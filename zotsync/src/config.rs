use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use thiserror::Error;
use zotsync_core::{LibraryRef, LibraryType};

use crate::sync::remote::DEFAULT_RMAPI_PROGRAM;

const DEFAULT_REMARKABLE_DIR_NAME: &str = "Zotero";
const DEFAULT_DOWNLOAD_DIR_NAME: &str = "tmp";
const DEFAULT_LIBRARY_NAME: &str = "Zotero Library";

/// Mirror a Zotero library's collections and PDF attachments onto a reMarkable tablet.
#[derive(Parser, Debug)]
#[command(name = "zotsync", version, about)]
pub struct Cli {
    /// Zotero API key, created at https://www.zotero.org/settings/keys
    #[arg(value_name = "API_KEY")]
    pub api_key: String,

    /// User ID, or the group ID from https://www.zotero.org/groups/<GROUP_ID>
    #[arg(value_name = "LIBRARY_ID")]
    pub library_id: String,

    /// Whether LIBRARY_ID names a group library or a user library
    #[arg(value_name = "LIBRARY_TYPE", value_enum)]
    pub library_type: LibraryKind,

    /// Directory on the tablet the library is mirrored into
    #[arg(
        long,
        alias = "remarkable_root_dir_name",
        default_value = DEFAULT_REMARKABLE_DIR_NAME
    )]
    pub remarkable_root_dir_name: String,

    /// Local directory attachments are downloaded to before upload
    #[arg(
        long,
        alias = "tmp_download_dir_name",
        default_value = DEFAULT_DOWNLOAD_DIR_NAME
    )]
    pub tmp_download_dir_name: String,

    /// Folder name used when the library has several top-level collections
    #[arg(long, default_value = DEFAULT_LIBRARY_NAME)]
    pub library_name: String,

    /// Path to the rmapi binary [env: ZOTSYNC_RMAPI]
    #[arg(long)]
    pub rmapi: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LibraryKind {
    Group,
    User,
}

impl From<LibraryKind> for LibraryType {
    fn from(kind: LibraryKind) -> Self {
        match kind {
            LibraryKind::Group => LibraryType::Group,
            LibraryKind::User => LibraryType::User,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("remarkable root directory name {0:?} names no directory")]
    EmptyRemoteRoot(String),
}

#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub api_key: String,
    pub library: LibraryRef,
    pub remote_root: String,
    pub staging_root: PathBuf,
    pub library_name: String,
    pub rmapi_program: PathBuf,
    /// Overrides the Zotero API endpoint, read from `ZOTSYNC_API_BASE`.
    pub api_base: Option<String>,
}

impl SyncConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let remote_root = cli
            .remarkable_root_dir_name
            .trim()
            .trim_matches('/')
            .to_string();
        if remote_root.is_empty() {
            return Err(ConfigError::EmptyRemoteRoot(cli.remarkable_root_dir_name));
        }

        let home = dirs::home_dir();
        let staging_root = match home.as_deref() {
            Some(home) => expand_with_home(&cli.tmp_download_dir_name, home),
            None => PathBuf::from(&cli.tmp_download_dir_name),
        };
        let rmapi_program = cli
            .rmapi
            .or_else(|| read_string_env("ZOTSYNC_RMAPI").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RMAPI_PROGRAM));

        Ok(Self {
            api_key: cli.api_key,
            library: LibraryRef::new(cli.library_type.into(), cli.library_id),
            remote_root,
            staging_root,
            library_name: cli.library_name,
            rmapi_program,
            api_base: read_string_env("ZOTSYNC_API_BASE"),
        })
    }
}

fn expand_with_home(value: &str, home: &Path) -> PathBuf {
    if value == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = value.strip_prefix("~/") {
        return home.join(rest);
    }
    PathBuf::from(value)
}

fn read_string_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
