//! Executable extraction from release archives.
//!
//! Supports gzip-compressed tarballs (`.tar.gz`, `.tgz`) and zip files. Any
//! other asset is taken to be the executable itself and copied through.
//!
//! Only the executable is written out; the rest of the archive is never
//! unpacked. The executable is chosen among regular files:
//!
//! 1. the only regular file, if there is exactly one;
//! 2. otherwise the unique file whose basename is the expected executable
//!    name (`name`, or `name.exe` on Windows).
//!
//! Anything else is ambiguous and fails with
//! [`ExecmanError::NoExecutableFound`].

use crate::core::{ExecmanError, Result};
use crate::utils::fs::make_executable;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::debug;

/// Container format, detected from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
    /// Not an archive: the asset is the executable
    Raw,
}

impl ArchiveKind {
    #[must_use]
    pub fn detect(path: &Path) -> Self {
        let name = path.file_name().map(|n| n.to_string_lossy().to_lowercase()).unwrap_or_default();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Self::TarGz
        } else if name.ends_with(".zip") {
            Self::Zip
        } else {
            Self::Raw
        }
    }
}

/// Extracts the executable called `binary_name` from `archive` to `output`.
///
/// `output` is the full path of the file to create; it is made executable
/// on Unix. Extraction runs on the blocking thread pool.
///
/// # Errors
///
/// - [`ExecmanError::NoExecutableFound`] when no unambiguous candidate exists
/// - [`ExecmanError::Extract`] for corrupt or unreadable containers
pub async fn extract_binary(archive: &Path, binary_name: &str, output: &Path) -> Result<PathBuf> {
    let archive = archive.to_path_buf();
    let binary_name = binary_name.to_string();
    let output = output.to_path_buf();

    let archive_for_error = archive.clone();
    tokio::task::spawn_blocking(move || extract_blocking(&archive, &binary_name, &output))
        .await
        .map_err(|e| ExecmanError::Extract {
            archive: archive_for_error,
            reason: format!("extraction task failed: {e}"),
        })?
}

fn extract_blocking(archive: &Path, binary_name: &str, output: &Path) -> Result<PathBuf> {
    let kind = ArchiveKind::detect(archive);
    debug!("Extracting {binary_name} from {} ({kind:?})", archive.display());

    match kind {
        ArchiveKind::Raw => {
            std::fs::copy(archive, output).map_err(|e| ExecmanError::io("copy", output, e))?;
        }
        ArchiveKind::TarGz => {
            let candidates = list_tar_files(archive)?;
            let winner = choose_candidate(archive, &candidates, binary_name)?;
            copy_tar_entry(archive, &winner, output)?;
        }
        ArchiveKind::Zip => {
            let file = File::open(archive).map_err(|e| ExecmanError::io("open", archive, e))?;
            let mut zip = zip::ZipArchive::new(file).map_err(|e| extract_error(archive, e))?;

            let mut candidates = Vec::new();
            for i in 0..zip.len() {
                let entry = zip.by_index(i).map_err(|e| extract_error(archive, e))?;
                if entry.is_file() {
                    candidates.push(entry.name().to_string());
                }
            }

            let winner = choose_candidate(archive, &candidates, binary_name)?;
            let mut entry = zip.by_name(&winner).map_err(|e| extract_error(archive, e))?;
            let mut out = create_output(output)?;
            io::copy(&mut entry, &mut out).map_err(|e| extract_error(archive, e))?;
        }
    }

    make_executable(output)?;
    Ok(output.to_path_buf())
}

fn extract_error(archive: &Path, reason: impl std::fmt::Display) -> ExecmanError {
    ExecmanError::Extract {
        archive: archive.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn create_output(output: &Path) -> Result<File> {
    File::create(output).map_err(|e| ExecmanError::io("create", output, e))
}

fn open_tar(archive: &Path) -> Result<Archive<GzDecoder<File>>> {
    let file = File::open(archive).map_err(|e| ExecmanError::io("open", archive, e))?;
    Ok(Archive::new(GzDecoder::new(file)))
}

fn list_tar_files(archive: &Path) -> Result<Vec<String>> {
    let mut tar = open_tar(archive)?;
    let mut files = Vec::new();

    for entry in tar.entries().map_err(|e| extract_error(archive, e))? {
        let entry = entry.map_err(|e| extract_error(archive, e))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path().map_err(|e| extract_error(archive, e))?;
        files.push(path.to_string_lossy().into_owned());
    }

    Ok(files)
}

fn copy_tar_entry(archive: &Path, wanted: &str, output: &Path) -> Result<()> {
    let mut tar = open_tar(archive)?;

    for entry in tar.entries().map_err(|e| extract_error(archive, e))? {
        let mut entry = entry.map_err(|e| extract_error(archive, e))?;
        let is_wanted = entry.header().entry_type().is_file()
            && entry.path().map(|p| p.to_string_lossy() == wanted).unwrap_or(false);
        if is_wanted {
            let mut out = create_output(output)?;
            io::copy(&mut entry, &mut out).map_err(|e| extract_error(archive, e))?;
            return Ok(());
        }
    }

    Err(extract_error(archive, format!("entry {wanted} disappeared during extraction")))
}

fn basename(entry: &str) -> &str {
    entry.trim_end_matches('/').rsplit(['/', '\\']).next().unwrap_or(entry)
}

/// Picks the executable among archive entry names.
///
/// `binary_name` already carries the target platform's extension.
fn choose_candidate(archive: &Path, candidates: &[String], binary_name: &str) -> Result<String> {
    if let [only] = candidates {
        return Ok(only.clone());
    }

    let named: Vec<&String> = candidates.iter().filter(|c| basename(c) == binary_name).collect();

    match named.as_slice() {
        [winner] => Ok((*winner).clone()),
        _ => Err(ExecmanError::NoExecutableFound {
            archive: archive.to_path_buf(),
            candidates: candidates.to_vec(),
        }),
    }
}
