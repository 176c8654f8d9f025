//! Capability-scoped filesystem helpers shared by the birthstats crates.
//!
//! The SQLite store uses [`ensure_parent_dir`] before opening its database and
//! the HTTP server serves reference files through [`read_reference_file`].
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;
use std::path::Component;

/// Read a reference file named `file_name` from `data_dir`.
///
/// The lookup is confined to `data_dir`: names containing parent-directory
/// components or absolute paths are rejected by `cap-std`.
///
/// # Errors
///
/// Returns an error when the directory cannot be opened or the file cannot be
/// read as UTF-8.
pub fn read_reference_file(data_dir: &Utf8Path, file_name: &str) -> io::Result<String> {
    let dir = fs_utf8::Dir::open_ambient_dir(data_dir, ambient_authority())?;
    dir.read_to_string(file_name)
}

/// Return whether `path` exists and is a directory.
///
/// # Errors
///
/// Returns an error when metadata for an existing parent cannot be read.
pub fn dir_exists(path: &Utf8Path) -> io::Result<bool> {
    match fs_utf8::Dir::open_ambient_dir(path, ambient_authority()) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) if err.kind() == io::ErrorKind::NotADirectory => Ok(false),
        Err(err) => Err(err),
    }
}

/// Ensure the parent directory for `path` exists.
///
/// Absolute and relative paths are both supported; an empty parent (a bare
/// file name) is a no-op.
///
/// # Errors
///
/// Returns an error when the directory chain cannot be created.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base_dir, relative) = base_dir_and_relative(parent)?;
    if relative.as_os_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)
}

/// Split a parent path into an ambient base directory and a relative suffix.
fn base_dir_and_relative(parent: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_parent = parent.as_std_path();

    let (base, relative) = match std_parent.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;

            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_parent.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from parent path"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_parent.to_path_buf()),
    };

    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative = Utf8PathBuf::from_path_buf(relative)
        .map_err(|_| io::Error::other("non-UTF-8 parent path"))?;

    Ok((dir, relative))
}
