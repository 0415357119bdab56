// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{io::Write, path::Path};

/// Replace the file at `path` with `contents`.
///
/// The data is first written to a temporary file next to `path` and then
/// renamed over it, so readers see either the old or the new file and a failed
/// write never leaves a truncated output behind.
///
/// A replaced file keeps its permissions. A new file gets the mode a plain
/// create would give it, `0o666` minus the umask.
pub fn write(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    // The temporary file must live on the same filesystem for the rename.
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = temp_file(dir)?;
    if let Ok(metadata) = std::fs::metadata(path) {
        file.as_file().set_permissions(metadata.permissions())?;
    }
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn temp_file(dir: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    // Passed to open(2), so the umask applies.
    tempfile::Builder::new()
        .permissions(std::fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn temp_file(dir: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    tempfile::NamedTempFile::new_in(dir)
}
