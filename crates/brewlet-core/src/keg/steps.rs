//! One function per install step.

use std::path::Path;

use super::{InstallContext, InstallOutcome, LinkAction, LinkConflict, LinkRecord};
use crate::error::InstallError;
use crate::formula::{FileMode, InstallStep};
use crate::fs::{relative_path, resolve_link, EntryKind, InstallFs};

pub(super) fn apply(
    step: &InstallStep,
    ctx: &InstallContext,
    fs: &dyn InstallFs,
    link_conflict: LinkConflict,
    outcome: &mut InstallOutcome,
) -> Result<(), InstallError> {
    match step {
        InstallStep::CopyAll {
            source,
            destination,
        } => copy_all(ctx, fs, source, destination, outcome),
        InstallStep::SetExecutable { path, mode } => set_executable(ctx, fs, path, *mode, outcome),
        InstallStep::CreateSymlink { target, link } => {
            create_symlink(ctx, fs, target, link, link_conflict, outcome)
        }
    }
}

fn copy_all(
    ctx: &InstallContext,
    fs: &dyn InstallFs,
    source: &str,
    destination: &Path,
    outcome: &mut InstallOutcome,
) -> Result<(), InstallError> {
    let dest_dir = ctx.lib_dir.join(destination);
    let matches = fs
        .glob(&ctx.staging_dir, source)
        .map_err(|e| InstallError::from_io("list", &ctx.staging_dir, e))?;
    if matches.is_empty() {
        return Err(InstallError::MissingSourceFile {
            path: ctx.staging_dir.join(source),
        });
    }

    fs.create_dir_all(&dest_dir)
        .map_err(|e| InstallError::from_io("create", &dest_dir, e))?;
    for entry in matches {
        let Some(file_name) = entry.file_name() else {
            continue;
        };
        let to = dest_dir.join(file_name);
        let written = fs
            .copy_tree(&entry, &to)
            .map_err(|e| copy_error(fs, &entry, &to, e))?;
        tracing::debug!(from = %entry.display(), to = %to.display(), files = written.len(), "copied");
        outcome.files.extend(written);
    }
    Ok(())
}

/// A copy failure names the source only when the source is what went missing.
fn copy_error(fs: &dyn InstallFs, from: &Path, to: &Path, e: std::io::Error) -> InstallError {
    if fs.entry(from).is_none() {
        return InstallError::MissingSourceFile {
            path: from.to_path_buf(),
        };
    }
    match e.kind() {
        std::io::ErrorKind::NotFound => InstallError::Io {
            action: "copy",
            path: to.to_path_buf(),
            source: e,
        },
        _ => InstallError::from_io("copy", to, e),
    }
}

fn set_executable(
    ctx: &InstallContext,
    fs: &dyn InstallFs,
    path: &Path,
    mode: FileMode,
    outcome: &mut InstallOutcome,
) -> Result<(), InstallError> {
    let full = ctx.lib_dir.join(path);
    if fs.entry(&full).is_none() {
        return Err(InstallError::MissingSourceFile { path: full });
    }
    fs.set_mode(&full, mode.bits())
        .map_err(|e| InstallError::from_io("chmod", &full, e))?;
    tracing::debug!(path = %full.display(), mode = %mode, "mode set");
    outcome.modes.push((full, mode.bits()));
    Ok(())
}

fn create_symlink(
    ctx: &InstallContext,
    fs: &dyn InstallFs,
    target: &Path,
    link: &Path,
    link_conflict: LinkConflict,
    outcome: &mut InstallOutcome,
) -> Result<(), InstallError> {
    let target = ctx.lib_dir.join(target);
    if fs.entry(&target).is_none() {
        return Err(InstallError::MissingSourceFile { path: target });
    }
    let link = ctx.bin_dir.join(link);
    let link_dir = link.parent().unwrap_or(&ctx.bin_dir).to_path_buf();
    fs.create_dir_all(&link_dir)
        .map_err(|e| InstallError::from_io("create", &link_dir, e))?;
    let relative = relative_path(&link_dir, &target);

    let action = match fs.entry(&link) {
        None => LinkAction::Created,
        Some(EntryKind::Symlink(raw)) if resolve_link(&link, &raw) == target => LinkAction::Reused,
        Some(existing) => {
            let existing_target = match &existing {
                EntryKind::Symlink(raw) => Some(resolve_link(&link, raw)),
                _ => None,
            };
            match link_conflict {
                LinkConflict::Fail => {
                    return Err(InstallError::SymlinkCollision {
                        link,
                        existing: existing_target,
                    })
                }
                LinkConflict::Overwrite => {
                    if matches!(existing, EntryKind::Dir) {
                        return Err(InstallError::SymlinkCollision {
                            link,
                            existing: None,
                        });
                    }
                    fs.remove_file(&link)
                        .map_err(|e| InstallError::from_io("remove", &link, e))?;
                    LinkAction::Replaced
                }
            }
        }
    };

    if action != LinkAction::Reused {
        fs.symlink(&relative, &link)
            .map_err(|e| InstallError::from_io("link", &link, e))?;
    }
    tracing::debug!(link = %link.display(), target = %relative.display(), ?action, "linked");
    outcome.links.push((LinkRecord { link, target }, action));
    Ok(())
}
