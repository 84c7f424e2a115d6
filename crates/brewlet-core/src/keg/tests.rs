use std::path::{Path, PathBuf};

use super::*;
use crate::formula::fixtures::{single_binary, PYGMY_SHA256, PYGMY_TOML};
use crate::formula::FileMode;
use crate::fs::{EntryKind, MemoryFs};

const URL: &str = "https://github.com/fubarhouse/pygmy-go/releases/download/v0.2.0/pygmy-go-darwin";

fn pygmy() -> Formula {
    Formula::from_toml_str(PYGMY_TOML).unwrap()
}

fn ctx() -> InstallContext {
    let layout = PrefixLayout::new("/p");
    InstallContext::for_formula(&pygmy(), &layout, Path::new("/stage"))
}

fn staged() -> MemoryFs {
    let fs = MemoryFs::new();
    fs.add_file("/stage/pygmy-go-darwin", b"\xcf\xfa\xed\xfe".to_vec(), 0o644);
    fs
}

#[test]
fn pygmy_install_links_executable_into_bin() {
    let fs = staged();
    let outcome = install(&pygmy(), &ctx(), &fs, LinkConflict::Fail).unwrap();

    let binary = PathBuf::from("/p/lib/pygmy-go/v0.2.0/pygmy-go-darwin");
    assert_eq!(outcome.files, vec![binary.clone()]);
    assert_eq!(outcome.modes, vec![(binary.clone(), 0o755)]);
    assert_eq!(
        outcome.links,
        vec![(
            LinkRecord {
                link: PathBuf::from("/p/bin/pygmy"),
                target: binary.clone(),
            },
            LinkAction::Created
        )]
    );

    assert_eq!(
        fs.entry(Path::new("/p/bin/pygmy")),
        Some(EntryKind::Symlink(PathBuf::from(
            "../lib/pygmy-go/v0.2.0/pygmy-go-darwin"
        )))
    );
    assert_eq!(fs.mode(Path::new("/p/bin/pygmy")).unwrap(), 0o755);
    assert_eq!(fs.read("/p/bin/pygmy").unwrap(), b"\xcf\xfa\xed\xfe");
    // The staged copy is left alone.
    assert_eq!(fs.mode(Path::new("/stage/pygmy-go-darwin")).unwrap(), 0o644);
}

#[test]
fn copy_all_takes_every_entry_except_dotfiles() {
    let fs = staged();
    fs.add_file("/stage/share/man/pygmy.1", b"man".to_vec(), 0o644);
    fs.add_file("/stage/.DS_Store", b"".to_vec(), 0o644);
    let outcome = install(&pygmy(), &ctx(), &fs, LinkConflict::Fail).unwrap();

    assert_eq!(
        outcome.files,
        vec![
            PathBuf::from("/p/lib/pygmy-go/v0.2.0/pygmy-go-darwin"),
            PathBuf::from("/p/lib/pygmy-go/v0.2.0/share/man/pygmy.1"),
        ]
    );
    assert_eq!(fs.entry(Path::new("/p/lib/pygmy-go/v0.2.0/.DS_Store")), None);
}

#[test]
fn missing_binary_fails_before_linking() {
    let fs = MemoryFs::new();
    fs.add_file("/stage/something-else", b"x".to_vec(), 0o644);
    let err = install(&pygmy(), &ctx(), &fs, LinkConflict::Fail).unwrap_err();
    match err {
        InstallError::MissingSourceFile { path } => {
            assert_eq!(path, PathBuf::from("/p/lib/pygmy-go/v0.2.0/pygmy-go-darwin"))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fs.entry(Path::new("/p/bin/pygmy")), None);
}

#[test]
fn empty_staging_dir_is_missing_source() {
    let fs = MemoryFs::new();
    fs.add_dir("/stage");
    let err = install(&pygmy(), &ctx(), &fs, LinkConflict::Fail).unwrap_err();
    assert!(matches!(err, InstallError::MissingSourceFile { .. }));
    assert_eq!(fs.entry(Path::new("/p/lib")), None);
}

#[test]
fn symlink_to_missing_target_is_not_created() {
    let formula = Formula {
        steps: vec![InstallStep::CreateSymlink {
            target: "nope".into(),
            link: "pygmy".into(),
        }],
        ..pygmy()
    };
    let fs = MemoryFs::new();
    fs.add_dir("/p/lib/pygmy-go/v0.2.0");
    let err = install(&formula, &ctx(), &fs, LinkConflict::Overwrite).unwrap_err();
    assert!(matches!(err, InstallError::MissingSourceFile { .. }));
    assert_eq!(fs.entry(Path::new("/p/bin/pygmy")), None);
}

#[test]
fn reinstall_reuses_matching_link() {
    let fs = staged();
    install(&pygmy(), &ctx(), &fs, LinkConflict::Fail).unwrap();
    let again = install(&pygmy(), &ctx(), &fs, LinkConflict::Fail).unwrap();
    assert_eq!(again.links[0].1, LinkAction::Reused);
    assert_eq!(fs.read("/p/bin/pygmy").unwrap(), b"\xcf\xfa\xed\xfe");
}

#[test]
fn foreign_link_collides_unless_overwriting() {
    let fs = staged();
    fs.add_file("/p/lib/other/1.0/pygmy", b"other".to_vec(), 0o755);
    fs.add_symlink("/p/bin/pygmy", "../lib/other/1.0/pygmy");

    let err = install(&pygmy(), &ctx(), &fs, LinkConflict::Fail).unwrap_err();
    match err {
        InstallError::SymlinkCollision { link, existing } => {
            assert_eq!(link, PathBuf::from("/p/bin/pygmy"));
            assert_eq!(existing, Some(PathBuf::from("/p/lib/other/1.0/pygmy")));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fs.read("/p/bin/pygmy").unwrap(), b"other");

    let outcome = install(&pygmy(), &ctx(), &fs, LinkConflict::Overwrite).unwrap();
    assert_eq!(outcome.links[0].1, LinkAction::Replaced);
    assert_eq!(fs.read("/p/bin/pygmy").unwrap(), b"\xcf\xfa\xed\xfe");
}

#[test]
fn plain_file_in_bin_collides() {
    let fs = staged();
    fs.add_file("/p/bin/pygmy", b"#!/bin/sh".to_vec(), 0o755);
    let err = install(&pygmy(), &ctx(), &fs, LinkConflict::Fail).unwrap_err();
    assert!(matches!(
        err,
        InstallError::SymlinkCollision { existing: None, .. }
    ));
}

#[test]
fn directory_in_bin_collides_even_when_overwriting() {
    let fs = staged();
    fs.add_dir("/p/bin/pygmy");
    let err = install(&pygmy(), &ctx(), &fs, LinkConflict::Overwrite).unwrap_err();
    assert!(matches!(err, InstallError::SymlinkCollision { .. }));
    assert_eq!(fs.entry(Path::new("/p/bin/pygmy")), Some(EntryKind::Dir));
}

#[test]
fn read_only_bin_dir_is_permission_denied() {
    let fs = staged();
    fs.add_dir("/p/bin");
    fs.deny_writes("/p/bin");
    let err = install(&pygmy(), &ctx(), &fs, LinkConflict::Fail).unwrap_err();
    match err {
        InstallError::PermissionDenied { path, .. } => {
            assert_eq!(path, PathBuf::from("/p/bin/pygmy"))
        }
        other => panic!("unexpected error: {other}"),
    }
    // Earlier steps stay applied.
    assert_eq!(
        fs.mode(Path::new("/p/lib/pygmy-go/v0.2.0/pygmy-go-darwin")).unwrap(),
        0o755
    );
}

#[test]
fn custom_mode_and_nested_link() {
    let formula = Formula {
        steps: vec![
            InstallStep::CopyAll {
                source: "*".to_string(),
                destination: PathBuf::from("libexec"),
            },
            InstallStep::SetExecutable {
                path: "libexec/pygmy-go-darwin".into(),
                mode: FileMode::new(0o750).unwrap(),
            },
            InstallStep::CreateSymlink {
                target: "libexec/pygmy-go-darwin".into(),
                link: "tools/pygmy".into(),
            },
        ],
        ..pygmy()
    };
    let fs = staged();
    install(&formula, &ctx(), &fs, LinkConflict::Fail).unwrap();
    assert_eq!(
        fs.mode(Path::new("/p/lib/pygmy-go/v0.2.0/libexec/pygmy-go-darwin"))
            .unwrap(),
        0o750
    );
    assert_eq!(
        fs.entry(Path::new("/p/bin/tools/pygmy")),
        Some(EntryKind::Symlink(PathBuf::from(
            "../../lib/pygmy-go/v0.2.0/libexec/pygmy-go-darwin"
        )))
    );
}

#[test]
fn two_formulae_side_by_side() {
    let fs = staged();
    install(&pygmy(), &ctx(), &fs, LinkConflict::Fail).unwrap();

    let other = single_binary("jq", "1.7", URL, PYGMY_SHA256, "jq-linux", "jq");
    fs.add_file("/stage2/jq-linux", b"jq".to_vec(), 0o644);
    let layout = PrefixLayout::new("/p");
    let other_ctx = InstallContext::for_formula(&other, &layout, Path::new("/stage2"));
    install(&other, &other_ctx, &fs, LinkConflict::Fail).unwrap();

    assert_eq!(fs.read("/p/bin/jq").unwrap(), b"jq");
    assert_eq!(fs.read("/p/bin/pygmy").unwrap(), b"\xcf\xfa\xed\xfe");
}

#[test]
fn plan_resolves_paths_without_side_effects() {
    let planned = plan(&pygmy(), &ctx());
    assert_eq!(
        planned,
        vec![
            PlannedStep::CopyAll {
                pattern: PathBuf::from("/stage/*"),
                destination: PathBuf::from("/p/lib/pygmy-go/v0.2.0"),
            },
            PlannedStep::SetExecutable {
                path: PathBuf::from("/p/lib/pygmy-go/v0.2.0/pygmy-go-darwin"),
                mode: 0o755,
            },
            PlannedStep::CreateSymlink {
                link: PathBuf::from("/p/bin/pygmy"),
                target: PathBuf::from("/p/lib/pygmy-go/v0.2.0/pygmy-go-darwin"),
            },
        ]
    );
    assert_eq!(
        planned[1].to_string(),
        "chmod 0755 /p/lib/pygmy-go/v0.2.0/pygmy-go-darwin"
    );
}

/// Delegates to `MemoryFs` but fails every copy as if the destination vanished.
struct VanishingDest(MemoryFs);

impl InstallFs for VanishingDest {
    fn glob(&self, root: &Path, pattern: &str) -> std::io::Result<Vec<PathBuf>> {
        self.0.glob(root, pattern)
    }
    fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
        self.0.create_dir_all(path)
    }
    fn copy_tree(&self, _from: &Path, to: &Path) -> std::io::Result<Vec<PathBuf>> {
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{}: parent removed", to.display()),
        ))
    }
    fn set_mode(&self, path: &Path, mode: u32) -> std::io::Result<()> {
        self.0.set_mode(path, mode)
    }
    fn mode(&self, path: &Path) -> std::io::Result<u32> {
        self.0.mode(path)
    }
    fn entry(&self, path: &Path) -> Option<EntryKind> {
        self.0.entry(path)
    }
    fn symlink(&self, target: &Path, link: &Path) -> std::io::Result<()> {
        self.0.symlink(target, link)
    }
    fn remove_file(&self, path: &Path) -> std::io::Result<()> {
        self.0.remove_file(path)
    }
    fn remove_dir_all(&self, path: &Path) -> std::io::Result<()> {
        self.0.remove_dir_all(path)
    }
    fn remove_dir_if_empty(&self, path: &Path) -> std::io::Result<bool> {
        self.0.remove_dir_if_empty(path)
    }
}

#[test]
fn copy_failure_on_destination_names_destination() {
    let fs = VanishingDest(staged());
    let err = install(&pygmy(), &ctx(), &fs, LinkConflict::Fail).unwrap_err();
    match err {
        InstallError::Io { action, path, .. } => {
            assert_eq!(action, "copy");
            assert_eq!(path, PathBuf::from("/p/lib/pygmy-go/v0.2.0/pygmy-go-darwin"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
