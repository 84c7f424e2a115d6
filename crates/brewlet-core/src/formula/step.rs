//! Install steps: the primitive actions a formula replays against a prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Unix permission bits, written in formulae as an octal string (`"0755"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileMode(u32);

impl FileMode {
    /// rwxr-xr-x
    pub const EXECUTABLE: FileMode = FileMode(0o755);

    /// Highest value accepted: permission bits plus setuid/setgid/sticky.
    pub const MAX: u32 = 0o7777;

    pub fn new(bits: u32) -> Option<Self> {
        (bits <= Self::MAX).then_some(Self(bits))
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// True when owner, group and other all have the execute bit.
    pub fn is_executable_by_all(self) -> bool {
        self.0 & 0o111 == 0o111
    }
}

impl Default for FileMode {
    fn default() -> Self {
        Self::EXECUTABLE
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

impl FromStr for FileMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        let digits = digits.strip_prefix("0o").unwrap_or(digits);
        let bits = u32::from_str_radix(digits, 8)
            .map_err(|_| format!("invalid file mode {s:?}: expected octal like \"0755\""))?;
        FileMode::new(bits).ok_or_else(|| format!("file mode {s:?} exceeds {:o}", FileMode::MAX))
    }
}

impl TryFrom<String> for FileMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FileMode> for String {
    fn from(m: FileMode) -> Self {
        m.to_string()
    }
}

fn default_source() -> String {
    "*".to_string()
}

/// One primitive install action. Steps run in order and each must succeed
/// before the next one starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum InstallStep {
    /// Copy every staged entry matching `source` into `lib_dir/destination`.
    CopyAll {
        #[serde(default = "default_source")]
        source: String,
        #[serde(default)]
        destination: PathBuf,
    },
    /// Set permission bits on `lib_dir/path`.
    SetExecutable {
        path: PathBuf,
        #[serde(default)]
        mode: FileMode,
    },
    /// Link `bin_dir/link` to `lib_dir/target`.
    CreateSymlink { target: PathBuf, link: PathBuf },
}

impl InstallStep {
    pub fn action(&self) -> &'static str {
        match self {
            InstallStep::CopyAll { .. } => "copy_all",
            InstallStep::SetExecutable { .. } => "set_executable",
            InstallStep::CreateSymlink { .. } => "create_symlink",
        }
    }
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallStep::CopyAll {
                source,
                destination,
            } => {
                if destination.as_os_str().is_empty() {
                    write!(f, "copy_all {source} -> lib/")
                } else {
                    write!(f, "copy_all {source} -> lib/{}", destination.display())
                }
            }
            InstallStep::SetExecutable { path, mode } => {
                write!(f, "set_executable lib/{} {mode}", path.display())
            }
            InstallStep::CreateSymlink { target, link } => {
                write!(
                    f,
                    "create_symlink bin/{} -> lib/{}",
                    link.display(),
                    target.display()
                )
            }
        }
    }
}
