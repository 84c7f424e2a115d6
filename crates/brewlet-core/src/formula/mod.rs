//! Formula: a declarative description of one release of one package.
//!
//! A formula names a prebuilt artifact (`url` + `sha256`), a version, and the
//! ordered install steps that place the artifact under a prefix. It is pure
//! data: authored once per release and never mutated afterwards.
//!
//! ```toml
//! name = "pygmy-go"
//! desc = "Amazee.io's local development helper tool"
//! homepage = "https://github.com/fubarhouse/pygmy-go"
//! url = "https://github.com/fubarhouse/pygmy-go/releases/download/v0.2.0/pygmy-go-darwin"
//! sha256 = "8d7780ad9183d613313140aab0e088a61919e7efff69c5d0ab09005c2671d67c"
//! version = "v0.2.0"
//!
//! [[install]]
//! action = "copy_all"
//!
//! [[install]]
//! action = "set_executable"
//! path = "pygmy-go-darwin"
//!
//! [[install]]
//! action = "create_symlink"
//! target = "pygmy-go-darwin"
//! link = "pygmy"
//! ```

mod step;
mod validate;

pub use step::{FileMode, InstallStep};
pub use validate::FormulaError;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::checksum::Sha256Digest;
use crate::url_model;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Formula {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    pub url: String,
    pub sha256: Sha256Digest,
    pub version: String,
    #[serde(rename = "install")]
    pub steps: Vec<InstallStep>,
}

impl Formula {
    /// Parse and validate a formula from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, FormulaError> {
        let formula: Formula = toml::from_str(s).map_err(|e| FormulaError::Parse {
            path: None,
            message: e.to_string(),
        })?;
        formula.validate()?;
        Ok(formula)
    }

    /// Read, parse and validate a formula file.
    pub fn load(path: &Path) -> Result<Self, FormulaError> {
        let data = std::fs::read_to_string(path).map_err(|e| FormulaError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&data).map_err(|e| e.with_path(path))
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Filename the downloaded artifact is staged under.
    pub fn artifact_filename(&self) -> String {
        url_model::derive_filename(&self.url)
    }

    /// `name@version`, used in logs and messages.
    pub fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    /// Command names this formula links into the bin dir.
    pub fn command_names(&self) -> Vec<PathBuf> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                InstallStep::CreateSymlink { link, .. } => Some(link.clone()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub const PYGMY_SHA256: &str =
        "8d7780ad9183d613313140aab0e088a61919e7efff69c5d0ab09005c2671d67c";

    pub const PYGMY_TOML: &str = r#"
name = "pygmy-go"
desc = "Amazee.io's local development helper tool"
homepage = "https://github.com/fubarhouse/pygmy-go"
url = "https://github.com/fubarhouse/pygmy-go/releases/download/v0.2.0/pygmy-go-darwin"
sha256 = "8d7780ad9183d613313140aab0e088a61919e7efff69c5d0ab09005c2671d67c"
version = "v0.2.0"

[[install]]
action = "copy_all"

[[install]]
action = "set_executable"
path = "pygmy-go-darwin"
mode = "0755"

[[install]]
action = "create_symlink"
target = "pygmy-go-darwin"
link = "pygmy"
"#;

    /// A formula for a single-binary payload with the usual three steps.
    pub fn single_binary(
        name: &str,
        version: &str,
        url: &str,
        sha256: &str,
        binary: &str,
        link: &str,
    ) -> Formula {
        Formula {
            name: name.to_string(),
            desc: String::new(),
            homepage: None,
            url: url.to_string(),
            sha256: sha256.parse().unwrap(),
            version: version.to_string(),
            steps: vec![
                InstallStep::CopyAll {
                    source: "*".to_string(),
                    destination: PathBuf::new(),
                },
                InstallStep::SetExecutable {
                    path: binary.into(),
                    mode: FileMode::EXECUTABLE,
                },
                InstallStep::CreateSymlink {
                    target: binary.into(),
                    link: link.into(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn parses_pygmy_formula() {
        let f = Formula::from_toml_str(PYGMY_TOML).unwrap();
        assert_eq!(f.name, "pygmy-go");
        assert_eq!(f.version, "v0.2.0");
        assert_eq!(f.sha256.as_str(), PYGMY_SHA256);
        assert_eq!(f.homepage.as_deref(), Some("https://github.com/fubarhouse/pygmy-go"));
        assert_eq!(f.steps.len(), 3);
        assert_eq!(f.artifact_filename(), "pygmy-go-darwin");
        assert_eq!(f.command_names(), vec![PathBuf::from("pygmy")]);
        assert_eq!(f.label(), "pygmy-go@v0.2.0");
    }

    #[test]
    fn bundled_formula_matches_fixture() {
        let bundled = include_str!("../../../../formula/pygmy-go.toml");
        assert_eq!(
            Formula::from_toml_str(bundled).unwrap(),
            Formula::from_toml_str(PYGMY_TOML).unwrap()
        );
    }

    #[test]
    fn toml_roundtrip_preserves_formula() {
        let f = Formula::from_toml_str(PYGMY_TOML).unwrap();
        let text = f.to_toml_string().unwrap();
        let again = Formula::from_toml_str(&text).unwrap();
        assert_eq!(f, again);
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let text = format!("bottle = true\n{PYGMY_TOML}");
        assert!(matches!(
            Formula::from_toml_str(&text),
            Err(FormulaError::Parse { .. })
        ));
    }

    #[test]
    fn load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "name = 1").unwrap();
        let err = Formula::load(&path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"), "{err}");

        let missing = Formula::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, FormulaError::Read { .. }));
    }
}
