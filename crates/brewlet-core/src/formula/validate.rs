//! Formula validation.

use std::path::{Component, Path, PathBuf};

use super::{Formula, InstallStep};

#[derive(Debug, thiserror::Error)]
pub enum FormulaError {
    #[error("failed to read formula {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}{message}", location(.path))]
    Parse {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("{}invalid {field}: {reason}", location(.path))]
    Invalid {
        path: Option<PathBuf>,
        field: String,
        reason: String,
    },
}

fn location(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!("{}: ", p.display()),
        None => String::new(),
    }
}

impl FormulaError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FormulaError::Invalid {
            path: None,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Attach the formula file path to parse/validation errors.
    pub fn with_path(self, file: &Path) -> Self {
        match self {
            FormulaError::Parse { path: None, message } => FormulaError::Parse {
                path: Some(file.to_path_buf()),
                message,
            },
            FormulaError::Invalid {
                path: None,
                field,
                reason,
            } => FormulaError::Invalid {
                path: Some(file.to_path_buf()),
                field,
                reason,
            },
            other => other,
        }
    }
}

/// `name` and `version` become directory names under the prefix.
fn check_path_component(field: &str, value: &str) -> Result<(), FormulaError> {
    if value.trim().is_empty() {
        return Err(FormulaError::invalid(field, "must not be empty"));
    }
    if value != value.trim() {
        return Err(FormulaError::invalid(field, "must not have surrounding whitespace"));
    }
    if value.starts_with('.') {
        return Err(FormulaError::invalid(field, "must not start with '.'"));
    }
    if let Some(c) = value
        .chars()
        .find(|c| *c == '/' || *c == '\\' || c.is_control())
    {
        return Err(FormulaError::invalid(
            field,
            format!("contains forbidden character {c:?}"),
        ));
    }
    Ok(())
}

/// Step paths are relative to the lib or bin dir and must stay inside it.
fn check_relative(field: &str, path: &Path, allow_empty: bool) -> Result<(), FormulaError> {
    if path.as_os_str().is_empty() {
        return if allow_empty {
            Ok(())
        } else {
            Err(FormulaError::invalid(field, "must not be empty"))
        };
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(FormulaError::invalid(
                    field,
                    format!("{} must not contain '..'", path.display()),
                ))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(FormulaError::invalid(
                    field,
                    format!("{} must be relative", path.display()),
                ))
            }
        }
    }
    Ok(())
}

fn check_url(field: &str, value: &str, schemes: &[&str]) -> Result<(), FormulaError> {
    let parsed =
        url::Url::parse(value).map_err(|e| FormulaError::invalid(field, format!("{value}: {e}")))?;
    if !schemes.contains(&parsed.scheme()) {
        return Err(FormulaError::invalid(
            field,
            format!("unsupported scheme {:?} in {value}", parsed.scheme()),
        ));
    }
    Ok(())
}

impl Formula {
    /// Check everything that can be checked without touching the network or disk.
    pub fn validate(&self) -> Result<(), FormulaError> {
        check_path_component("name", &self.name)?;
        check_path_component("version", &self.version)?;
        check_url("url", &self.url, &["http", "https", "file"])?;
        if let Some(homepage) = &self.homepage {
            check_url("homepage", homepage, &["http", "https"])?;
        }
        if self.steps.is_empty() {
            return Err(FormulaError::invalid("install", "at least one step is required"));
        }

        for (i, step) in self.steps.iter().enumerate() {
            let field = |key: &str| format!("install[{i}].{key}");
            match step {
                InstallStep::CopyAll {
                    source,
                    destination,
                } => {
                    if source.trim().is_empty() {
                        return Err(FormulaError::invalid(field("source"), "must not be empty"));
                    }
                    check_relative(&field("source"), Path::new(source), false)?;
                    glob::Pattern::new(source).map_err(|e| {
                        FormulaError::invalid(field("source"), format!("bad pattern: {e}"))
                    })?;
                    check_relative(&field("destination"), destination, true)?;
                }
                InstallStep::SetExecutable { path, .. } => {
                    check_relative(&field("path"), path, false)?;
                }
                InstallStep::CreateSymlink { target, link } => {
                    check_relative(&field("target"), target, false)?;
                    check_relative(&field("link"), link, false)?;
                }
            }
        }
        Ok(())
    }
}
