//! Defines [`Record`] and [`Meta`], the in-memory form of one redirect, and
//! the rules for filling in unset [`Meta`] fields. Every input format funnels
//! through [`MetaEntry::resolve`] so the defaulting rules live in exactly one
//! place.

use serde::Deserialize;
use std::fmt;
use url::Url;

/// The VCS assumed when a record doesn't name one.
pub const DEFAULT_VCS: &str = "git";

/// The `go-source` placeholder for a pattern that isn't known.
pub const UNKNOWN_PATTERN: &str = "_";

/// One package to redirect. Records are built fresh from the input on every
/// run and never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Identifies the record in logs and errors: the package name for
    /// delimited inputs, the import prefix for JSON inputs.
    pub name: String,

    /// The output location relative to the output root, as `/`-separated
    /// segments. Empty only when a JSON import prefix is the domain itself.
    pub path: String,

    /// The data rendered into the page.
    pub meta: Meta,

    /// Relative paths of nested modules which resolve through this record's
    /// repository root. Each gets a byte-identical copy of the page.
    pub submodules: Vec<String>,
}

/// Fully-resolved VCS metadata; every field is populated.
#[derive(Clone, Debug, PartialEq)]
pub struct Meta {
    pub import_prefix: String,
    pub vcs: String,

    /// The repository root exactly as configured, minus a trailing `/`. It is
    /// always a syntactically valid URL.
    pub repo_root: String,

    /// The project home page (defaults to `repo_root`).
    pub home: String,

    /// The directory-browse pattern, e.g. `{repo}/tree/master{/dir}`.
    pub directory: String,

    /// The file/line pattern, e.g. `{directory}/{file}#L{line}`.
    pub file: String,
}

/// VCS metadata as written by the user, before defaults are applied. This is
/// also the schema of one element of a JSON records file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetaEntry {
    #[serde(default)]
    pub vcs: Option<String>,

    pub import_prefix: String,

    pub repo_root: String,

    #[serde(default)]
    pub home: Option<String>,

    #[serde(default)]
    pub directory: Option<String>,

    #[serde(default)]
    pub file: Option<String>,

    #[serde(default)]
    pub submodules: Vec<String>,
}

impl MetaEntry {
    /// Validates the entry and fills in defaults:
    ///
    /// * `vcs` defaults to [`DEFAULT_VCS`];
    /// * `home` defaults to `repo_root`;
    /// * on hosts containing `github.com`, `directory` defaults to
    ///   `{repo_root}/tree/master{/dir}` and `file` to
    ///   `{directory}/{file}#L{line}`;
    /// * elsewhere unset patterns become [`UNKNOWN_PATTERN`].
    ///
    /// Returns the resolved [`Meta`] alongside the validated submodules.
    pub fn resolve(self) -> Result<(Meta, Vec<String>)> {
        let import_prefix = self.import_prefix.trim().trim_end_matches('/').to_owned();
        if import_prefix.is_empty() {
            return Err(Error::EmptyImportPrefix);
        }

        let repo_root = self.repo_root.trim().trim_end_matches('/').to_owned();
        let url = Url::parse(&repo_root).map_err(|err| Error::Url {
            repo_root: self.repo_root.clone(),
            err,
        })?;
        let github = is_github(&url);

        let home = given(self.home).unwrap_or_else(|| repo_root.clone());
        let directory = given(self.directory).unwrap_or_else(|| match github {
            true => format!("{}/tree/master{{/dir}}", repo_root),
            false => UNKNOWN_PATTERN.to_owned(),
        });
        let file = given(self.file).unwrap_or_else(|| match github {
            true => format!("{}/{{file}}#L{{line}}", directory),
            false => UNKNOWN_PATTERN.to_owned(),
        });

        let submodules = self
            .submodules
            .iter()
            .map(|submodule| {
                let submodule = submodule.trim().trim_matches('/');
                validate_path(submodule)?;
                Ok(submodule.to_owned())
            })
            .collect::<Result<Vec<String>>>()?;

        Ok((
            Meta {
                import_prefix,
                vcs: given(self.vcs).unwrap_or_else(|| DEFAULT_VCS.to_owned()),
                repo_root,
                home,
                directory,
                file,
            },
            submodules,
        ))
    }
}

fn given(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn is_github(url: &Url) -> bool {
    url.host_str()
        .map(|host| host.contains("github.com"))
        .unwrap_or(false)
}

/// Checks that `path` is a non-empty relative path of `/`-separated normal
/// segments, so joining it onto the output root can't escape the root.
pub fn validate_path(path: &str) -> Result<()> {
    let bad = path.is_empty()
        || path.contains('\\')
        || path
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    match bad {
        true => Err(Error::InvalidPath(path.to_owned())),
        false => Ok(()),
    }
}

/// The result of resolving a [`MetaEntry`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an invalid record.
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Returned when an import prefix is empty.
    EmptyImportPrefix,

    /// Returned when a repository root isn't a valid URL.
    Url {
        repo_root: String,
        err: url::ParseError,
    },

    /// Returned when a name or submodule isn't a safe relative path.
    InvalidPath(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::EmptyImportPrefix => write!(f, "import prefix is empty"),
            Error::Url { repo_root, err } => {
                write!(f, "repository root `{}` is not a valid URL: {}", repo_root, err)
            }
            Error::InvalidPath(path) => {
                write!(f, "`{}` is not a valid relative path", path)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`]. The URL
    /// parse error is already part of the message, so there's no source.
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}
