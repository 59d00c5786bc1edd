//! Defines the [`Config`] object which carries every setting for a run. A
//! [`Config`] is built exactly once (see [`Config::from_settings`]) from the
//! raw, optional [`Settings`] gathered by [`crate::cli`] and then passed by
//! reference into the pipeline; nothing below this module reads the
//! environment.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

/// The environment variable naming the records file.
pub const INPUT_ENV: &str = "PROJECTS_FILE_PATH";

/// The environment variable naming the output root directory.
pub const OUTPUT_ENV: &str = "WEB_DIR_PATH";

/// The environment variable naming the vanity domain.
pub const DOMAIN_ENV: &str = "DOMAIN";

/// The environment variable naming the repository base URL.
pub const REPO_BASE_URL_ENV: &str = "REPO_BASE_URL";

/// The environment variable selecting the [`InputFormat`].
pub const FORMAT_ENV: &str = "INPUT_FORMAT";

/// The environment variable selecting the [`Layout`].
pub const LAYOUT_ENV: &str = "OUTPUT_LAYOUT";

/// The environment variable toggling the `CNAME` file.
pub const CNAME_ENV: &str = "WRITE_CNAME";

/// The format of the records file. The format is configured, never sniffed
/// from the file's contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    /// One record per line, fields separated by runs of whitespace. The
    /// optional second field is a repository name.
    Projects,

    /// One record per line, fields separated by `;`. The optional second
    /// field is an import definition.
    Imports,

    /// A single JSON array of VCS metadata objects.
    Json,
}

impl Default for InputFormat {
    fn default() -> Self {
        InputFormat::Projects
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "projects" => Ok(InputFormat::Projects),
            "imports" => Ok(InputFormat::Imports),
            "json" => Ok(InputFormat::Json),
            _ => Err(format!(
                "unknown input format `{}` (expected `projects`, `imports` or `json`)",
                s
            )),
        }
    }
}

/// Where pages land relative to the output root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// `{output}/{name}/index.html`.
    Nested,

    /// `{output}/{name}.html`.
    Flat,
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Nested
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "nested" => Ok(Layout::Nested),
            "flat" => Ok(Layout::Flat),
            _ => Err(format!(
                "unknown output layout `{}` (expected `nested` or `flat`)",
                s
            )),
        }
    }
}

/// Raw settings as collected from flags and environment variables. Every
/// field is optional here; [`Config::from_settings`] decides which ones are
/// required.
#[derive(Clone, Debug, Default)]
pub struct Settings {
    pub input: Option<String>,
    pub output: Option<String>,
    pub domain: Option<String>,
    pub repo_base_url: Option<String>,
    pub format: Option<String>,
    pub layout: Option<String>,
    pub cname: Option<String>,
}

/// The validated configuration for a single run.
#[derive(Clone, Debug)]
pub struct Config {
    /// The records file to read.
    pub input_path: PathBuf,

    /// The root directory into which pages are written.
    pub output_directory: PathBuf,

    /// The vanity domain (e.g., `go.example.org`). It prefixes import paths
    /// built from delimited records, is stripped from JSON import prefixes
    /// to find the output directory, and is the content of `CNAME`.
    pub domain: String,

    /// The URL under which repositories named in delimited records live
    /// (e.g., `https://github.com/acme`). Only needed by records which don't
    /// spell out their repository root.
    pub repo_base_url: Option<String>,

    pub format: InputFormat,

    pub layout: Layout,

    /// Whether to write `{output_directory}/CNAME`.
    pub cname: bool,
}

impl Config {
    /// Validates raw [`Settings`] into a [`Config`]. Fails on the first
    /// missing or malformed setting without touching the filesystem.
    pub fn from_settings(settings: Settings) -> Result<Config> {
        let input_path = required(settings.input, "--input", INPUT_ENV)?;
        let output_directory = required(settings.output, "--output", OUTPUT_ENV)?;
        let domain = required(settings.domain, "--domain", DOMAIN_ENV)?;
        let domain = domain.trim().trim_end_matches('/').to_owned();
        if domain.is_empty() {
            return Err(Error::InvalidSetting {
                variable: DOMAIN_ENV,
                message: String::from("must not be empty"),
            });
        }

        let repo_base_url = match non_empty(settings.repo_base_url) {
            None => None,
            Some(raw) => {
                let trimmed = raw.trim().trim_end_matches('/');
                Url::parse(trimmed).map_err(|e| Error::InvalidSetting {
                    variable: REPO_BASE_URL_ENV,
                    message: format!("`{}` is not a valid URL: {}", raw, e),
                })?;
                Some(trimmed.to_owned())
            }
        };

        Ok(Config {
            input_path: PathBuf::from(input_path),
            output_directory: PathBuf::from(output_directory),
            domain,
            repo_base_url,
            format: parse_or_default(settings.format, FORMAT_ENV)?,
            layout: parse_or_default(settings.layout, LAYOUT_ENV)?,
            cname: match non_empty(settings.cname) {
                None => false,
                Some(raw) => parse_bool(&raw).ok_or_else(|| Error::InvalidSetting {
                    variable: CNAME_ENV,
                    message: format!("`{}` is not a boolean", raw),
                })?,
            },
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, flag: &'static str, variable: &'static str) -> Result<String> {
    non_empty(value).ok_or(Error::MissingSetting { flag, variable })
}

fn parse_or_default<T>(value: Option<String>, variable: &'static str) -> Result<T>
where
    T: FromStr<Err = String> + Default,
{
    match non_empty(value) {
        None => Ok(T::default()),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|message| Error::InvalidSetting { variable, message }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// The result of building a [`Config`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a configuration error.
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Returned when a required setting was given neither as a flag nor as
    /// an environment variable.
    MissingSetting {
        flag: &'static str,
        variable: &'static str,
    },

    /// Returned when a setting is present but can't be interpreted.
    InvalidSetting {
        variable: &'static str,
        message: String,
    },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingSetting { flag, variable } => {
                write!(f, "{} env variable not set (or pass `{}`)", variable, flag)
            }
            Error::InvalidSetting { variable, message } => {
                write!(f, "invalid `{}`: {}", variable, message)
            }
        }
    }
}

impl std::error::Error for Error {}
