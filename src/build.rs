//! Exports the [`generate`] function which stitches together the steps of a
//! run: parsing the records file ([`crate::parser`]), rendering each record
//! ([`crate::template`]) and writing the pages and the optional `CNAME`
//! ([`crate::write`]). The first error aborts the run; pages written before
//! it stay on disk.

use crate::config::Config;
use crate::parser::{Error as ParseError, Parser};
use crate::template::{Error as TemplateError, Renderer};
use crate::write::{Error as WriteError, Writer};
use std::fmt;
use tracing::info;

/// What a successful run produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Number of records rendered (one primary page each).
    pub pages: usize,

    /// Number of extra submodule pages written.
    pub submodules: usize,

    /// Import prefixes which were skipped for lying outside the domain.
    pub skipped: Vec<String>,

    /// Whether a `CNAME` file was written.
    pub cname: bool,
}

/// Generates the redirect site described by `config`. Every record is parsed
/// before anything is written, so a malformed records file leaves the output
/// directory untouched.
pub fn generate(config: &Config) -> Result<Summary> {
    let parser = Parser::new(
        config.format,
        &config.domain,
        config.repo_base_url.as_deref(),
    );
    let (records, skipped) = parser.parse_file(&config.input_path)?;
    info!(
        records = records.len(),
        skipped = skipped.len(),
        input = %config.input_path.display(),
        "parsed records"
    );

    let renderer = Renderer::new()?;
    let writer = Writer {
        output_directory: &config.output_directory,
        layout: config.layout,
    };

    let mut summary = Summary {
        skipped,
        ..Summary::default()
    };
    for record in &records {
        let page = renderer.render(&record.meta)?;
        let written = writer.write_record(record, &page)?;
        summary.pages += 1;
        summary.submodules += written.len() - 1;
        info!(
            name = %record.name,
            path = %written[0].display(),
            submodules = written.len() - 1,
            "redirect created"
        );
    }

    if config.cname {
        let path = writer.write_cname(&config.domain)?;
        summary.cname = true;
        info!(path = %path.display(), domain = %config.domain, "CNAME written");
    }

    Ok(summary)
}

/// The result of a run.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for a run. Errors can come from parsing the records file,
/// from the template, or from writing output.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors reading or parsing the records file.
    Parse(ParseError),

    /// Returned for errors parsing or executing the template.
    Template(TemplateError),

    /// Returned for errors writing pages to disk.
    Write(WriteError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Template(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`]. The wrapped error's own
    /// source is skipped since its message is already this error's message.
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use std::error::Error as _;
        match self {
            Error::Parse(err) => err.source(),
            Error::Template(err) => err.source(),
            Error::Write(err) => err.source(),
        }
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<TemplateError> for Error {
    /// Converts [`TemplateError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: TemplateError) -> Error {
        Error::Template(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}
