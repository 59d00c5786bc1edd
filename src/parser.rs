//! Defines the [`Parser`], [`Line`], and [`Error`] types. Also defines the
//! logic for reading a records file into [`Record`]s. Three formats are
//! understood (see [`InputFormat`]); which one applies is configuration, not
//! something sniffed from the file.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{
    config::InputFormat,
    record::{self, validate_path, MetaEntry, Record},
};

/// One non-blank line of a delimited records file.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    /// The first field. Never empty.
    pub name: String,

    /// The second field, or the empty string if the line had only one.
    pub secondary: String,
}

/// How the fields of a delimited line are separated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delimiter {
    /// Runs of whitespace.
    Whitespace,

    /// A single `;`; whitespace around each field is trimmed.
    Semicolon,
}

/// Parses a single line of a delimited records file. Returns `Ok(None)` for
/// blank lines and an error if the line has more than two fields.
pub fn parse_line(raw: &str, delimiter: Delimiter) -> Result<Option<Line>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = match delimiter {
        Delimiter::Whitespace => raw.split_whitespace().collect(),
        Delimiter::Semicolon => raw.split(';').map(str::trim).collect(),
    };

    match fields.as_slice() {
        [name] => Ok(Some(Line {
            name: (*name).to_owned(),
            secondary: String::new(),
        })),
        [name, _] if name.is_empty() => Err(Error::EmptyName(raw.to_owned())),
        [name, secondary] => Ok(Some(Line {
            name: (*name).to_owned(),
            secondary: (*secondary).to_owned(),
        })),
        _ => Err(Error::FieldCount {
            fields: fields.len(),
            line: raw.to_owned(),
        }),
    }
}

/// Parsed records alongside the import prefixes of JSON entries which were
/// skipped for lying outside the configured domain.
pub type Records = (Vec<Record>, Vec<String>);

/// Parses [`Record`]s from a records file.
pub struct Parser<'a> {
    /// `format` selects how the file is interpreted.
    format: InputFormat,

    /// `domain` is the vanity domain. Delimited records get the import
    /// prefix `{domain}/{name}` unless they spell one out; JSON records have
    /// it stripped from their import prefix to find their output path.
    domain: &'a str,

    /// `repo_base_url` is the URL under which repositories named by delimited
    /// records live, e.g. `https://github.com/acme`.
    repo_base_url: Option<&'a str>,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(
        format: InputFormat,
        domain: &'a str,
        repo_base_url: Option<&'a str>,
    ) -> Parser<'a> {
        Parser {
            format,
            domain,
            repo_base_url,
        }
    }

    /// Reads `path` in full and parses it. Records come back in input order.
    pub fn parse_file(&self, path: &Path) -> Result<Records> {
        let contents = std::fs::read_to_string(path).map_err(|err| Error::Read {
            path: path.to_owned(),
            err,
        })?;
        self.parse_str(&contents)
    }

    /// Parses the contents of a records file.
    pub fn parse_str(&self, input: &str) -> Result<Records> {
        match self.format {
            InputFormat::Projects => Ok((self.parse_lines(input, Delimiter::Whitespace)?, Vec::new())),
            InputFormat::Imports => Ok((self.parse_lines(input, Delimiter::Semicolon)?, Vec::new())),
            InputFormat::Json => self.parse_json(input),
        }
    }

    fn parse_lines(&self, input: &str, delimiter: Delimiter) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for (i, raw) in input.lines().enumerate() {
            let annotate = |e: Error| Error::Annotated(format!("line {}", i + 1), Box::new(e));
            let line = match parse_line(raw, delimiter).map_err(annotate)? {
                Some(line) => line,
                None => continue,
            };
            let record = match delimiter {
                Delimiter::Whitespace => self.project_record(line),
                Delimiter::Semicolon => self.import_record(line),
            }
            .map_err(annotate)?;
            debug!(name = %record.name, import_prefix = %record.meta.import_prefix, "parsed record");
            records.push(record);
        }
        Ok(records)
    }

    /// A project line is `name [repository]`; the repository name defaults
    /// to the package name.
    fn project_record(&self, line: Line) -> Result<Record> {
        validate_path(&line.name)?;
        let repo = match line.secondary.is_empty() {
            true => line.name.as_str(),
            false => line.secondary.as_str(),
        };
        let repo_root = self.repo_url(&line.name, repo)?;
        let (meta, _) = MetaEntry {
            import_prefix: format!("{}/{}", self.domain, line.name),
            repo_root,
            ..MetaEntry::default()
        }
        .resolve()?;
        Ok(Record {
            path: line.name.clone(),
            name: line.name,
            meta,
            submodules: Vec::new(),
        })
    }

    /// An import line is `name; [definition]` where the definition is either
    /// an import prefix on its own or a complete `prefix vcs repo-root`
    /// triple as it appears in a `go-import` tag.
    fn import_record(&self, line: Line) -> Result<Record> {
        validate_path(&line.name)?;
        let tokens: Vec<&str> = line.secondary.split_whitespace().collect();
        let entry = match tokens.as_slice() {
            [] => MetaEntry {
                import_prefix: format!("{}/{}", self.domain, line.name),
                repo_root: self.repo_url(&line.name, &line.name)?,
                ..MetaEntry::default()
            },
            [prefix] => MetaEntry {
                import_prefix: (*prefix).to_owned(),
                repo_root: self.repo_url(&line.name, &line.name)?,
                ..MetaEntry::default()
            },
            [prefix, vcs, repo_root] => MetaEntry {
                import_prefix: (*prefix).to_owned(),
                vcs: Some((*vcs).to_owned()),
                repo_root: (*repo_root).to_owned(),
                ..MetaEntry::default()
            },
            _ => return Err(Error::ImportDefinition(line.secondary.clone())),
        };
        let (meta, _) = entry.resolve()?;
        Ok(Record {
            path: line.name.clone(),
            name: line.name,
            meta,
            submodules: Vec::new(),
        })
    }

    fn repo_url(&self, name: &str, repo: &str) -> Result<String> {
        match self.repo_base_url {
            Some(base) => Ok(format!("{}/{}", base, repo)),
            None => Err(Error::MissingRepoBase(name.to_owned())),
        }
    }

    /// Parses a JSON array of [`MetaEntry`] objects.
    ///
    /// NOTE: entries whose `import_prefix` does not contain the configured
    /// domain are skipped. They produce no page and no error; their prefixes
    /// are returned in the second half of [`Records`] and logged as
    /// warnings. The check is a plain substring match.
    fn parse_json(&self, input: &str) -> Result<Records> {
        let entries: Vec<MetaEntry> = serde_json::from_str(input)?;
        let mut records = Vec::with_capacity(entries.len());
        let mut skipped = Vec::new();
        for (i, entry) in entries.into_iter().enumerate() {
            // trimmed the same way MetaEntry::resolve trims the rendered prefix
            let prefix = entry.import_prefix.trim().trim_end_matches('/');
            let offset = match prefix.find(self.domain) {
                Some(offset) => offset,
                None => {
                    warn!(
                        import_prefix = %entry.import_prefix,
                        domain = %self.domain,
                        "skipping record outside the configured domain"
                    );
                    skipped.push(entry.import_prefix);
                    continue;
                }
            };
            let annotate = |e: Error| Error::Annotated(format!("record {}", i), Box::new(e));
            let path = prefix[offset + self.domain.len()..]
                .trim_matches('/')
                .to_owned();
            if !path.is_empty() {
                validate_path(&path).map_err(|e| annotate(e.into()))?;
            }
            let (meta, submodules) = entry.resolve().map_err(|e| annotate(e.into()))?;
            debug!(import_prefix = %meta.import_prefix, path = %path, "parsed record");
            records.push(Record {
                name: meta.import_prefix.clone(),
                path,
                meta,
                submodules,
            });
        }
        Ok((records, skipped))
    }
}

/// Represents the result of a [`Record`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error reading or parsing a records file.
#[derive(Debug)]
pub enum Error {
    /// Returned when the records file can't be read.
    Read { path: PathBuf, err: std::io::Error },

    /// Returned when a delimited line has the wrong number of fields.
    FieldCount { fields: usize, line: String },

    /// Returned when a delimited line starts with an empty field.
    EmptyName(String),

    /// Returned when an import definition is neither a lone prefix nor a
    /// `prefix vcs repo-root` triple.
    ImportDefinition(String),

    /// Returned when a record needs [`crate::config::Config::repo_base_url`]
    /// but none was configured.
    MissingRepoBase(String),

    /// Returned when the JSON records file is malformed.
    Json(serde_json::Error),

    /// Returned when a record's fields are invalid.
    Record(record::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Read { path, err } => {
                write!(f, "failed to open projects file '{}': {}", path.display(), err)
            }
            Error::FieldCount { fields, line } => write!(
                f,
                "project value is not interpretable ({} fields, expected 1 or 2): {}",
                fields, line
            ),
            Error::EmptyName(line) => write!(f, "project name is empty: {}", line),
            Error::ImportDefinition(definition) => write!(
                f,
                "import definition `{}` must be `prefix` or `prefix vcs repo-root`",
                definition
            ),
            Error::MissingRepoBase(name) => write!(
                f,
                "`{}` needs a repository base URL but {} is not set",
                name,
                crate::config::REPO_BASE_URL_ENV
            ),
            Error::Json(err) => err.fmt(f),
            Error::Record(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    /// Variants which already print the wrapped error return its source
    /// instead, so a cause chain never repeats a message.
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use std::error::Error as _;
        match self {
            Error::Read { err, .. } => err.source(),
            Error::FieldCount { .. } => None,
            Error::EmptyName(_) => None,
            Error::ImportDefinition(_) => None,
            Error::MissingRepoBase(_) => None,
            Error::Json(err) => err.source(),
            Error::Record(err) => err.source(),
            Error::Annotated(_, err) => err.source(),
        }
    }
}

impl From<serde_json::Error> for Error {
    /// Converts a [`serde_json::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for [`serde_json`] deserialization functions.
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}

impl From<record::Error> for Error {
    fn from(err: record::Error) -> Error {
        Error::Record(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const DOMAIN: &str = "go.example.org";
    const BASE: &str = "https://github.com/acme";

    fn parser(format: InputFormat) -> Parser<'static> {
        Parser::new(format, DOMAIN, Some(BASE))
    }

    #[test]
    fn test_parse_line_single_field() -> Result<()> {
        for delimiter in &[Delimiter::Whitespace, Delimiter::Semicolon] {
            assert_eq!(
                Some(Line {
                    name: String::from("mylib"),
                    secondary: String::new(),
                }),
                parse_line("  mylib \t", *delimiter)?
            );
        }
        Ok(())
    }

    #[test]
    fn test_parse_line_two_fields() -> Result<()> {
        assert_eq!(
            Some(Line {
                name: String::from("mylib"),
                secondary: String::from("go-mylib"),
            }),
            parse_line("mylib \t  go-mylib", Delimiter::Whitespace)?
        );
        assert_eq!(
            Some(Line {
                name: String::from("mylib"),
                secondary: String::from("go.example.org/mylib"),
            }),
            parse_line(" mylib ;  go.example.org/mylib ", Delimiter::Semicolon)?
        );
        Ok(())
    }

    #[test]
    fn test_parse_line_blank() -> Result<()> {
        assert_eq!(None, parse_line("", Delimiter::Whitespace)?);
        assert_eq!(None, parse_line(" \t ", Delimiter::Semicolon)?);
        Ok(())
    }

    #[test]
    fn test_parse_line_too_many_fields() {
        for (raw, delimiter) in &[
            ("a b c", Delimiter::Whitespace),
            ("a; b; c", Delimiter::Semicolon),
            ("a;;", Delimiter::Semicolon),
        ] {
            match parse_line(raw, *delimiter) {
                Err(Error::FieldCount { fields: 3, .. }) => {}
                other => panic!("`{}`: expected a field count error, got {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_parse_line_empty_name() {
        assert!(matches!(
            parse_line("; go.example.org/x", Delimiter::Semicolon),
            Err(Error::EmptyName(_))
        ));
    }

    #[test]
    fn test_projects() -> Result<()> {
        let (records, skipped) = parser(InputFormat::Projects).parse_str("mylib\n\n  tool   go-tool  \n")?;
        assert!(skipped.is_empty());
        assert_eq!(2, records.len());

        assert_eq!("mylib", records[0].name);
        assert_eq!("mylib", records[0].path);
        assert_eq!("go.example.org/mylib", records[0].meta.import_prefix);
        assert_eq!("https://github.com/acme/mylib", records[0].meta.repo_root);

        assert_eq!("tool", records[1].path);
        assert_eq!("go.example.org/tool", records[1].meta.import_prefix);
        assert_eq!("https://github.com/acme/go-tool", records[1].meta.repo_root);
        Ok(())
    }

    #[test]
    fn test_projects_reports_line_number() {
        let err = parser(InputFormat::Projects)
            .parse_str("ok\n\nnot ok at all\n")
            .unwrap_err();
        match &err {
            Error::Annotated(annotation, inner) => {
                assert_eq!("line 3", annotation);
                assert!(matches!(**inner, Error::FieldCount { fields: 4, .. }));
            }
            other => panic!("expected an annotated error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_repo_base() {
        let err = Parser::new(InputFormat::Projects, DOMAIN, None)
            .parse_str("mylib\n")
            .unwrap_err();
        assert!(err.to_string().contains("REPO_BASE_URL"), "{}", err);
    }

    #[test]
    fn test_imports() -> Result<()> {
        let input = "\
mylib; go.example.org/mylib
bare
full; go.example.org/full hg https://hg.example.org/full
";
        let (records, _) = parser(InputFormat::Imports).parse_str(input)?;
        let summary: Vec<(&str, &str, &str, &str)> = records
            .iter()
            .map(|r| {
                (
                    r.path.as_str(),
                    r.meta.import_prefix.as_str(),
                    r.meta.vcs.as_str(),
                    r.meta.repo_root.as_str(),
                )
            })
            .collect();
        assert_eq!(
            vec![
                ("mylib", "go.example.org/mylib", "git", "https://github.com/acme/mylib"),
                ("bare", "go.example.org/bare", "git", "https://github.com/acme/bare"),
                ("full", "go.example.org/full", "hg", "https://hg.example.org/full"),
            ],
            summary
        );
        Ok(())
    }

    #[test]
    fn test_imports_bad_definition() {
        let err = parser(InputFormat::Imports)
            .parse_str("mylib; go.example.org/mylib git\n")
            .unwrap_err();
        assert!(err.to_string().starts_with("line 1: import definition"), "{}", err);
    }

    #[test]
    fn test_name_must_be_relative() {
        for input in &["../etc\n", "/abs\n"] {
            assert!(parser(InputFormat::Projects).parse_str(input).is_err());
        }
    }

    #[test]
    fn test_json() -> Result<()> {
        let input = r#"[
            {
                "import_prefix": "go.example.org/pkg",
                "repo_root": "https://github.com/acme/pkg",
                "submodules": ["sub"]
            },
            {
                "import_prefix": "other.org/elsewhere",
                "repo_root": "https://github.com/acme/elsewhere"
            },
            {
                "vcs": "git",
                "import_prefix": "go.example.org/deep/tool",
                "repo_root": "https://git.example.org/tool",
                "home": "https://tool.example.org"
            }
        ]"#;
        let (records, skipped) = parser(InputFormat::Json).parse_str(input)?;
        assert_eq!(vec![String::from("other.org/elsewhere")], skipped);
        assert_eq!(2, records.len());
        assert_eq!("pkg", records[0].path);
        assert_eq!(vec![String::from("sub")], records[0].submodules);
        assert_eq!("deep/tool", records[1].path);
        assert_eq!("go.example.org/deep/tool", records[1].name);
        assert_eq!("https://tool.example.org", records[1].meta.home);
        Ok(())
    }

    #[test]
    fn test_json_padded_prefix_path() -> Result<()> {
        let (records, _) = parser(InputFormat::Json).parse_str(
            r#"[{"import_prefix": "  go.example.org/pkg/ ", "repo_root": "https://github.com/acme/pkg"}]"#,
        )?;
        assert_eq!("pkg", records[0].path);
        assert_eq!("go.example.org/pkg", records[0].meta.import_prefix);
        Ok(())
    }

    #[test]
    fn test_cause_chain_does_not_repeat() {
        use std::error::Error as _;

        let err = parser(InputFormat::Projects).parse_str("a b c\n").unwrap_err();
        assert!(err.to_string().starts_with("line 1: project value"), "{}", err);
        assert!(err.source().is_none());

        let err = parser(InputFormat::Json)
            .parse_str(r#"[{"import_prefix": "go.example.org/x", "repo_root": "nope"}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("not a valid URL"), "{}", err);
        assert!(err.source().is_none());

        let err = parser(InputFormat::Projects)
            .parse_file(Path::new("./definitely/not/here.txt"))
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to open projects file"), "{}", err);
        assert!(err.source().is_none());
    }

    #[test]
    fn test_json_domain_root() -> Result<()> {
        let (records, _) = parser(InputFormat::Json)
            .parse_str(r#"[{"import_prefix": "go.example.org", "repo_root": "https://github.com/acme/root"}]"#)?;
        assert_eq!("", records[0].path);
        Ok(())
    }

    #[test]
    fn test_json_malformed() {
        for input in &["", "{", r#"[{"import_prefix": "go.example.org/x"}]"#, r#"[{"import_prefix": "go.example.org/x", "repo_root": "https://github.com/a/x", "extra": 1}]"#] {
            match parser(InputFormat::Json).parse_str(input) {
                Err(Error::Json(_)) => {}
                other => panic!("`{}`: expected a JSON error, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_json_invalid_url() {
        let err = parser(InputFormat::Json)
            .parse_str(r#"[{"import_prefix": "go.example.org/x", "repo_root": "nope"}]"#)
            .unwrap_err();
        match err {
            Error::Annotated(annotation, inner) => {
                assert_eq!("record 0", annotation);
                assert!(matches!(*inner, Error::Record(record::Error::Url { .. })));
            }
            other => panic!("expected an annotated error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = parser(InputFormat::Projects)
            .parse_file(Path::new("./definitely/not/here.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
