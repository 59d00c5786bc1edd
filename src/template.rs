//! Renders [`Meta`] into redirect pages. The page template is compiled into
//! the binary and parsed once per run by [`Renderer::new`]; rendering itself
//! is pure, so the same [`Meta`] always produces the same bytes.

use crate::record::Meta;
use gtmpl::Template;
use gtmpl_derive::Gtmpl;
use pulldown_cmark::escape::escape_html;
use std::fmt;

/// The redirect page. It carries the `go-import` tag read by `go get`, the
/// `go-source` tag read by documentation browsers, and a refresh to
/// pkg.go.dev for humans.
const REDIRECT_TEMPLATE: &str = include_str!("templates/redirect.html");

/// The values exposed to the template. Everything is HTML-escaped on the way
/// in because the template places it inside attribute values.
#[derive(Gtmpl)]
struct PageData {
    import_prefix: String,
    vcs: String,
    repo_root: String,
    home: String,
    directory: String,
    file: String,
}

impl PageData {
    fn new(meta: &Meta) -> Result<PageData> {
        Ok(PageData {
            import_prefix: escaped(&meta.import_prefix)?,
            vcs: escaped(&meta.vcs)?,
            repo_root: escaped(&meta.repo_root)?,
            home: escaped(&meta.home)?,
            directory: escaped(&meta.directory)?,
            file: escaped(&meta.file)?,
        })
    }
}

/// Holds the parsed redirect template.
pub struct Renderer {
    template: Template,
}

impl Renderer {
    /// Parses the embedded redirect template.
    pub fn new() -> Result<Renderer> {
        Renderer::with_template(REDIRECT_TEMPLATE)
    }

    /// Parses `source` as the redirect template. It sees the fields
    /// `import_prefix`, `vcs`, `repo_root`, `home`, `directory` and `file`.
    /// An action left open (`{{` without a closing `}}`) is a parse error.
    pub fn with_template(source: &str) -> Result<Renderer> {
        if let Some(offset) = unclosed_action(source) {
            return Err(Error::Parse(format!(
                "unclosed action starting at byte {}",
                offset
            )));
        }
        let mut template = Template::default();
        template
            .parse(source)
            .map_err(|e| Error::Parse(e.to_string()))?;
        Ok(Renderer { template })
    }

    /// Renders the page for `meta`.
    pub fn render(&self, meta: &Meta) -> Result<Vec<u8>> {
        let context = gtmpl::Context::from(PageData::new(meta)?)
            .map_err(|e| Error::Execute(e.to_string()))?;
        let mut buf = Vec::new();
        self.template
            .execute(&mut buf, &context)
            .map_err(|e| Error::Execute(e.to_string()))?;
        Ok(buf)
    }
}

/// Escapes `s` for use inside a double-quoted HTML attribute.
fn escaped(s: &str) -> Result<String> {
    let mut out = String::with_capacity(s.len());
    escape_html(&mut out, s).map_err(|e| Error::Execute(e.to_string()))?;
    Ok(out)
}

/// Returns the byte offset of the first `{{` with no `}}` after it. gtmpl's
/// lexer never terminates on such input, so it's rejected up front.
fn unclosed_action(source: &str) -> Option<usize> {
    let mut pos = 0;
    while let Some(open) = source[pos..].find("{{") {
        let open = pos + open;
        match source[open + 2..].find("}}") {
            Some(close) => pos = open + 2 + close + 2,
            None => return Some(open),
        }
    }
    None
}

/// The result of a templating operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a templating operation. [`gtmpl`] reports its
/// errors as messages, so that's what we carry.
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Returned when the template can't be parsed.
    Parse(String),

    /// Returned when the template fails to execute.
    Execute(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "parsing redirect template: {}", err),
            Error::Execute(err) => write!(f, "redirect template execution failed: {}", err),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::record::MetaEntry;

    fn meta(repo_root: &str) -> Meta {
        MetaEntry {
            import_prefix: String::from("go.example.org/mylib"),
            repo_root: String::from(repo_root),
            ..MetaEntry::default()
        }
        .resolve()
        .unwrap()
        .0
    }

    fn render(meta: &Meta) -> String {
        String::from_utf8(Renderer::new().unwrap().render(meta).unwrap()).unwrap()
    }

    #[test]
    fn test_go_import_tag() {
        let page = render(&meta("https://github.com/acme/mylib"));
        assert!(
            page.contains(
                r#"<meta name="go-import" content="go.example.org/mylib git https://github.com/acme/mylib">"#
            ),
            "{}",
            page
        );
    }

    #[test]
    fn test_go_source_tag_github_defaults() {
        let page = render(&meta("https://github.com/acme/mylib"));
        assert!(
            page.contains(concat!(
                r#"<meta name="go-source" content="go.example.org/mylib "#,
                "https://github.com/acme/mylib ",
                "https://github.com/acme/mylib/tree/master{/dir} ",
                r#"https://github.com/acme/mylib/tree/master{/dir}/{file}#L{line}">"#,
            )),
            "{}",
            page
        );
    }

    #[test]
    fn test_go_source_tag_unknown_host() {
        let page = render(&meta("https://git.example.org/mylib"));
        assert!(
            page.contains(
                r#"<meta name="go-source" content="go.example.org/mylib https://git.example.org/mylib _ _">"#
            ),
            "{}",
            page
        );
    }

    #[test]
    fn test_render_is_deterministic() -> Result<()> {
        let renderer = Renderer::new()?;
        let meta = meta("https://github.com/acme/mylib");
        assert_eq!(renderer.render(&meta)?, renderer.render(&meta)?);
        assert_eq!(renderer.render(&meta)?, Renderer::new()?.render(&meta)?);
        Ok(())
    }

    #[test]
    fn test_values_are_escaped() {
        let mut meta = meta("https://github.com/acme/mylib");
        meta.home = String::from(r#"https://example.org/?a=1&b="2""#);
        let page = render(&meta);
        assert!(page.contains("https://example.org/?a=1&amp;b=&quot;2&quot;"), "{}", page);
    }

    #[test]
    fn test_custom_template() -> Result<()> {
        let renderer = Renderer::with_template("{{.import_prefix}} {{.vcs}} {{.repo_root}}")?;
        assert_eq!(
            b"go.example.org/mylib git https://github.com/acme/mylib".to_vec(),
            renderer.render(&meta("https://github.com/acme/mylib"))?
        );
        Ok(())
    }

    #[test]
    fn test_bad_template() {
        for source in &["{{end}}", "{{ .import_prefix }"] {
            match Renderer::with_template(source) {
                Err(Error::Parse(_)) => {}
                Err(other) => panic!("`{}`: expected a parse error, got {:?}", source, other),
                Ok(_) => panic!("`{}`: expected a parse error", source),
            }
        }
    }

    #[test]
    fn test_unclosed_action_is_rejected() {
        match Renderer::with_template("ok {{ .import_prefix ") {
            Err(err) => assert_eq!(
                Error::Parse(String::from("unclosed action starting at byte 3")),
                err
            ),
            Ok(_) => panic!("expected a parse error"),
        }
        assert_eq!(None, unclosed_action("{{.vcs}} and {{.home}}"));
        assert_eq!(Some(9), unclosed_action("{{.vcs}} {{"));
    }
}
