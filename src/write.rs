use crate::config::Layout;
use crate::record::Record;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Mode for every directory we create.
#[cfg(unix)]
const DIRECTORY_MODE: u32 = 0o755;

/// Mode for every file we write.
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Responsible for laying rendered pages out on disk.
pub struct Writer<'a> {
    /// The root of the generated tree. With [`Layout::Nested`] a record lands
    /// at `{output_directory}/{record.path}/index.html`; with
    /// [`Layout::Flat`] at `{output_directory}/{record.path}.html`.
    pub output_directory: &'a Path,

    pub layout: Layout,
}

impl Writer<'_> {
    /// Writes `page` for `record`, then writes the same bytes for each of the
    /// record's submodules. Go resolves a nested module through its parent's
    /// `go-import` tag, so the copies are byte-identical on purpose. Returns
    /// the paths written, parent first.
    pub fn write_record(&self, record: &Record, page: &[u8]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(record.submodules.len() + 1);
        let parent = self.page_path(&record.path);
        self.write_page(&parent, page)?;
        written.push(parent);

        for submodule in &record.submodules {
            let relative = match record.path.is_empty() {
                true => submodule.clone(),
                false => format!("{}/{}", record.path, submodule),
            };
            let path = self.page_path(&relative);
            self.write_page(&path, page)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Writes `{output_directory}/CNAME` containing `domain`, for static
    /// hosts which configure custom domains that way.
    pub fn write_cname(&self, domain: &str) -> Result<PathBuf> {
        ensure_directory(self.output_directory)?;
        let path = self.output_directory.join("CNAME");
        write_file(&path, format!("{}\n", domain).as_bytes())?;
        Ok(path)
    }

    /// Maps a `/`-separated relative path onto the output file for the
    /// configured [`Layout`]. The empty path is the output root itself.
    fn page_path(&self, relative: &str) -> PathBuf {
        let mut path = self.output_directory.to_owned();
        match self.layout {
            Layout::Nested => {
                path.extend(relative.split('/').filter(|s| !s.is_empty()));
                path.join("index.html")
            }
            Layout::Flat if relative.is_empty() => path.join("index.html"),
            Layout::Flat => {
                let mut segments: Vec<&str> = relative.split('/').collect();
                let file_name = format!("{}.html", segments.pop().unwrap_or_default());
                path.extend(segments);
                path.join(file_name)
            }
        }
    }

    fn write_page(&self, path: &Path, page: &[u8]) -> Result<()> {
        // page_path always joins onto output_directory, so there's a parent
        if let Some(dir) = path.parent() {
            ensure_directory(dir)?;
        }
        write_file(path, page)?;
        debug!(path = %path.display(), bytes = page.len(), "wrote page");
        Ok(())
    }
}

/// Creates `dir` and any missing ancestors. Succeeds if it already exists.
fn ensure_directory(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIRECTORY_MODE);
    }
    builder.create(dir).map_err(|err| Error::CreateDirectory {
        path: dir.to_owned(),
        err,
    })
}

/// Writes `contents` to `path`, replacing any existing file, and resets the
/// file's permissions so re-runs converge on the same mode.
fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    let annotate = |err: io::Error| Error::WriteFile {
        path: path.to_owned(),
        err,
    };
    fs::write(path, contents).map_err(annotate)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(FILE_MODE)).map_err(annotate)?;
    }
    Ok(())
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error creating an output directory.
    CreateDirectory { path: PathBuf, err: io::Error },

    /// An error writing an output file.
    WriteFile { path: PathBuf, err: io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::CreateDirectory { path, err } => {
                write!(f, "creating directory '{}': {}", path.display(), err)
            }
            Error::WriteFile { path, err } => {
                write!(f, "writing out html failed for '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    /// The I/O error is already part of the message, so this skips to its
    /// own source.
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use std::error::Error as _;
        match self {
            Error::CreateDirectory { err, .. } => err.source(),
            Error::WriteFile { err, .. } => err.source(),
        }
    }
}
