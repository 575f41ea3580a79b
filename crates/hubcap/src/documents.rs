//! declaration files (parsed hcl [Body] and path to source file)
//!
//! [Documents] keeps the parsed documents in load order, together with the path they came from.
//! The path is used to resolve relative `absorb` paths and to point at the file in log output.
//! At this point documents only have to be valid HCL to be accepted.
use hcl::Body;
use std::path::{Path, PathBuf};

/// Extension of declaration files
pub const EXTENSION: &str = "hcl";

#[derive(Debug, Clone)]
pub struct Document {
    source: Source,
    body: Body,
}

impl Document {
    pub fn new(body: Body, source: impl Into<Source>) -> Self {
        Self {
            source: source.into(),
            body,
        }
    }

    pub fn parse(contents: &str, source: impl Into<Source>) -> Result<Self, LoadError> {
        let body = hcl_edit::parser::parse_body(contents)?;
        Ok(Self::new(body.into(), source))
    }

    pub fn load(file_path: &Path) -> Result<Self, LoadError> {
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(&file_path)?;
        Self::parse(&file_contents, Some(file_path))
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Directory relative paths inside this document are resolved against
    pub fn dir(&self) -> Option<&Path> {
        self.source.as_deref().and_then(Path::parent)
    }
}

#[derive(Default, Debug)]
pub struct Documents {
    documents: Vec<Document>,
}

impl Documents {
    /// Adds a parsed document
    pub fn insert(&mut self, body: Body, path: impl Into<Source>) {
        self.documents.push(Document::new(body, path));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn source_count(&self) -> usize {
        self.documents.len()
    }
}

impl Documents {
    /// Load a file (`.hcl` may be omitted) or every declaration file of a directory
    pub fn load_path(&mut self, path: &Path) -> Result<(), LoadError> {
        if path.is_dir() {
            self.load_directory(path)
        } else {
            self.load_file(&locate(path)?)
        }
    }

    pub fn load_file(&mut self, file_path: &Path) -> Result<(), LoadError> {
        self.documents.push(Document::load(file_path)?);
        Ok(())
    }

    /// Loads the declaration files of a directory in name order, subdirectories are ignored
    pub fn load_directory(&mut self, dir_path: &Path) -> Result<(), LoadError> {
        let mut file_paths = Vec::new();

        let read_dir = std::fs::read_dir(dir_path)?;
        for dir_entry in read_dir {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let file_path = dir_entry.path();
            if file_path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }

            file_paths.push(file_path);
        }

        if file_paths.is_empty() {
            return Err(LoadError::NoFilesFound(dir_path.to_owned()));
        }

        file_paths.sort();
        for file_path in file_paths {
            self.load_file(&file_path)?;
        }

        Ok(())
    }
}

/// Find the file `path` refers to, trying `path` itself and then `path` with [EXTENSION]
pub fn locate(path: &Path) -> Result<PathBuf, LoadError> {
    if path.is_file() {
        return Ok(path.to_owned());
    }

    let mut with_extension = path.as_os_str().to_owned();
    with_extension.push(".");
    with_extension.push(EXTENSION);
    let with_extension = PathBuf::from(with_extension);
    if with_extension.is_file() {
        return Ok(with_extension);
    }

    Err(LoadError::FileNotFound(path.to_owned()))
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("No files found in directory {}", .0.display())]
    NoFilesFound(PathBuf),
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse hcl file")]
    HclParseFailed(#[from] hcl_edit::parser::Error),
}

impl From<Body> for Documents {
    fn from(value: Body) -> Self {
        let mut documents = Documents::default();
        documents.insert(value, None);
        documents
    }
}

/// Utility macro to create [Documents]
///
/// Create from a single document
/// ```
/// # use hubcap::documents;
/// documents!(r#"server "localhost" {}"#);
/// ```
///
/// Create from multiple documents (path required)
/// ```
/// # use hubcap::documents;
/// documents! {
///   "one.hcl" => r#"group "one" {}"#,
///   "two.hcl" => r#"group "two" {}"#
/// };
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use hubcap::documents;
/// documents!("not = valid = hcl");
/// ```
#[macro_export]
macro_rules! documents {
    // single document without source
    { $expr:expr } => {
        $crate::documents::Documents::from(
            $crate::documents::Document::parse($expr, None)
                .expect("body must parse")
                .body()
                .clone(),
        )
    };
    // multi document with sources
    { $($source:expr => $expr:expr),+ } => {{
        let mut docs = $crate::documents::Documents::default();
        $(
            docs.insert(
                $crate::documents::Document::parse($expr, None)
                    .expect("body must parse")
                    .body()
                    .clone(),
                Some(::std::path::PathBuf::from($source)),
            );
        )+

        docs
    }};
}

pub type Source = Option<PathBuf>;

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    #[test]
    fn insert_keeps_order() {
        let documents = documents! {
            "one.hcl" => r#"group "one" {}"#,
            "two.hcl" => r#"group "two" {}"#
        };

        assert_eq!(documents.source_count(), 2);
        let sources: Vec<_> = documents.iter().map(|d| d.source().clone()).collect();
        assert_eq!(
            sources,
            [Some(PathBuf::from("one.hcl")), Some(PathBuf::from("two.hcl"))]
        );
    }

    #[test]
    fn locate_missing_file() {
        assert!(matches!(
            locate(Path::new("does/not/exist")),
            Err(LoadError::FileNotFound(_))
        ));
    }

    #[test]
    fn invalid_hcl_fails_to_parse() {
        assert!(matches!(
            Document::parse("not = valid = hcl", None),
            Err(LoadError::HclParseFailed(_))
        ));
    }
}
