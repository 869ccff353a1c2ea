use crate::Span;
use camino::{Utf8Path, Utf8PathBuf};
use codespan_reporting as cs;
use cs::files::Error as CsError;
use std::{fs, io, ops::Range};

pub struct SourceFile {
    id: SourceFileId,
    name: Utf8PathBuf,
    content: String,
    line_starts: Vec<usize>,
}

#[derive(Debug, PartialEq, Copy, Clone, Eq, Hash, PartialOrd, Ord)]
pub struct SourceFileId(u32);

impl SourceFileId {
    /// The id of files outside any [`FileStore`].
    fn detached() -> Self {
        Self(u32::MAX)
    }
}

impl SourceFile {
    pub fn new(id: SourceFileId, name: Utf8PathBuf, content: String) -> Self {
        let line_starts = cs::files::line_starts(&content).collect();
        Self {
            id,
            name,
            content,
            line_starts,
        }
    }

    /// A file that isn't registered in any [`FileStore`]; diagnostics
    /// produced against it can still be turned into line numbers.
    pub fn detached(name: impl Into<Utf8PathBuf>, content: impl Into<String>) -> Self {
        Self::new(SourceFileId::detached(), name.into(), content.into())
    }

    pub fn id(&self) -> SourceFileId {
        self.id
    }

    pub fn name(&self) -> &Utf8Path {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Zero-based index of the line containing `byte_index`.
    pub fn line_index(&self, byte_index: usize) -> usize {
        self.line_starts
            .binary_search(&byte_index)
            .unwrap_or_else(|next_line| next_line - 1)
    }

    /// One-based line number of the line containing `byte_index`.
    pub fn line_number(&self, byte_index: usize) -> usize {
        self.line_index(byte_index) + 1
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn line_span(&self, line_index: usize) -> Option<Span> {
        let start = *self.line_starts.get(line_index)?;
        let end = match self.line_starts.get(line_index + 1) {
            Some(next) => *next,
            None => self.content.len(),
        };
        Some(Span::new(start, end))
    }
}

pub trait FileLoader {
    fn load_file(&self, path: &Utf8Path) -> io::Result<String>;
}

pub struct OsFileLoader;

impl FileLoader for OsFileLoader {
    fn load_file(&self, path: &Utf8Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

pub struct FileStore {
    files: Vec<SourceFile>,
    loader: Box<dyn FileLoader>,
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStore {
    pub fn new() -> Self {
        Self::with_loader(Box::new(OsFileLoader))
    }

    pub fn with_loader(loader: Box<dyn FileLoader>) -> Self {
        Self {
            files: Vec::new(),
            loader,
        }
    }

    pub fn add_file(
        &mut self,
        path: impl Into<Utf8PathBuf>,
        content: impl Into<String>,
    ) -> SourceFileId {
        let id = SourceFileId(self.files.len() as u32);
        self.files.push(SourceFile::new(id, path.into(), content.into()));
        id
    }

    pub fn load_file(&mut self, path: &Utf8Path) -> io::Result<SourceFileId> {
        let content = self.loader.load_file(path)?;
        Ok(self.add_file(path, content))
    }

    pub fn get_file(&self, id: SourceFileId) -> Option<&SourceFile> {
        self.files.get(id.0 as usize)
    }

    /// # Panics
    /// Panics if `id` wasn't handed out by this store.
    pub fn file(&self, id: SourceFileId) -> &SourceFile {
        self.get_file(id).expect("file id from a different store")
    }
}

impl<'a> cs::files::Files<'a> for FileStore {
    type FileId = SourceFileId;
    type Name = &'a Utf8Path;
    type Source = &'a str;

    fn name(&'a self, id: SourceFileId) -> Result<Self::Name, CsError> {
        self.get_file(id)
            .map(|file| file.name.as_path())
            .ok_or(CsError::FileMissing)
    }

    fn source(&'a self, id: SourceFileId) -> Result<Self::Source, CsError> {
        self.get_file(id)
            .map(|file| file.content.as_str())
            .ok_or(CsError::FileMissing)
    }

    fn line_index(&'a self, id: SourceFileId, byte_index: usize) -> Result<usize, CsError> {
        Ok(self
            .get_file(id)
            .ok_or(CsError::FileMissing)?
            .line_index(byte_index))
    }

    fn line_range(&'a self, id: SourceFileId, line_index: usize) -> Result<Range<usize>, CsError> {
        let file = self.get_file(id).ok_or(CsError::FileMissing)?;
        Ok(file
            .line_span(line_index)
            .ok_or(CsError::LineTooLarge {
                given: line_index,
                max: file.line_starts.len() - 1,
            })?
            .into())
    }
}
