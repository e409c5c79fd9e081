//! Source documents and output sinks
//!
//! The converter only needs two capabilities from its surroundings: a fresh
//! read cursor positioned at the start of a registry document, and a writable
//! sink per CSV file. Filesystem and in-memory implementations live here.

use crate::config::ConverterConfig;
use crate::constants::METADATA_MARKER;
use crate::error::{ConverterError, Result};
use crate::scanner::ListScanner;
use glob::{MatchOptions, Pattern};
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// The two registry exports a run reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceDocument {
    /// Address registry: postal codes, roads, access points, addresses
    Dar,
    /// Cadastral registry: ownership districts and parcels
    Mat,
}

impl fmt::Display for SourceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDocument::Dar => f.write_str("DAR"),
            SourceDocument::Mat => f.write_str("MAT"),
        }
    }
}

pub type SourceReader = Box<dyn Read + Send>;
pub type SinkWriter = Box<dyn Write + Send>;

/// Hands out independent read cursors over the registry documents
pub trait SourceProvider: Send + Sync {
    /// Open a new cursor at the start of `document`
    fn open(&self, document: SourceDocument) -> Result<SourceReader>;

    /// Name of the document for logs and error messages
    fn describe(&self, document: SourceDocument) -> String {
        document.to_string()
    }
}

/// Creates one writable sink per output file
pub trait SinkProvider: Send + Sync {
    fn create(&self, name: &str) -> Result<SinkWriter>;
}

/// Registry documents on the local filesystem
#[derive(Debug, Clone)]
pub struct FileSources {
    dar: PathBuf,
    mat: PathBuf,
}

impl FileSources {
    pub fn new(dar: impl Into<PathBuf>, mat: impl Into<PathBuf>) -> Self {
        Self {
            dar: dar.into(),
            mat: mat.into(),
        }
    }

    /// Explicit paths from the configuration win; the rest is discovered
    pub fn from_config(config: &ConverterConfig) -> Result<Self> {
        let dar = match &config.dar_path {
            Some(path) => path.clone(),
            None => discover_document(&config.input_dir, SourceDocument::Dar, &config.dar_prefix)?,
        };
        let mat = match &config.mat_path {
            Some(path) => path.clone(),
            None => discover_document(&config.input_dir, SourceDocument::Mat, &config.mat_prefix)?,
        };
        Ok(Self::new(dar, mat))
    }

    pub fn path(&self, document: SourceDocument) -> &Path {
        match document {
            SourceDocument::Dar => &self.dar,
            SourceDocument::Mat => &self.mat,
        }
    }
}

impl SourceProvider for FileSources {
    fn open(&self, document: SourceDocument) -> Result<SourceReader> {
        let path = self.path(document);
        match File::open(path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ConverterError::SourceNotFound {
                document: document.to_string(),
                dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                prefix: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn describe(&self, document: SourceDocument) -> String {
        self.path(document)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| document.to_string())
    }
}

/// Newest `<prefix>*.json` document in `dir`, ignoring metadata documents
///
/// Matching is case-insensitive. Export file names embed their timestamp, so
/// the lexicographically greatest name is the newest export.
pub fn discover_document(dir: &Path, document: SourceDocument, prefix: &str) -> Result<PathBuf> {
    let pattern = format!(
        "{}/{}*.json",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(prefix)
    );
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let entries = glob::glob_with(&pattern, options)
        .map_err(|e| ConverterError::configuration(format!("Invalid source pattern '{}': {}", pattern, e)))?;

    let mut newest: Option<(String, PathBuf)> = None;
    for path in entries.flatten() {
        let Some(name) = path.file_name().map(|name| name.to_string_lossy().to_lowercase()) else {
            continue;
        };
        if name.contains(METADATA_MARKER) || !path.is_file() {
            debug!("Skipping {} while discovering {}", path.display(), document);
            continue;
        }

        if newest.as_ref().is_none_or(|(current, _)| name > *current) {
            newest = Some((name, path));
        }
    }

    match newest {
        Some((_, path)) => {
            info!("Using {} document {}", document, path.display());
            Ok(path)
        }
        None => Err(ConverterError::SourceNotFound {
            document: document.to_string(),
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
        }),
    }
}

/// Scanner over a fresh cursor of `document`
pub(crate) fn open_scanner(
    sources: &dyn SourceProvider,
    document: SourceDocument,
    buffer_size: usize,
) -> Result<ListScanner<SourceReader>> {
    let reader = sources.open(document)?;
    Ok(ListScanner::new(reader, sources.describe(document)).with_buffer_size(buffer_size))
}

/// CSV files in an output directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Use `dir` for output, creating it when missing
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }
}

impl SinkProvider for DirectorySink {
    fn create(&self, name: &str) -> Result<SinkWriter> {
        let file = File::create(self.dir.join(name))?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Registry documents held in memory
#[derive(Debug, Clone)]
pub struct MemorySources {
    dar: Arc<[u8]>,
    mat: Arc<[u8]>,
}

impl MemorySources {
    pub fn new(dar: impl Into<Vec<u8>>, mat: impl Into<Vec<u8>>) -> Self {
        let dar: Vec<u8> = dar.into();
        let mat: Vec<u8> = mat.into();
        Self {
            dar: dar.into(),
            mat: mat.into(),
        }
    }
}

impl SourceProvider for MemorySources {
    fn open(&self, document: SourceDocument) -> Result<SourceReader> {
        let bytes = match document {
            SourceDocument::Dar => Arc::clone(&self.dar),
            SourceDocument::Mat => Arc::clone(&self.mat),
        };
        Ok(Box::new(Cursor::new(bytes)))
    }
}

/// Output files collected in memory; clones share the same files
#[derive(Debug, Clone, Default)]
pub struct MemorySinks {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemorySinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written to `name`, if it was created
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().ok()?.get(name).cloned()
    }

    /// Contents of `name` as UTF-8 text
    pub fn text(&self, name: &str) -> Option<String> {
        String::from_utf8(self.contents(name)?).ok()
    }

    /// Names of all created files, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .files
            .lock()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl SinkProvider for MemorySinks {
    fn create(&self, name: &str) -> Result<SinkWriter> {
        self.files
            .lock()
            .map_err(|_| io::Error::other("memory sink lock poisoned"))?
            .insert(name.to_string(), Vec::new());

        Ok(Box::new(MemoryFile {
            name: name.to_string(),
            files: Arc::clone(&self.files),
        }))
    }
}

struct MemoryFile {
    name: String,
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl Write for MemoryFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| io::Error::other("memory sink lock poisoned"))?;
        files.entry(self.name.clone()).or_default().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// In-memory documents whose cursors count the bytes they hand out
    #[derive(Clone)]
    pub struct CountingSources {
        inner: MemorySources,
        cursors: Arc<Mutex<Vec<(SourceDocument, Arc<AtomicU64>)>>>,
    }

    impl CountingSources {
        pub fn new(dar: &str, mat: &str) -> Self {
            Self {
                inner: MemorySources::new(dar, mat),
                cursors: Arc::default(),
            }
        }

        /// Cursors opened so far, in opening order
        pub fn opened(&self) -> Vec<SourceDocument> {
            self.cursors.lock().unwrap().iter().map(|(doc, _)| *doc).collect()
        }

        /// Bytes read so far through the `index`-th cursor
        pub fn bytes_read(&self, index: usize) -> u64 {
            self.cursors
                .lock()
                .unwrap()
                .get(index)
                .map_or(0, |(_, counter)| counter.load(Ordering::SeqCst))
        }
    }

    impl SourceProvider for CountingSources {
        fn open(&self, document: SourceDocument) -> Result<SourceReader> {
            let inner = self.inner.open(document)?;
            let counter = Arc::new(AtomicU64::new(0));
            self.cursors.lock().unwrap().push((document, Arc::clone(&counter)));
            Ok(Box::new(CountingReader { inner, counter }))
        }
    }

    struct CountingReader {
        inner: SourceReader,
        counter: Arc<AtomicU64>,
    }

    impl Read for CountingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.inner.read(buf)?;
            self.counter.fetch_add(n as u64, Ordering::SeqCst);
            Ok(n)
        }
    }
}
