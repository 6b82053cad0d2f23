use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Incremental byte source for one asset download.
pub trait ByteStream {
    /// Total size once the source knows it. May start as `None` and become
    /// known part-way through the download.
    fn total_len(&self) -> Option<u64>;

    /// Reads up to `max` bytes. `Ok(None)` marks the end of the stream.
    fn read_chunk(&mut self, max: usize) -> Result<Option<Vec<u8>>>;
}

pub trait Transport {
    fn open(&mut self, url: &str) -> Result<Box<dyn ByteStream>>;
}

/// Serves `file://` URLs and plain paths, resolved against an optional root.
#[derive(Debug, Clone, Default)]
pub struct FileTransport {
    root: Option<PathBuf>,
}

impl FileTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: Some(root.into()) }
    }

    fn resolve(&self, url: &str) -> Result<PathBuf> {
        if url.starts_with("http://") || url.starts_with("https://") {
            bail!("file transport cannot fetch remote url '{url}'");
        }
        let raw = url.strip_prefix("file://").unwrap_or(url);
        let path = Path::new(raw);
        Ok(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        })
    }
}

impl Transport for FileTransport {
    fn open(&mut self, url: &str) -> Result<Box<dyn ByteStream>> {
        let path = self.resolve(url)?;
        let file = File::open(&path).with_context(|| format!("Failed to open model file {}", path.display()))?;
        let total = file
            .metadata()
            .with_context(|| format!("Failed to stat model file {}", path.display()))?
            .len();
        Ok(Box::new(FileStream { file, total }))
    }
}

struct FileStream {
    file: File,
    total: u64,
}

impl ByteStream for FileStream {
    fn total_len(&self) -> Option<u64> {
        Some(self.total)
    }

    fn read_chunk(&mut self, max: usize) -> Result<Option<Vec<u8>>> {
        let mut chunk = vec![0u8; max.max(1)];
        let read = self.file.read(&mut chunk).context("Failed to read model file")?;
        if read == 0 {
            return Ok(None);
        }
        chunk.truncate(read);
        Ok(Some(chunk))
    }
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    bytes: Vec<u8>,
    /// Number of chunks served before the total length is revealed.
    reveal_length_after: usize,
}

/// In-memory asset source keyed by URL. Used by tests and by hosts that
/// already hold the asset bytes.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    entries: HashMap<String, MemoryEntry>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(url.into(), MemoryEntry { bytes, reveal_length_after: 0 });
    }

    /// Like `insert`, but the stream reports an unknown length until
    /// `chunks` chunks have been read.
    pub fn insert_with_late_length(&mut self, url: impl Into<String>, bytes: Vec<u8>, chunks: usize) {
        self.entries.insert(url.into(), MemoryEntry { bytes, reveal_length_after: chunks });
    }
}

impl Transport for MemoryTransport {
    fn open(&mut self, url: &str) -> Result<Box<dyn ByteStream>> {
        let entry = self.entries.get(url).cloned().ok_or_else(|| anyhow!("no asset registered for '{url}'"))?;
        Ok(Box::new(MemoryStream { entry, offset: 0, chunks_read: 0 }))
    }
}

struct MemoryStream {
    entry: MemoryEntry,
    offset: usize,
    chunks_read: usize,
}

impl ByteStream for MemoryStream {
    fn total_len(&self) -> Option<u64> {
        (self.chunks_read >= self.entry.reveal_length_after).then_some(self.entry.bytes.len() as u64)
    }

    fn read_chunk(&mut self, max: usize) -> Result<Option<Vec<u8>>> {
        if self.offset >= self.entry.bytes.len() {
            return Ok(None);
        }
        let end = (self.offset + max.max(1)).min(self.entry.bytes.len());
        let chunk = self.entry.bytes[self.offset..end].to_vec();
        self.offset = end;
        self.chunks_read += 1;
        Ok(Some(chunk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn memory_stream_reveals_length_late() {
        let mut transport = MemoryTransport::new();
        transport.insert_with_late_length("mem://a", vec![1, 2, 3, 4, 5], 2);
        let mut stream = transport.open("mem://a").expect("open");
        assert_eq!(stream.total_len(), None);
        assert_eq!(stream.read_chunk(2).expect("chunk"), Some(vec![1, 2]));
        assert_eq!(stream.total_len(), None);
        assert_eq!(stream.read_chunk(2).expect("chunk"), Some(vec![3, 4]));
        assert_eq!(stream.total_len(), Some(5));
        assert_eq!(stream.read_chunk(2).expect("chunk"), Some(vec![5]));
        assert_eq!(stream.read_chunk(2).expect("chunk"), None);
    }

    #[test]
    fn file_transport_reads_relative_to_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut file = File::create(dir.path().join("cube.glb")).expect("create");
        file.write_all(b"abcdef").expect("write");
        let mut transport = FileTransport::with_root(dir.path());
        let mut stream = transport.open("file://cube.glb").expect("open");
        assert_eq!(stream.total_len(), Some(6));
        assert_eq!(stream.read_chunk(4).expect("chunk"), Some(b"abcd".to_vec()));
        assert!(transport.open("https://example.com/cube.glb").is_err());
    }
}
