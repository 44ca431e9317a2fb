// =============================================================================
// FS — virtual filesystem
//
// Paths are `/`-separated and relative to the filesystem base directory. Any
// number of read-only in-memory "buffer files" can be registered on top; they
// shadow disk files with the same path and show up in directory listings.
// =============================================================================

pub mod save;

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom, Write};
use std::ops::BitOr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};
use thiserror::Error;

pub use save::{read_save, read_save_bytes, save_path, write_save, write_save_bytes};

#[derive(Debug, Error)]
pub enum FsError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("read-only file: {0}")]
    ReadOnly(String),
    #[error("file is not open")]
    NotOpen,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ── Flags ─────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenMode(pub u8);

impl OpenMode {
    pub const READ: Self = Self(1);
    pub const WRITE: Self = Self(2);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for OpenMode {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FileFlags(pub u8);

impl FileFlags {
    pub const NONE: Self = Self(0);
    pub const DIRECTORY: Self = Self(1);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub flags: FileFlags,
    pub size: u64,
}

impl FileInfo {
    pub fn is_dir(&self) -> bool {
        self.flags.contains(FileFlags::DIRECTORY)
    }
}

/// Strip leading `/` and `./` and any trailing `/`.
fn normalize(path: &str) -> String {
    let mut p = path.trim_start_matches("./").trim_start_matches('/');
    while let Some(rest) = p.strip_prefix("./") {
        p = rest;
    }
    p.trim_end_matches('/').to_string()
}

/// Directory part of a normalised path ("" for the root).
fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(d, _)| d).unwrap_or("")
}

// ── Filesystem ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct Filesystem {
    base: PathBuf,
    buffers: HashMap<String, Arc<[u8]>>,
}

impl Filesystem {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into(), buffers: HashMap::new() }
    }

    pub fn base_path(&self) -> &Path {
        &self.base
    }

    /// Disk location of a virtual path.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = normalize(path);
        if p.is_empty() { self.base.clone() } else { self.base.join(p) }
    }

    /// Register a read-only in-memory file at `path`.
    pub fn add_buffer_file(&mut self, path: &str, data: impl Into<Arc<[u8]>>) {
        let key = normalize(path);
        let data = data.into();
        debug!("[fs] buffer file {key} ({} bytes)", data.len());
        self.buffers.insert(key, data);
    }

    pub fn buffer_file(&self, path: &str) -> Option<&Arc<[u8]>> {
        self.buffers.get(&normalize(path))
    }

    pub fn is_buffer_file(&self, path: &str) -> bool {
        self.buffers.contains_key(&normalize(path))
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.is_buffer_file(path) || self.resolve(path).is_file()
    }

    pub fn directory_exists(&self, path: &str) -> bool {
        let dir = normalize(path);
        let prefix = format!("{dir}/");
        dir.is_empty()
            || self.buffers.keys().any(|k| k.starts_with(&prefix))
            || self.resolve(&dir).is_dir()
    }

    pub fn create_directory(&self, path: &str) -> Result<(), FsError> {
        std::fs::create_dir_all(self.resolve(path))?;
        Ok(())
    }

    pub fn rename_file(&self, old: &str, new: &str) -> Result<(), FsError> {
        if self.is_buffer_file(old) {
            return Err(FsError::ReadOnly(old.to_string()));
        }
        std::fs::rename(self.resolve(old), self.resolve(new))?;
        Ok(())
    }

    pub fn remove_file(&self, path: &str) -> Result<(), FsError> {
        if self.is_buffer_file(path) {
            return Err(FsError::ReadOnly(path.to_string()));
        }
        std::fs::remove_file(self.resolve(path))?;
        Ok(())
    }

    /// Entries directly inside `path`, sorted by name.
    pub fn list_files(&self, path: &str) -> Vec<FileInfo> {
        self.list_files_filtered(path, |_| true)
    }

    pub fn list_files_filtered(&self, path: &str, filter: impl Fn(&FileInfo) -> bool) -> Vec<FileInfo> {
        let dir = normalize(path);
        let mut out: Vec<FileInfo> = Vec::new();

        if let Ok(entries) = std::fs::read_dir(self.resolve(&dir)) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name == "." || name == ".." {
                    continue;
                }
                let Ok(meta) = entry.metadata() else { continue };
                let flags = if meta.is_dir() { FileFlags::DIRECTORY } else { FileFlags::NONE };
                out.push(FileInfo { name, flags, size: if meta.is_dir() { 0 } else { meta.len() } });
            }
        }

        for (key, data) in &self.buffers {
            if parent_of(key) != dir {
                continue;
            }
            let name = key.rsplit('/').next().unwrap_or(key).to_string();
            let info = FileInfo { name, flags: FileFlags::NONE, size: data.len() as u64 };
            match out.iter_mut().find(|f| f.name == info.name) {
                Some(existing) => *existing = info,
                None => out.push(info),
            }
        }

        out.retain(|f| filter(f));
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Every file below `path`, recursively, as virtual paths.
    pub fn walk(&self, path: &str) -> Vec<String> {
        let dir = normalize(path);
        let root = self.resolve(&dir);
        let mut out: Vec<String> = walkdir::WalkDir::new(&root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let rel = e.path().strip_prefix(&self.base).ok()?;
                Some(rel.to_string_lossy().replace('\\', "/"))
            })
            .collect();

        let prefix = format!("{dir}/");
        for key in self.buffers.keys() {
            if (dir.is_empty() || key.starts_with(&prefix)) && !out.contains(key) {
                out.push(key.clone());
            }
        }
        out.sort();
        out
    }

    /// Read a whole file.
    pub fn read_all(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let file = File::open(self, path, OpenMode::READ)?;
        let mut buf = vec![0; file.get_length() as usize];
        let n = file.read(0, &mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }
}

// ── File ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
enum Handle {
    #[default]
    Closed,
    Disk(std::fs::File),
    Buffer(Arc<[u8]>),
}

/// An open file, either on disk or one of the filesystem's buffer files.
#[derive(Debug, Default)]
pub struct File {
    handle: Handle,
    path: String,
}

impl File {
    pub fn open(fs: &Filesystem, path: &str, mode: OpenMode) -> Result<Self, FsError> {
        if let Some(data) = fs.buffer_file(path) {
            if mode.contains(OpenMode::WRITE) {
                return Err(FsError::ReadOnly(path.to_string()));
            }
            return Ok(Self { handle: Handle::Buffer(data.clone()), path: path.to_string() });
        }

        let disk = fs.resolve(path);
        let file = std::fs::OpenOptions::new()
            .read(mode.contains(OpenMode::READ))
            .write(mode.contains(OpenMode::WRITE))
            .create(mode.contains(OpenMode::WRITE))
            .open(&disk)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => FsError::NotFound(path.to_string()),
                _ => FsError::Io(e),
            })?;
        Ok(Self { handle: Handle::Disk(file), path: path.to_string() })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.handle, Handle::Closed)
    }

    /// Read up to `buf.len()` bytes from `offset`. Returns the count read,
    /// which is short only at end of file.
    pub fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize, FsError> {
        match &self.handle {
            Handle::Closed => Err(FsError::NotOpen),
            Handle::Buffer(data) => {
                let start = (offset as usize).min(data.len());
                let n = buf.len().min(data.len() - start);
                buf[..n].copy_from_slice(&data[start..start + n]);
                Ok(n)
            }
            Handle::Disk(file) => {
                let mut f = file;
                f.seek(SeekFrom::Start(offset))?;
                let mut total = 0;
                while total < buf.len() {
                    match f.read(&mut buf[total..]) {
                        Ok(0) => break,
                        Ok(n) => total += n,
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                        Err(e) => return Err(e.into()),
                    }
                }
                Ok(total)
            }
        }
    }

    pub fn write(&self, offset: u64, data: &[u8]) -> Result<usize, FsError> {
        match &self.handle {
            Handle::Closed => Err(FsError::NotOpen),
            Handle::Buffer(_) => Err(FsError::ReadOnly(self.path.clone())),
            Handle::Disk(file) => {
                let mut f = file;
                f.seek(SeekFrom::Start(offset))?;
                f.write_all(data)?;
                Ok(data.len())
            }
        }
    }

    pub fn get_length(&self) -> u64 {
        match &self.handle {
            Handle::Closed => 0,
            Handle::Buffer(data) => data.len() as u64,
            Handle::Disk(file) => match file.metadata() {
                Ok(m) => m.len(),
                Err(e) => {
                    warn!("[fs] cannot stat {}: {e}", self.path);
                    0
                }
            },
        }
    }

    /// Direct access to the contents of a buffer file.
    pub fn get_ptr(&self) -> Option<&[u8]> {
        match &self.handle {
            Handle::Buffer(data) => Some(&data[..]),
            _ => None,
        }
    }

    pub fn close(&mut self) {
        self.handle = Handle::Closed;
    }
}
