use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Read-only view of a procfs-shaped directory tree.
///
/// Paths are relative to the registry root, e.g. `"1234/stat"` or `"stat"`.
/// Implementations must tolerate entries disappearing between `list_entries`
/// and a later read; that surfaces as an ordinary `io::Error`.
pub trait ProcSource {
    fn read_to_string(&self, path: &str) -> io::Result<String>;

    /// Every entry name directly under the root, numeric or not.
    fn list_entries(&self) -> io::Result<Vec<String>>;

    /// Human-readable location of the root, used in error messages.
    fn describe(&self) -> String;
}

impl<S: ProcSource + ?Sized> ProcSource for &S {
    fn read_to_string(&self, path: &str) -> io::Result<String> {
        (**self).read_to_string(path)
    }

    fn list_entries(&self) -> io::Result<Vec<String>> {
        (**self).list_entries()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Directory-backed source, normally rooted at `/proc`.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ProcFs { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ProcSource for ProcFs {
    fn read_to_string(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(self.root.join(path))
    }

    fn list_entries(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)?.flatten() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// In-memory source holding file contents keyed by relative path.
///
/// Top-level entries are derived from the first path component of every file,
/// plus any names registered with [`MockProcFs::with_entry`].
#[derive(Debug, Default, Clone)]
pub struct MockProcFs {
    files: HashMap<String, String>,
    extra_entries: BTreeSet<String>,
    unlistable: bool,
}

impl MockProcFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.to_string(), contents.to_string());
        self
    }

    /// Register a top-level entry that has no readable files.
    pub fn with_entry(mut self, name: &str) -> Self {
        self.extra_entries.insert(name.to_string());
        self
    }

    /// Add `<pid>/comm` and `<pid>/stat` for a process with the given ticks.
    pub fn with_process(self, pid: u32, comm: &str, utime: u64, stime: u64) -> Self {
        let stat = format!(
            "{pid} ({comm}) S 1 {pid} {pid} 0 -1 4194304 120 0 0 0 {utime} {stime} 0 0 20 0 1 0 100 1000 50"
        );
        self.with_file(&format!("{pid}/comm"), &format!("{comm}\n"))
            .with_file(&format!("{pid}/stat"), &stat)
    }

    /// Make `list_entries` fail, as an unmounted or unreadable root would.
    pub fn unlistable(mut self) -> Self {
        self.unlistable = true;
        self
    }
}

impl ProcSource for MockProcFs {
    fn read_to_string(&self, path: &str) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such file: {path}"))
        })
    }

    fn list_entries(&self) -> io::Result<Vec<String>> {
        if self.unlistable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "registry root is not listable",
            ));
        }
        let mut names: BTreeSet<String> = self.extra_entries.clone();
        for path in self.files.keys() {
            if let Some((first, _)) = path.split_once('/') {
                names.insert(first.to_string());
            } else {
                names.insert(path.clone());
            }
        }
        Ok(names.into_iter().collect())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}
