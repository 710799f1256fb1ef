//! Staging: getting resource bytes onto disk and back into memory
//!
//! Some font constructors only take a path. Staging gives them one: a file
//! created exclusively in the cache directory, filled from a resource stream,
//! optionally mapped read-only, and removed when the [`TempFile`] guard drops.
//!
//! ## Naming
//!
//! Candidates look like `.font{pid}-{tid}-{n}` with `n` counting up from zero
//! on every call. Two stagers with different (pid, tid) identities never try
//! the same name. The same identity racing itself can still run out of the
//! [`StagingConfig::max_attempts`] names; that call then fails with
//! [`StagingError::TempFileExhausted`] and nothing retries it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use memmap2::Mmap;

use fontstage_core::{
    config::StagingConfig,
    error::StagingError,
    traits::{CacheDirProvider, Resources},
    types::ResourceId,
};

static NEXT_THREAD_ORDINAL: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ORDINAL: u64 = NEXT_THREAD_ORDINAL.fetch_add(1, Ordering::Relaxed);
}

/// Who is staging: baked into every temp-file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StagingIdentity {
    pub pid: u32,
    /// Per-process thread ordinal, stable for the thread's lifetime
    pub tid: u64,
}

impl StagingIdentity {
    /// Identity of the calling thread
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            tid: THREAD_ORDINAL.with(|ordinal| *ordinal),
        }
    }
}

/// Builds the `attempt`-th candidate name for `identity`
pub fn temp_file_name(prefix: &str, identity: StagingIdentity, attempt: u32) -> String {
    format!("{}{}-{}-{}", prefix, identity.pid, identity.tid, attempt)
}

/// A staged file that is deleted when dropped
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => log::trace!("Removed staged file {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Could not remove staged file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Stages resource bytes through temp files
///
/// Holds only configuration; every call is independent and synchronous.
#[derive(Debug, Clone, Default)]
pub struct Stager {
    config: StagingConfig,
    identity: Option<StagingIdentity>,
}

impl Stager {
    pub fn new(config: StagingConfig) -> Self {
        Self {
            config,
            identity: None,
        }
    }

    /// Pins the identity used for naming instead of the calling thread's
    pub fn with_identity(mut self, identity: StagingIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Exclusively creates a fresh temp file in `context`'s cache directory
    ///
    /// # Errors
    /// [`StagingError::TempFileExhausted`] once every candidate name failed,
    /// whether because it exists or because the directory refused the create.
    pub fn acquire_temp_file<C>(&self, context: &C) -> Result<TempFile, StagingError>
    where
        C: CacheDirProvider + ?Sized,
    {
        let dir = context.cache_dir();
        let identity = self.identity.unwrap_or_else(StagingIdentity::current);

        for attempt in 0..self.config.max_attempts {
            let path = dir.join(temp_file_name(&self.config.prefix, identity, attempt));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    log::debug!("Staging into {}", path.display());
                    return Ok(TempFile { path });
                }
                Err(e) => log::trace!("Temp candidate {} rejected: {}", path.display(), e),
            }
        }

        Err(StagingError::TempFileExhausted {
            dir: dir.to_path_buf(),
            attempts: self.config.max_attempts,
        })
    }

    /// Replaces `path`'s contents with everything `source` yields
    ///
    /// Copies in chunks of [`StagingConfig::copy_buffer_size`]. On failure the
    /// file may be left partially written. Returns the number of bytes copied.
    pub fn copy_to_file<R>(&self, path: &Path, source: &mut R) -> Result<u64, StagingError>
    where
        R: Read + ?Sized,
    {
        let io_error = |source: io::Error| {
            log::error!(
                "Error copying resource contents to {}: {}",
                path.display(),
                source
            );
            StagingError::Io {
                path: path.to_path_buf(),
                source,
            }
        };

        let mut out = File::create(path).map_err(io_error)?;
        let result = pump(source, &mut out, self.config.copy_buffer_size);
        close_quietly(out);
        result.map_err(io_error)
    }

    /// Byte-buffer variant of [`copy_to_file`](Self::copy_to_file)
    pub fn copy_buffer_to_file(&self, path: &Path, bytes: &[u8]) -> Result<u64, StagingError> {
        let mut source = bytes;
        self.copy_to_file(path, &mut source)
    }

    /// Copies resource `id` into `path`
    pub fn copy_resource_to_file(
        &self,
        path: &Path,
        resources: &dyn Resources,
        id: ResourceId,
    ) -> Result<u64, StagingError> {
        let mut stream = resources.open_raw(id)?;
        self.copy_to_file(path, &mut stream)
    }

    /// Stages resource `id` and hands back a read-only mapping of it
    ///
    /// The temp file is unlinked before this returns and the mapping keeps the
    /// bytes reachable.
    ///
    /// # Platform limits
    /// Unlinking a mapped file only succeeds where the OS allows it (Unix).
    /// On Windows the delete fails while the mapping is alive, the failure is
    /// logged and the staged file stays in the cache directory. Callers that
    /// need the no-leftover guarantee there should use
    /// [`copy_resource_to_file`](Self::copy_resource_to_file) and read the
    /// bytes instead.
    pub fn copy_resource_to_buffer<C>(
        &self,
        context: &C,
        resources: &dyn Resources,
        id: ResourceId,
    ) -> Result<Mmap, StagingError>
    where
        C: CacheDirProvider + ?Sized,
    {
        let staged = self.acquire_temp_file(context)?;
        self.copy_resource_to_file(staged.path(), resources, id)?;
        map_read_only(staged.path())
    }
}

fn pump<R, W>(source: &mut R, sink: &mut W, chunk: usize) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write,
{
    let mut buffer = vec![0u8; chunk.max(1)];
    let mut total = 0u64;
    loop {
        let read = match source.read(&mut buffer) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        sink.write_all(&buffer[..read])?;
        total += read as u64;
    }
}

/// Maps the whole of `path` read-only
///
/// The mapping is released when the returned [`Mmap`] drops. The caller
/// still owns the file itself.
#[allow(unsafe_code)]
pub fn map_read_only(path: &Path) -> Result<Mmap, StagingError> {
    let map_error = |source: io::Error| StagingError::Map {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(map_error)?;
    let size = file.metadata().map_err(map_error)?.len();
    log::trace!("Mapping {} ({} bytes)", path.display(), size);

    // SAFETY: the file is private to this process' cache directory and is only
    // written before mapping, so the mapped bytes do not change underneath us.
    unsafe { Mmap::map(&file) }.map_err(map_error)
}

/// Flushes and drops a writer, discarding any close-time error
pub fn close_quietly<W: Write>(mut resource: W) {
    if let Err(e) = resource.flush() {
        log::trace!("Ignoring error on close: {}", e);
    }
}

/// [`Stager::acquire_temp_file`] with default configuration
pub fn acquire_temp_file<C>(context: &C) -> Result<TempFile, StagingError>
where
    C: CacheDirProvider + ?Sized,
{
    Stager::default().acquire_temp_file(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;

    use fontstage_core::error::ResourceError;

    struct MapResources(HashMap<ResourceId, Vec<u8>>);

    impl Resources for MapResources {
        fn package_name(&self, id: ResourceId) -> Result<String, ResourceError> {
            if self.0.contains_key(&id) {
                Ok("com.example.fonts".to_string())
            } else {
                Err(ResourceError::NotFound(id))
            }
        }

        fn open_raw(&self, id: ResourceId) -> Result<Box<dyn Read + Send + '_>, ResourceError> {
            let bytes = self.0.get(&id).ok_or(ResourceError::NotFound(id))?;
            Ok(Box::new(bytes.as_slice()))
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    struct FailingFlush;

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::other("flush failed"))
        }
    }

    fn pinned(tid: u64) -> Stager {
        Stager::default().with_identity(StagingIdentity { pid: 42, tid })
    }

    #[test]
    fn test_temp_file_name_layout() {
        let identity = StagingIdentity { pid: 7, tid: 3 };
        assert_eq!(temp_file_name(".font", identity, 0), ".font7-3-0");
        assert_eq!(temp_file_name(".font", identity, 99), ".font7-3-99");
    }

    #[test]
    fn test_acquire_skips_taken_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stager = pinned(1);

        let first = stager.acquire_temp_file(dir.path()).expect("first");
        let second = stager.acquire_temp_file(dir.path()).expect("second");

        assert!(first.path().ends_with(".font42-1-0"));
        assert!(second.path().ends_with(".font42-1-1"));
    }

    #[test]
    fn test_acquire_exhausts_after_max_attempts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stager = Stager::new(StagingConfig {
            max_attempts: 3,
            ..StagingConfig::default()
        })
        .with_identity(StagingIdentity { pid: 42, tid: 1 });

        let _held: Vec<TempFile> = (0..3)
            .map(|_| stager.acquire_temp_file(dir.path()).expect("slot"))
            .collect();

        let err = stager.acquire_temp_file(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            StagingError::TempFileExhausted { attempts: 3, .. }
        ));
    }

    #[test]
    fn test_acquire_in_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("does-not-exist");
        assert!(matches!(
            acquire_temp_file(&missing),
            Err(StagingError::TempFileExhausted { .. })
        ));
    }

    #[test]
    fn test_temp_file_removed_on_drop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let staged = pinned(2).acquire_temp_file(dir.path()).expect("staged");
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn test_copy_uses_small_chunks_and_truncates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("target.bin");
        fs::write(&path, vec![0xAA; 5000]).expect("seed");

        let stager = Stager::new(StagingConfig {
            copy_buffer_size: 7,
            ..StagingConfig::default()
        });
        let payload: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let copied = stager
            .copy_to_file(&path, &mut Cursor::new(payload.clone()))
            .expect("copy");

        assert_eq!(copied, 1000);
        assert_eq!(fs::read(&path).expect("read back"), payload);
    }

    #[test]
    fn test_copy_reports_read_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("target.bin");
        let err = Stager::default()
            .copy_to_file(&path, &mut FailingReader)
            .unwrap_err();
        assert!(matches!(err, StagingError::Io { .. }));
    }

    #[test]
    fn test_copy_resource_missing_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let resources = MapResources(HashMap::new());
        let err = Stager::default()
            .copy_resource_to_file(&dir.path().join("x"), &resources, 0x7f01)
            .unwrap_err();
        assert!(matches!(
            err,
            StagingError::Resource(ResourceError::NotFound(0x7f01))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_resource_to_buffer_leaves_no_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bytes = b"OTTO not really a font".to_vec();
        let resources = MapResources(HashMap::from([(5, bytes.clone())]));

        let mapped = Stager::default()
            .copy_resource_to_buffer(dir.path(), &resources, 5)
            .expect("buffer");

        assert_eq!(&mapped[..], bytes.as_slice());
        assert_eq!(fs::read_dir(dir.path()).expect("list").count(), 0);
    }

    #[test]
    fn test_map_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            map_read_only(&dir.path().join("nope")),
            Err(StagingError::Map { .. })
        ));
    }

    #[test]
    fn test_close_quietly_swallows_flush_error() {
        close_quietly(FailingFlush);
    }

    #[test]
    fn test_current_identity_differs_across_threads() {
        let here = StagingIdentity::current();
        let there = std::thread::spawn(StagingIdentity::current)
            .join()
            .expect("thread");
        assert_eq!(here.pid, there.pid);
        assert_ne!(here.tid, there.tid);
        assert_eq!(here, StagingIdentity::current());
    }
}
