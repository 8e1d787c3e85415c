//! Local scratch file holding materialized object content.
//!
//! The scratch file is private to one proxy. Its layout is the raw object
//! bytes; nothing about it survives the process.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use rusty_objproxy_common::{SCRATCH_FILE_PREFIX, SCRATCH_FILE_SUFFIX};
use tempfile::{NamedTempFile, TempPath};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::task::JoinError;

/// Temporary file with positioned read/write access.
///
/// The backing file is unlinked when the scratch file is discarded or
/// dropped. Creation and [`discard`](Self::discard) run on the blocking
/// pool; the unlink on drop happens inline. Bytes in any gap created by writing past the end or by
/// extending with [`set_len`](Self::set_len) read back as zero.
#[derive(Debug)]
pub(crate) struct ScratchFile {
    /// Open handle. Declared before `path` so it closes before unlinking.
    file: File,
    /// Path of the backing file; removes the file on drop.
    path: TempPath,
}

impl ScratchFile {
    /// Create an empty scratch file.
    ///
    /// # Arguments
    /// * `dir` - Directory to create the file in, or the system temp dir
    pub(crate) async fn create(dir: Option<&Path>) -> io::Result<Self> {
        let dir: Option<PathBuf> = dir.map(Path::to_path_buf);
        let named: NamedTempFile = tokio::task::spawn_blocking(move || {
            let mut builder = tempfile::Builder::new();
            builder.prefix(SCRATCH_FILE_PREFIX).suffix(SCRATCH_FILE_SUFFIX);
            match dir {
                Some(dir) => builder.tempfile_in(dir),
                None => builder.tempfile(),
            }
        })
        .await
        .map_err(join_error)??;
        let (file, path) = named.into_parts();

        Ok(Self {
            file: File::from_std(file),
            path,
        })
    }

    /// Path of the backing file.
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Current content length in bytes.
    pub(crate) async fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata().await?.len())
    }

    /// Read into `buf` starting at `offset`.
    ///
    /// # Returns
    /// Number of bytes read. Less than `buf.len()` only at end of content.
    pub(crate) async fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.file.seek(SeekFrom::Start(offset)).await?;

        let mut filled: usize = 0;
        while filled < buf.len() {
            let n: usize = self.file.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        Ok(filled)
    }

    /// Write all of `buf` starting at `offset`, extending the file if needed.
    ///
    /// # Returns
    /// Number of bytes written (always `buf.len()` on success).
    pub(crate) async fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize> {
        self.file.seek(SeekFrom::Start(offset)).await?;
        self.file.write_all(buf).await?;
        // Wait for the write to land so metadata reflects it.
        self.file.flush().await?;
        Ok(buf.len())
    }

    /// Truncate or zero-extend to exactly `len` bytes.
    pub(crate) async fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.file.set_len(len).await
    }

    /// Replace the content with everything read from `reader`.
    ///
    /// # Returns
    /// Number of bytes copied.
    pub(crate) async fn fill_from<R>(&mut self, reader: &mut R) -> io::Result<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.file.set_len(0).await?;
        self.file.seek(SeekFrom::Start(0)).await?;
        let copied: u64 = tokio::io::copy(reader, &mut self.file).await?;
        self.file.flush().await?;
        Ok(copied)
    }

    /// Rewind and expose the content as a byte stream for upload.
    pub(crate) async fn contents(&mut self) -> io::Result<&mut File> {
        self.file.seek(SeekFrom::Start(0)).await?;
        Ok(&mut self.file)
    }

    /// Close the file and unlink it, reporting unlink failures.
    pub(crate) async fn discard(self) -> io::Result<()> {
        let Self { file, path } = self;
        let file: std::fs::File = file.into_std().await;
        tokio::task::spawn_blocking(move || {
            drop(file);
            path.close()
        })
        .await
        .map_err(join_error)?
    }
}

fn join_error(err: JoinError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}
