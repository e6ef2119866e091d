use crate::api::error::AppError;
use crate::models::StoredFile;
use crate::utils::validation::{validate_file_size, verify_magic_bytes};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

/// Prefix of in-flight part files inside the upload directory
pub const STAGING_PREFIX: &str = ".staging-";

/// Bytes peeked from each part for content sniffing
const HEADER_LEN: usize = 1024;

const CHUNK_SIZE: usize = 64 * 1024;

/// A part that has been fully received but not yet given its final name.
/// Dropping it removes the staging file.
#[derive(Debug)]
pub struct StagedPhoto {
    temp_path: TempPath,
    size: u64,
}

impl StagedPhoto {
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn staging_path(&self) -> &Path {
        &self.temp_path
    }
}

/// Local-disk photo store. Parts are streamed into staging files in the upload
/// directory and only renamed to their generated names on commit, so a rejected
/// request leaves nothing behind.
#[derive(Debug, Clone)]
pub struct PhotoStorage {
    dir: PathBuf,
    max_file_size: usize,
    verify_magic_bytes: bool,
}

impl PhotoStorage {
    /// Creates the upload directory (recursively) and resolves it to an absolute path
    pub async fn open(
        dir: impl AsRef<Path>,
        max_file_size: usize,
        verify_magic_bytes: bool,
    ) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(dir.as_ref()).await?;
        let dir = tokio::fs::canonicalize(dir.as_ref()).await?;
        Ok(Self {
            dir,
            max_file_size,
            verify_magic_bytes,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Streams one part into a staging file, enforcing the per-file size limit
    /// and, when enabled, the content sniffing check.
    pub async fn stage(
        &self,
        mut reader: impl AsyncRead + Unpin + Send,
    ) -> Result<StagedPhoto, AppError> {
        // 1. Peek into stream for magic bytes
        let mut header = Vec::with_capacity(HEADER_LEN);
        (&mut reader)
            .take(HEADER_LEN as u64)
            .read_to_end(&mut header)
            .await?;

        if self.verify_magic_bytes {
            verify_magic_bytes(&header)?;
        }

        // 2. Open the staging file; it is unlinked again if anything below fails
        let dir = self.dir.clone();
        let named = tokio::task::spawn_blocking(move || {
            let mut builder = tempfile::Builder::new();
            builder.prefix(STAGING_PREFIX);
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                builder.permissions(std::fs::Permissions::from_mode(0o644));
            }
            builder.tempfile_in(dir)
        })
        .await
        .map_err(anyhow::Error::from)??;

        let (file, temp_path) = named.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        // 3. Copy header + rest of the stream, counting bytes as they arrive
        let mut reader = Cursor::new(header).chain(reader);
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut size = 0usize;
        loop {
            let n = reader.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            size += n;
            validate_file_size(size, self.max_file_size)?;
            file.write_all(&buffer[..n]).await?;
        }
        file.flush().await?;
        drop(file);

        Ok(StagedPhoto {
            temp_path,
            size: size as u64,
        })
    }

    /// Gives a staged part its final name. An existing file of the same name is replaced.
    pub async fn commit(&self, staged: StagedPhoto, saved_as: &str) -> Result<StoredFile, AppError> {
        let path = self.dir.join(saved_as);
        let size = staged.size;
        let dest = path.clone();

        tokio::task::spawn_blocking(move || staged.temp_path.persist(dest))
            .await
            .map_err(anyhow::Error::from)?
            .map_err(|e| e.error)?;

        Ok(StoredFile {
            saved_as: saved_as.to_string(),
            path,
            size,
        })
    }

    /// Removes staging files left behind by a previous process. Returns how many were removed.
    pub async fn sweep_staging(&self) -> std::io::Result<usize> {
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let is_staging = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(STAGING_PREFIX));
            if is_staging && entry.file_type().await?.is_file() {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
