//! Writing a transfer body to disk

use crate::error::VidmuxError;
use crate::transfer::Transfer;
use crate::utils::filename::generate_unique_filename;
use futures::StreamExt;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const PART_SUFFIX: &str = ".part";

/// Final path for a download
///
/// With no output, or an existing directory, the file lands in that directory
/// under `filename`, numbered if the name is taken. Anything else is used as
/// the file path itself.
pub fn resolve_output_path(output: Option<&Path>, filename: &str) -> std::io::Result<PathBuf> {
    let dir = match output {
        Some(path) if !path.is_dir() => return Ok(path.to_path_buf()),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from("."),
    };
    let name = generate_unique_filename(&dir, filename)?;
    Ok(dir.join(name))
}

/// Temporary path the body is written to before the final rename
pub fn part_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}

/// Stream the body into `path`, calling `on_chunk` with each chunk's size
///
/// The body goes to a `.part` file that is renamed on success and removed on
/// failure. Returns the number of bytes written.
pub async fn save_transfer(
    transfer: Transfer,
    path: &Path,
    mut on_chunk: impl FnMut(u64),
) -> Result<u64, VidmuxError> {
    let part = part_path(path);
    let result = write_body(transfer, &part, &mut on_chunk).await;

    match result {
        Ok(written) => {
            tokio::fs::rename(&part, path).await?;
            debug!("Saved {} bytes to {}", written, path.display());
            Ok(written)
        }
        Err(err) => {
            if let Err(e) = tokio::fs::remove_file(&part).await {
                warn!("Failed to remove {}: {}", part.display(), e);
            }
            Err(err)
        }
    }
}

async fn write_body(
    transfer: Transfer,
    part: &Path,
    on_chunk: &mut impl FnMut(u64),
) -> Result<u64, VidmuxError> {
    let mut file = tokio::fs::File::create(part).await?;
    let mut body = transfer.body;
    let mut written = 0u64;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        on_chunk(chunk.len() as u64);
    }

    file.flush().await?;
    Ok(written)
}
