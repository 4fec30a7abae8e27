// ABOUTME: Table export to a JSON backup file
// ABOUTME: Streams every scan page into a pretty-printed JSON array, one page in memory at a time

use crate::dynamo::converter::encode_record;
use crate::error::{MigrationError, StoreError};
use crate::migration::guard::TableHandle;
use crate::migration::outcome::RunOutcome;
use crate::migration::progress::Progress;
use crate::store::{ContinuationToken, Record};
use futures::stream::{self, Stream, TryStreamExt};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

/// Make sure the backup file can be created
///
/// An existing file is an error unless `overwrite` is set, in which case it is
/// deleted. Runs before any store access so a refused backup does no work.
pub async fn prepare_destination(path: &Path, overwrite: bool) -> Result<(), MigrationError> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|source| MigrationError::DestinationNotWritable {
            path: path.to_path_buf(),
            source,
        })?;

    if !exists {
        return Ok(());
    }

    if !overwrite {
        return Err(MigrationError::DestinationExists {
            path: path.to_path_buf(),
        });
    }

    tracing::warn!("Deleting existing backup file {}", path.display());
    tokio::fs::remove_file(path)
        .await
        .map_err(|source| MigrationError::DestinationNotWritable {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes records as the elements of a JSON array
///
/// Layout: `[`, newline, then each record followed by `,` and a newline except
/// the last, which is followed by a newline only, then `]`.
struct ArrayWriter {
    writer: BufWriter<File>,
    written: u64,
}

impl ArrayWriter {
    async fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        let mut writer = BufWriter::new(file);
        writer.write_all(b"[\n").await?;
        Ok(Self { writer, written: 0 })
    }

    async fn push(&mut self, encoded: &str) -> io::Result<()> {
        if self.written > 0 {
            self.writer.write_all(b",\n").await?;
        }
        self.writer.write_all(encoded.as_bytes()).await?;
        self.written += 1;
        Ok(())
    }

    async fn finish(mut self) -> io::Result<u64> {
        if self.written > 0 {
            self.writer.write_all(b"\n").await?;
        }
        self.writer.write_all(b"]").await?;
        self.writer.flush().await?;
        Ok(self.written)
    }

    /// Push buffered bytes to disk so a failed run leaves everything written so far.
    async fn abandon(mut self) {
        if let Err(e) = self.writer.flush().await {
            tracing::warn!("Failed to flush partial backup file: {}", e);
        }
    }
}

/// Every page of a full table scan, following continuation tokens until none is returned.
fn scan_pages<'h>(
    handle: &'h TableHandle<'h>,
) -> impl Stream<Item = Result<Vec<Record>, StoreError>> + 'h {
    let first: Option<Option<ContinuationToken>> = Some(None);
    stream::try_unfold(first, move |state| async move {
        let Some(start) = state else {
            return Ok(None);
        };
        let page = handle.scan_page(start).await?;
        tracing::debug!(
            "Scanned page of {} items (more pages: {})",
            page.items.len(),
            page.next.is_some()
        );
        Ok::<_, StoreError>(Some((page.items, page.next.map(Some))))
    })
}

fn not_writable(path: &Path, source: io::Error) -> MigrationError {
    MigrationError::DestinationNotWritable {
        path: path.to_path_buf(),
        source,
    }
}

/// Export every item of the table to `path`
///
/// The destination is checked (and removed when `overwrite` is set) before the
/// first scan request. On a scan failure the partially written file is left in
/// place and the outcome reports how many records reached it.
pub async fn export(
    handle: TableHandle<'_>,
    path: &Path,
    overwrite: bool,
    progress: &Progress,
) -> RunOutcome {
    if let Err(e) = prepare_destination(path, overwrite).await {
        return RunOutcome::failed(e, 0);
    }

    tracing::info!(
        "Scanning table {} ({} items reported)",
        handle.table_name(),
        handle.item_count()
    );

    let mut output = match ArrayWriter::create(path).await {
        Ok(output) => output,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return RunOutcome::failed(
                MigrationError::DestinationExists {
                    path: PathBuf::from(path),
                },
                0,
            )
        }
        Err(e) => return RunOutcome::failed(not_writable(path, e), 0),
    };

    let pages = scan_pages(&handle);
    futures::pin_mut!(pages);

    loop {
        let items = match pages.try_next().await {
            Ok(Some(items)) => items,
            Ok(None) => break,
            Err(source) => {
                let written = output.written;
                output.abandon().await;
                progress.abandon();
                return RunOutcome::failed(
                    MigrationError::ScanFailed {
                        table: handle.table_name().to_string(),
                        written,
                        source,
                    },
                    written,
                );
            }
        };

        for item in &items {
            let written = output.written;
            let encoded = match encode_record(item) {
                Ok(encoded) => encoded,
                Err(source) => {
                    output.abandon().await;
                    progress.abandon();
                    return RunOutcome::failed(
                        MigrationError::MalformedRecord {
                            index: written as usize,
                            source,
                        },
                        written,
                    );
                }
            };

            if let Err(e) = output.push(&encoded).await {
                output.abandon().await;
                progress.abandon();
                return RunOutcome::failed(not_writable(path, e), written);
            }
            progress.record(output.written);
        }
    }

    let written_before_close = output.written;
    match output.finish().await {
        Ok(written) => {
            progress.finish(written);
            tracing::info!(
                "Finished exporting {} records from table {}",
                written,
                handle.table_name()
            );
            RunOutcome::success(written)
        }
        Err(e) => {
            progress.abandon();
            RunOutcome::failed(not_writable(path, e), written_before_close)
        }
    }
}
