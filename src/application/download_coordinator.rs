use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use futures::{stream::BoxStream, StreamExt};
use tracing::{debug, info, warn};

use crate::{
    api::ApiClient,
    domain::{AppError, MediaKind, PostMetadata},
    utils::{format_bytes, progress_percent},
};

/// Upper bound for the buffer reserved up front from `Content-Length`.
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub enum DownloadEvent {
    Connected { total: Option<u64> },
    Progress { received: u64, percent: Option<u8> },
    Completed(DownloadedFile),
    Failed(AppError),
}

/// A finished download held in memory until it is written out.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub kind: MediaKind,
    pub bytes: Bytes,
}

/// Decoded thumbnail pixels.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub rgba: Bytes,
}

#[derive(Clone)]
pub struct DownloadCoordinator {
    api_client: ApiClient,
}

impl DownloadCoordinator {
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    pub fn proxy_image_url(&self, thumbnail_url: &str) -> Option<String> {
        self.api_client
            .proxy_image_url(thumbnail_url)
            .ok()
            .map(String::from)
    }

    /// Blank input is rejected before any request goes out.
    pub async fn fetch_metadata(&self, post_url: String) -> Result<PostMetadata, AppError> {
        let post_url = post_url.trim();
        if post_url.is_empty() {
            return Err(AppError::InvalidInput);
        }

        match self.api_client.fetch_metadata(post_url).await {
            Ok(metadata) => {
                info!(title = %metadata.title, "post metadata fetched");
                Ok(metadata)
            }
            Err(e) => {
                warn!(error = %e, post_url, "metadata fetch failed");
                Err(e.into())
            }
        }
    }

    pub async fn load_thumbnail(&self, thumbnail_url: String) -> Result<Thumbnail, AppError> {
        let bytes = self.api_client.fetch_thumbnail(&thumbnail_url).await?;
        decode_thumbnail(&bytes)
    }

    pub fn download_stream(
        &self,
        kind: MediaKind,
        original_url: String,
    ) -> BoxStream<'static, DownloadEvent> {
        Self::run(DownloadRuntimeState::Start {
            client: self.api_client.clone(),
            kind,
            original_url,
        })
    }

    /// Progress tracking over an already opened body stream.
    #[cfg(test)]
    pub fn track(
        kind: MediaKind,
        total: Option<u64>,
        stream: BoxStream<'static, crate::api::Result<Bytes>>,
    ) -> BoxStream<'static, DownloadEvent> {
        Self::run(DownloadRuntimeState::receiving(kind, total, stream))
    }

    fn run(initial: DownloadRuntimeState) -> BoxStream<'static, DownloadEvent> {
        futures::stream::unfold(initial, |state| async move {
            match state {
                DownloadRuntimeState::Start {
                    client,
                    kind,
                    original_url,
                } => match client.download_stream(kind, &original_url).await {
                    Ok((total, stream)) => Some((
                        DownloadEvent::Connected { total },
                        DownloadRuntimeState::receiving(kind, total, stream),
                    )),
                    Err(e) => {
                        warn!(error = %e, %kind, "download request failed");
                        Some((
                            DownloadEvent::Failed(e.into()),
                            DownloadRuntimeState::Finished,
                        ))
                    }
                },
                DownloadRuntimeState::Receiving {
                    kind,
                    mut stream,
                    mut received,
                    total,
                    mut buffer,
                } => match stream.next().await {
                    Some(Ok(chunk)) => {
                        received += chunk.len() as u64;
                        buffer.extend_from_slice(&chunk);

                        Some((
                            DownloadEvent::Progress {
                                received,
                                percent: progress_percent(received, total),
                            },
                            DownloadRuntimeState::Receiving {
                                kind,
                                stream,
                                received,
                                total,
                                buffer,
                            },
                        ))
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, %kind, received, "download stream broke off");
                        Some((
                            DownloadEvent::Failed(e.into()),
                            DownloadRuntimeState::Finished,
                        ))
                    }
                    None => {
                        info!(%kind, size = %format_bytes(received), "download finished");
                        Some((
                            DownloadEvent::Completed(DownloadedFile {
                                kind,
                                bytes: buffer.freeze(),
                            }),
                            DownloadRuntimeState::Finished,
                        ))
                    }
                },
                DownloadRuntimeState::Finished => None,
            }
        })
        .boxed()
    }

    pub async fn choose_save_path(&self, kind: MediaKind) -> Option<PathBuf> {
        rfd::AsyncFileDialog::new()
            .set_file_name(kind.file_name())
            .save_file()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    /// Ask where to put the file and write it there. The buffer is dropped
    /// once written.
    pub async fn save_file(&self, file: DownloadedFile) -> Result<PathBuf, AppError> {
        let path = self
            .choose_save_path(file.kind)
            .await
            .ok_or(AppError::Cancelled)?;
        write_file(&path, file.bytes).await?;
        Ok(path)
    }
}

pub async fn write_file(path: &Path, bytes: Bytes) -> Result<(), AppError> {
    tokio::fs::write(path, &bytes).await.map_err(|e| {
        warn!(error = %e, path = %path.display(), "failed to write download");
        AppError::Io(format!("Failed to write {}: {}", path.display(), e))
    })?;
    info!(path = %path.display(), size = %format_bytes(bytes.len() as u64), "download saved");
    Ok(())
}

pub fn decode_thumbnail(bytes: &[u8]) -> Result<Thumbnail, AppError> {
    let img = image::load_from_memory(bytes).map_err(|e| AppError::Image(e.to_string()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    debug!(width, height, "thumbnail decoded");
    Ok(Thumbnail {
        width,
        height,
        rgba: Bytes::from(rgba.into_raw()),
    })
}

enum DownloadRuntimeState {
    Start {
        client: ApiClient,
        kind: MediaKind,
        original_url: String,
    },
    Receiving {
        kind: MediaKind,
        stream: BoxStream<'static, crate::api::Result<Bytes>>,
        received: u64,
        total: Option<u64>,
        buffer: BytesMut,
    },
    Finished,
}

impl DownloadRuntimeState {
    fn receiving(
        kind: MediaKind,
        total: Option<u64>,
        stream: BoxStream<'static, crate::api::Result<Bytes>>,
    ) -> Self {
        let capacity = total.unwrap_or(0).min(MAX_PREALLOCATION) as usize;
        DownloadRuntimeState::Receiving {
            kind,
            stream,
            received: 0,
            total,
            buffer: BytesMut::with_capacity(capacity),
        }
    }
}
