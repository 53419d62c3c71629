use super::{AppError, MediaKind, PostMetadata};

/// The download currently shown by the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveDownload {
    pub id: u64,
    pub kind: MediaKind,
    pub progress: u8,
}

/// All state of the window. Every transition goes through one of the methods below.
#[derive(Debug, Default)]
pub struct Session {
    pub url: String,
    metadata: Option<PostMetadata>,
    fetch_in_progress: bool,
    active: Option<ActiveDownload>,
    download_just_completed: bool,
    completed_generation: u64,
    next_download_id: u64,
}

impl Session {
    pub fn metadata(&self) -> Option<&PostMetadata> {
        self.metadata.as_ref()
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch_in_progress
    }

    pub fn active(&self) -> Option<ActiveDownload> {
        self.active
    }

    pub fn active_kind(&self) -> Option<MediaKind> {
        self.active.map(|download| download.kind)
    }

    /// Percentage of the tracked download, 0 when nothing is downloading.
    pub fn progress(&self) -> u8 {
        self.active.map(|download| download.progress).unwrap_or(0)
    }

    pub fn download_just_completed(&self) -> bool {
        self.download_just_completed
    }

    pub fn set_url(&mut self, url: String) {
        self.url = url;
    }

    /// Returns the URL to fetch, `Ok(None)` while a fetch is already running,
    /// or a validation error for blank input.
    pub fn begin_fetch(&mut self) -> Result<Option<String>, AppError> {
        if self.fetch_in_progress {
            return Ok(None);
        }
        let url = self.url.trim().to_string();
        if url.is_empty() {
            return Err(AppError::InvalidInput);
        }
        self.fetch_in_progress = true;
        Ok(Some(url))
    }

    /// Prior metadata survives a failed fetch.
    pub fn finish_fetch(&mut self, result: Result<PostMetadata, AppError>) -> Result<(), AppError> {
        self.fetch_in_progress = false;
        let metadata = result?;
        self.metadata = Some(metadata);
        Ok(())
    }

    pub fn is_download_disabled(&self, kind: MediaKind) -> bool {
        self.active_kind() == Some(kind)
    }

    /// Starts tracking a download and returns its id and the post URL, or `None`
    /// when there is no metadata yet or the same kind is already in flight.
    pub fn begin_download(&mut self, kind: MediaKind) -> Option<(u64, String)> {
        let original_url = self.metadata.as_ref()?.original_url.clone();
        if self.is_download_disabled(kind) {
            return None;
        }

        self.next_download_id += 1;
        let id = self.next_download_id;
        self.active = Some(ActiveDownload {
            id,
            kind,
            progress: 0,
        });
        Some((id, original_url))
    }

    /// `None` means the server did not declare a size; the bar stays where it is.
    pub fn record_progress(&mut self, id: u64, percent: Option<u8>) {
        if let (Some(download), Some(percent)) = (self.tracked_mut(id), percent) {
            download.progress = percent.min(100);
        }
    }

    /// Marks a download as saved and returns the generation to hand to
    /// [`Session::clear_completed`] once the banner has been shown long enough.
    pub fn complete_download(&mut self, id: u64) -> u64 {
        if let Some(download) = self.tracked_mut(id) {
            download.progress = 100;
        }
        self.download_just_completed = true;
        self.completed_generation += 1;
        self.completed_generation
    }

    pub fn fail_download(&mut self, id: u64) {
        if self.tracked_mut(id).is_some() {
            self.active = None;
        }
    }

    pub fn settle_download(&mut self, id: u64) {
        if self.tracked_mut(id).is_some() {
            self.active = None;
        }
    }

    pub fn clear_completed(&mut self, generation: u64) {
        if generation == self.completed_generation {
            self.download_just_completed = false;
        }
    }

    fn tracked_mut(&mut self, id: u64) -> Option<&mut ActiveDownload> {
        self.active.as_mut().filter(|download| download.id == id)
    }
}
