use std::fmt;
use std::time::Duration;

/// Metadata returned by the backend for a single post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostMetadata {
    pub title: String,
    pub thumbnail_url: String,
    pub original_url: String,
    pub uploader: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    pub const ALL: [MediaKind; 2] = [MediaKind::Video, MediaKind::Audio];

    pub fn endpoint(self) -> &'static str {
        match self {
            MediaKind::Video => "/api/download_video",
            MediaKind::Audio => "/api/download_audio",
        }
    }

    /// Name offered in the save dialog.
    pub fn file_name(self) -> &'static str {
        match self {
            MediaKind::Video => "instagram_video.mp4",
            MediaKind::Audio => "instagram_audio.mp3",
        }
    }

    pub fn busy_label(self) -> &'static str {
        match self {
            MediaKind::Video => "Downloading...",
            MediaKind::Audio => "Converting...",
        }
    }

    pub fn lowercase(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => write!(f, "Video"),
            MediaKind::Audio => write!(f, "Audio"),
        }
    }
}

/// Presentation timings. None of these are protocol requirements.
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    /// How long the finished progress bar stays visible before the download is cleared.
    pub settle: Duration,
    pub completed_display: Duration,
    pub confetti: Duration,
    pub toast: Duration,
    pub bar_fade: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(1),
            completed_display: Duration::from_secs(3),
            confetti: Duration::from_secs(2),
            toast: Duration::from_secs(4),
            bar_fade: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_files() {
        assert_eq!(MediaKind::Video.file_name(), "instagram_video.mp4");
        assert_eq!(MediaKind::Audio.file_name(), "instagram_audio.mp3");
        assert_eq!(MediaKind::Video.endpoint(), "/api/download_video");
        assert_eq!(MediaKind::Audio.endpoint(), "/api/download_audio");
    }

    #[test]
    fn test_media_kind_display() {
        assert_eq!(format!("{}", MediaKind::Video), "Video");
        assert_eq!(format!("{}", MediaKind::Audio), "Audio");
        assert_eq!(MediaKind::Audio.lowercase(), "audio");
    }
}
