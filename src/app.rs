use std::path::PathBuf;
use std::time::{Duration, Instant};

use futures::StreamExt;
use iced::widget::image;
use iced::{Subscription, Task};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiConfig};
use crate::application::{DownloadCoordinator, DownloadEvent, Thumbnail};
use crate::domain::{AppError, MediaKind, PostMetadata, Session, Timings};
use crate::ui::{DownloadMessage, DownloadView};

/// Key of the toast that follows a download from start to finish.
const DOWNLOAD_TOAST: &str = "dl";
const TOAST_TICK: Duration = Duration::from_millis(100);

pub struct DownloadApp {
    session: Session,
    view: DownloadView,
    coordinator: DownloadCoordinator,
    timings: Timings,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new(ApiConfig::from_env(), Timings::default())
    }
}

impl DownloadApp {
    pub fn new(config: ApiConfig, timings: Timings) -> Self {
        info!(base_url = %config.base_url, "using backend");
        let coordinator = DownloadCoordinator::new(ApiClient::new(config));

        Self {
            session: Session::default(),
            view: DownloadView::new(timings),
            coordinator,
            timings,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    MetadataFetched(Result<PostMetadata, AppError>),
    /// (Thumbnail URL it was requested for, decoded image)
    ThumbnailLoaded(String, Result<Thumbnail, AppError>),
    /// Event of the download with the given id
    Download(u64, DownloadEvent),
    Saved {
        id: u64,
        kind: MediaKind,
        result: Result<PathBuf, AppError>,
    },
    Settled(u64),
    CompletionExpired(u64),
    Tick(Instant),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::UrlChanged(url) => app.session.set_url(url),
                DownloadMessage::FetchPressed => return start_fetch(app),
                DownloadMessage::DownloadPressed(kind) => return start_download(app, kind),
                DownloadMessage::DismissToast(_) => {}
            }
        }
        Message::MetadataFetched(result) => match app.session.finish_fetch(result) {
            Ok(()) => {
                app.view
                    .toasts
                    .success(None, "Post details fetched!", Instant::now());
                app.view.thumbnail = None;

                let thumbnail_url = app
                    .session
                    .metadata()
                    .map(|metadata| metadata.thumbnail_url.clone())
                    .unwrap_or_default();
                if !thumbnail_url.is_empty() {
                    debug!(
                        proxy = ?app.coordinator.proxy_image_url(&thumbnail_url),
                        "loading thumbnail"
                    );
                    let coordinator = app.coordinator.clone();
                    return Task::perform(
                        async move {
                            let result = coordinator.load_thumbnail(thumbnail_url.clone()).await;
                            (thumbnail_url, result)
                        },
                        |(url, result)| Message::ThumbnailLoaded(url, result),
                    );
                }
            }
            Err(e) => {
                app.view.toasts.error(
                    None,
                    format!("Failed to fetch post details: {}", e),
                    Instant::now(),
                );
            }
        },
        Message::ThumbnailLoaded(url, result) => {
            let current = app
                .session
                .metadata()
                .is_some_and(|metadata| metadata.thumbnail_url == url);
            if !current {
                debug!(%url, "dropping stale thumbnail");
                return Task::none();
            }
            match result {
                Ok(thumbnail) => {
                    app.view.thumbnail = Some(image::Handle::from_rgba(
                        thumbnail.width,
                        thumbnail.height,
                        thumbnail.rgba,
                    ));
                }
                Err(e) => warn!(error = %e, %url, "thumbnail unavailable"),
            }
        }
        Message::Download(id, event) => return on_download_event(app, id, event),
        Message::Saved { id, kind, result } => {
            let now = Instant::now();
            return match result {
                Ok(path) => {
                    info!(%kind, path = %path.display(), "download completed");
                    let generation = app.session.complete_download(id);
                    app.view
                        .toasts
                        .success(Some(DOWNLOAD_TOAST), format!("{} downloaded!", kind), now);
                    app.view.celebrate(kind, now);
                    Task::batch([
                        after(app.timings.settle, Message::Settled(id)),
                        after(
                            app.timings.completed_display,
                            Message::CompletionExpired(generation),
                        ),
                    ])
                }
                Err(e) => fail_download(app, id, e),
            };
        }
        Message::Settled(id) => {
            app.session.settle_download(id);
            if app.session.active().is_none() {
                app.view.received = 0;
            }
        }
        Message::CompletionExpired(generation) => app.session.clear_completed(generation),
        Message::Tick(now) => app.view.tick(now, app.session.progress()),
    }
    Task::none()
}

fn start_fetch(app: &mut DownloadApp) -> Task<Message> {
    match app.session.begin_fetch() {
        Ok(Some(url)) => {
            let coordinator = app.coordinator.clone();
            // iced Task::perform runs in the background tokio executor
            Task::perform(
                async move { coordinator.fetch_metadata(url).await },
                Message::MetadataFetched,
            )
        }
        Ok(None) => Task::none(),
        Err(e) => {
            app.view.toasts.error(None, e.to_string(), Instant::now());
            Task::none()
        }
    }
}

fn start_download(app: &mut DownloadApp, kind: MediaKind) -> Task<Message> {
    let Some((id, original_url)) = app.session.begin_download(kind) else {
        return Task::none();
    };

    info!(id, %kind, "download requested");
    app.view.received = 0;
    app.view
        .toasts
        .loading(DOWNLOAD_TOAST, format!("Preparing {}...", kind.lowercase()));

    Task::stream(
        app.coordinator
            .download_stream(kind, original_url)
            .map(move |event| Message::Download(id, event)),
    )
}

fn on_download_event(app: &mut DownloadApp, id: u64, event: DownloadEvent) -> Task<Message> {
    match event {
        DownloadEvent::Connected { total } => {
            debug!(id, ?total, "download connected");
            Task::none()
        }
        DownloadEvent::Progress { received, percent } => {
            app.session.record_progress(id, percent);
            if app.session.active().is_some_and(|active| active.id == id) {
                app.view.received = received;
            }
            Task::none()
        }
        DownloadEvent::Completed(file) => {
            let kind = file.kind;
            let coordinator = app.coordinator.clone();
            Task::perform(
                async move { coordinator.save_file(file).await },
                move |result| Message::Saved { id, kind, result },
            )
        }
        DownloadEvent::Failed(e) => fail_download(app, id, e),
    }
}

fn fail_download(app: &mut DownloadApp, id: u64, error: AppError) -> Task<Message> {
    warn!(id, error = %error, "download failed");
    app.session.fail_download(id);
    if app.session.active().is_none() {
        app.view.received = 0;
    }

    let message = if error == AppError::Cancelled {
        error.to_string()
    } else {
        format!("Download failed: {}", error)
    };
    app.view
        .toasts
        .error(Some(DOWNLOAD_TOAST), message, Instant::now());

    after(app.timings.settle, Message::Settled(id))
}

fn after(delay: Duration, message: Message) -> Task<Message> {
    Task::perform(async move { tokio::time::sleep(delay).await }, move |()| message)
}

pub fn subscription(app: &DownloadApp) -> Subscription<Message> {
    let frames = if app.view.is_animating() || app.session.progress() >= 100 {
        iced::window::frames().map(Message::Tick)
    } else {
        Subscription::none()
    };

    let toasts = if app.view.toasts.is_empty() {
        Subscription::none()
    } else {
        iced::time::every(TOAST_TICK).map(Message::Tick)
    };

    Subscription::batch([frames, toasts])
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view(&app.session).map(Message::UiMessage)
}
