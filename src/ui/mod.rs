pub mod confetti;
pub mod progress;
pub mod toast;

use std::time::Instant;

use iced::{
    border,
    widget::{button, canvas, column, container, image, row, stack, text, text_input, Space},
    Alignment, Color, Element, Length,
};

use crate::domain::{MediaKind, Session, Timings};
use crate::utils::format_bytes;
use confetti::Confetti;
use progress::{BarFade, ProgressBar};
use toast::ToastManager;

const BACKGROUND: Color = Color {
    r: 0.19,
    g: 0.18,
    b: 0.51,
    a: 1.0,
};
const CARD: Color = Color {
    r: 1.0,
    g: 1.0,
    b: 1.0,
    a: 0.08,
};
const ACCENT: Color = Color {
    r: 0.66,
    g: 0.33,
    b: 0.97,
    a: 1.0,
};

/// Everything on screen that is not part of the session itself.
pub struct DownloadView {
    pub thumbnail: Option<image::Handle>,
    pub toasts: ToastManager,
    pub confetti: Option<Confetti>,
    pub bar_fade: BarFade,
    /// Bytes of the tracked download, shown when no size is known.
    pub received: u64,
    timings: Timings,
    started: Instant,
    now: Instant,
}

impl DownloadView {
    pub fn new(timings: Timings) -> Self {
        let now = Instant::now();
        Self {
            thumbnail: None,
            toasts: ToastManager::new(timings.toast),
            confetti: None,
            bar_fade: BarFade::default(),
            received: 0,
            timings,
            started: now,
            now,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    FetchPressed,
    DownloadPressed(MediaKind),
    DismissToast(usize),
}

/// Message a download button sends, `None` while it is disabled.
pub fn download_action(session: &Session, kind: MediaKind) -> Option<DownloadMessage> {
    (!session.is_download_disabled(kind)).then_some(DownloadMessage::DownloadPressed(kind))
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        if let DownloadMessage::DismissToast(index) = message {
            self.toasts.dismiss(index);
        }
        // The rest is handled by the app
    }

    pub fn tick(&mut self, now: Instant, progress: u8) {
        self.now = now;
        self.toasts.tick(now);
        self.bar_fade.observe(progress, now);
        if let Some(confetti) = &mut self.confetti {
            confetti.advance(now);
            if confetti.is_finished() {
                self.confetti = None;
            }
        }
    }

    pub fn celebrate(&mut self, kind: MediaKind, now: Instant) {
        self.confetti = Some(Confetti::burst(kind, self.timings.confetti, now));
    }

    /// Whether something on screen is moving and needs frame ticks.
    pub fn is_animating(&self) -> bool {
        self.confetti.is_some() || self.bar_fade.is_fading(self.now, self.timings.bar_fade)
    }

    pub fn view<'a>(&'a self, session: &'a Session) -> Element<'a, DownloadMessage> {
        let fetch_label = if session.is_fetching() {
            "Fetching..."
        } else {
            "Fetch"
        };
        let input_row = row![
            text_input("Paste Instagram post URL...", &session.url)
                .on_input(DownloadMessage::UrlChanged)
                .on_submit(DownloadMessage::FetchPressed)
                .padding(12),
            button(text(fetch_label))
                .on_press_maybe((!session.is_fetching()).then_some(DownloadMessage::FetchPressed))
                .padding([12, 20]),
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        let mut card = column![
            text("Instagram Downloader").size(32).color(ACCENT),
            Space::new().height(Length::Fixed(10.0)),
            input_row,
        ]
        .spacing(12)
        .align_x(Alignment::Center);

        if let Some(preview) = self.preview(session) {
            card = card.push(preview);
        }

        let content = container(
            container(card.padding(24).max_width(560.0))
                .style(|_| container::Style {
                    background: Some(CARD.into()),
                    border: border::rounded(24),
                    ..Default::default()
                }),
        )
        .center(Length::Fill)
        .padding(16)
        .style(|_| container::Style {
            background: Some(BACKGROUND.into()),
            text_color: Some(Color::WHITE),
            ..Default::default()
        });

        let mut layers = stack![content, self.toast_column()];
        if let Some(confetti) = &self.confetti {
            layers = layers.push(canvas(confetti).width(Length::Fill).height(Length::Fill));
        }
        layers.into()
    }

    fn preview<'a>(&'a self, session: &'a Session) -> Option<Element<'a, DownloadMessage>> {
        let metadata = session.metadata()?;

        let mut preview = column![].spacing(10).align_x(Alignment::Center);
        match &self.thumbnail {
            Some(handle) => {
                preview = preview.push(image(handle.clone()).width(Length::Fixed(288.0)));
            }
            None if !metadata.thumbnail_url.is_empty() => {
                preview = preview.push(text("Loading thumbnail...").size(14));
            }
            None => {}
        }

        preview = preview.push(text(&metadata.title).size(18).color(Color::from_rgb8(0xa5, 0xb4, 0xfc)));
        if let Some(uploader) = &metadata.uploader {
            preview = preview.push(text(format!("by {}", uploader)).size(14));
        }

        let buttons = row(MediaKind::ALL.into_iter().map(|kind| {
            let label = if session.is_download_disabled(kind) {
                kind.busy_label().to_string()
            } else {
                format!("Download {}", kind)
            };
            button(text(label))
                .on_press_maybe(download_action(session, kind))
                .padding([12, 20])
                .into()
        }))
        .spacing(12);
        preview = preview.push(buttons);

        if let Some(active) = session.active() {
            if active.progress > 0 {
                let bar = ProgressBar {
                    progress: f32::from(active.progress),
                    opacity: self.bar_fade.opacity(self.now, self.timings.bar_fade),
                    tick: self.now.saturating_duration_since(self.started).as_secs_f32(),
                };
                preview = preview.push(canvas(bar).width(Length::Fill).height(Length::Fixed(12.0)));
            } else if self.received > 0 {
                preview = preview.push(text(format!("Received {}", format_bytes(self.received))).size(14));
            }
        }

        if session.download_just_completed() {
            preview = preview.push(
                text("✅ Download Completed!").color(Color::from_rgb8(0x4a, 0xde, 0x80)),
            );
        }

        Some(preview.into())
    }

    fn toast_column(&self) -> Element<'_, DownloadMessage> {
        let toasts = column(self.toasts.iter().enumerate().map(|(index, toast)| {
            let color = toast.severity.color();
            button(
                row![text(toast.severity.icon()).color(color), text(&toast.message)]
                    .spacing(8)
                    .align_y(Alignment::Center),
            )
            .on_press(DownloadMessage::DismissToast(index))
            .padding([8, 14])
            .style(move |_, _| button::Style {
                background: Some(Color::from_rgb8(0x1f, 0x29, 0x37).into()),
                text_color: Color::WHITE,
                border: border::rounded(10).color(color).width(1.0),
                ..Default::default()
            })
            .into()
        }))
        .spacing(8)
        .align_x(Alignment::End);

        container(toasts)
            .width(Length::Fill)
            .align_right(Length::Fill)
            .padding(16)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostMetadata;

    fn ready_session() -> Session {
        let mut session = Session::default();
        session.set_url("https://instagram.com/p/ABC".to_string());
        session.begin_fetch().unwrap();
        session
            .finish_fetch(Ok(PostMetadata {
                title: "Sample".to_string(),
                thumbnail_url: "https://x/y.jpg".to_string(),
                original_url: "https://instagram.com/p/ABC".to_string(),
                uploader: None,
            }))
            .unwrap();
        session
    }

    #[test]
    fn test_button_disabled_only_for_active_kind() {
        let mut session = ready_session();
        session.begin_download(MediaKind::Audio).unwrap();

        for kind in MediaKind::ALL {
            assert_eq!(
                download_action(&session, kind).is_none(),
                session.active_kind() == Some(kind)
            );
        }
    }

    #[test]
    fn test_tick_clears_finished_confetti() {
        let mut view = DownloadView::new(Timings::default());
        let now = Instant::now();
        view.celebrate(MediaKind::Video, now);
        assert!(view.is_animating());

        view.tick(now + Timings::default().confetti, 0);
        assert!(view.confetti.is_none());
        assert!(!view.is_animating());
    }

    #[test]
    fn test_dismiss_toast_message() {
        let mut view = DownloadView::new(Timings::default());
        view.toasts.error(None, "Download failed", Instant::now());
        view.update(DownloadMessage::DismissToast(0));
        assert!(view.toasts.is_empty());
    }
}
