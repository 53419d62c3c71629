use std::time::{Duration, Instant};

use iced::widget::canvas;
use iced::{mouse, Color, Point, Rectangle, Size, Theme};

#[derive(Debug)]
pub struct ProgressBar {
    /// 0..=100
    pub progress: f32,
    pub opacity: f32,
    pub tick: f32,
}

impl<Message> canvas::Program<Message> for ProgressBar {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let radius = bounds.height / 2.0;

        let track = canvas::Path::rounded_rectangle(Point::ORIGIN, bounds.size(), radius.into());
        frame.fill(&track, Color::from_rgba(0.22, 0.25, 0.32, self.opacity));

        if self.progress > 0.0 {
            let width = bounds.width * (self.progress.min(100.0) / 100.0);
            let bar = canvas::Path::rounded_rectangle(
                Point::ORIGIN,
                Size::new(width, bounds.height),
                radius.into(),
            );
            // Slow shimmer across the filled part.
            let shift = (self.tick * 2.0).sin() * 0.1;
            let gradient = canvas::gradient::Linear::new(Point::ORIGIN, Point::new(width, 0.0))
                .add_stop(0.0, with_alpha(Color::from_rgb8(0xa8, 0x55, 0xf7), self.opacity))
                .add_stop(
                    (0.5 + shift).clamp(0.1, 0.9),
                    with_alpha(Color::from_rgb8(0xc0, 0x84, 0xfc), self.opacity),
                )
                .add_stop(1.0, with_alpha(Color::from_rgb8(0xf0, 0xab, 0xfc), self.opacity));
            frame.fill(&bar, canvas::Gradient::Linear(gradient));
        }

        vec![frame.into_geometry()]
    }
}

fn with_alpha(color: Color, alpha: f32) -> Color {
    Color { a: alpha, ..color }
}

/// Fades the bar out once it is full.
#[derive(Debug, Default)]
pub struct BarFade {
    full_since: Option<Instant>,
}

impl BarFade {
    pub fn observe(&mut self, progress: u8, now: Instant) {
        if progress >= 100 {
            self.full_since.get_or_insert(now);
        } else {
            self.full_since = None;
        }
    }

    pub fn opacity(&self, now: Instant, fade: Duration) -> f32 {
        match self.full_since {
            None => 1.0,
            Some(_) if fade.is_zero() => 0.0,
            Some(since) => {
                let elapsed = now.saturating_duration_since(since).as_secs_f32();
                (1.0 - elapsed / fade.as_secs_f32()).clamp(0.0, 1.0)
            }
        }
    }

    pub fn is_fading(&self, now: Instant, fade: Duration) -> bool {
        self.full_since
            .map_or(false, |since| now.saturating_duration_since(since) < fade)
    }
}
