use std::f32::consts::PI;
use std::time::{Duration, Instant};

use iced::widget::canvas;
use iced::{mouse, Color, Point, Rectangle, Size, Theme, Vector};
use rand::Rng;

use crate::domain::MediaKind;

const PARTICLE_COUNT: usize = 150;
/// Cone width around straight up, in degrees.
const SPREAD: f32 = 100.0;
const ORIGIN: (f32, f32) = (0.5, 0.6);
/// In heights per second squared.
const GRAVITY: f32 = 1.6;
const DRAG: f32 = 1.2;

pub fn palette(kind: MediaKind) -> [Color; 3] {
    match kind {
        MediaKind::Video => [
            Color::from_rgb8(0x22, 0xc5, 0x5e),
            Color::from_rgb8(0x4a, 0xde, 0x80),
            Color::from_rgb8(0x86, 0xef, 0xac),
        ],
        MediaKind::Audio => [
            Color::from_rgb8(0x3b, 0x82, 0xf6),
            Color::from_rgb8(0x60, 0xa5, 0xfa),
            Color::from_rgb8(0x93, 0xc5, 0xfd),
        ],
    }
}

#[derive(Debug, Clone)]
struct Particle {
    velocity: Vector,
    color: Color,
    size: f32,
    spin: f32,
}

/// One celebratory burst. Positions are a closed form of the elapsed time so
/// drawing never mutates anything.
#[derive(Debug, Clone)]
pub struct Confetti {
    particles: Vec<Particle>,
    started: Instant,
    duration: Duration,
    elapsed: f32,
}

impl Confetti {
    pub fn burst(kind: MediaKind, duration: Duration, now: Instant) -> Self {
        Self::with_rng(kind, duration, now, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng>(kind: MediaKind, duration: Duration, now: Instant, rng: &mut R) -> Self {
        let colors = palette(kind);
        let half_spread = SPREAD / 2.0;
        let particles = (0..PARTICLE_COUNT)
            .map(|_| {
                let angle = (90.0 + rng.gen_range(-half_spread..=half_spread)) * PI / 180.0;
                let speed = rng.gen_range(0.6..1.3);
                Particle {
                    velocity: Vector::new(angle.cos() * speed, -angle.sin() * speed),
                    color: colors[rng.gen_range(0..colors.len())],
                    size: rng.gen_range(4.0..9.0),
                    spin: rng.gen_range(2.0..8.0),
                }
            })
            .collect();

        Self {
            particles,
            started: now,
            duration,
            elapsed: 0.0,
        }
    }

    pub fn advance(&mut self, now: Instant) {
        self.elapsed = now.saturating_duration_since(self.started).as_secs_f32();
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration.as_secs_f32()
    }

    #[cfg(test)]
    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        self.particles.iter().map(|particle| particle.color)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    fn opacity(&self) -> f32 {
        let total = self.duration.as_secs_f32();
        if total <= 0.0 {
            return 0.0;
        }
        (1.0 - self.elapsed / total).clamp(0.0, 1.0)
    }

    /// Position in unit coordinates (0..1 of the canvas) at the current time.
    fn position(&self, particle: &Particle) -> Point {
        let t = self.elapsed;
        // Integrated velocity under linear drag.
        let travelled = (1.0 - (-DRAG * t).exp()) / DRAG;
        Point::new(
            ORIGIN.0 + particle.velocity.x * travelled,
            ORIGIN.1 + particle.velocity.y * travelled + 0.5 * GRAVITY * t * t,
        )
    }
}

impl<Message> canvas::Program<Message> for Confetti {
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
        if self.is_finished() {
            return vec![frame.into_geometry()];
        }

        let alpha = self.opacity();
        for particle in &self.particles {
            let unit = self.position(particle);
            let center = Point::new(unit.x * bounds.width, unit.y * bounds.height);
            if center.y > bounds.height + particle.size {
                continue;
            }

            frame.with_save(|frame| {
                frame.translate(Vector::new(center.x, center.y));
                frame.rotate(particle.spin * self.elapsed);
                let piece = canvas::Path::rectangle(
                    Point::new(-particle.size / 2.0, -particle.size / 4.0),
                    Size::new(particle.size, particle.size / 2.0),
                );
                frame.fill(&piece, Color { a: alpha, ..particle.color });
            });
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn burst(kind: MediaKind) -> (Confetti, Instant) {
        let now = Instant::now();
        let mut rng = StdRng::seed_from_u64(7);
        (
            Confetti::with_rng(kind, Duration::from_secs(2), now, &mut rng),
            now,
        )
    }

    #[test]
    fn test_video_burst_is_green() {
        let (confetti, _) = burst(MediaKind::Video);
        let greens = palette(MediaKind::Video);
        assert_eq!(confetti.len(), PARTICLE_COUNT);
        assert!(confetti.colors().all(|color| greens.contains(&color)));
    }

    #[test]
    fn test_audio_burst_is_blue() {
        let (confetti, _) = burst(MediaKind::Audio);
        let blues = palette(MediaKind::Audio);
        assert!(confetti.colors().all(|color| blues.contains(&color)));
        assert!(confetti.colors().all(|color| color.b > color.g && color.b > color.r));
    }

    #[test]
    fn test_burst_finishes_after_duration() {
        let (mut confetti, start) = burst(MediaKind::Video);
        confetti.advance(start + Duration::from_millis(1500));
        assert!(!confetti.is_finished());
        assert!(confetti.opacity() > 0.0);

        confetti.advance(start + Duration::from_secs(2));
        assert!(confetti.is_finished());
        assert_eq!(confetti.opacity(), 0.0);
    }

    #[test]
    fn test_particles_start_at_origin_and_rise() {
        let (mut confetti, start) = burst(MediaKind::Audio);
        let first = confetti.particles[0].clone();
        assert_eq!(confetti.position(&first), Point::new(ORIGIN.0, ORIGIN.1));

        confetti.advance(start + Duration::from_millis(100));
        assert!(confetti.position(&first).y < ORIGIN.1);
    }
}
