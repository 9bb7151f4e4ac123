// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Playback of a [Route]: the exploration trace segment by segment, followed by the path.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::{Coordinates, Route, TraceSegment};

/// Default animation speed multiplier.
pub const DEFAULT_ANIMATION_SPEED: f64 = 0.2;

/// How long a single animation step takes at speed 1.0.
const STEP_AT_UNIT_SPEED: Duration = Duration::from_millis(20);

/// Controls the playback of a [Route].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationOptions {
    /// Multiplier of the delay between consecutive frames;
    /// higher values mean a slower animation.
    pub speed: f64,

    /// Whether to play back the exploration trace, or only show the final path.
    pub visualize: bool,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            speed: DEFAULT_ANIMATION_SPEED,
            visualize: true,
        }
    }
}

impl AnimationOptions {
    /// Delay between consecutive frames.
    pub fn step(&self) -> Duration {
        Duration::try_from_secs_f64(STEP_AT_UNIT_SPEED.as_secs_f64() * self.speed)
            .unwrap_or_default()
    }
}

/// Something to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Frame {
    Trace(TraceSegment),
    Path { path: Vec<Coordinates> },
}

/// A [Frame] with the delay since the start of playback.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledFrame {
    pub at: Duration,
    pub frame: Frame,
}

/// Computes when each part of a [Route] should be drawn.
///
/// Trace segments come one step apart, starting two steps after the start of playback.
/// The path comes together with the last trace segment, or after one step if
/// there's nothing else to draw.
pub fn schedule(route: &Route, options: &AnimationOptions) -> Vec<ScheduledFrame> {
    let step = options.step();
    let mut at = step;
    let mut frames = Vec::default();

    if options.visualize {
        for &segment in &route.trace {
            at += step;
            frames.push(ScheduledFrame {
                at,
                frame: Frame::Trace(segment),
            });
        }
    }

    frames.push(ScheduledFrame {
        at,
        frame: Frame::Path {
            path: route.path.clone(),
        },
    });

    frames
}

/// Plays back [ScheduledFrames](ScheduledFrame) by sending them into a channel.
///
/// All frames are sent by a single timer task, in the order they were given,
/// regardless of the runtime flavor. [Player::cancel], as well as dropping
/// the player, aborts all frames which haven't been sent yet.
#[derive(Debug)]
pub struct Player {
    task: Option<JoinHandle<()>>,
}

impl Player {
    /// Starts playing back frames, which must be sorted by [ScheduledFrame::at].
    /// Must be called from within a Tokio runtime.
    pub fn start(frames: Vec<ScheduledFrame>, sink: mpsc::UnboundedSender<Frame>) -> Self {
        let origin = Instant::now();
        let task = tokio::spawn(async move {
            for f in frames {
                sleep_until(origin + f.at).await;
                if sink.send(f.frame).is_err() {
                    break;
                }
            }
        });

        Self { task: Some(task) }
    }

    /// Checks if all frames were already sent (or aborted).
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Aborts all frames which haven't been sent yet.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                log::debug!("cancelling pending animation frames");
            }
            task.abort();
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> Route {
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(0.0, 0.001);
        let c = Coordinates::new(0.001, 0.0);
        let d = Coordinates::new(0.001, 0.001);
        Route {
            nodes: vec![1, 2, 4],
            path: vec![a, b, d],
            trace: vec![
                TraceSegment { from: a, to: b },
                TraceSegment { from: a, to: c },
                TraceSegment { from: b, to: d },
            ],
            distance: 0.222,
        }
    }

    #[test]
    fn schedule_with_trace() {
        let r = route();
        let frames = schedule(&r, &AnimationOptions::default());

        let times: Vec<Duration> = frames.iter().map(|f| f.at).collect();
        assert_eq!(
            times,
            vec![
                Duration::from_millis(8),
                Duration::from_millis(12),
                Duration::from_millis(16),
                Duration::from_millis(16),
            ]
        );
        assert_eq!(frames[0].frame, Frame::Trace(r.trace[0]));
        assert_eq!(frames[2].frame, Frame::Trace(r.trace[2]));
        assert_eq!(frames[3].frame, Frame::Path { path: r.path.clone() });
    }

    #[test]
    fn schedule_without_trace() {
        let r = route();
        let options = AnimationOptions {
            speed: 1.0,
            visualize: false,
        };
        let frames = schedule(&r, &options);
        assert_eq!(
            frames,
            vec![ScheduledFrame {
                at: Duration::from_millis(20),
                frame: Frame::Path { path: r.path },
            }]
        );
    }

    #[test]
    fn invalid_speed() {
        let options = AnimationOptions {
            speed: -1.0,
            visualize: true,
        };
        assert_eq!(options.step(), Duration::ZERO);

        let options = AnimationOptions {
            speed: f64::NAN,
            visualize: true,
        };
        assert_eq!(options.step(), Duration::ZERO);
    }

    #[test]
    fn frame_serialization() {
        let frame = Frame::Trace(TraceSegment {
            from: Coordinates::new(1.0, 2.0),
            to: Coordinates::new(3.0, 4.0),
        });
        assert_eq!(
            serde_json::to_string(&frame).unwrap(),
            r#"{"kind":"trace","from":{"lat":1.0,"lon":2.0},"to":{"lat":3.0,"lon":4.0}}"#
        );
    }

    #[tokio::test(start_paused = true)]
    async fn play() {
        let r = route();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let player = Player::start(schedule(&r, &AnimationOptions::default()), tx);

        let mut received = Vec::default();
        while let Some(frame) = rx.recv().await {
            received.push(frame);
        }

        assert!(player.is_finished());
        assert_eq!(received.len(), 4);
        assert_eq!(received[0], Frame::Trace(r.trace[0]));
        assert_eq!(received[1], Frame::Trace(r.trace[1]));
        assert!(received.contains(&Frame::Path { path: r.path }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn frames_keep_their_order_on_all_workers() {
        let a = Coordinates::new(0.0, 0.0);
        let route = Route {
            nodes: vec![0, 20],
            path: vec![a, Coordinates::new(0.0, 0.02)],
            trace: (1..=20)
                .map(|i| TraceSegment {
                    from: a,
                    to: Coordinates::new(0.0, i as f64 * 0.001),
                })
                .collect(),
            distance: 2.224,
        };
        let options = AnimationOptions {
            speed: 0.0,
            visualize: true,
        };
        let expected: Vec<Frame> = schedule(&route, &options)
            .into_iter()
            .map(|f| f.frame)
            .collect();

        for _ in 0..100 {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let _player = Player::start(schedule(&route, &options), tx);

            let mut received = Vec::default();
            while let Some(frame) = rx.recv().await {
                received.push(frame);
            }
            assert_eq!(received, expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancel() {
        let r = route();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut player = Player::start(schedule(&r, &AnimationOptions::default()), tx);

        assert_eq!(rx.recv().await, Some(Frame::Trace(r.trace[0])));
        player.cancel();
        assert_eq!(rx.recv().await, None);
    }
}
