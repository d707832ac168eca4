use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use super::badge::controller::{lock_controller, SharedBadgeController};

/// Measures time between consecutive `interval` calls.
pub struct StopWatch {
    previous: Instant,
}

impl StopWatch {
    pub fn start() -> Self {
        Self {
            previous: Instant::now(),
        }
    }

    pub fn interval(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.previous);
        self.previous = now;
        elapsed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameMetrics {
    pub frame: Duration,
    pub render: Duration,
    pub frames: u64,
}

impl FrameMetrics {
    pub fn fps(&self) -> f32 {
        if self.frame.is_zero() {
            0.0
        } else {
            1.0 / self.frame.as_secs_f32()
        }
    }
}

/// Fixed-rate frame loop advancing badge animation time.
pub struct RenderLoop {
    controller: SharedBadgeController,
    frame_interval: Duration,
    metrics: FrameMetrics,
}

impl RenderLoop {
    pub fn new(controller: SharedBadgeController, frame_interval: Duration) -> Self {
        Self {
            controller,
            frame_interval,
            metrics: FrameMetrics::default(),
        }
    }

    pub fn metrics(&self) -> FrameMetrics {
        self.metrics
    }

    /// One frame: advance animations by `delta`.
    pub fn frame(&mut self, delta: Duration) {
        let started = Instant::now();
        lock_controller(&self.controller).advance(delta);
        self.metrics.frame = delta;
        self.metrics.render = started.elapsed();
        self.metrics.frames += 1;
    }

    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.frame_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut stopwatch = StopWatch::start();
        let frames_per_report = (Duration::from_secs(60).as_secs_f64()
            / self.frame_interval.as_secs_f64().max(f64::EPSILON)) as u64;
        log::info!("Render loop started ({:?} per frame)", self.frame_interval);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    log::info!("Render loop stopped after {} frames", self.metrics.frames);
                    return;
                }
                _ = ticker.tick() => {
                    let delta = stopwatch.interval();
                    self.frame(delta);
                    if frames_per_report > 0 && self.metrics.frames % frames_per_report == 0 {
                        log::debug!(
                            "{:.0} fps, {}us per frame",
                            self.metrics.fps(),
                            self.metrics.render.as_micros()
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::badge::controller::{BadgeController, BadgeRequest};
    use crate::core::badge::headless::{tests::shield_manifest, LoadedScene};
    use crate::core::badge::scene::BadgeKind;
    use crate::core::completion::AlertOutcome;

    fn shared() -> SharedBadgeController {
        let loaded = LoadedScene::from_manifest(&shield_manifest()).unwrap();
        BadgeController::new(Box::new(loaded.scene), loaded.rigs, None).into_shared()
    }

    #[test]
    fn test_frames_drive_badge_to_completion() {
        let controller = shared();
        let mut done = lock_controller(&controller)
            .show(BadgeRequest {
                display_name: "Alice".to_string(),
                kind: BadgeKind::Follower,
            })
            .unwrap();

        let mut render = RenderLoop::new(controller.clone(), Duration::from_millis(33));
        for _ in 0..59 {
            render.frame(Duration::from_millis(33));
        }
        assert_eq!(done.try_outcome(), None);
        render.frame(Duration::from_millis(33));
        render.frame(Duration::from_millis(33));

        assert_eq!(done.try_outcome(), Some(AlertOutcome::Finished));
        assert_eq!(render.metrics().frames, 61);
        assert!((render.metrics().fps() - 30.3).abs() < 0.1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let (tx, rx) = broadcast::channel(1);
        let render = RenderLoop::new(shared(), Duration::from_millis(10));
        let handle = tokio::spawn(render.run(rx));

        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[test]
    fn test_stopwatch_measures_elapsed() {
        let mut watch = StopWatch::start();
        std::thread::sleep(Duration::from_millis(5));
        assert!(watch.interval() >= Duration::from_millis(5));
    }
}
