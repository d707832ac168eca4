#[cfg(test)]
mod sim_tests {
    use crate::core::badge::controller::{lock_controller, BadgeController, BadgeStatus, SharedBadgeController};
    use crate::core::badge::font::Typeface;
    use crate::core::badge::headless::load_scene;
    use crate::core::badge::scene::BadgeKind;
    use crate::core::dispatcher::AlertDispatcher;
    use crate::core::handlers::badge_handlers;
    use crate::core::queue::EventQueue;
    use crate::core::render::RenderLoop;
    use crate::core::source::client::Session;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    const SCENE_JSON: &str = r#"{
        "nodes": [
            { "name": "FollowerShield", "size": { "x": 10, "y": 4, "z": 2 }, "material": "Silver" },
            { "name": "SubscriberShield", "size": { "x": 8, "y": 6, "z": 1 }, "material": "Gold" },
            { "name": "Floor", "size": { "x": 50, "y": 0.1, "z": 50 } }
        ],
        "animations": [
            { "name": "FollowerAnimation", "target": "FollowerShield", "duration_seconds": 2.0 },
            { "name": "SubscriberAnimation", "target": "SubscriberShield", "duration_seconds": 3.0 }
        ]
    }"#;

    const FONT_JSON: &str = r#"{
        "familyName": "Sim Sans",
        "resolution": 1000,
        "boundingBox": { "yMin": -200, "yMax": 800 },
        "glyphs": {
            "A": { "ha": 700 }, "l": { "ha": 250 }, "i": { "ha": 250 }, "c": { "ha": 500 },
            "e": { "ha": 550 }, "B": { "ha": 650 }, "o": { "ha": 550 }, "b": { "ha": 550 },
            "?": { "ha": 500 }
        }
    }"#;

    struct Overlay {
        controller: SharedBadgeController,
        dispatcher: AlertDispatcher,
        session: Session,
        render: RenderLoop,
        _dir: tempfile::TempDir,
    }

    impl Overlay {
        async fn start() -> Self {
            let dir = tempdir().unwrap();
            let scene_path = dir.path().join("shields.json");
            fs::write(&scene_path, SCENE_JSON).unwrap();
            let font_path = dir.path().join("font.json");
            fs::write(&font_path, FONT_JSON).unwrap();

            let loaded = load_scene(&scene_path).await.unwrap();
            let font = Typeface::load(&font_path).await.unwrap();
            let controller =
                BadgeController::new(Box::new(loaded.scene), loaded.rigs, Some(font)).into_shared();
            let dispatcher = AlertDispatcher::new(
                EventQueue::new(),
                badge_handlers(&controller, None),
                Some(Duration::from_secs(30)),
            );
            let render = RenderLoop::new(controller.clone(), Duration::from_millis(33));

            let mut session = Session::new("jwt".to_string());
            session
                .on_frame(r#"0{"sid":"x","upgrades":[],"pingInterval":25000,"pingTimeout":5000}"#)
                .unwrap();
            session.on_frame("40").unwrap();
            session.on_frame(r#"42["authenticated",{"channelId":"chan"}]"#).unwrap();

            Self {
                controller,
                dispatcher,
                session,
                render,
                _dir: dir,
            }
        }

        /// What the socket task does with every inbound frame.
        fn receive(&mut self, frame: &str) {
            if let Some(event) = self.session.on_frame(frame).unwrap().event {
                self.dispatcher.queue().push(event);
                self.dispatcher.on_queue_activity();
            }
        }

        async fn play_for(&mut self, seconds: f32) {
            let frames = (seconds / 0.033).ceil() as usize;
            for _ in 0..frames {
                self.render.frame(Duration::from_millis(33));
                settle().await;
            }
        }

        fn status(&self) -> BadgeStatus {
            lock_controller(&self.controller).status()
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn showing(kind: BadgeKind, name: &str) -> BadgeStatus {
        BadgeStatus::Showing {
            kind,
            display_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn simulate_follow_then_subscriber_burst() {
        let mut overlay = Overlay::start().await;

        overlay.receive(r#"42["event:test",{"listener":"follower-latest","event":{"name":"Alice"}}]"#);
        overlay.receive(r#"42["event",{"type":"subscriber","data":{"displayName":"Bob","amount":1}}]"#);
        settle().await;

        assert_eq!(overlay.status(), showing(BadgeKind::Follower, "Alice"));
        assert!(lock_controller(&overlay.controller).text_node().is_some());
        assert_eq!(overlay.dispatcher.queue().len(), 1);

        overlay.play_for(1.0).await;
        assert_eq!(overlay.status(), showing(BadgeKind::Follower, "Alice"));

        overlay.play_for(1.1).await;
        assert_eq!(overlay.status(), showing(BadgeKind::Subscriber, "Bob"));
        assert!(overlay.dispatcher.queue().is_empty());

        overlay.play_for(3.1).await;
        assert_eq!(overlay.status(), BadgeStatus::Idle);
        assert!(lock_controller(&overlay.controller).text_node().is_none());
        assert!(overlay.dispatcher.is_idle());
    }

    #[tokio::test]
    async fn simulate_cheer_then_follow() {
        let mut overlay = Overlay::start().await;

        overlay.receive(r#"42["event",{"type":"cheer","data":{"displayName":"Carol","amount":100}}]"#);
        overlay.receive(r#"42["event",{"type":"follow","data":{"displayName":"Dave"}}]"#);
        settle().await;

        assert_eq!(overlay.status(), showing(BadgeKind::Follower, "Dave"));
        assert!(overlay.dispatcher.queue().is_empty());
    }

    #[tokio::test]
    async fn simulate_dropped_and_control_frames() {
        let mut overlay = Overlay::start().await;

        overlay.receive("2");
        overlay.receive(r#"42["event:test",{"listener":"tip-latest","event":{"name":"Eve"}}]"#);
        overlay.receive(r#"42["event:update",{"name":"follower-session"}]"#);
        settle().await;

        assert_eq!(overlay.status(), BadgeStatus::Idle);
        assert!(overlay.dispatcher.is_idle());
        assert!(overlay.dispatcher.queue().is_empty());
    }

    #[tokio::test]
    async fn simulate_arrivals_while_showing_wait_their_turn() {
        let mut overlay = Overlay::start().await;

        overlay.receive(r#"42["event",{"type":"follow","data":{"displayName":"Alice"}}]"#);
        settle().await;
        overlay.play_for(0.5).await;

        overlay.receive(r#"42["event",{"type":"follow","data":{"displayName":"Bob"}}]"#);
        overlay.receive(r#"42["event",{"type":"follow","data":{"displayName":"Carol"}}]"#);
        settle().await;
        assert_eq!(overlay.status(), showing(BadgeKind::Follower, "Alice"));
        assert_eq!(overlay.dispatcher.queue().len(), 2);

        overlay.play_for(1.6).await;
        assert_eq!(overlay.status(), showing(BadgeKind::Follower, "Bob"));

        overlay.play_for(2.1).await;
        assert_eq!(overlay.status(), showing(BadgeKind::Follower, "Carol"));
    }
}
