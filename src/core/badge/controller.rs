// Badge animation controller - owns the single on-screen badge.
//
// Idle -> Showing on `show`, Showing -> Idle exactly once per episode when the lifetime clip
// finishes, a newer badge replaces it, or the badge is dismissed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::font::Typeface;
use super::placement::place_text;
use super::scene::{AnimationClip, BadgeKind, NodeId, Scene};
use crate::core::completion::{completion_pair, AlertOutcome, Completion, CompletionSignal};
use crate::core::error::AlertError;

/// Managed node and lifetime clip of one badge kind
pub struct BadgeRig {
    pub node: NodeId,
    pub clip: Box<dyn AnimationClip>,
}

impl BadgeRig {
    pub fn new(node: NodeId, clip: Box<dyn AnimationClip>) -> Self {
        Self { node, clip }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeRequest {
    pub display_name: String,
    pub kind: BadgeKind,
}

struct ActiveBadge {
    kind: BadgeKind,
    display_name: String,
    text: Option<NodeId>,
    signal: CompletionSignal,
}

enum BadgeState {
    Idle,
    Showing(ActiveBadge),
}

/// Observable view of the controller state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadgeStatus {
    Idle,
    Showing { kind: BadgeKind, display_name: String },
}

pub type SharedBadgeController = Arc<Mutex<BadgeController>>;

pub struct BadgeController {
    scene: Box<dyn Scene>,
    rigs: HashMap<BadgeKind, BadgeRig>,
    font: Option<Typeface>,
    state: BadgeState,
}

impl BadgeController {
    pub fn new(scene: Box<dyn Scene>, rigs: HashMap<BadgeKind, BadgeRig>, font: Option<Typeface>) -> Self {
        Self {
            scene,
            rigs,
            font,
            state: BadgeState::Idle,
        }
    }

    pub fn into_shared(self) -> SharedBadgeController {
        Arc::new(Mutex::new(self))
    }

    pub fn status(&self) -> BadgeStatus {
        match &self.state {
            BadgeState::Idle => BadgeStatus::Idle,
            BadgeState::Showing(active) => BadgeStatus::Showing {
                kind: active.kind,
                display_name: active.display_name.clone(),
            },
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, BadgeState::Idle)
    }

    /// Name text node of the on-screen badge, if any
    pub fn text_node(&self) -> Option<NodeId> {
        match &self.state {
            BadgeState::Showing(active) => active.text,
            BadgeState::Idle => None,
        }
    }

    pub fn has_badge(&self, kind: BadgeKind) -> bool {
        self.rigs.contains_key(&kind)
    }

    pub fn scene(&self) -> &dyn Scene {
        self.scene.as_ref()
    }

    /// Shows a badge, replacing any badge still on screen.
    ///
    /// The returned completion resolves when this badge leaves the screen.
    pub fn show(&mut self, request: BadgeRequest) -> Result<Completion, AlertError> {
        if !self.is_idle() {
            log::debug!("Replacing on-screen badge with {} for {}", request.kind, request.display_name);
            self.teardown(AlertOutcome::Replaced);
        }

        let rig = self
            .rigs
            .get_mut(&request.kind)
            .ok_or(AlertError::BadgeUnavailable(request.kind))?;
        let badge_size = self
            .scene
            .size_of(rig.node)
            .ok_or_else(|| AlertError::Scene(format!("{} node has no bounds", request.kind)))?;
        let anchor = self.scene.position_of(rig.node).unwrap_or_default();

        let text = match &self.font {
            Some(font) => {
                let text_size = font.measure(&request.display_name);
                let text = self.scene.create_text(&request.display_name, text_size);
                self.scene
                    .set_transform(text, place_text(badge_size, anchor, text_size));
                self.scene.set_material(text, request.kind.material_name());
                self.scene.attach(rig.node, text);
                Some(text)
            }
            None => {
                log::debug!("No font loaded, showing {} badge without name", request.kind);
                None
            }
        };

        self.scene.add_to_scene(rig.node);
        rig.clip.set_time(0.0);
        rig.clip.play_once();

        log::info!("Showing {} badge for {}", request.kind, request.display_name);
        let (signal, completion) = completion_pair();
        self.state = BadgeState::Showing(ActiveBadge {
            kind: request.kind,
            display_name: request.display_name,
            text,
            signal,
        });
        Ok(completion)
    }

    /// Per-frame tick: advances the active clip and ends the episode when it finishes.
    pub fn advance(&mut self, delta: Duration) {
        let BadgeState::Showing(active) = &self.state else {
            return;
        };
        let kind = active.kind;
        let finished = self
            .rigs
            .get_mut(&kind)
            .is_some_and(|rig| rig.clip.update(delta));
        if finished {
            self.on_animation_finished(kind);
        }
    }

    /// The clip's "finished" signal. Only the first one per episode has an effect.
    pub fn on_animation_finished(&mut self, kind: BadgeKind) -> bool {
        match &self.state {
            BadgeState::Showing(active) if active.kind == kind => {
                self.teardown(AlertOutcome::Finished);
                true
            }
            _ => {
                log::trace!("Ignoring finished signal for {} badge", kind);
                false
            }
        }
    }

    /// Forces the on-screen badge away.
    pub fn dismiss(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }
        self.teardown(AlertOutcome::Dismissed);
        true
    }

    fn teardown(&mut self, outcome: AlertOutcome) {
        let BadgeState::Showing(active) = std::mem::replace(&mut self.state, BadgeState::Idle) else {
            return;
        };

        if let Some(text) = active.text {
            self.scene.detach(text);
            self.scene.remove_node(text);
        }
        if let Some(rig) = self.rigs.get_mut(&active.kind) {
            rig.clip.stop();
            rig.clip.set_time(0.0);
            self.scene.remove_from_scene(rig.node);
        }

        log::debug!("{} badge for {} gone ({:?})", active.kind, active.display_name, outcome);
        active.signal.fire(outcome);
    }
}

/// Locks a shared controller, ignoring poisoning.
pub fn lock_controller(controller: &SharedBadgeController) -> MutexGuard<'_, BadgeController> {
    controller.lock().unwrap_or_else(PoisonError::into_inner)
}
