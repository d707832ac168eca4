// Handler table of the overlay: which event kinds get a badge.
//
// follow -> follower badge, subscriber -> subscriber badge. cheer, host, raid and tip have no
// visual and are skipped by the dispatcher.

use std::sync::Arc;

use super::audio::AlertSound;
use super::badge::controller::{lock_controller, BadgeRequest, SharedBadgeController};
use super::badge::scene::BadgeKind;
use super::completion::Completion;
use super::dispatcher::{AlertHandler, HandlerTable};
use super::error::AlertError;
use super::model::{EventKind, NormalizedEvent};

pub struct BadgeAlertHandler {
    kind: BadgeKind,
    controller: SharedBadgeController,
    sound: Option<AlertSound>,
}

impl BadgeAlertHandler {
    pub fn new(kind: BadgeKind, controller: SharedBadgeController, sound: Option<AlertSound>) -> Self {
        Self {
            kind,
            controller,
            sound,
        }
    }
}

impl AlertHandler for BadgeAlertHandler {
    fn handle(&self, event: &NormalizedEvent) -> Result<Completion, AlertError> {
        let display_name = event
            .display_name()
            .ok_or(AlertError::MissingDisplayName(event.kind))?
            .to_string();

        let completion = lock_controller(&self.controller).show(BadgeRequest {
            display_name,
            kind: self.kind,
        })?;

        if let Some(sound) = &self.sound {
            sound.play();
        }
        Ok(completion)
    }

    fn abort(&self) {
        lock_controller(&self.controller).dismiss();
    }
}

/// Badge kind shown for an event kind, if any
pub fn badge_for(kind: EventKind) -> Option<BadgeKind> {
    match kind {
        EventKind::Follow => Some(BadgeKind::Follower),
        EventKind::Subscriber => Some(BadgeKind::Subscriber),
        EventKind::Cheer | EventKind::Host | EventKind::Raid | EventKind::Tip => None,
    }
}

pub fn badge_handlers(controller: &SharedBadgeController, sound: Option<AlertSound>) -> HandlerTable {
    let mut table = HandlerTable::new();
    for kind in EventKind::all() {
        if let Some(badge) = badge_for(*kind) {
            let handler = BadgeAlertHandler::new(badge, Arc::clone(controller), sound.clone());
            table.register(*kind, Arc::new(handler));
        }
    }
    table
}
