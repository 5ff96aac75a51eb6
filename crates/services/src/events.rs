//! Outbound notifications for presentation, audio and scene layers.
//!
//! Listeners are held weakly: dropping a listener detaches it, and every
//! dispatch is a no-op when nothing is attached.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use serde::Serialize;

use crate::quiz::{QuizState, QuizView};

//
// ─── EVENTS ────────────────────────────────────────────────────────────────────
//

/// Events the campaign core publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CampaignEvent {
    Unlocked { unit: usize },
    ScoreChanged { score: u32 },
    QuizStateChanged {
        unit: usize,
        state: QuizState,
        view: QuizView,
    },
    UnitCompleted { unit: usize },
    ProgressReset,
    PersistenceFailed { message: String },
}

pub trait CampaignObserver: Send + Sync {
    fn on_event(&self, event: &CampaignEvent);
}

/// Fire-and-forget audio cues.
pub trait Notifier: Send + Sync {
    fn on_correct_answer(&self) {}
    fn on_wrong_answer(&self) {}
    fn on_unlock(&self) {}
    fn on_button_click(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    CorrectAnswer,
    WrongAnswer,
    Unlock,
    ButtonClick,
}

//
// ─── SCENES ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scene {
    MainMenu,
    Overview,
    Leaderboard,
    Unit { index: usize, name: String },
}

impl Scene {
    /// Name handed to the host's scene loader.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Scene::MainMenu => "MainMenu",
            Scene::Overview => "MapScene",
            Scene::Leaderboard => "Leaderboard",
            Scene::Unit { name, .. } => name,
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait SceneLoader: Send + Sync {
    fn load(&self, scene: &Scene);
}

//
// ─── HUB ───────────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct Listeners {
    observers: Vec<Weak<dyn CampaignObserver>>,
    notifier: Option<Weak<dyn Notifier>>,
    scenes: Option<Weak<dyn SceneLoader>>,
}

/// Null-safe dispatcher shared by the services.
#[derive(Clone, Default)]
pub struct EventHub {
    listeners: Arc<RwLock<Listeners>>,
}

impl EventHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: &Arc<dyn CampaignObserver>) {
        let mut guard = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        guard.observers.push(Arc::downgrade(observer));
    }

    pub fn attach_notifier(&self, notifier: &Arc<dyn Notifier>) {
        let mut guard = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        guard.notifier = Some(Arc::downgrade(notifier));
    }

    pub fn attach_scene_loader(&self, loader: &Arc<dyn SceneLoader>) {
        let mut guard = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        guard.scenes = Some(Arc::downgrade(loader));
    }

    pub fn publish(&self, event: &CampaignEvent) {
        let live: Vec<Arc<dyn CampaignObserver>> = {
            let mut guard = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
            guard.observers.retain(|weak| weak.strong_count() > 0);
            guard.observers.iter().filter_map(Weak::upgrade).collect()
        };
        // observers run outside the lock so they may subscribe or publish
        for observer in live {
            observer.on_event(event);
        }
    }

    pub fn cue(&self, cue: Cue) {
        let notifier = {
            let guard = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
            guard.notifier.as_ref().and_then(Weak::upgrade)
        };
        let Some(notifier) = notifier else {
            return;
        };
        match cue {
            Cue::CorrectAnswer => notifier.on_correct_answer(),
            Cue::WrongAnswer => notifier.on_wrong_answer(),
            Cue::Unlock => notifier.on_unlock(),
            Cue::ButtonClick => notifier.on_button_click(),
        }
    }

    pub fn load_scene(&self, scene: &Scene) {
        let loader = {
            let guard = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
            guard.scenes.as_ref().and_then(Weak::upgrade)
        };
        tracing::debug!(scene = %scene, "loading scene");
        if let Some(loader) = loader {
            loader.load(scene);
        }
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("EventHub")
            .field("observers", &guard.observers.len())
            .field("notifier", &guard.notifier.is_some())
            .field("scenes", &guard.scenes.is_some())
            .finish()
    }
}
