use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;
use tokio::sync::broadcast;

use crate::core::audio::AlertSound;
use crate::core::badge::controller::{BadgeController, SharedBadgeController};
use crate::core::badge::font::Typeface;
use crate::core::badge::headless::{load_scene, HeadlessScene, LoadedScene};
use crate::core::config::{ConfigManager, Settings};
use crate::core::dispatcher::AlertDispatcher;
use crate::core::handlers::badge_handlers;
use crate::core::queue::EventQueue;
use crate::core::render::RenderLoop;
use crate::core::source::{SourceConfig, StreamElementsSource};

#[derive(Parser, Debug)]
#[command(version, about = "Plays StreamElements follows and subs as 3D badge alerts")]
struct Cli {
    /// StreamElements JWT; without it the overlay only renders the idle scene
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// Directory holding settings.json
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// Overrides the assets directory from settings.json
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// Enable the alert sound and remember the choice
    #[arg(long, default_value_t = false, conflicts_with = "disable_audio")]
    enable_audio: bool,

    /// Disable the alert sound and remember the choice
    #[arg(long, default_value_t = false)]
    disable_audio: bool,
}

impl Cli {
    /// Audio setting requested on the command line, if any
    fn audio_choice(&self) -> Option<bool> {
        match (self.enable_audio, self.disable_audio) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Applies a command-line audio choice. Returns true when the persisted flag changed.
fn apply_audio_choice(settings: &mut Settings, choice: Option<bool>) -> bool {
    match choice {
        Some(enabled) if enabled != settings.audio_enabled => {
            settings.audio_enabled = enabled;
            true
        }
        _ => false,
    }
}

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };
    runtime.block_on(serve(cli));
}

async fn serve(cli: Cli) {
    let config_manager = ConfigManager::new(cli.config_dir.clone());
    let mut settings = config_manager.load();
    log::info!("Settings loaded from {:?}", config_manager.path());

    if apply_audio_choice(&mut settings, cli.audio_choice()) {
        match config_manager.save(&settings) {
            Ok(()) => log::info!(
                "Audio {}",
                if settings.audio_enabled { "enabled" } else { "disabled" }
            ),
            Err(e) => log::warn!("Failed to persist audio flag: {}", e),
        }
    }
    if let Some(dir) = cli.assets_dir {
        settings.assets_dir = dir;
    }

    let controller = build_controller(&settings).await;
    let sound = settings
        .audio_enabled
        .then(|| AlertSound::new(settings.sound_path(), settings.volume));
    let dispatcher = AlertDispatcher::new(
        EventQueue::new(),
        badge_handlers(&controller, sound),
        settings.alert_timeout(),
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let render = RenderLoop::new(controller.clone(), settings.frame_interval());
    let render_task = tokio::spawn(render.run(shutdown_tx.subscribe()));

    let source_task = match cli.auth_token.filter(|t| !t.trim().is_empty()) {
        Some(token) => match SourceConfig::from_settings(&settings, token) {
            Ok(config) => {
                let source = StreamElementsSource::new(config, dispatcher.clone());
                Some(tokio::spawn(source.run(shutdown_tx.subscribe())))
            }
            Err(e) => {
                log::error!("Realtime source disabled: {}", e);
                None
            }
        },
        None => {
            log::warn!("No auth token given (--auth-token / AUTH_TOKEN); alerts are disabled");
            None
        }
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for ctrl-c: {}", e);
    }
    log::info!("Shutting down...");
    let _ = shutdown_tx.send(());

    let _ = render_task.await;
    if let Some(task) = source_task {
        let _ = task.await;
    }
}

/// Scene and font load concurrently. Either failing degrades the overlay instead of stopping it.
async fn build_controller(settings: &Settings) -> SharedBadgeController {
    let (scene, font) = tokio::join!(
        load_scene(settings.scene_path()),
        Typeface::load(settings.font_path())
    );

    let scene = scene.unwrap_or_else(|e| {
        log::error!("Scene unavailable, badges disabled: {}", e);
        LoadedScene {
            scene: HeadlessScene::new(),
            rigs: HashMap::new(),
        }
    });
    let font = match font {
        Ok(font) => Some(font),
        Err(e) => {
            log::error!("Font unavailable, badges show without names: {}", e);
            None
        }
    };

    BadgeController::new(Box::new(scene.scene), scene.rigs, font).into_shared()
}
