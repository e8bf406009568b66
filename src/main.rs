//=========================================================================
// Card Stage: demo binary
//=========================================================================
//
// Usage:
//   card_stage [config.toml] [--headless]
//
// Without `--headless` a window opens and the stage starts at the splash
// screen. With it, the table runs an automated game with no window for a
// fixed number of ticks.
//
//=========================================================================

use log::{error, info};

use card_stage::core::config::StageConfig;
use card_stage::game::{self, NoticeTicker, RuleEngine, ScriptedRules, StageKey};
use card_stage::EngineBuilder;

/// Tick limit for headless runs (ten minutes at 60 TPS).
const HEADLESS_FRAMES: u64 = 36_000;

/// Frames a notice stays on screen.
const NOTICE_FRAMES: u32 = 120;

fn main() {
    env_logger::init();

    let mut headless = false;
    let mut config_path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--headless" => headless = true,
            _ => config_path = Some(arg),
        }
    }

    let config = match config_path {
        Some(path) => StageConfig::load_from_file(&path).unwrap_or_else(|err| {
            error!("Could not load config '{}': {}. Using defaults.", path, err);
            StageConfig::default()
        }),
        None => StageConfig::default(),
    };

    let engine = EngineBuilder::<StageKey>::new()
        .with_config(config)
        .with_title("Card Stage")
        .build()
        .init(move |systems, context| {
            game::register_scenes(&mut systems.scene_manager, move |config: &StageConfig| {
                Box::new(ScriptedRules::seeded(config.seats, config.rules_seed).with_autoplay(headless))
                    as Box<dyn RuleEngine>
            });
            if headless {
                systems.scene_manager.set_initial(StageKey::Gameplay);
            }
            context.persistent.register(Box::new(NoticeTicker::new(NOTICE_FRAMES)), context.renderer.as_mut());
        });

    if headless {
        let frames = engine.run_headless(HEADLESS_FRAMES);
        info!("Headless run finished after {} frames", frames);
    } else {
        engine.run();
    }
}
