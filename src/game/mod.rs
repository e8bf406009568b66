//=========================================================================
// Game
//=========================================================================
//
// The card table built on top of `core`: card sprites and animation,
// the rule engine seam, widgets, and the four scenes of the stage.
//
//   cards   ── sprite pool, tweens, hand layout, animation scheduler
//   rules   ── RuleEngine trait + ScriptedRules demo opponent
//   widgets ── menus, colour indicator, gauge, notice ticker
//   scenes  ── Splash, Loading, Title, Gameplay
//
//=========================================================================

pub mod cards;
pub mod rules;
pub mod scenes;
pub mod widgets;

use crate::core::config::StageConfig;
use crate::core::scene::{Scene, SceneKey, SceneManager};

pub use rules::{GameEvent, PlayerDecision, RuleEngine, ScriptedRules, HAND_SIZE};
pub use scenes::{GameplayScene, LoadingScene, SplashScene, TitleScene};
pub use widgets::{ColorIndicator, CommandMenu, MenuCommand, Notice, NoticeTicker, ProgressGauge};

//=== StageKey ============================================================

/// Scenes of the card stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKey {
    Splash,
    Loading,
    Title,
    Gameplay,
}

impl SceneKey for StageKey {}

//=== Registration ========================================================

/// Registers every scene, with Splash as the first one entered.
///
/// `rules` builds a fresh rule engine each time a game starts.
pub fn register_scenes<F>(manager: &mut SceneManager<StageKey>, rules: F)
where
    F: Fn(&StageConfig) -> Box<dyn RuleEngine> + Send + 'static,
{
    manager.register_default(StageKey::Splash, |config: &StageConfig| {
        Box::new(SplashScene::new(config)) as Box<dyn Scene>
    });
    manager.register_scene(StageKey::Loading, |config: &StageConfig| {
        Box::new(LoadingScene::new(config)) as Box<dyn Scene>
    });
    manager.register_scene(StageKey::Title, |config: &StageConfig| {
        Box::new(TitleScene::new(config)) as Box<dyn Scene>
    });
    manager.register_scene(StageKey::Gameplay, move |config: &StageConfig| {
        Box::new(GameplayScene::new(config, rules(config))) as Box<dyn Scene>
    });
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::globals::{GlobalContext, GlobalSystems};
    use crate::core::input::{InputEvent, KeyCode, Modifiers};

    fn stage(autoplay: bool) -> (GlobalSystems<StageKey>, GlobalContext) {
        let mut systems = GlobalSystems::new();
        let context = GlobalContext::headless(StageConfig { splash_frames: 20, ..StageConfig::default() });
        register_scenes(&mut systems.scene_manager, move |config: &StageConfig| {
            Box::new(ScriptedRules::seeded(config.seats, config.rules_seed).with_autoplay(autoplay))
                as Box<dyn RuleEngine>
        });
        (systems, context)
    }

    fn enter(frame: u32) -> Vec<Vec<InputEvent>> {
        let event = match frame % 12 {
            0 => InputEvent::KeyDown { key: KeyCode::Enter, modifiers: Modifiers::NONE },
            1 => InputEvent::KeyUp { key: KeyCode::Enter, modifiers: Modifiers::NONE },
            _ => return Vec::new(),
        };
        vec![vec![event]]
    }

    #[test]
    fn enter_walks_from_splash_to_the_table() {
        let (mut systems, mut context) = stage(false);
        systems.scene_manager.start(&mut context).unwrap();

        let mut visited = vec![StageKey::Splash];
        for frame in 1..3_000 {
            context.frame_events = enter(frame);
            systems.update(&mut context).unwrap();
            let current = systems.scene_manager.current_key();
            if let Some(key) = current.filter(|key| visited.last() != Some(key)) {
                visited.push(key);
            }
            if current == Some(StageKey::Gameplay) && !systems.scene_manager.is_changing() {
                break;
            }
        }

        assert_eq!(visited, [StageKey::Splash, StageKey::Loading, StageKey::Title, StageKey::Gameplay]);
        assert!(context.game_started);
        assert!(!systems.is_finished());
    }

    #[test]
    fn autoplay_table_runs_without_input() {
        let (mut systems, mut context) = stage(true);
        systems.scene_manager.set_initial(StageKey::Gameplay);
        systems.scene_manager.start(&mut context).unwrap();

        for _ in 0..2_000 {
            systems.update(&mut context).unwrap();
        }
        assert_eq!(systems.scene_manager.current_key(), Some(StageKey::Gameplay));
        assert!(systems.scene_manager.current().is_some_and(|scene| scene.base().is_active()));
    }
}
