//=========================================================================
// Title Scene
//=========================================================================

use log::info;

use crate::core::config::StageConfig;
use crate::core::error::StageResult;
use crate::core::globals::GlobalContext;
use crate::core::scene::{Scene, SceneBase, SceneRequest};
use crate::game::widgets::{CommandMenu, MenuCommand};
use crate::game::StageKey;

const MENU: &str = "title";

/// New Game / Exit. Starts only once the preload has finished.
pub struct TitleScene {
    base: SceneBase,
    leaving: bool,
}

impl TitleScene {
    pub fn new(config: &StageConfig) -> Self {
        Self { base: SceneBase::new("title", config.input_cooldown_frames), leaving: false }
    }
}

impl Scene for TitleScene {
    fn base(&self) -> &SceneBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut SceneBase {
        &mut self.base
    }

    fn is_ready(&mut self, context: &mut GlobalContext) -> bool {
        context.renderer.poll_preload().is_complete()
    }

    fn start(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base.start(context)?;
        let menu = CommandMenu::new(MENU, &[("New Game", "new_game"), ("Exit", "exit")]);
        self.base.add_widget(Box::new(menu), false, context)?;
        self.base.start_fade_in(context.config.fade_frames, context);
        Ok(())
    }

    fn update(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base.update(context);
        let commands = context.bus.drain::<MenuCommand>();
        if !self.base.is_active() || self.leaving {
            return Ok(());
        }

        for command in commands.into_iter().filter(|c| c.menu == MENU) {
            match command.symbol {
                "new_game" => {
                    info!(target: "stage", "title: new game");
                    self.base.fade_out_all(context);
                    context.game_started = true;
                    context.bus.post(SceneRequest::Goto(StageKey::Gameplay));
                }
                "exit" => context.bus.post(SceneRequest::<StageKey>::Exit),
                _ => continue,
            }
            self.leaving = true;
            break;
        }
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
