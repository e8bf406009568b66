//=========================================================================
// Gameplay Scene
//=========================================================================
//
// The card table. Rule events are pulled one at a time and handed to
// the animation scheduler; the next event is only pulled once the table
// has stopped moving.
//
//   RuleEngine ──GameEvent──► GameplayScene ──► AnimationScheduler
//        ▲                         │
//        └──── PlayerDecision ─────┘  (seat 0, on UserTurn)
//
// Tab raises the pause menu as a modal overlay. While it is up the table
// is frozen and no rule events are pulled.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use crate::core::config::StageConfig;
use crate::core::error::StageResult;
use crate::core::globals::GlobalContext;
use crate::core::input::InputKey;
use crate::core::render::{Layer, Pose, VisualId};
use crate::core::scene::{Scene, SceneBase, SceneRequest, Widget, WidgetId};
use crate::game::cards::{AnimationScheduler, CardColor, CardId};
use crate::game::rules::{GameEvent, PlayerDecision, RuleEngine};
use crate::game::widgets::{ColorIndicator, CommandMenu, MenuCommand, Notice};
use crate::game::StageKey;

const PAUSE_MENU: &str = "pause";

/// Sound played when the chosen card cannot be played.
const BUZZER: &str = "buzzer";

//=== GameplayScene =======================================================

pub struct GameplayScene {
    base: SceneBase,
    rules: Box<dyn RuleEngine>,
    scheduler: Option<AnimationScheduler>,
    table: Vec<VisualId>,
    indicator: Option<WidgetId>,
    pause: Option<WidgetId>,
    /// Legal plays while seat 0 is deciding.
    deciding: Option<Vec<CardId>>,
    cursor: usize,
    winner: Option<usize>,
    leaving: bool,
}

impl GameplayScene {
    pub fn new(config: &StageConfig, rules: Box<dyn RuleEngine>) -> Self {
        Self {
            base: SceneBase::new("gameplay", config.input_cooldown_frames),
            rules,
            scheduler: None,
            table: Vec::new(),
            indicator: None,
            pause: None,
            deciding: None,
            cursor: 0,
            winner: None,
            leaving: false,
        }
    }

    //--- Queries ----------------------------------------------------------

    pub fn scheduler(&self) -> Option<&AnimationScheduler> {
        self.scheduler.as_ref()
    }

    pub fn is_deciding(&self) -> bool {
        self.deciding.is_some()
    }

    /// Hand position of the lifted card while deciding.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn winner(&self) -> Option<usize> {
        self.winner
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_some() && self.base.overlay() == self.pause
    }

    /// Colour shown by the indicator.
    pub fn current_color(&self) -> Option<CardColor> {
        self.indicator
            .and_then(|id| self.base.widget::<ColorIndicator>(id))
            .and_then(ColorIndicator::color)
    }

    //--- Rule Events ------------------------------------------------------

    fn table_busy(&self) -> bool {
        self.scheduler.as_ref().is_some_and(AnimationScheduler::is_busy)
    }

    /// Pulls events until something starts moving or input is needed.
    fn poll_rules(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        while !self.table_busy() && self.deciding.is_none() && self.winner.is_none() {
            let Some(event) = self.rules.next_event() else { break };
            self.apply(event, context)?;
        }
        Ok(())
    }

    fn apply(&mut self, event: GameEvent, context: &mut GlobalContext) -> StageResult<()> {
        debug!(target: "stage", "gameplay: {:?}", event);
        let Some(scheduler) = self.scheduler.as_mut() else {
            warn!(target: "stage", "gameplay: event before the table was built");
            return Ok(());
        };
        let renderer = context.renderer.as_mut();

        match event {
            GameEvent::Draw { player, cards, reveal } => {
                scheduler.play_draw(player, &cards, reveal, renderer)?;
            }
            GameEvent::Play { origin, card, effects } => {
                scheduler.play_card(origin, &card, &effects, renderer)?;
            }
            GameEvent::ColorChanged { color } => {
                let color: CardColor = color.parse()?;
                if let Some(indicator) = self.indicator.and_then(|id| self.base.widget_mut::<ColorIndicator>(id)) {
                    indicator.set_color(color, renderer);
                }
            }
            GameEvent::UserTurn { playable } => {
                let hand = scheduler.hand_cards(0);
                self.cursor = hand.iter().position(|card| playable.contains(card)).unwrap_or(0);
                scheduler.lift(0, Some(self.cursor), renderer)?;
                self.deciding = Some(playable);
                context.bus.post(Notice("Your turn".into()));
            }
            GameEvent::GameOver { winner } => {
                info!(target: "stage", "gameplay: player {} wins", winner);
                self.winner = Some(winner);
                context.bus.post(Notice(format!("Player {} wins", winner + 1)));
            }
        }
        Ok(())
    }

    //--- Player Input -----------------------------------------------------

    fn pressed(&mut self, context: &GlobalContext, key: InputKey) -> bool {
        context.input.is_triggered(key) && self.base.cooldown_mut().try_trigger(key)
    }

    fn decide(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        let Some(scheduler) = self.scheduler.as_mut() else { return Ok(()) };
        let hand = scheduler.hand_cards(0);
        let count = hand.len();

        let input = &context.input;
        let cooldown = self.base.cooldown_mut();
        let mut pressed = |key| input.is_triggered(key) && cooldown.try_trigger(key);

        if count > 0 && pressed(InputKey::Left) {
            self.cursor = (self.cursor + count - 1) % count;
            scheduler.lift(0, Some(self.cursor), context.renderer.as_mut())?;
        } else if count > 0 && pressed(InputKey::Right) {
            self.cursor = (self.cursor + 1) % count;
            scheduler.lift(0, Some(self.cursor), context.renderer.as_mut())?;
        } else if pressed(InputKey::Ok) {
            let legal = self
                .deciding
                .as_ref()
                .zip(hand.get(self.cursor))
                .filter(|(playable, card)| playable.contains(*card));
            match legal {
                Some((_, &card)) => {
                    debug!(target: "stage", "gameplay: playing {}", card);
                    self.deciding = None;
                    scheduler.lift(0, None, context.renderer.as_mut())?;
                    self.rules.submit(PlayerDecision::Play(card));
                }
                None => context.audio.play_se(BUZZER),
            }
        } else if pressed(InputKey::Cancel) {
            debug!(target: "stage", "gameplay: drawing");
            self.deciding = None;
            scheduler.lift(0, None, context.renderer.as_mut())?;
            self.rules.submit(PlayerDecision::Draw);
        }
        Ok(())
    }

    //--- Pause Menu -------------------------------------------------------

    fn open_pause(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        let Some(id) = self.pause else { return Ok(()) };
        self.base.raise_overlay(id, context)?;
        if let Some(menu) = self.base.widget_mut::<CommandMenu>(id) {
            menu.select(0);
            menu.set_shown(context.renderer.as_mut(), true);
        }
        debug!(target: "stage", "gameplay: paused");
        Ok(())
    }

    fn close_pause(&mut self, context: &mut GlobalContext) {
        self.base.close_overlay(context);
        if let Some(menu) = self.pause.and_then(|id| self.base.widget_mut::<CommandMenu>(id)) {
            menu.set_shown(context.renderer.as_mut(), false);
        }
    }

    fn handle_pause(&mut self, commands: Vec<MenuCommand>, context: &mut GlobalContext) {
        for command in commands.into_iter().filter(|c| c.menu == PAUSE_MENU) {
            match command.symbol {
                "resume" => {
                    self.close_pause(context);
                    debug!(target: "stage", "gameplay: resumed");
                }
                "quit" => {
                    self.close_pause(context);
                    self.leaving = true;
                    info!(target: "stage", "gameplay: quitting to title");
                    context.bus.post(SceneRequest::Goto(StageKey::Title));
                }
                _ => continue,
            }
            break;
        }
    }
}

impl Scene for GameplayScene {
    fn base(&self) -> &SceneBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut SceneBase {
        &mut self.base
    }

    fn create(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base.create(context)?;
        let config = &context.config;
        let renderer = context.renderer.as_mut();
        let scheduler = AnimationScheduler::new(config, renderer);

        let center = Pose::at(config.screen_width / 2.0, config.screen_height / 2.0);
        for (asset, pose, layer) in [
            ("table", center, Layer::Background),
            ("deck_pile", scheduler.deck_pose(), Layer::Table),
            ("discard_pile", scheduler.discard_pose(), Layer::Table),
        ] {
            let visual = renderer.add_sprite(asset);
            renderer.set_pose(visual, pose);
            renderer.set_layer(visual, layer);
            renderer.set_visible(visual, true);
            self.table.push(visual);
        }
        self.scheduler = Some(scheduler);
        Ok(())
    }

    fn is_ready(&mut self, context: &mut GlobalContext) -> bool {
        context.renderer.poll_preload().is_complete()
    }

    fn start(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base.start(context)?;
        self.indicator = Some(self.base.add_widget(Box::new(ColorIndicator::new()), false, context)?);

        let menu = CommandMenu::new(PAUSE_MENU, &[("Resume", "resume"), ("Quit to Title", "quit")]).with_cancel("resume");
        let pause = self.base.add_widget(Box::new(menu), false, context)?;
        if let Some(menu) = self.base.widget_mut::<CommandMenu>(pause) {
            menu.set_active(false);
            menu.set_shown(context.renderer.as_mut(), false);
        }
        self.pause = Some(pause);

        self.base.start_fade_in(context.config.fade_frames, context);
        Ok(())
    }

    fn update(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base.update(context);
        let commands = context.bus.drain::<MenuCommand>();
        let paused = self.is_paused();

        if !paused {
            if let Some(scheduler) = self.scheduler.as_mut() {
                scheduler.update(context.renderer.as_mut());
            }
        }
        if !self.base.is_active() || self.leaving {
            return Ok(());
        }

        if paused {
            self.handle_pause(commands, context);
            return Ok(());
        }
        if self.pressed(context, InputKey::Menu) {
            return self.open_pause(context);
        }

        if self.winner.is_some() {
            if self.pressed(context, InputKey::Ok) {
                self.leaving = true;
                context.bus.post(SceneRequest::Goto(StageKey::Title));
            }
            return Ok(());
        }
        if self.deciding.is_some() {
            return self.decide(context);
        }
        if self.base.is_busy() {
            return Ok(());
        }
        self.poll_rules(context)
    }

    fn is_busy(&self) -> bool {
        self.base.is_busy() || self.table_busy() || self.deciding.is_some()
    }

    fn pre_terminate(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.deciding = None;
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.shutdown();
        }
        self.base.pre_terminate(context)
    }

    fn terminate(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base.terminate(context)?;
        let renderer = context.renderer.as_mut();
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.dispose(renderer);
        }
        for visual in self.table.drain(..) {
            renderer.remove_sprite(visual);
        }
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
