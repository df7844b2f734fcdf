//! Boat, ocean, HUD labels and the intro/outro screens, plus the game-state
//! transitions that drive them.

use super::collections::StringLabel;
use super::factory::Appearance;
use super::EntityManager;
use crate::config::GameConfig;
use crate::ecs::{
    Animation, AnimationMode, Collision, CollisionKind, Color, ComponentKind, DelegateEvent, Entity,
    EntityId, EntityType, Font, GlyphKey, Input, OnFinish, Position, SpriteSource, StaticSprite, Velocity,
};
use crate::error::{SpawnError, SpawnResult};

const LABEL_FONT: Font = Font::SfMonoRegular;
const NUMBER_LABEL_SIZE: u32 = 32;
const INDICATOR_LABEL_OFFSET: f32 = 32.0;

const GAME_TITLE: &str = "SUBMARINE WARS";
const WELCOME_MESSAGE: &str = "WELCOME ABOARD CAPTAIN";
const INSTRUCTIONS: [(&str, [f32; 2]); 3] = [
    ("THERE ARE ENEMY SHIPS INCOMING WE MUST PREPARE FOR BATTLE!", [385.0, 320.0]),
    ("YOUR CONTROLS ARE LISTED BELOW", [510.0, 340.0]),
    ("GOOD LUCK", [603.0, 360.0]),
];
const NEW_GAME: &str = "N E W  G A M E";
const LOAD_GAME: &str = "L O A D  G A M E";

/// The fixed-width numeric HUD labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumberLabelKind {
    /// `SCORE:00000000`
    Score,
    /// `MONEY:00000100`
    Money,
    /// `x 05` next to the lives indicator.
    Lives,
    /// `x 01` next to the missiles indicator.
    Missiles,
    /// `STAGE 00`
    Stage,
}

impl NumberLabelKind {
    const ALL: [Self; 5] = [Self::Score, Self::Money, Self::Lives, Self::Missiles, Self::Stage];

    const fn index(self) -> usize {
        match self {
            Self::Score => 0,
            Self::Money => 1,
            Self::Lives => 2,
            Self::Missiles => 3,
            Self::Stage => 4,
        }
    }

    const fn prefix(self) -> &'static str {
        match self {
            Self::Score => "SCORE:",
            Self::Money => "MONEY:",
            Self::Lives | Self::Missiles => "x ",
            Self::Stage => "STAGE ",
        }
    }

    const fn width(self) -> usize {
        match self {
            Self::Score | Self::Money => 8,
            Self::Lives | Self::Missiles | Self::Stage => 2,
        }
    }
}

/// A string label rendering `prefix` followed by a zero-padded number.
///
/// Updates re-render only the digits that changed; the character
/// identifiers never change after setup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NumberLabel {
    prefix: &'static str,
    width: usize,
    value: u64,
    label: StringLabel,
}

impl NumberLabel {
    fn new(kind: NumberLabelKind, value: u64) -> Self {
        Self {
            prefix: kind.prefix(),
            width: kind.width(),
            value,
            label: StringLabel::default(),
        }
    }

    /// The value currently rendered.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.value
    }

    /// The character identifiers, prefix included.
    #[must_use]
    pub fn characters(&self) -> &[EntityId] {
        self.label.characters()
    }

    /// Whether the label has been set up.
    #[must_use]
    pub fn is_set_up(&self) -> bool {
        !self.label.is_empty()
    }

    /// Largest value that fits in the label's width.
    fn max_value(&self) -> u64 {
        u32::try_from(self.width)
            .ok()
            .and_then(|width| 10u64.checked_pow(width))
            .map_or(u64::MAX, |limit| limit - 1)
    }

    fn digits(&self, value: u64) -> Vec<char> {
        format!("{value:0width$}", width = self.width).chars().collect()
    }

    fn text(&self) -> String {
        format!("{}{:0width$}", self.prefix, self.value, width = self.width)
    }
}

/// Singleton entities and labels that live outside the live collections.
#[derive(Clone, Debug)]
pub(crate) struct UiState {
    ocean: Entity,
    lives_indicator: Entity,
    missiles_indicator: Entity,
    number_labels: [NumberLabel; 5],
    intro_panel: Entity,
    intro_labels: Vec<StringLabel>,
    outro_panel: Entity,
    outro_labels: Vec<StringLabel>,
}

impl UiState {
    pub(crate) fn new(config: &GameConfig) -> Self {
        let player = &config.player;
        let number_labels = NumberLabelKind::ALL.map(|kind| {
            let value = match kind {
                NumberLabelKind::Money => player.starting_money,
                NumberLabelKind::Lives => u64::from(player.starting_lives),
                NumberLabelKind::Missiles => u64::from(player.starting_missiles),
                NumberLabelKind::Score | NumberLabelKind::Stage => 0,
            };
            NumberLabel::new(kind, value)
        });

        Self {
            ocean: Entity::new(),
            lives_indicator: Entity::new(),
            missiles_indicator: Entity::new(),
            number_labels,
            intro_panel: Entity::new(),
            intro_labels: Vec::new(),
            outro_panel: Entity::new(),
            outro_labels: Vec::new(),
        }
    }
}

impl EntityManager {
    // =========================================================================
    // Ocean and boat
    // =========================================================================

    /// Makes and adds the background ocean. Later calls do nothing.
    ///
    /// # Errors
    ///
    /// [`SpawnError`] if the ocean cannot be made.
    pub fn setup_ocean(&mut self) -> SpawnResult<()> {
        if self.ui.ocean.is_initialized() {
            return Ok(());
        }

        let center = self.config.layout.screen_center();
        let ocean = self.make_base(EntityType::Ocean, center, Appearance::default())?;
        self.add_entity(&ocean);
        self.ui.ocean = ocean;
        Ok(())
    }

    /// The background ocean, if set up.
    #[must_use]
    pub fn ocean(&self) -> Option<&Entity> {
        Some(&self.ui.ocean).filter(|ocean| ocean.is_initialized())
    }

    /// Sets up the player boat, or respawns it.
    ///
    /// The first call makes the animated boat at the spawn point, records
    /// it as the player's boat and adds it. Later calls reuse its components,
    /// move it to the respawn point and broadcast did-add again.
    ///
    /// # Errors
    ///
    /// [`SpawnError`] if the boat cannot be made on the first call.
    pub fn reset_boat(&mut self) -> SpawnResult<()> {
        if self.boat.is_initialized() {
            let id = self.boat.id();
            *self.registry.components_mut::<Position>().slot_mut(id) = self.config.layout.boat_respawn_position();
            *self.registry.components_mut::<Velocity>().slot_mut(id) = Velocity::ZERO;
            self.player_mut().boat_destroyed = false;

            let boat = self.boat;
            self.add_entity(&boat);
            tracing::info!(id = %id, "boat respawned");
            return Ok(());
        }

        let spawn = self.config.layout.boat_spawn_position();
        let mut boat = self.make_base(EntityType::Boat, spawn, Appearance::animated())?;
        let id = boat.id();

        self.set_dynamics(id, self.config.physics.boat_mass, [0.0, 0.0]);
        let frames = self.registry.sprites().animated().slot(id).frame_count;

        *self.registry.components_mut::<Input>().slot_mut(id) = Input::default();
        *self.registry.components_mut::<Collision>().slot_mut(id) = Collision::new(CollisionKind::Boat);
        *self.registry.components_mut::<Velocity>().slot_mut(id) = Velocity::ZERO;
        *self.registry.components_mut::<Animation>().slot_mut(id) =
            Animation::new(AnimationMode::Loopback, frames, OnFinish::Nothing);
        for kind in [
            ComponentKind::Input,
            ComponentKind::Collision,
            ComponentKind::Velocity,
            ComponentKind::Animation,
        ] {
            boat.register_component(kind);
        }

        self.player_mut().pid = id;
        self.boat = boat;
        self.add_entity(&boat);
        tracing::info!(id = %id, "boat set up");
        Ok(())
    }

    /// Hides the boat after it was destroyed.
    ///
    /// Only will-remove is broadcast; the components stay in place for
    /// [`reset_boat`](Self::reset_boat) to reuse.
    pub fn disable_boat(&mut self) {
        if !self.boat.is_initialized() {
            return;
        }
        let boat = self.boat;
        self.notify(DelegateEvent::WillRemove, &boat);
        tracing::debug!(id = %boat.id(), "boat disabled");
    }

    /// The player boat. Uninitialized until [`reset_boat`](Self::reset_boat).
    #[must_use]
    pub fn boat(&self) -> &Entity {
        &self.boat
    }

    // =========================================================================
    // HUD
    // =========================================================================

    /// Makes the lives indicator icon and its number label.
    ///
    /// # Panics
    ///
    /// Panics if the indicator is already set up.
    ///
    /// # Errors
    ///
    /// [`SpawnError`] if the icon or a glyph cannot be made.
    pub fn setup_boat_lives_indicator(&mut self) -> SpawnResult<()> {
        assert!(
            !self.ui.lives_indicator.is_initialized(),
            "boat lives indicator already set up"
        );
        let position = Position::new(24.0, 24.0);
        self.ui.lives_indicator = self.setup_indicator(EntityType::BoatLivesIndicator, position)?;
        self.setup_number_label(NumberLabelKind::Lives, Self::indicator_label_position(position))
    }

    /// Makes the boat missiles indicator icon and its number label.
    ///
    /// # Panics
    ///
    /// Panics if the indicator is already set up.
    ///
    /// # Errors
    ///
    /// [`SpawnError`] if the icon or a glyph cannot be made.
    pub fn setup_boat_missiles_indicator(&mut self) -> SpawnResult<()> {
        assert!(
            !self.ui.missiles_indicator.is_initialized(),
            "boat missiles indicator already set up"
        );
        let position = Position::new(24.0, 56.0);
        self.ui.missiles_indicator = self.setup_indicator(EntityType::BoatMissilesIndicator, position)?;
        self.setup_number_label(NumberLabelKind::Missiles, Self::indicator_label_position(position))
    }

    fn setup_indicator(&mut self, kind: EntityType, position: Position) -> SpawnResult<Entity> {
        let icon = self.make_base(kind, position, Appearance::default())?;
        self.add_entity(&icon);
        Ok(icon)
    }

    fn indicator_label_position(icon: Position) -> Position {
        Position::new(icon.x + INDICATOR_LABEL_OFFSET, icon.y)
    }

    /// Makes the score label in the top right corner.
    ///
    /// # Errors
    ///
    /// [`SpawnError`] if a glyph cannot be made.
    pub fn setup_score_label(&mut self) -> SpawnResult<()> {
        let x = self.config.layout.screen_width - 16.0 * 17.0;
        self.setup_number_label(NumberLabelKind::Score, Position::new(x, 16.0))
    }

    /// Makes the money label under the score label.
    ///
    /// # Errors
    ///
    /// [`SpawnError`] if a glyph cannot be made.
    pub fn setup_money_label(&mut self) -> SpawnResult<()> {
        let x = self.config.layout.screen_width - 16.0 * 17.0;
        self.setup_number_label(NumberLabelKind::Money, Position::new(x, 48.0))
    }

    /// Makes the stage label at the top of the screen.
    ///
    /// # Errors
    ///
    /// [`SpawnError`] if a glyph cannot be made.
    pub fn setup_stage_label(&mut self) -> SpawnResult<()> {
        self.setup_number_label(NumberLabelKind::Stage, Position::new(560.0, 16.0))
    }

    /// Makes the number label of `kind` at `position` showing its current
    /// value.
    ///
    /// # Panics
    ///
    /// Panics if the label is already set up.
    ///
    /// # Errors
    ///
    /// [`SpawnError`] if a glyph cannot be made.
    pub fn setup_number_label(&mut self, kind: NumberLabelKind, position: Position) -> SpawnResult<()> {
        let slot = kind.index();
        assert!(!self.ui.number_labels[slot].is_set_up(), "{kind:?} label already set up");

        let text = self.ui.number_labels[slot].text();
        let label = self.make_string_label(position, LABEL_FONT, Color::BLACK, NUMBER_LABEL_SIZE, &text)?;
        self.ui.number_labels[slot].label = label;
        Ok(())
    }

    /// The number label of `kind`.
    #[must_use]
    pub fn number_label(&self, kind: NumberLabelKind) -> &NumberLabel {
        &self.ui.number_labels[kind.index()]
    }

    /// Shows `value` in the number label of `kind`.
    ///
    /// Values too wide for the label are clamped to its largest value. Only
    /// the glyphs of digits that differ get a new sprite, and did-update is
    /// broadcast for each of them. A label that is not set up just records
    /// the value.
    ///
    /// # Errors
    ///
    /// [`SpawnError::SpriteUnavailable`] if a digit glyph cannot be loaded.
    /// Digits already swapped keep their new sprite.
    pub fn update_number_label(&mut self, kind: NumberLabelKind, value: u64) -> SpawnResult<()> {
        let slot = kind.index();
        let label = &self.ui.number_labels[slot];
        let value = value.min(label.max_value());
        if label.value == value {
            return Ok(());
        }
        if !label.is_set_up() {
            self.ui.number_labels[slot].value = value;
            return Ok(());
        }

        let base = label.prefix.chars().count();
        let old = label.digits(label.value);
        let new = label.digits(value);
        let ids = label.characters()[base..].to_vec();

        for ((id, old), new) in ids.into_iter().zip(old).zip(new) {
            if old == new {
                continue;
            }

            let Some(character) = self.characters.get(id).copied() else {
                continue;
            };
            let glyph = GlyphKey {
                character: new,
                ..character.glyph
            };
            let texture = self
                .sprite_cache
                .fetch(SpriteSource::Glyph(glyph))
                .map_err(|err| SpawnError::SpriteUnavailable {
                    kind: EntityType::Character,
                    reason: err.to_string(),
                })?;

            self.registry.sprites_mut().set_static(id, StaticSprite::from_texture(&texture));
            if let Some(stored) = self.characters.get_mut(id) {
                stored.glyph = glyph;
                stored.advance = texture.advance;
            }
            self.notify(DelegateEvent::DidUpdate, &character.entity);
        }

        self.ui.number_labels[slot].value = value;
        Ok(())
    }

    /// Pushes the player's money, score, lives and missiles to their labels.
    ///
    /// # Errors
    ///
    /// See [`update_number_label`](Self::update_number_label).
    pub fn sync_player_labels(&mut self) -> SpawnResult<()> {
        let player = *self.player();
        self.update_number_label(NumberLabelKind::Score, player.score)?;
        self.update_number_label(NumberLabelKind::Money, player.money)?;
        self.update_number_label(NumberLabelKind::Lives, u64::from(player.lives))?;
        self.update_number_label(NumberLabelKind::Missiles, u64::from(player.missiles))
    }

    // =========================================================================
    // Intro / outro screens
    // =========================================================================

    /// Makes the intro panel with its title, instructions and menu.
    ///
    /// # Errors
    ///
    /// [`SpawnError`] if the panel or a glyph cannot be made. Whatever was
    /// made before the failure stays up and is torn down by
    /// [`remove_intro_ui`](Self::remove_intro_ui).
    pub fn setup_intro_ui(&mut self) -> SpawnResult<()> {
        let panel = self.make_base(EntityType::IntroPanel, Position::new(645.0, 360.0), Appearance::scaled(0.6))?;
        self.add_entity(&panel);
        self.ui.intro_panel = panel;

        let mut lines = vec![
            (GAME_TITLE, [431.0, 210.0], 52, Color::BLACK),
            (WELCOME_MESSAGE, [494.0, 288.0], 23, Color::BLACK),
        ];
        lines.extend(INSTRUCTIONS.map(|(text, at)| (text, at, 15, Color::BLACK)));
        lines.extend(Self::menu_lines());

        for (text, [x, y], size, color) in lines {
            let label = self.make_string_label(Position::new(x, y), LABEL_FONT, color, size, text)?;
            self.ui.intro_labels.push(label);
        }
        Ok(())
    }

    /// Tears down the intro panel and its labels.
    pub fn remove_intro_ui(&mut self) {
        let panel = std::mem::take(&mut self.ui.intro_panel);
        self.remove_entity(&panel);
        for mut label in std::mem::take(&mut self.ui.intro_labels) {
            self.remove_string_label(&mut label);
        }
    }

    /// Makes the game-over panel with its message and menu.
    ///
    /// # Errors
    ///
    /// [`SpawnError`] if the panel or a glyph cannot be made.
    pub fn setup_outro_ui(&mut self) -> SpawnResult<()> {
        let center = self.config.layout.screen_center();
        let panel = self.make_base(EntityType::OutroPanel, center, Appearance::scaled(0.6))?;
        self.add_entity(&panel);
        self.ui.outro_panel = panel;

        let mut lines = vec![
            ("GAME OVER", [512.0, 210.0], 52, Color::BLACK),
            ("THANKS FOR PLAYING", [365.0, 320.0], 15, Color::BLACK),
            ("WOULD YOU LIKE TO TRY AGAIN?", [200.0, 360.0], 15, Color::BLACK),
        ];
        lines.extend(Self::menu_lines());

        for (text, [x, y], size, color) in lines {
            let label = self.make_string_label(Position::new(x, y), LABEL_FONT, color, size, text)?;
            self.ui.outro_labels.push(label);
        }
        Ok(())
    }

    /// Tears down the game-over panel and its labels.
    pub fn remove_outro_ui(&mut self) {
        let panel = std::mem::take(&mut self.ui.outro_panel);
        self.remove_entity(&panel);
        for mut label in std::mem::take(&mut self.ui.outro_labels) {
            self.remove_string_label(&mut label);
        }
    }

    fn menu_lines() -> [(&'static str, [f32; 2], u32, Color); 2] {
        [
            (NEW_GAME, [440.0, 541.5], 35, Color::WHITE),
            (LOAD_GAME, [680.0, 541.5], 35, Color::WHITE),
        ]
    }

    // =========================================================================
    // Game state
    // =========================================================================

    /// Restores the player's money, score, lives and missiles to their
    /// starting values and resets the stage label.
    ///
    /// # Errors
    ///
    /// See [`update_number_label`](Self::update_number_label).
    pub fn reset_game(&mut self) -> SpawnResult<()> {
        let start = self.config.player.clone();
        let player = self.player_mut();
        player.money = start.starting_money;
        player.score = 0;
        player.lives = start.starting_lives;
        player.missiles = start.starting_missiles;
        player.boat_destroyed = false;

        self.sync_player_labels()?;
        self.update_number_label(NumberLabelKind::Stage, 0)?;
        tracing::info!("game reset");
        Ok(())
    }

    /// Marks the game as over, or clears the mark for a new game.
    pub fn signal_game_over(&mut self, over: bool) {
        self.game_over = over;
        if !over {
            self.game_running = true;
        }
        tracing::info!(over, "game over signalled");
    }

    /// Performs the running to over transition the first time it is seen:
    /// every spawned entity is removed and the outro is shown.
    ///
    /// # Returns
    ///
    /// Whether the game is over.
    pub fn check_game_over(&mut self) -> bool {
        if !self.game_over {
            return false;
        }

        if self.game_running {
            self.game_running = false;
            self.remove_all_entities();
            if let Err(err) = self.setup_outro_ui() {
                tracing::warn!(error = %err, "failed to show the outro");
            }
            tracing::info!(score = self.player().score, "game over");
        }
        true
    }

    /// Whether game over has been signalled.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Whether the game is running (not yet torn down by game over).
    #[must_use]
    pub fn is_game_running(&self) -> bool {
        self.game_running
    }
}
