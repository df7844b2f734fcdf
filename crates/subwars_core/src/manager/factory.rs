//! Entity factories.
//!
//! Every `make_*` allocates an identifier, populates the base components
//! (sprite, color, position, rotation, physics), then the kind-specific ones.
//! A factory never adds the entity; see the `add_*` operations.
//!
//! The `build_*` variants take an identifier that is already reserved and are
//! shared with snapshot restore.

use super::collections::{Character, StringLabel, Submarine, SubmarineType};
use super::EntityManager;
use crate::ecs::{
    AnimatedSprite, Animation, AnimationMode, Attack, Collision, CollisionKind, Color, Component,
    ComponentKind, ComponentMask, Direction, Distortion, Entity, EntityId, EntityType, Font,
    GlyphKey, OnFinish, Pathing, Physics, Position, Rotation, Score, SpriteSource, StaticSprite,
    Store, StoreRole, TextureInfo, Velocity, Weapon,
};
use crate::error::{SpawnError, SpawnResult};
use std::f32::consts::FRAC_PI_2;

/// Components every factory populates.
const BASE_COMPONENTS: ComponentMask = ComponentMask::of(&[
    ComponentKind::Sprite,
    ComponentKind::Color,
    ComponentKind::Position,
    ComponentKind::Rotation,
    ComponentKind::Physics,
]);

/// Increment per step for boat missile paths.
const BOAT_MISSILE_PATH_INCREMENT: f32 = 0.025;

/// Score awarded for a fish.
const FISH_SCORE: u32 = 1;

/// How a newly made entity is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Appearance {
    /// Render scale; a negative x mirrors the sprite.
    pub scale: [f32; 2],
    /// Tint.
    pub color: Color,
    /// Rotation in radians.
    pub rotation: f32,
    /// Use the animated sprite strip instead of a static sprite.
    pub animated: bool,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            scale: [1.0, 1.0],
            color: Color::WHITE,
            rotation: 0.0,
            animated: false,
        }
    }
}

impl Appearance {
    /// Default appearance using the animated sprite strip.
    #[must_use]
    pub fn animated() -> Self {
        Self {
            animated: true,
            ..Self::default()
        }
    }

    /// Default appearance with a uniform scale.
    #[must_use]
    pub fn scaled(scale: f32) -> Self {
        Self {
            scale: [scale, scale],
            ..Self::default()
        }
    }
}

impl EntityManager {
    // =========================================================================
    // Shared construction
    // =========================================================================

    /// Populates the base components for `id`.
    ///
    /// On a sprite failure the identifier is released and no slot is left
    /// populated.
    pub(crate) fn make(
        &mut self,
        id: EntityId,
        kind: EntityType,
        source: SpriteSource,
        position: Position,
        appearance: Appearance,
    ) -> SpawnResult<(Entity, TextureInfo)> {
        let texture = match self.sprite_cache.fetch(source) {
            Ok(texture) => texture,
            Err(err) => {
                self.free_list.release(id);
                tracing::warn!(id = %id, ?kind, error = %err, "sprite unavailable, spawn skipped");
                return Err(SpawnError::SpriteUnavailable {
                    kind,
                    reason: err.to_string(),
                });
            }
        };

        let sprites = self.registry.sprites_mut();
        if appearance.animated {
            sprites.set_animated(id, AnimatedSprite::from_texture(&texture));
        } else {
            sprites.set_static(id, StaticSprite::from_texture(&texture));
        }

        *self.registry.components_mut::<Color>().slot_mut(id) = appearance.color;
        *self.registry.components_mut::<Position>().slot_mut(id) = position;
        *self.registry.components_mut::<Rotation>().slot_mut(id) = Rotation {
            radians: appearance.rotation,
        };
        *self.registry.components_mut::<Physics>().slot_mut(id) = Physics {
            scale: appearance.scale,
            ..Physics::default()
        };

        let mut entity = Entity::new();
        entity.initialize(id, BASE_COMPONENTS);

        tracing::debug!(id = %id, ?kind, x = position.x, y = position.y, "entity made");
        Ok((entity, texture))
    }

    /// Allocates an identifier and populates the base components.
    pub(crate) fn make_base(
        &mut self,
        kind: EntityType,
        position: Position,
        appearance: Appearance,
    ) -> SpawnResult<Entity> {
        let id = self.allocate_id()?;
        let (entity, _) = self.make(id, kind, SpriteSource::Entity(kind), position, appearance)?;
        Ok(entity)
    }

    /// Writes `component` into its slot and, for tracked kinds, sets its bit
    /// on `entity`.
    fn attach<C: Component>(&mut self, entity: &mut Entity, component: C) {
        *self.registry.components_mut::<C>().slot_mut(entity.id()) = component;
        if C::KIND.is_tracked() {
            entity.register_component(C::KIND);
        }
    }

    /// Sets mass and external force, keeping the scale chosen at make time.
    pub(crate) fn set_dynamics(&mut self, id: EntityId, mass: f32, force: [f32; 2]) {
        let physics = self.registry.components_mut::<Physics>().slot_mut(id);
        physics.mass = mass;
        physics.force = force;
    }

    fn frames_of(&self, id: EntityId) -> u32 {
        self.registry.sprites().animated().slot(id).frame_count
    }

    // =========================================================================
    // Bombs and explosions
    // =========================================================================

    /// Makes a bomb at `position` moving with `velocity`.
    ///
    /// # Errors
    ///
    /// [`SpawnError::PoolExhausted`] or [`SpawnError::SpriteUnavailable`].
    pub fn make_bomb(&mut self, position: Position, velocity: Velocity) -> SpawnResult<Entity> {
        let id = self.allocate_id()?;
        self.build_bomb(id, position, velocity)
    }

    pub(crate) fn build_bomb(&mut self, id: EntityId, position: Position, velocity: Velocity) -> SpawnResult<Entity> {
        let (mut bomb, _) = self.make(
            id,
            EntityType::Bomb,
            SpriteSource::Entity(EntityType::Bomb),
            position,
            Appearance::default(),
        )?;

        let force = if self.tutorial {
            [0.0, 0.0]
        } else {
            [0.0, self.config.physics.gravity]
        };
        self.set_dynamics(id, self.config.physics.bomb_mass, force);

        self.attach(&mut bomb, Collision::new(CollisionKind::Bomb));
        self.attach(&mut bomb, velocity);
        self.attach(&mut bomb, Distortion { distort: true });
        Ok(bomb)
    }

    /// Makes an explosion at `position`.
    ///
    /// The explosion plays its animation once and then removes itself.
    ///
    /// # Errors
    ///
    /// [`SpawnError::PoolExhausted`] or [`SpawnError::SpriteUnavailable`].
    pub fn make_explosion(&mut self, position: Position) -> SpawnResult<Entity> {
        let id = self.allocate_id()?;
        let (mut explosion, _) = self.make(
            id,
            EntityType::Explosion,
            SpriteSource::Entity(EntityType::Explosion),
            position,
            Appearance::animated(),
        )?;

        self.set_dynamics(id, self.config.physics.immovable_mass, [0.0, 0.0]);

        let frames = self.frames_of(id);
        self.attach(&mut explosion, Collision::new(CollisionKind::Explosion));
        self.attach(&mut explosion, Velocity::ZERO);
        self.attach(
            &mut explosion,
            Animation::new(AnimationMode::Autoterminating, frames, OnFinish::RemoveExplosion),
        );
        self.attach(&mut explosion, Distortion { distort: true });
        Ok(explosion)
    }

    // =========================================================================
    // Submarines and fish
    // =========================================================================

    /// Makes a submarine of `sub_type` at `position`.
    ///
    /// `speed` is an absolute value; `direction` gives its sign and mirrors
    /// the sprite when facing left. `radar` is the detection radius, `None`
    /// meaning the boat is always detected. Only types II and III get an
    /// attack component.
    ///
    /// # Errors
    ///
    /// [`SpawnError::InvalidPlacement`] if `position.y` is above the minimum
    /// submarine depth, otherwise [`SpawnError::PoolExhausted`] or
    /// [`SpawnError::SpriteUnavailable`].
    pub fn make_submarine(
        &mut self,
        position: Position,
        direction: Direction,
        speed: f32,
        sub_type: SubmarineType,
        score: u32,
        radar: Option<f32>,
    ) -> SpawnResult<Submarine> {
        self.check_submarine_depth(sub_type, position)?;
        let id = self.allocate_id()?;
        self.build_submarine(id, position, direction, speed, sub_type, score, radar)
    }

    pub(crate) fn check_submarine_depth(&self, sub_type: SubmarineType, position: Position) -> SpawnResult<()> {
        if position.y < self.config.layout.minimum_submarine_depth {
            tracing::warn!(?sub_type, y = position.y, "submarine placed above minimum depth");
            return Err(SpawnError::InvalidPlacement {
                kind: sub_type.entity_type(),
                y: position.y,
            });
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn build_submarine(
        &mut self,
        id: EntityId,
        position: Position,
        direction: Direction,
        speed: f32,
        sub_type: SubmarineType,
        score: u32,
        radar: Option<f32>,
    ) -> SpawnResult<Submarine> {
        if speed < 0.0 {
            tracing::warn!(speed, "submarine speed must be an absolute value");
        }

        let sign = direction.sign();
        let kind = sub_type.entity_type();
        let appearance = Appearance {
            scale: [sign, 1.0],
            ..Appearance::default()
        };
        let (mut entity, _) = self.make(id, kind, SpriteSource::Entity(kind), position, appearance)?;

        let force_x = if self.tutorial {
            0.0
        } else {
            sign * self.config.physics.submarine_force
        };
        self.set_dynamics(id, 1.0, [force_x, 0.0]);

        self.attach(&mut entity, Collision::new(CollisionKind::Submarine));
        self.attach(&mut entity, Velocity::new(sign * speed.abs(), 0.0));
        self.attach(&mut entity, Score { score });
        self.attach(&mut entity, Distortion { distort: true });

        let weapon = sub_type.weapon();
        if weapon != Weapon::None {
            let radius = radar.unwrap_or(f32::MAX);
            self.attach(&mut entity, Attack { weapon, radius });
        }

        Ok(Submarine { entity, sub_type })
    }

    /// Makes a fish at `position` swimming in `direction` at `speed`.
    ///
    /// # Errors
    ///
    /// [`SpawnError::PoolExhausted`] or [`SpawnError::SpriteUnavailable`].
    pub fn make_fish(&mut self, position: Position, direction: Direction, speed: f32) -> SpawnResult<Entity> {
        let id = self.allocate_id()?;
        self.build_fish(id, position, direction, speed)
    }

    pub(crate) fn build_fish(
        &mut self,
        id: EntityId,
        position: Position,
        direction: Direction,
        speed: f32,
    ) -> SpawnResult<Entity> {
        let sign = direction.sign();
        let appearance = Appearance {
            scale: [sign, 1.0],
            ..Appearance::default()
        };
        let (mut fish, _) = self.make(
            id,
            EntityType::Fish,
            SpriteSource::Entity(EntityType::Fish),
            position,
            appearance,
        )?;

        let force_x = if self.tutorial {
            0.0
        } else {
            sign * self.config.physics.fish_force
        };
        self.set_dynamics(id, 1.0, [force_x, 0.0]);

        self.attach(&mut fish, Collision::new(CollisionKind::Fish));
        self.attach(&mut fish, Velocity::new(sign * speed.abs(), 0.0));
        self.attach(&mut fish, Score { score: FISH_SCORE });
        self.attach(&mut fish, Distortion { distort: true });
        Ok(fish)
    }

    // =========================================================================
    // Projectiles
    // =========================================================================

    /// Makes a torpedo at `position` moving with `velocity`.
    ///
    /// In tutorial mode the torpedo gets no force and is drawn pointing up.
    ///
    /// # Errors
    ///
    /// [`SpawnError::PoolExhausted`] or [`SpawnError::SpriteUnavailable`].
    pub fn make_torpedo(&mut self, position: Position, velocity: Velocity) -> SpawnResult<Entity> {
        let id = self.allocate_id()?;
        self.build_torpedo(id, position, velocity)
    }

    pub(crate) fn build_torpedo(&mut self, id: EntityId, position: Position, velocity: Velocity) -> SpawnResult<Entity> {
        let appearance = Appearance {
            rotation: if self.tutorial { FRAC_PI_2 } else { 0.0 },
            ..Appearance::default()
        };
        let (mut torpedo, _) = self.make(
            id,
            EntityType::Torpedo,
            SpriteSource::Entity(EntityType::Torpedo),
            position,
            appearance,
        )?;

        let force = if self.tutorial {
            [0.0, 0.0]
        } else {
            [0.0, self.config.physics.torpedo_force]
        };
        self.set_dynamics(id, 1.0, force);

        self.attach(&mut torpedo, Collision::new(CollisionKind::Torpedo));
        self.attach(&mut torpedo, velocity);
        self.attach(&mut torpedo, Distortion { distort: true });
        Ok(torpedo)
    }

    /// Makes an enemy missile at `position`, homing on the boat's current
    /// position along a curved path.
    ///
    /// # Errors
    ///
    /// [`SpawnError::PoolExhausted`] or [`SpawnError::SpriteUnavailable`].
    pub fn make_missile(&mut self, position: Position) -> SpawnResult<Entity> {
        let id = self.allocate_id()?;
        self.build_missile(id, position)
    }

    pub(crate) fn build_missile(&mut self, id: EntityId, position: Position) -> SpawnResult<Entity> {
        let (mut missile, _) = self.make(
            id,
            EntityType::Missile,
            SpriteSource::Entity(EntityType::Missile),
            position,
            Appearance::default(),
        )?;

        self.set_dynamics(id, self.config.physics.projectile_mass, [0.0, 0.0]);

        let target = *self.registry.components::<Position>().slot(self.boat.id());
        self.attach(&mut missile, Collision::new(CollisionKind::Missile));
        self.attach(&mut missile, Velocity::ZERO);
        self.attach(
            &mut missile,
            Pathing {
                start: position,
                target,
                bezier: true,
                ..Pathing::default()
            },
        );
        self.attach(&mut missile, Distortion { distort: true });
        Ok(missile)
    }

    /// Makes a boat missile at `position` flying straight to `target`.
    ///
    /// # Errors
    ///
    /// [`SpawnError::PoolExhausted`] or [`SpawnError::SpriteUnavailable`].
    pub fn make_boat_missile(&mut self, position: Position, target: Position) -> SpawnResult<Entity> {
        let id = self.allocate_id()?;
        let (mut missile, _) = self.make(
            id,
            EntityType::BoatMissile,
            SpriteSource::Entity(EntityType::BoatMissile),
            position,
            Appearance::animated(),
        )?;

        self.set_dynamics(id, self.config.physics.projectile_mass, [0.0, 0.0]);

        let frames = self.frames_of(id);
        self.attach(&mut missile, Collision::new(CollisionKind::BoatMissile));
        self.attach(&mut missile, Velocity::ZERO);
        self.attach(
            &mut missile,
            Pathing {
                start: position,
                target,
                bezier: false,
                increment: BOAT_MISSILE_PATH_INCREMENT,
                progress: 0.0,
            },
        );
        self.attach(&mut missile, Animation::new(AnimationMode::Loopback, frames, OnFinish::Nothing));
        self.attach(&mut missile, Distortion { distort: true });
        Ok(missile)
    }

    /// Makes a smoke particle at the top of the boat.
    ///
    /// # Errors
    ///
    /// [`SpawnError::PoolExhausted`] or [`SpawnError::SpriteUnavailable`].
    pub fn make_smoke(&mut self) -> SpawnResult<Entity> {
        let boat_id = self.boat.id();
        let boat_position = *self.registry.components::<Position>().slot(boat_id);
        let boat_scale = self.registry.components::<Physics>().slot(boat_id).scale;
        let top = self
            .registry
            .sprites()
            .get(boat_id)
            .map_or(boat_position.y, |sprite| {
                sprite.bounding_box(boat_scale, [boat_position.x, boat_position.y]).0[1]
            });

        let mut smoke = self.make_base(
            EntityType::Smoke,
            Position::new(boat_position.x, top),
            Appearance::scaled(0.05),
        )?;

        let id = smoke.id();
        self.set_dynamics(id, self.config.physics.smoke_mass, [1.0, -1.0]);
        self.attach(&mut smoke, Velocity::new(0.5, -0.5));
        self.attach(&mut smoke, Collision::new(CollisionKind::Smoke));
        Ok(smoke)
    }

    // =========================================================================
    // Store icons
    // =========================================================================

    /// Makes a store icon with `role` at `position`.
    ///
    /// # Panics
    ///
    /// Panics if `role` is [`StoreRole::None`].
    ///
    /// # Errors
    ///
    /// [`SpawnError::PoolExhausted`] or [`SpawnError::SpriteUnavailable`].
    pub fn make_store_icon(&mut self, position: Position, role: StoreRole) -> SpawnResult<Entity> {
        let kind = match role {
            StoreRole::Life => EntityType::BuyLives,
            StoreRole::BoatMissile => EntityType::BuyMissiles,
            StoreRole::End => EntityType::EndStore,
            StoreRole::None => panic!("store icon made without a role"),
        };

        let mut icon = self.make_base(kind, position, Appearance::default())?;
        self.set_dynamics(icon.id(), self.config.physics.immovable_mass, [0.0, 0.0]);

        self.attach(&mut icon, Collision::new(CollisionKind::StoreIcon));
        self.attach(&mut icon, Velocity::ZERO);
        self.attach(&mut icon, Store { role });
        Ok(icon)
    }

    /// Makes the store icon that sells a life.
    ///
    /// # Errors
    ///
    /// See [`make_store_icon`](Self::make_store_icon).
    pub fn make_buy_lives(&mut self, position: Position) -> SpawnResult<Entity> {
        self.make_store_icon(position, StoreRole::Life)
    }

    /// Makes the store icon that sells a boat missile.
    ///
    /// # Errors
    ///
    /// See [`make_store_icon`](Self::make_store_icon).
    pub fn make_buy_missiles(&mut self, position: Position) -> SpawnResult<Entity> {
        self.make_store_icon(position, StoreRole::BoatMissile)
    }

    /// Makes the store icon that leaves the store.
    ///
    /// # Errors
    ///
    /// See [`make_store_icon`](Self::make_store_icon).
    pub fn make_end_store(&mut self, position: Position) -> SpawnResult<Entity> {
        self.make_store_icon(position, StoreRole::End)
    }

    // =========================================================================
    // Text
    // =========================================================================

    /// Makes a single glyph.
    ///
    /// # Errors
    ///
    /// [`SpawnError::PoolExhausted`] or [`SpawnError::SpriteUnavailable`].
    pub fn make_character(
        &mut self,
        position: Position,
        character: char,
        font: Font,
        color: Color,
        size: u32,
    ) -> SpawnResult<Character> {
        let id = self.allocate_id()?;
        let glyph = GlyphKey { font, size, character };
        let appearance = Appearance {
            color,
            ..Appearance::default()
        };
        let (entity, texture) = self.make(id, EntityType::Character, SpriteSource::Glyph(glyph), position, appearance)?;

        Ok(Character {
            entity,
            glyph,
            advance: texture.advance,
        })
    }

    /// Makes and adds one character per glyph of `text`, left to right from
    /// `position`.
    ///
    /// On failure every character already made for the label is removed.
    ///
    /// # Errors
    ///
    /// The first [`SpawnError`] raised by a glyph.
    pub fn make_string_label(
        &mut self,
        position: Position,
        font: Font,
        color: Color,
        size: u32,
        text: &str,
    ) -> SpawnResult<StringLabel> {
        let mut label = StringLabel::default();
        let mut pen = position;

        for ch in text.chars() {
            match self.make_character(pen, ch, font, color, size) {
                Ok(character) => {
                    self.add_character(character);
                    label.push(character.entity.id());
                    pen.x += character.advance;
                }
                Err(err) => {
                    tracing::warn!(character = %ch, error = %err, "string label rolled back");
                    self.remove_string_label(&mut label);
                    return Err(err);
                }
            }
        }

        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::ecs::{HeadlessTextureLoader, Sprite};

    fn manager() -> EntityManager {
        EntityManager::headless(GameConfig {
            capacity: 64,
            ..GameConfig::default()
        })
    }

    #[test]
    fn test_bomb_components() {
        let mut manager = manager();
        let bomb = manager
            .make_bomb(Position::new(100.0, 50.0), Velocity::new(0.0, 5.0))
            .unwrap();
        let id = bomb.id();

        for kind in [
            ComponentKind::Sprite,
            ComponentKind::Position,
            ComponentKind::Velocity,
            ComponentKind::Collision,
        ] {
            assert!(bomb.has_component(kind), "{kind:?}");
        }
        assert!(!bomb.has_component(ComponentKind::Score));
        assert!(!bomb.has_component(ComponentKind::Distortion), "distortion is untracked");
        assert!(manager.components::<Distortion>().slot(id).distort);

        assert_eq!(*manager.components::<Position>().slot(id), Position::new(100.0, 50.0));
        assert_eq!(*manager.components::<Velocity>().slot(id), Velocity::new(0.0, 5.0));
        assert_eq!(manager.components::<Collision>().slot(id).kind, CollisionKind::Bomb);
        let physics = manager.components::<Physics>().slot(id);
        assert_eq!(physics.mass, 0.25);
        assert_eq!(physics.force, [0.0, 200.0]);
    }

    #[test]
    fn test_left_facing_submarine_is_mirrored() {
        let mut manager = manager();
        let sub = manager
            .make_submarine(Position::new(900.0, 400.0), Direction::Left, 40.0, SubmarineType::II, 20, Some(300.0))
            .unwrap();
        let id = sub.entity.id();

        assert_eq!(manager.components::<Velocity>().slot(id).vx, -40.0);
        assert_eq!(manager.components::<Physics>().slot(id).scale, [-1.0, 1.0]);
        assert_eq!(manager.components::<Physics>().slot(id).force, [-50.0, 0.0]);
        assert_eq!(manager.components::<Score>().slot(id).score, 20);
        assert_eq!(
            *manager.components::<Attack>().slot(id),
            Attack {
                weapon: Weapon::Torpedo,
                radius: 300.0
            }
        );
    }

    #[test]
    fn test_unarmed_submarine_has_no_attack() {
        let mut manager = manager();
        let sub = manager
            .make_submarine(Position::new(0.0, 400.0), Direction::Right, 40.0, SubmarineType::I, 10, None)
            .unwrap();
        assert!(!sub.entity.has_component(ComponentKind::Attack));
    }

    #[test]
    fn test_missile_submarine_radar_defaults_to_unbounded() {
        let mut manager = manager();
        let sub = manager
            .make_submarine(Position::new(0.0, 400.0), Direction::Right, 40.0, SubmarineType::III, 30, None)
            .unwrap();
        let attack = manager.components::<Attack>().slot(sub.entity.id());
        assert_eq!(attack.weapon, Weapon::Missile);
        assert_eq!(attack.radius, f32::MAX);
    }

    #[test]
    fn test_shallow_submarine_is_rejected_without_allocating() {
        let mut manager = manager();
        let available = manager.available_identifiers();

        let err = manager
            .make_submarine(Position::new(0.0, 10.0), Direction::Right, 40.0, SubmarineType::I, 10, None)
            .unwrap_err();

        assert!(matches!(err, SpawnError::InvalidPlacement { y, .. } if y == 10.0));
        assert_eq!(manager.available_identifiers(), available);
    }

    #[test]
    fn test_tutorial_zeroes_forces() {
        let mut manager = manager();
        manager.set_tutorial(true);

        let bomb = manager.make_bomb(Position::new(0.0, 0.0), Velocity::ZERO).unwrap();
        let fish = manager.make_fish(Position::new(0.0, 300.0), Direction::Left, 2.0).unwrap();
        let torpedo = manager.make_torpedo(Position::new(0.0, 300.0), Velocity::ZERO).unwrap();

        for id in [bomb.id(), fish.id(), torpedo.id()] {
            assert_eq!(manager.components::<Physics>().slot(id).force, [0.0, 0.0]);
        }
        assert_eq!(manager.components::<Rotation>().slot(torpedo.id()).radians, FRAC_PI_2);
    }

    #[test]
    fn test_explosion_is_animated_and_self_removing() {
        let mut manager = manager();
        let explosion = manager.make_explosion(Position::new(5.0, 5.0)).unwrap();
        let id = explosion.id();

        assert!(matches!(manager.sprites().get(id), Some(Sprite::Animated(_))));
        let animation = manager.components::<Animation>().slot(id);
        assert_eq!(animation.mode, AnimationMode::Autoterminating);
        assert_eq!(animation.frame_count, 15);
        assert_eq!(animation.on_finish, OnFinish::RemoveExplosion);
    }

    #[test]
    fn test_missile_targets_the_boat() {
        let mut manager = manager();
        manager.reset_boat().unwrap();
        let missile = manager.make_missile(Position::new(300.0, 600.0)).unwrap();

        let pathing = manager.components::<Pathing>().slot(missile.id());
        assert_eq!(pathing.target, Position::new(640.0, 155.0));
        assert!(pathing.bezier);
    }

    #[test]
    fn test_smoke_starts_on_top_of_the_boat() {
        let mut manager = manager();
        manager.reset_boat().unwrap();
        let smoke = manager.make_smoke().unwrap();

        let position = manager.components::<Position>().slot(smoke.id());
        assert_eq!(position.x, 640.0);
        assert_eq!(position.y, 155.0 - HeadlessTextureLoader::FRAME_SIZE / 2.0);
        assert_eq!(manager.components::<Physics>().slot(smoke.id()).scale, [0.05, 0.05]);
    }

    #[test]
    fn test_store_icon_roles() {
        let mut manager = manager();
        let life = manager.make_buy_lives(Position::new(400.0, 400.0)).unwrap();
        let end = manager.make_end_store(Position::new(800.0, 400.0)).unwrap();

        assert_eq!(manager.components::<Store>().slot(life.id()).role, StoreRole::Life);
        assert_eq!(manager.components::<Store>().slot(end.id()).role, StoreRole::End);
        assert_eq!(manager.components::<Collision>().slot(end.id()).kind, CollisionKind::StoreIcon);
    }

    #[test]
    fn test_sprite_failure_releases_identifier() {
        let loader = HeadlessTextureLoader::new().with_failure(SpriteSource::Entity(EntityType::Torpedo));
        let mut manager = EntityManager::new(
            GameConfig {
                capacity: 8,
                ..GameConfig::default()
            },
            Box::new(loader),
        );
        let available = manager.available_identifiers();

        let err = manager.make_torpedo(Position::new(0.0, 0.0), Velocity::ZERO).unwrap_err();
        assert!(matches!(err, SpawnError::SpriteUnavailable { kind: EntityType::Torpedo, .. }));
        assert_eq!(manager.available_identifiers(), available);
    }

    #[test]
    fn test_string_label_advances_pen() {
        let mut manager = manager();
        let label = manager
            .make_string_label(Position::new(10.0, 20.0), Font::SfMonoRegular, Color::BLACK, 10, "AB")
            .unwrap();

        let [a, b] = label.characters() else {
            panic!("expected two characters");
        };
        let advance = manager.characters().get(*a).unwrap().advance;
        assert_eq!(manager.components::<Position>().slot(*b).x, 10.0 + advance);
        assert_eq!(manager.characters().len(), 2);
    }

    #[test]
    fn test_string_label_rolls_back_on_failure() {
        let failing = SpriteSource::Glyph(GlyphKey {
            font: Font::SfMonoRegular,
            size: 10,
            character: 'C',
        });
        let mut manager = EntityManager::new(
            GameConfig {
                capacity: 16,
                ..GameConfig::default()
            },
            Box::new(HeadlessTextureLoader::new().with_failure(failing)),
        );
        let available = manager.available_identifiers();

        let result = manager.make_string_label(Position::new(0.0, 0.0), Font::SfMonoRegular, Color::BLACK, 10, "ABC");
        assert!(result.is_err());
        assert!(manager.characters().is_empty());
        assert_eq!(manager.available_identifiers(), available);
    }
}
