//! # Entity Manager
//!
//! The central owner of all component storage and all live collections.
//!
//! ## Lifecycle
//!
//! ```text
//! make_*  ──> Entity (components populated, not yet visible)
//!   │
//! add_*   ──> live collection upsert + did-add broadcast
//!   │
//! remove_* ─> will-remove broadcast, component teardown,
//!             identifier released, collection entry dropped
//! ```
//!
//! Factories never add; adding is a separate step so callers can finish
//! configuring an entity before any system sees it.

mod collections;
mod factory;
mod snapshot;
mod ui;

pub use collections::{Character, LiveCollection, StringLabel, Submarine, SubmarineType, Tracked};
pub use factory::Appearance;
pub use snapshot::SaveSnapshot;
pub use ui::{NumberLabel, NumberLabelKind};

use crate::config::GameConfig;
use crate::ecs::{
    Component, ComponentKind, ComponentRegistry, ComponentStorage, DelegateEvent, DelegateList,
    Distortion, Entity, EntityId, EntityManagerDelegate, FreeList, HeadlessTextureLoader,
    OnFinish, Animation, Player, Position, SpriteCache, SpriteStorage, TextureLoader,
};
use crate::error::{SpawnError, SpawnResult};
use std::cell::RefCell;
use std::rc::Rc;

/// Owner of every component array, the identifier pool and the per-kind
/// live collections.
///
/// # Example
///
/// ```rust,ignore
/// let mut manager = EntityManager::headless(GameConfig::default());
///
/// let bomb = manager.make_bomb(Position::new(100.0, 50.0), Velocity::new(0.0, 5.0))?;
/// manager.add_bomb(bomb);
/// assert!(manager.bombs().contains(bomb.id()));
///
/// manager.remove_bomb(bomb.id());
/// ```
pub struct EntityManager {
    config: GameConfig,
    registry: ComponentRegistry,
    free_list: FreeList,
    sprite_cache: SpriteCache,
    delegates: DelegateList,
    tutorial: bool,

    // =========================================================================
    // Live collections
    // =========================================================================
    boat: Entity,
    submarines: [LiveCollection<Submarine>; 3],
    fishes: LiveCollection<Entity>,
    bombs: LiveCollection<Entity>,
    torpedoes: LiveCollection<Entity>,
    missiles: LiveCollection<Entity>,
    boat_missiles: LiveCollection<Entity>,
    explosions: LiveCollection<Entity>,
    smokes: LiveCollection<Entity>,
    store_icons: LiveCollection<Entity>,
    characters: LiveCollection<Character>,

    ui: ui::UiState,
    game_over: bool,
    game_running: bool,
}

impl EntityManager {
    /// Creates a manager with all storage pre-allocated.
    ///
    /// # Panics
    ///
    /// Panics if `config.capacity` is below 2. Use
    /// [`GameConfig::validate`] to check untrusted configs first.
    #[must_use]
    pub fn new(config: GameConfig, loader: Box<dyn TextureLoader>) -> Self {
        let capacity = config.capacity;
        let mut registry = ComponentRegistry::new(capacity);
        *registry.player_mut() = Player {
            money: config.player.starting_money,
            lives: config.player.starting_lives,
            missiles: config.player.starting_missiles,
            available_bombs: config.player.available_bombs,
            ..Player::default()
        };
        let ui = ui::UiState::new(&config);

        tracing::info!(capacity, "entity manager created");

        Self {
            config,
            registry,
            free_list: FreeList::new(capacity),
            sprite_cache: SpriteCache::new(loader),
            delegates: DelegateList::new(),
            tutorial: false,
            boat: Entity::new(),
            submarines: Default::default(),
            fishes: LiveCollection::new(),
            bombs: LiveCollection::new(),
            torpedoes: LiveCollection::new(),
            missiles: LiveCollection::new(),
            boat_missiles: LiveCollection::new(),
            explosions: LiveCollection::new(),
            smokes: LiveCollection::new(),
            store_icons: LiveCollection::new(),
            characters: LiveCollection::new(),
            ui,
            game_over: false,
            game_running: true,
        }
    }

    /// Creates a manager backed by a [`HeadlessTextureLoader`].
    #[must_use]
    pub fn headless(config: GameConfig) -> Self {
        Self::new(config, Box::new(HeadlessTextureLoader::new()))
    }

    /// The configuration the manager was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Number of slots in every component array.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.free_list.capacity()
    }

    /// Identifiers that can still be allocated.
    #[inline]
    #[must_use]
    pub fn available_identifiers(&self) -> usize {
        self.free_list.available()
    }

    /// Textures loaded so far.
    #[inline]
    #[must_use]
    pub fn sprite_cache(&self) -> &SpriteCache {
        &self.sprite_cache
    }

    // =========================================================================
    // Component access
    // =========================================================================

    /// Read-only view of every component array.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// The typed array for component `T`.
    #[inline]
    #[must_use]
    pub fn components<T: Component>(&self) -> &ComponentStorage<T> {
        self.registry.components::<T>()
    }

    /// The typed array for component `T`, for in-place updates by systems.
    #[inline]
    pub fn components_mut<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        self.registry.components_mut::<T>()
    }

    /// The indirect sprite array.
    #[inline]
    #[must_use]
    pub fn sprites(&self) -> &SpriteStorage {
        self.registry.sprites()
    }

    /// The player record.
    #[inline]
    #[must_use]
    pub fn player(&self) -> &Player {
        self.registry.player()
    }

    /// The player record, mutably.
    #[inline]
    pub fn player_mut(&mut self) -> &mut Player {
        self.registry.player_mut()
    }

    /// The position array as raw bytes, for upload by a renderer.
    #[must_use]
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.registry.components::<Position>().as_slice())
    }

    // =========================================================================
    // Tutorial
    // =========================================================================

    /// While set, newly made bombs, submarines, fish and torpedoes get no
    /// external force.
    pub fn set_tutorial(&mut self, active: bool) {
        self.tutorial = active;
    }

    /// Whether tutorial mode is active.
    #[must_use]
    pub fn is_tutorial(&self) -> bool {
        self.tutorial
    }

    // =========================================================================
    // Delegates
    // =========================================================================

    /// Registers a lifecycle delegate after those already registered.
    ///
    /// The manager holds the delegate weakly and never drops it.
    pub fn register_delegate<D: EntityManagerDelegate + 'static>(&mut self, delegate: &Rc<RefCell<D>>) {
        self.delegates.register(delegate);
    }

    /// Registers several delegates, preserving their order.
    pub fn register_delegates(&mut self, delegates: &[Rc<RefCell<dyn EntityManagerDelegate>>]) {
        for delegate in delegates {
            self.delegates.register_dyn(delegate);
        }
    }

    /// Number of live delegates.
    #[must_use]
    pub fn delegate_count(&self) -> usize {
        self.delegates.len()
    }

    fn notify(&mut self, event: DelegateEvent, entity: &Entity) {
        self.delegates.notify(event, entity, &self.registry);
    }

    // =========================================================================
    // Generic add / remove
    // =========================================================================

    /// Broadcasts did-add for an entity that is not kept in a live
    /// collection (the ocean, UI panels, indicator icons).
    pub fn add_entity(&mut self, entity: &Entity) {
        tracing::debug!(id = %entity.id(), "entity added");
        self.notify(DelegateEvent::DidAdd, entity);
    }

    /// Tears down an entity: will-remove broadcast, every attached component
    /// reset, identifier released, distortion flag cleared.
    ///
    /// Callers must drop the entity from its live collection afterwards.
    pub(crate) fn remove_entity(&mut self, entity: &Entity) {
        let id = entity.id();
        if id.is_null() {
            return;
        }

        self.notify(DelegateEvent::WillRemove, entity);

        let mut components = entity.components();
        for kind in entity.components().iter() {
            self.registry.reset(kind, id);
            components.remove(kind);
        }
        debug_assert!(components.is_empty());

        self.free_list.release(id);
        *self.registry.components_mut::<Distortion>().slot_mut(id) = Distortion::default();

        tracing::debug!(id = %id, "entity removed");
    }

    fn allocate_id(&mut self) -> SpawnResult<EntityId> {
        let id = self.free_list.allocate();
        if id.is_null() {
            tracing::warn!(capacity = self.capacity(), "identifier pool exhausted");
            return Err(SpawnError::PoolExhausted);
        }
        Ok(id)
    }

    // =========================================================================
    // Runtime attach / detach
    // =========================================================================

    /// Attaches `component` to a live entity at runtime.
    ///
    /// The value is written into the backing array first, then the bit of a
    /// tracked kind is set on `entity` (and on the copy held by its live
    /// collection), then did-update is broadcast.
    pub fn on_component_added<C: Component>(&mut self, entity: &mut Entity, component: C) {
        let id = entity.id();
        *self.registry.components_mut::<C>().slot_mut(id) = component;
        if C::KIND.is_tracked() {
            entity.register_component(C::KIND);
        }
        self.refresh_tracked(entity);
        self.notify(DelegateEvent::DidUpdate, entity);
    }

    /// Detaches the component of `kind` from a live entity at runtime.
    ///
    /// The slot is reset, the bit cleared, and did-update broadcast.
    pub fn on_component_removed(&mut self, entity: &mut Entity, kind: ComponentKind) {
        let id = entity.id();
        self.registry.reset(kind, id);
        entity.unregister_component(kind);
        self.refresh_tracked(entity);
        self.notify(DelegateEvent::DidUpdate, entity);
    }

    /// Runs the completion action of a finished autoterminating animation.
    ///
    /// # Returns
    ///
    /// `true` if the action removed the entity.
    pub fn animation_did_finish(&mut self, id: EntityId) -> bool {
        let action = self
            .registry
            .components::<Animation>()
            .get(id.index())
            .map_or(OnFinish::Nothing, |animation| animation.on_finish);

        match action {
            OnFinish::Nothing => false,
            OnFinish::RemoveExplosion => self.remove_explosion(id),
        }
    }
}

impl std::fmt::Debug for EntityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityManager")
            .field("capacity", &self.capacity())
            .field("available", &self.available_identifiers())
            .field("delegates", &self.delegates)
            .field("tutorial", &self.tutorial)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{CollisionKind, Collision, Score, Velocity};

    fn manager(capacity: usize) -> EntityManager {
        EntityManager::headless(GameConfig {
            capacity,
            ..GameConfig::default()
        })
    }

    #[derive(Default)]
    struct Counter {
        added: usize,
        removed: usize,
        updated: usize,
    }

    impl EntityManagerDelegate for Counter {
        fn did_add_entity(&mut self, _entity: &Entity, _components: &ComponentRegistry) {
            self.added += 1;
        }

        fn will_remove_entity(&mut self, entity: &Entity, components: &ComponentRegistry) {
            // Components must still be intact when the notification arrives.
            assert!(components.sprites().get(entity.id()).is_some());
            self.removed += 1;
        }

        fn did_update_entity(&mut self, _entity: &Entity, _components: &ComponentRegistry) {
            self.updated += 1;
        }
    }

    #[test]
    fn test_runtime_attach_and_detach() {
        let mut manager = manager(16);
        let counter = Rc::new(RefCell::new(Counter::default()));
        manager.register_delegate(&counter);

        let mut fish = manager
            .make_fish(Position::new(10.0, 300.0), crate::ecs::Direction::Right, 3.0)
            .unwrap();
        manager.add_fish(fish);

        assert!(fish.has_component(ComponentKind::Score));
        manager.on_component_removed(&mut fish, ComponentKind::Score);
        assert!(!fish.has_component(ComponentKind::Score));
        assert_eq!(*manager.components::<Score>().slot(fish.id()), Score::default());
        assert!(!manager.fishes().get(fish.id()).unwrap().has_component(ComponentKind::Score));

        manager.on_component_added(&mut fish, Score { score: 9 });
        assert!(manager.fishes().get(fish.id()).unwrap().has_component(ComponentKind::Score));
        assert_eq!(manager.components::<Score>().slot(fish.id()).score, 9);

        let counter = counter.borrow();
        assert_eq!(counter.added, 1);
        assert_eq!(counter.updated, 2);
    }

    #[test]
    fn test_removal_resets_every_attached_slot() {
        let mut manager = manager(16);
        let counter = Rc::new(RefCell::new(Counter::default()));
        manager.register_delegate(&counter);

        let bomb = manager
            .make_bomb(Position::new(100.0, 50.0), Velocity::new(0.0, 5.0))
            .unwrap();
        manager.add_bomb(bomb);
        let id = bomb.id();

        assert!(manager.components::<Distortion>().slot(id).distort);
        assert!(manager.remove_bomb(id));

        assert!(manager.sprites().get(id).is_none());
        assert_eq!(*manager.components::<Velocity>().slot(id), Velocity::default());
        assert_eq!(*manager.components::<Collision>().slot(id), Collision::default());
        assert_eq!(manager.components::<Collision>().slot(id).kind, CollisionKind::None);
        assert!(!manager.components::<Distortion>().slot(id).distort);
        assert_eq!(counter.borrow().removed, 1);
    }

    #[test]
    fn test_position_bytes_cover_every_slot() {
        let manager = manager(16);
        assert_eq!(manager.position_bytes().len(), 16 * std::mem::size_of::<Position>());
    }

    #[test]
    fn test_finished_explosion_removes_itself() {
        let mut manager = manager(16);
        let explosion = manager.make_explosion(Position::new(5.0, 5.0)).unwrap();
        manager.add_explosion(explosion);

        assert!(manager.animation_did_finish(explosion.id()));
        assert!(manager.explosions().is_empty());
        assert!(!manager.animation_did_finish(explosion.id()));
    }
}
