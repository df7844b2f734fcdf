//! # Delegate Protocol
//!
//! Two listener interfaces make up the core's callback contract:
//!
//! - [`EntityManagerDelegate`]: entity lifecycle (did-add, will-remove,
//!   did-update), broadcast by the manager to every registered system.
//! - [`CollisionDelegate`]: collision outcomes reported inside a
//!   `begin_updates` / `end_updates` bracket.
//!
//! Outcome callbacks receive identifiers only. Nothing in the bracket can
//! reach the manager until [`CollisionDelegate::end_updates`], which is the
//! one place structural changes are applied.

use super::entity::{Entity, EntityId};
use super::registry::ComponentRegistry;
use crate::manager::EntityManager;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Entity lifecycle listener.
///
/// All methods default to doing nothing so a system implements only the
/// notifications it cares about. A delegate observes; it cannot veto.
pub trait EntityManagerDelegate {
    /// An entity became globally visible.
    fn did_add_entity(&mut self, _entity: &Entity, _components: &ComponentRegistry) {}

    /// An entity is about to be torn down. Its components are still intact.
    fn will_remove_entity(&mut self, _entity: &Entity, _components: &ComponentRegistry) {}

    /// A component was attached to or detached from a live entity.
    fn did_update_entity(&mut self, _entity: &Entity, _components: &ComponentRegistry) {}
}

/// Which lifecycle notification is being broadcast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelegateEvent {
    /// See [`EntityManagerDelegate::did_add_entity`].
    DidAdd,
    /// See [`EntityManagerDelegate::will_remove_entity`].
    WillRemove,
    /// See [`EntityManagerDelegate::did_update_entity`].
    DidUpdate,
}

/// Ordered, non-owning list of lifecycle delegates.
///
/// Delegates are held weakly: dropping the last strong reference
/// unregisters a delegate. Registration order is the broadcast order.
#[derive(Default)]
pub struct DelegateList {
    delegates: Vec<Weak<RefCell<dyn EntityManagerDelegate>>>,
}

impl DelegateList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a delegate.
    pub fn register<D: EntityManagerDelegate + 'static>(&mut self, delegate: &Rc<RefCell<D>>) {
        let strong: Rc<RefCell<dyn EntityManagerDelegate>> = delegate.clone();
        self.delegates.push(Rc::downgrade(&strong));
    }

    /// Appends an already type-erased delegate.
    pub fn register_dyn(&mut self, delegate: &Rc<RefCell<dyn EntityManagerDelegate>>) {
        self.delegates.push(Rc::downgrade(delegate));
    }

    /// Number of delegates still alive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.delegates
            .iter()
            .filter(|delegate| delegate.strong_count() > 0)
            .count()
    }

    /// Checks whether no live delegate is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Broadcasts `event` for `entity` to every delegate in registration
    /// order.
    ///
    /// Best effort: a delegate that is already mutably borrowed (it is the
    /// caller further up the stack) is skipped with a warning, and dropped
    /// delegates are pruned.
    pub fn notify(&mut self, event: DelegateEvent, entity: &Entity, components: &ComponentRegistry) {
        self.delegates.retain(|delegate| delegate.strong_count() > 0);

        for (index, weak) in self.delegates.iter().enumerate() {
            let Some(delegate) = weak.upgrade() else {
                continue;
            };
            let Ok(mut delegate) = delegate.try_borrow_mut() else {
                tracing::warn!(
                    delegate = index,
                    id = %entity.id(),
                    ?event,
                    "delegate busy, notification skipped"
                );
                continue;
            };

            match event {
                DelegateEvent::DidAdd => delegate.did_add_entity(entity, components),
                DelegateEvent::WillRemove => delegate.will_remove_entity(entity, components),
                DelegateEvent::DidUpdate => delegate.did_update_entity(entity, components),
            }
        }
    }
}

impl std::fmt::Debug for DelegateList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateList")
            .field("registered", &self.delegates.len())
            .field("alive", &self.len())
            .finish()
    }
}

/// Collision outcome listener.
///
/// The collision system calls [`begin_updates`](Self::begin_updates), then
/// any number of outcome methods while it scans component arrays, then
/// [`end_updates`](Self::end_updates). Outcome methods must only record
/// intents; removals and spawns happen in `end_updates`.
pub trait CollisionDelegate {
    /// Starts a bracket; clears every pending-removal set.
    fn begin_updates(&mut self);

    /// A bomb hit something and blows up.
    fn bomb_did_generate_explosion(&mut self, _bomb: EntityId) {}

    /// A boat missile reached its target and blows up.
    fn boat_missile_did_generate_explosion(&mut self, _boat_missile: EntityId) {}

    /// An explosion caught these submarines.
    fn explosion_did_collide_with_submarines(&mut self, _submarines: &[EntityId]) {}

    /// An explosion caught these fish.
    fn explosion_did_collide_with_fishes(&mut self, _fishes: &[EntityId]) {}

    /// An explosion caught these enemy missiles.
    fn explosion_did_collide_with_missiles(&mut self, _missiles: &[EntityId]) {}

    /// An explosion caught these torpedoes.
    fn explosion_did_collide_with_torpedoes(&mut self, _torpedoes: &[EntityId]) {}

    /// An explosion caught these store icons.
    fn explosion_did_collide_with_store_icons(&mut self, _store_icons: &[EntityId]) {}

    /// A torpedo hit the boat.
    fn torpedo_did_collide_with_boat(&mut self, _torpedo: EntityId, _boat: EntityId) {}

    /// A missile hit the boat.
    fn missile_did_collide_with_boat(&mut self, _missile: EntityId, _boat: EntityId) {}

    /// A submarine left the screen sideways.
    fn submarine_did_move_out_of_screen(&mut self, _submarine: EntityId) {}

    /// A bomb left the bottom of the screen.
    fn bomb_did_move_out_of_screen(&mut self, _bomb: EntityId) {}

    /// A missile left the top of the screen.
    fn missile_did_move_out_of_screen(&mut self, _missile: EntityId) {}

    /// A torpedo rose past the ocean surface.
    fn torpedo_did_move_out_of_ocean_surface(&mut self, _torpedo: EntityId) {}

    /// A smoke particle left the top of the screen.
    fn smoke_did_move_out_of_screen(&mut self, _smoke: EntityId) {}

    /// Ends the bracket; applies every recorded intent exactly once.
    fn end_updates(&mut self, manager: &mut EntityManager);
}
