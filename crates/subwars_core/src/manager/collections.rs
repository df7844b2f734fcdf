//! Per-kind live collections and the add/remove operations over them.

use super::EntityManager;
use crate::ecs::{Entity, EntityId, EntityType, GlyphKey, Weapon};
use std::collections::BTreeMap;

/// A handle that can be kept in a [`LiveCollection`].
pub trait Tracked {
    /// The underlying entity handle.
    fn entity(&self) -> &Entity;

    /// The underlying entity handle, mutably.
    fn entity_mut(&mut self) -> &mut Entity;

    /// Shortcut for `self.entity().id()`.
    fn id(&self) -> EntityId {
        self.entity().id()
    }
}

impl Tracked for Entity {
    fn entity(&self) -> &Entity {
        self
    }

    fn entity_mut(&mut self) -> &mut Entity {
        self
    }
}

/// Mapping from identifier to the last handle added under it.
///
/// Membership answers "is this entity alive, and which kind is it".
/// Adding an identifier that is already present replaces the stored handle.
#[derive(Clone, Debug)]
pub struct LiveCollection<H> {
    entries: BTreeMap<EntityId, H>,
}

impl<H> Default for LiveCollection<H> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<H: Tracked> LiveCollection<H> {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the handle for its identifier.
    ///
    /// # Returns
    ///
    /// The handle previously stored under the same identifier.
    pub fn upsert(&mut self, handle: H) -> Option<H> {
        self.entries.insert(handle.id(), handle)
    }

    /// Removes the handle for `id`.
    pub fn remove(&mut self, id: EntityId) -> Option<H> {
        self.entries.remove(&id)
    }

    /// The stored handle for `id`.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&H> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut H> {
        self.entries.get_mut(&id)
    }

    /// Checks membership.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the member identifiers in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entries.keys().copied()
    }

    /// Iterates the stored handles in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &H> {
        self.entries.values()
    }

    /// The lowest member identifier, if any.
    #[must_use]
    pub fn any_id(&self) -> Option<EntityId> {
        self.entries.keys().next().copied()
    }

    /// Copies the bitmask of `entity` onto the stored handle with the same
    /// identifier.
    ///
    /// # Returns
    ///
    /// `true` if the entity is a member.
    pub fn refresh(&mut self, entity: &Entity) -> bool {
        match self.entries.get_mut(&entity.id()) {
            Some(handle) => {
                *handle.entity_mut() = *entity;
                true
            }
            None => false,
        }
    }
}

/// Submarine variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubmarineType {
    /// Unarmed.
    I,
    /// Fires torpedoes.
    II,
    /// Fires homing missiles.
    III,
}

impl SubmarineType {
    /// All variants, in collection order.
    pub const ALL: [Self; 3] = [Self::I, Self::II, Self::III];

    /// Index of the variant's live collection.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::I => 0,
            Self::II => 1,
            Self::III => 2,
        }
    }

    /// The texture key for this variant.
    #[must_use]
    pub const fn entity_type(self) -> EntityType {
        match self {
            Self::I => EntityType::SubmarineI,
            Self::II => EntityType::SubmarineII,
            Self::III => EntityType::SubmarineIII,
        }
    }

    /// The weapon this variant attacks with.
    #[must_use]
    pub const fn weapon(self) -> Weapon {
        match self {
            Self::I => Weapon::None,
            Self::II => Weapon::Torpedo,
            Self::III => Weapon::Missile,
        }
    }
}

/// A submarine: entity handle plus its variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Submarine {
    /// The entity.
    pub entity: Entity,
    /// Which variant this is.
    pub sub_type: SubmarineType,
}

impl Tracked for Submarine {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

/// A single text glyph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Character {
    /// The entity.
    pub entity: Entity,
    /// Font, size and character currently rendered.
    pub glyph: GlyphKey,
    /// Horizontal pen advance in pixels.
    pub advance: f32,
}

impl Tracked for Character {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

/// A line of text: the ordered character entities that render it.
///
/// The label itself owns no identifier; each glyph is a character entity in
/// the manager's character collection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringLabel {
    characters: Vec<EntityId>,
}

impl StringLabel {
    /// Character identifiers, left to right.
    #[must_use]
    pub fn characters(&self) -> &[EntityId] {
        &self.characters
    }

    /// Checks whether the label has been made.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub(crate) fn push(&mut self, id: EntityId) {
        self.characters.push(id);
    }

    pub(crate) fn take(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.characters)
    }
}

macro_rules! live_collection_ops {
    ($($field:ident: $add:ident, $remove:ident, $get:ident, $name:literal;)*) => {
        $(
            #[doc = concat!("Adds ", $name, " (upsert) and broadcasts did-add.")]
            pub fn $add(&mut self, entity: Entity) {
                self.$field.upsert(entity);
                self.add_entity(&entity);
            }

            #[doc = concat!("Removes ", $name, "; a miss is a no-op.")]
            ///
            /// # Returns
            ///
            /// `true` if an entity was removed.
            pub fn $remove(&mut self, id: EntityId) -> bool {
                let Some(entity) = self.$field.get(id).copied() else {
                    return false;
                };
                self.remove_entity(&entity);
                self.$field.remove(id);
                true
            }

            #[doc = concat!("Live collection of ", $name, "s.")]
            #[must_use]
            pub fn $get(&self) -> &LiveCollection<Entity> {
                &self.$field
            }
        )*
    };
}

impl EntityManager {
    live_collection_ops! {
        fishes: add_fish, remove_fish, fishes, "a fish";
        bombs: add_bomb, remove_bomb, bombs, "a bomb";
        torpedoes: add_torpedo, remove_torpedo, torpedoes, "a torpedo";
        missiles: add_missile, remove_missile, missiles, "an enemy missile";
        boat_missiles: add_boat_missile, remove_boat_missile, boat_missiles, "a boat missile";
        explosions: add_explosion, remove_explosion, explosions, "an explosion";
        smokes: add_smoke, remove_smoke, smokes, "a smoke particle";
        store_icons: add_store_icon, remove_store_icon, store_icons, "a store icon";
    }

    /// Adds a submarine to its variant's collection and broadcasts did-add.
    pub fn add_submarine(&mut self, submarine: Submarine) {
        self.submarines[submarine.sub_type.index()].upsert(submarine);
        self.add_entity(&submarine.entity);
    }

    /// Removes a submarine of any variant; a miss is a no-op.
    ///
    /// # Returns
    ///
    /// `true` if a submarine was removed.
    pub fn remove_submarine(&mut self, id: EntityId) -> bool {
        let Some(submarine) = self
            .submarines
            .iter()
            .find_map(|collection| collection.get(id).copied())
        else {
            return false;
        };

        self.remove_entity(&submarine.entity);
        self.submarines[submarine.sub_type.index()].remove(id);
        true
    }

    /// Live collection of one submarine variant.
    #[must_use]
    pub fn submarines(&self, sub_type: SubmarineType) -> &LiveCollection<Submarine> {
        &self.submarines[sub_type.index()]
    }

    /// Iterates every live submarine identifier across variants.
    pub fn all_submarine_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.submarines.iter().flat_map(LiveCollection::ids)
    }

    /// Adds a character glyph and broadcasts did-add.
    pub fn add_character(&mut self, character: Character) {
        self.characters.upsert(character);
        self.add_entity(&character.entity);
    }

    /// Removes a character glyph; a miss is a no-op.
    pub fn remove_character(&mut self, id: EntityId) -> bool {
        let Some(character) = self.characters.get(id).copied() else {
            return false;
        };
        self.remove_entity(&character.entity);
        self.characters.remove(id);
        true
    }

    /// Live collection of character glyphs.
    #[must_use]
    pub fn characters(&self) -> &LiveCollection<Character> {
        &self.characters
    }

    /// Removes every character of `label` and empties it.
    pub fn remove_string_label(&mut self, label: &mut StringLabel) {
        for id in label.take() {
            self.remove_character(id);
        }
    }

    /// Removes every spawnable entity: fish, bombs, torpedoes, missiles,
    /// boat missiles, explosions, submarines, smoke and store icons.
    ///
    /// Each removed bomb is returned to the player's available bombs. The
    /// boat, the ocean and the UI are left in place.
    pub fn remove_all_entities(&mut self) {
        while let Some(id) = self.fishes.any_id() {
            self.remove_fish(id);
        }
        while let Some(id) = self.bombs.any_id() {
            if self.remove_bomb(id) {
                self.player_mut().available_bombs += 1;
            }
        }
        while let Some(id) = self.torpedoes.any_id() {
            self.remove_torpedo(id);
        }
        while let Some(id) = self.missiles.any_id() {
            self.remove_missile(id);
        }
        while let Some(id) = self.boat_missiles.any_id() {
            self.remove_boat_missile(id);
        }
        while let Some(id) = self.explosions.any_id() {
            self.remove_explosion(id);
        }
        for sub_type in SubmarineType::ALL {
            while let Some(id) = self.submarines[sub_type.index()].any_id() {
                self.remove_submarine(id);
            }
        }
        while let Some(id) = self.smokes.any_id() {
            self.remove_smoke(id);
        }
        while let Some(id) = self.store_icons.any_id() {
            self.remove_store_icon(id);
        }

        tracing::debug!(available = self.available_identifiers(), "all entities removed");
    }

    /// Number of entities across all spawnable collections.
    #[must_use]
    pub fn spawned_count(&self) -> usize {
        self.submarines.iter().map(LiveCollection::len).sum::<usize>()
            + self.fishes.len()
            + self.bombs.len()
            + self.torpedoes.len()
            + self.missiles.len()
            + self.boat_missiles.len()
            + self.explosions.len()
            + self.smokes.len()
            + self.store_icons.len()
    }

    /// Copies the bitmask of `entity` onto whichever stored handle shares
    /// its identifier.
    pub(crate) fn refresh_tracked(&mut self, entity: &Entity) {
        if self.boat.id() == entity.id() {
            self.boat = *entity;
            return;
        }

        let refreshed = self.fishes.refresh(entity)
            || self.bombs.refresh(entity)
            || self.torpedoes.refresh(entity)
            || self.missiles.refresh(entity)
            || self.boat_missiles.refresh(entity)
            || self.explosions.refresh(entity)
            || self.smokes.refresh(entity)
            || self.store_icons.refresh(entity)
            || self.characters.refresh(entity)
            || self.submarines.iter_mut().any(|collection| collection.refresh(entity));

        if !refreshed {
            tracing::trace!(id = %entity.id(), "component change on untracked entity");
        }
    }
}
