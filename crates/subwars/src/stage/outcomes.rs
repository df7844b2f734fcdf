//! Collision outcomes.
//!
//! Outcome callbacks only record intents. [`end_updates`] applies them in a
//! fixed order: the boat hit first (it can end the game), then explosions,
//! score and purchases while every reported entity is still live, then the
//! removals.
//!
//! [`end_updates`]: CollisionDelegate::end_updates

use std::collections::BTreeSet;

use subwars_core::ecs::{Position, Score, Store, StoreRole};
use subwars_core::manager::NumberLabelKind;
use subwars_core::{CollisionDelegate, EntityId, EntityManager};

use super::StageController;

/// Everything reported during one collision bracket.
#[derive(Debug, Default)]
pub(crate) struct PendingOutcomes {
    bombs: BTreeSet<EntityId>,
    boat_missiles: BTreeSet<EntityId>,
    missiles: BTreeSet<EntityId>,
    torpedoes: BTreeSet<EntityId>,
    submarines: BTreeSet<EntityId>,
    fishes: BTreeSet<EntityId>,
    smokes: BTreeSet<EntityId>,
    /// Entities whose position seeds a new explosion.
    explode_at: Vec<EntityId>,
    /// Submarines and fish whose score is credited.
    scored: BTreeSet<EntityId>,
    /// Store icons caught by an explosion, in report order.
    store_icons: Vec<EntityId>,
    boat_hit: bool,
}

impl PendingOutcomes {
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

impl StageController {
    fn apply_boat_hit(manager: &mut EntityManager) {
        let player = manager.player_mut();
        if player.boat_destroyed {
            return;
        }
        player.boat_destroyed = true;
        player.lives = player.lives.saturating_sub(1);
        let lives = player.lives;

        manager.disable_boat();
        if let Err(err) = manager.update_number_label(NumberLabelKind::Lives, u64::from(lives)) {
            tracing::warn!(error = %err, "failed to update the lives label");
        }

        tracing::info!(lives, "boat destroyed");
        if lives == 0 {
            manager.signal_game_over(true);
        }
    }

    fn spawn_explosions(&self, manager: &mut EntityManager) {
        let positions: Vec<Position> = self
            .pending
            .explode_at
            .iter()
            .map(|&id| *manager.components::<Position>().slot(id))
            .collect();

        for position in positions {
            match manager.make_explosion(position) {
                Ok(explosion) => manager.add_explosion(explosion),
                Err(err) => tracing::warn!(error = %err, "failed to spawn an explosion"),
            }
        }
    }

    fn credit_scores(&self, manager: &mut EntityManager) {
        for &id in &self.pending.scored {
            let live = manager.fishes().contains(id) || manager.all_submarine_ids().any(|sub| sub == id);
            if !live {
                continue;
            }
            let points = manager.components::<Score>().slot(id).score;
            manager.player_mut().award(points);
        }
    }

    fn apply_purchases(&mut self, manager: &mut EntityManager) {
        let icons = std::mem::take(&mut self.pending.store_icons);
        for id in icons {
            if !manager.store_icons().contains(id) {
                continue;
            }
            match manager.components::<Store>().slot(id).role {
                StoreRole::Life => self.buy_life(manager),
                StoreRole::BoatMissile => self.buy_missile(manager),
                StoreRole::End => self.exit_store(),
                StoreRole::None => {}
            }
        }
    }

    fn apply_removals(&mut self, manager: &mut EntityManager) {
        let pending = std::mem::take(&mut self.pending);

        let mut returned = 0;
        for id in pending.bombs {
            if manager.remove_bomb(id) {
                returned += 1;
            }
        }
        manager.player_mut().available_bombs += returned;

        for id in pending.boat_missiles {
            manager.remove_boat_missile(id);
        }
        for id in pending.missiles {
            manager.remove_missile(id);
        }
        for id in pending.torpedoes {
            manager.remove_torpedo(id);
        }
        for id in pending.submarines {
            if manager.remove_submarine(id) {
                self.submarines_destroyed += 1;
            }
        }
        for id in pending.fishes {
            if manager.remove_fish(id) {
                self.fish_on_screen = self.fish_on_screen.saturating_sub(1);
            }
        }
        for id in pending.smokes {
            manager.remove_smoke(id);
        }
    }
}

impl CollisionDelegate for StageController {
    fn begin_updates(&mut self) {
        self.pending.clear();
    }

    fn bomb_did_generate_explosion(&mut self, bomb: EntityId) {
        if self.pending.bombs.insert(bomb) {
            self.pending.explode_at.push(bomb);
        }
    }

    fn boat_missile_did_generate_explosion(&mut self, boat_missile: EntityId) {
        if self.pending.boat_missiles.insert(boat_missile) {
            self.pending.explode_at.push(boat_missile);
        }
    }

    fn explosion_did_collide_with_submarines(&mut self, submarines: &[EntityId]) {
        for &id in submarines {
            self.pending.submarines.insert(id);
            self.pending.scored.insert(id);
        }
    }

    fn explosion_did_collide_with_fishes(&mut self, fishes: &[EntityId]) {
        for &id in fishes {
            self.pending.fishes.insert(id);
            self.pending.scored.insert(id);
        }
    }

    fn explosion_did_collide_with_missiles(&mut self, missiles: &[EntityId]) {
        for &id in missiles {
            if self.pending.missiles.insert(id) {
                self.pending.explode_at.push(id);
            }
        }
    }

    fn explosion_did_collide_with_torpedoes(&mut self, torpedoes: &[EntityId]) {
        for &id in torpedoes {
            if self.pending.torpedoes.insert(id) {
                self.pending.explode_at.push(id);
            }
        }
    }

    fn explosion_did_collide_with_store_icons(&mut self, store_icons: &[EntityId]) {
        self.pending.store_icons.extend_from_slice(store_icons);
    }

    fn torpedo_did_collide_with_boat(&mut self, torpedo: EntityId, boat: EntityId) {
        self.pending.torpedoes.insert(torpedo);
        self.projectile_did_collide_with_boat(boat);
    }

    fn missile_did_collide_with_boat(&mut self, missile: EntityId, boat: EntityId) {
        self.pending.missiles.insert(missile);
        self.projectile_did_collide_with_boat(boat);
    }

    fn submarine_did_move_out_of_screen(&mut self, submarine: EntityId) {
        self.pending.submarines.insert(submarine);
    }

    fn bomb_did_move_out_of_screen(&mut self, bomb: EntityId) {
        self.pending.bombs.insert(bomb);
    }

    fn missile_did_move_out_of_screen(&mut self, missile: EntityId) {
        self.pending.missiles.insert(missile);
    }

    fn torpedo_did_move_out_of_ocean_surface(&mut self, torpedo: EntityId) {
        self.pending.torpedoes.insert(torpedo);
    }

    fn smoke_did_move_out_of_screen(&mut self, smoke: EntityId) {
        self.pending.smokes.insert(smoke);
    }

    fn end_updates(&mut self, manager: &mut EntityManager) {
        if self.pending.boat_hit {
            Self::apply_boat_hit(manager);
        }

        if manager.check_game_over() {
            self.pending.clear();
            return;
        }

        self.spawn_explosions(manager);
        self.credit_scores(manager);
        self.apply_purchases(manager);
        self.apply_removals(manager);

        if let Err(err) = manager.sync_player_labels() {
            tracing::warn!(error = %err, "failed to refresh the player labels");
        }
    }
}

impl StageController {
    fn projectile_did_collide_with_boat(&mut self, boat: EntityId) {
        if !self.pending.boat_hit {
            self.pending.boat_hit = true;
            self.pending.explode_at.push(boat);
        }
    }
}
