//! # Collision System
//!
//! Finds overlaps with a uniform spatial grid and reports them to a
//! [`CollisionDelegate`] inside one `begin_updates` / `end_updates`
//! bracket per frame.
//!
//! ```text
//! bodies ──> grid cells ──> candidate pairs ──> overlap test ──> outcomes
//!   │                                                              │
//!   └──> screen bounds ────────────────────────────────────────────┘
//! ```
//!
//! The scan only reads the scene. The one thing it writes is collision
//! bookkeeping: the cells each body occupies, and the store icons an
//! explosion has already triggered (so a lingering explosion buys once).

use std::collections::{BTreeMap, BTreeSet, HashMap};

use subwars_core::ecs::{Collision, CollisionKind, Pathing, Physics, Position, Velocity};
use subwars_core::{CollisionDelegate, EntityId, EntityManager};

/// Side of one grid cell, in pixels.
pub const DEFAULT_CELL_SIZE: f32 = 64.0;

/// Anything that can run a collision bracket over the scene.
pub trait CollisionDetector {
    /// Scans `manager`, reporting to `delegate` between `begin_updates` and
    /// `end_updates`.
    fn detect(&mut self, manager: &mut EntityManager, delegate: &mut dyn CollisionDelegate);
}

/// A collidable entity for one scan.
#[derive(Clone, Copy, Debug)]
struct Body {
    id: EntityId,
    kind: CollisionKind,
    min: [f32; 2],
    max: [f32; 2],
}

impl Body {
    fn overlaps(&self, other: &Body) -> bool {
        self.min[0] < other.max[0]
            && self.max[0] > other.min[0]
            && self.min[1] < other.max[1]
            && self.max[1] > other.min[1]
    }
}

/// What one explosion caught.
#[derive(Debug, Default)]
struct ExplosionHits {
    submarines: BTreeSet<EntityId>,
    fishes: BTreeSet<EntityId>,
    missiles: BTreeSet<EntityId>,
    torpedoes: BTreeSet<EntityId>,
    store_icons: BTreeSet<EntityId>,
}

/// Outcomes of one scan, deduplicated and in identifier order.
#[derive(Debug, Default)]
struct Findings {
    bombs_exploding: BTreeSet<EntityId>,
    boat_missiles_exploding: BTreeSet<EntityId>,
    explosions: BTreeMap<EntityId, ExplosionHits>,
    torpedo_hits: BTreeSet<EntityId>,
    missile_hits: BTreeSet<EntityId>,
    submarines_out: BTreeSet<EntityId>,
    bombs_out: BTreeSet<EntityId>,
    missiles_out: BTreeSet<EntityId>,
    torpedoes_out: BTreeSet<EntityId>,
    smokes_out: BTreeSet<EntityId>,
}

/// Uniform-grid broad phase with an AABB narrow phase.
#[derive(Debug)]
pub struct GridCollisionSystem {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl Default for GridCollisionSystem {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl GridCollisionSystem {
    /// Creates a system with square cells of `cell_size` pixels.
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is not positive.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "cell size must be positive");
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    fn cell_of(&self, x: f32, y: f32) -> (i32, i32) {
        ((x / self.cell_size).floor() as i32, (y / self.cell_size).floor() as i32)
    }

    fn gather(manager: &EntityManager) -> Vec<Body> {
        let mut ids: Vec<EntityId> = Vec::new();
        ids.extend(manager.bombs().ids());
        ids.extend(manager.all_submarine_ids());
        ids.extend(manager.fishes().ids());
        ids.extend(manager.torpedoes().ids());
        ids.extend(manager.missiles().ids());
        ids.extend(manager.boat_missiles().ids());
        ids.extend(manager.explosions().ids());
        ids.extend(manager.smokes().ids());
        ids.extend(manager.store_icons().ids());

        let boat = manager.boat();
        if boat.is_initialized() && !manager.player().boat_destroyed {
            ids.push(boat.id());
        }
        ids.sort_unstable();

        ids.into_iter()
            .filter_map(|id| {
                let kind = manager.components::<Collision>().slot(id).kind;
                if kind == CollisionKind::None {
                    return None;
                }
                let position = *manager.components::<Position>().slot(id);
                let scale = manager.components::<Physics>().slot(id).scale;
                let (min, max) = manager
                    .sprites()
                    .get(id)
                    .map_or(([position.x, position.y], [position.x, position.y]), |sprite| {
                        sprite.bounding_box(scale, [position.x, position.y])
                    });
                Some(Body { id, kind, min, max })
            })
            .collect()
    }

    /// Rebuilds the grid and records each body's cells on its collision
    /// component.
    fn build_grid(&mut self, manager: &mut EntityManager, bodies: &[Body]) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }

        for (index, body) in bodies.iter().enumerate() {
            let (x0, y0) = self.cell_of(body.min[0], body.min[1]);
            let (x1, y1) = self.cell_of(body.max[0], body.max[1]);

            let mut occupied = Vec::new();
            for cx in x0..=x1 {
                for cy in y0..=y1 {
                    self.cells.entry((cx, cy)).or_default().push(index);
                    occupied.push((cx, cy));
                }
            }

            let collision = manager.components_mut::<Collision>().slot_mut(body.id);
            collision.prev_cell_count = i32::try_from(collision.grid_cells.len()).unwrap_or(i32::MAX);
            collision.grid_cells = occupied;
        }

        self.cells.retain(|_, bucket| !bucket.is_empty());
    }

    fn check_bounds(manager: &EntityManager, bodies: &[Body], findings: &mut Findings) {
        let layout = &manager.config().layout;
        for body in bodies {
            match body.kind {
                CollisionKind::Submarine => {
                    let vx = manager.components::<Velocity>().slot(body.id).vx;
                    if (vx > 0.0 && body.min[0] > layout.screen_width) || (vx < 0.0 && body.max[0] < 0.0) {
                        findings.submarines_out.insert(body.id);
                    }
                }
                CollisionKind::Bomb if body.min[1] > layout.screen_height => {
                    findings.bombs_out.insert(body.id);
                }
                CollisionKind::Missile if body.max[1] < 0.0 => {
                    findings.missiles_out.insert(body.id);
                }
                CollisionKind::Torpedo if body.max[1] < layout.ocean_surface => {
                    findings.torpedoes_out.insert(body.id);
                }
                CollisionKind::Smoke if body.max[1] < 0.0 => {
                    findings.smokes_out.insert(body.id);
                }
                CollisionKind::BoatMissile => {
                    let progress = manager.components::<Pathing>().slot(body.id).progress;
                    if progress >= 1.0 {
                        findings.boat_missiles_exploding.insert(body.id);
                    }
                }
                _ => {}
            }
        }
    }

    fn candidate_pairs(&self, bodies: &[Body]) -> BTreeSet<(usize, usize)> {
        let mut pairs = BTreeSet::new();
        for bucket in self.cells.values() {
            for (n, &a) in bucket.iter().enumerate() {
                for &b in &bucket[n + 1..] {
                    if bodies[a].overlaps(&bodies[b]) {
                        pairs.insert((a.min(b), a.max(b)));
                    }
                }
            }
        }
        pairs
    }

    fn classify(a: &Body, b: &Body, manager: &mut EntityManager, findings: &mut Findings) {
        use CollisionKind as K;

        match (a.kind, b.kind) {
            (K::Bomb, K::Submarine | K::Fish | K::StoreIcon) => {
                findings.bombs_exploding.insert(a.id);
            }
            (K::BoatMissile, K::Submarine) => {
                findings.boat_missiles_exploding.insert(a.id);
            }
            (K::Torpedo, K::Boat) => {
                findings.torpedo_hits.insert(a.id);
            }
            (K::Missile, K::Boat) => {
                findings.missile_hits.insert(a.id);
            }
            (K::Explosion, other) => {
                let hits = findings.explosions.entry(a.id).or_default();
                match other {
                    K::Submarine => {
                        hits.submarines.insert(b.id);
                    }
                    K::Fish => {
                        hits.fishes.insert(b.id);
                    }
                    K::Missile => {
                        hits.missiles.insert(b.id);
                    }
                    K::Torpedo => {
                        hits.torpedoes.insert(b.id);
                    }
                    K::StoreIcon => {
                        let ignore = &mut manager.components_mut::<Collision>().slot_mut(a.id).ignore;
                        if !ignore.contains(&b.id) {
                            ignore.push(b.id);
                            hits.store_icons.insert(b.id);
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn report(findings: Findings, boat: EntityId, delegate: &mut dyn CollisionDelegate) {
        for id in findings.bombs_exploding {
            delegate.bomb_did_generate_explosion(id);
        }
        for id in findings.boat_missiles_exploding {
            delegate.boat_missile_did_generate_explosion(id);
        }

        for hits in findings.explosions.into_values() {
            let collect = |set: BTreeSet<EntityId>| set.into_iter().collect::<Vec<_>>();
            let submarines = collect(hits.submarines);
            let fishes = collect(hits.fishes);
            let missiles = collect(hits.missiles);
            let torpedoes = collect(hits.torpedoes);
            let store_icons = collect(hits.store_icons);

            if !submarines.is_empty() {
                delegate.explosion_did_collide_with_submarines(&submarines);
            }
            if !fishes.is_empty() {
                delegate.explosion_did_collide_with_fishes(&fishes);
            }
            if !missiles.is_empty() {
                delegate.explosion_did_collide_with_missiles(&missiles);
            }
            if !torpedoes.is_empty() {
                delegate.explosion_did_collide_with_torpedoes(&torpedoes);
            }
            if !store_icons.is_empty() {
                delegate.explosion_did_collide_with_store_icons(&store_icons);
            }
        }

        for id in findings.torpedo_hits {
            delegate.torpedo_did_collide_with_boat(id, boat);
        }
        for id in findings.missile_hits {
            delegate.missile_did_collide_with_boat(id, boat);
        }

        for id in findings.submarines_out {
            delegate.submarine_did_move_out_of_screen(id);
        }
        for id in findings.bombs_out {
            delegate.bomb_did_move_out_of_screen(id);
        }
        for id in findings.missiles_out {
            delegate.missile_did_move_out_of_screen(id);
        }
        for id in findings.torpedoes_out {
            delegate.torpedo_did_move_out_of_ocean_surface(id);
        }
        for id in findings.smokes_out {
            delegate.smoke_did_move_out_of_screen(id);
        }
    }
}

impl CollisionDetector for GridCollisionSystem {
    fn detect(&mut self, manager: &mut EntityManager, delegate: &mut dyn CollisionDelegate) {
        delegate.begin_updates();

        let bodies = Self::gather(manager);
        self.build_grid(manager, &bodies);

        let mut findings = Findings::default();
        Self::check_bounds(manager, &bodies, &mut findings);

        for (a, b) in self.candidate_pairs(&bodies) {
            Self::classify(&bodies[a], &bodies[b], manager, &mut findings);
            Self::classify(&bodies[b], &bodies[a], manager, &mut findings);
        }

        tracing::trace!(bodies = bodies.len(), cells = self.cells.len(), "collision scan");
        Self::report(findings, manager.boat().id(), delegate);
        delegate.end_updates(manager);
    }
}
