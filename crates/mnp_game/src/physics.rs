//! Rigid-body physics against static tile geometry.
//!
//! Coordinates are tilemap pixel space: y grows downward, gravity is a
//! positive per-tick-squared constant, and body velocities are pixels per
//! fixed tick. The character controller's speed constants (±3/±6 walk/run,
//! −5/−8 jump) are expressed directly in these units.
//!
//! Static geometry is a grid of solid cells built from the map's collision
//! layer. Movement uses **axis-separable move-and-slide**: resolve X against
//! the grid first, then resolve Y from the corrected X position. This
//! prevents diagonal tunneling and produces the wall-slide behavior expected
//! from platformers.
//!
//! Contact reporting follows the scene's collision-callback model: every
//! step a body was blocked on any side emits one `ContactEvent` for it. The
//! scene consumes those events at the start of the next tick.

use std::collections::HashSet;

/// Default downward acceleration in px/tick^2.
pub const DEFAULT_GRAVITY: f32 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub center_x: f32,
    pub center_y: f32,
    pub half_w: f32,
    pub half_h: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyId(usize);

/// A dynamic body with locked rotation: no angular state exists at all,
/// so the collider stays axis-aligned and upright forever.
#[derive(Debug, Clone, Copy)]
pub struct RigidBody {
    pub aabb: Aabb,
    pub velocity_x: f32,
    pub velocity_y: f32,
}

/// A body touched static geometry during the last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    pub body: BodyId,
}

#[derive(Debug, Clone, Copy)]
struct MoveResult {
    aabb: Aabb,
    blocked_left: bool,
    blocked_right: bool,
    blocked_down: bool,
    blocked_up: bool,
}

impl MoveResult {
    fn any_contact(&self) -> bool {
        self.blocked_left || self.blocked_right || self.blocked_down || self.blocked_up
    }
}

/// Solid cells from the tilemap collision layer. Cell (0, 0) is the map's
/// top-left corner; cell y grows downward like world y.
#[derive(Debug, Clone)]
pub struct StaticGeometry {
    pub cell_size: i32,
    pub width: i32,
    pub height: i32,
    solids: HashSet<(i32, i32)>,
}

impl StaticGeometry {
    pub fn from_cells(cell_size: i32, width: i32, height: i32, cells: &[(i32, i32)]) -> Self {
        Self {
            cell_size,
            width,
            height,
            solids: cells.iter().copied().collect(),
        }
    }

    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return false;
        }
        self.solids.contains(&(x, y))
    }

    pub fn solids_iter(&self) -> impl Iterator<Item = &(i32, i32)> {
        self.solids.iter()
    }

    fn move_and_collide(&self, aabb: Aabb, dx: f32, dy: f32) -> MoveResult {
        const EPS: f32 = 0.0001;

        // Axis-separable move-and-slide:
        // resolve X first, then resolve Y using updated X position.
        let resolved_x = self.resolve_axis_x(aabb, dx);
        let x_expected = aabb.center_x + dx;
        let collided_x = (resolved_x - x_expected).abs() > EPS;

        let mut moved = aabb;
        moved.center_x = resolved_x;
        let resolved_y = self.resolve_axis_y(moved, dy);
        let y_expected = aabb.center_y + dy;
        let collided_y = (resolved_y - y_expected).abs() > EPS;
        moved.center_y = resolved_y;

        MoveResult {
            aabb: moved,
            blocked_left: collided_x && dx < 0.0,
            blocked_right: collided_x && dx > 0.0,
            // y-down: moving down (dy > 0) into the floor blocks "down".
            blocked_down: collided_y && dy > 0.0,
            blocked_up: collided_y && dy < 0.0,
        }
    }

    fn resolve_axis_x(&self, aabb: Aabb, dx: f32) -> f32 {
        if dx == 0.0 {
            return aabb.center_x;
        }

        const EPS: f32 = 0.001;
        let mut candidate_x = aabb.center_x + dx;
        let min_y = aabb.center_y - aabb.half_h + EPS;
        let max_y = aabb.center_y + aabb.half_h - EPS;
        let y0 = self.world_to_cell(min_y);
        let y1 = self.world_to_cell(max_y);

        if dx > 0.0 {
            let max_x = candidate_x + aabb.half_w - EPS;
            let x_cell = self.world_to_cell(max_x);
            for y in y0..=y1 {
                if self.is_solid(x_cell, y) {
                    let cell_left = (x_cell * self.cell_size) as f32;
                    candidate_x = candidate_x.min(cell_left - aabb.half_w);
                }
            }
            // Guardrail: never push opposite direction during resolution.
            candidate_x = candidate_x.max(aabb.center_x);
        } else {
            let min_x = candidate_x - aabb.half_w + EPS;
            let x_cell = self.world_to_cell(min_x);
            for y in y0..=y1 {
                if self.is_solid(x_cell, y) {
                    let cell_right = ((x_cell + 1) * self.cell_size) as f32;
                    candidate_x = candidate_x.max(cell_right + aabb.half_w);
                }
            }
            candidate_x = candidate_x.min(aabb.center_x);
        }

        candidate_x
    }

    fn resolve_axis_y(&self, aabb: Aabb, dy: f32) -> f32 {
        if dy == 0.0 {
            return aabb.center_y;
        }

        const EPS: f32 = 0.001;
        let mut candidate_y = aabb.center_y + dy;
        let min_x = aabb.center_x - aabb.half_w + EPS;
        let max_x = aabb.center_x + aabb.half_w - EPS;
        let x0 = self.world_to_cell(min_x);
        let x1 = self.world_to_cell(max_x);

        if dy > 0.0 {
            // Falling: the bottom edge (larger y) sweeps into cells below.
            let max_y = candidate_y + aabb.half_h - EPS;
            let y_cell = self.world_to_cell(max_y);
            for x in x0..=x1 {
                if self.is_solid(x, y_cell) {
                    let cell_top = (y_cell * self.cell_size) as f32;
                    candidate_y = candidate_y.min(cell_top - aabb.half_h);
                }
            }
            candidate_y = candidate_y.max(aabb.center_y);
        } else {
            // Jumping: the top edge (smaller y) sweeps into cells above.
            let min_y = candidate_y - aabb.half_h + EPS;
            let y_cell = self.world_to_cell(min_y);
            for x in x0..=x1 {
                if self.is_solid(x, y_cell) {
                    let cell_bottom = ((y_cell + 1) * self.cell_size) as f32;
                    candidate_y = candidate_y.max(cell_bottom + aabb.half_h);
                }
            }
            candidate_y = candidate_y.min(aabb.center_y);
        }

        candidate_y
    }

    fn world_to_cell(&self, world: f32) -> i32 {
        (world / self.cell_size as f32).floor() as i32
    }
}

/// The physics world: gravity, static geometry, and dynamic bodies.
///
/// With no geometry installed (missing ground layer), bodies free-fall
/// indefinitely -- degraded but not an error.
pub struct PhysicsWorld {
    pub gravity_y: f32,
    geometry: Option<StaticGeometry>,
    bodies: Vec<RigidBody>,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            gravity_y: DEFAULT_GRAVITY,
            geometry: None,
            bodies: Vec::new(),
        }
    }

    pub fn set_static_geometry(&mut self, geometry: StaticGeometry) {
        self.geometry = Some(geometry);
    }

    pub fn geometry(&self) -> Option<&StaticGeometry> {
        self.geometry.as_ref()
    }

    pub fn add_body(&mut self, aabb: Aabb) -> BodyId {
        self.bodies.push(RigidBody {
            aabb,
            velocity_x: 0.0,
            velocity_y: 0.0,
        });
        BodyId(self.bodies.len() - 1)
    }

    pub fn body(&self, id: BodyId) -> &RigidBody {
        &self.bodies[id.0]
    }

    pub fn body_mut(&mut self, id: BodyId) -> &mut RigidBody {
        &mut self.bodies[id.0]
    }

    /// Advance every body one fixed tick, pushing a contact event for each
    /// body that touched geometry.
    pub fn step(&mut self, events: &mut Vec<ContactEvent>) {
        for (index, body) in self.bodies.iter_mut().enumerate() {
            body.velocity_y += self.gravity_y;

            let Some(geometry) = &self.geometry else {
                body.aabb.center_x += body.velocity_x;
                body.aabb.center_y += body.velocity_y;
                continue;
            };

            // Terminal speed: one cell per tick per axis. The resolvers test
            // the single cell at the leading edge, so a larger displacement
            // could skip a solid row entirely.
            let max_speed = geometry.cell_size as f32;
            body.velocity_x = body.velocity_x.clamp(-max_speed, max_speed);
            body.velocity_y = body.velocity_y.clamp(-max_speed, max_speed);

            let result = geometry.move_and_collide(body.aabb, body.velocity_x, body.velocity_y);
            body.aabb = result.aabb;

            // Zero velocity only on the axis that was actually blocked.
            if (result.blocked_left && body.velocity_x < 0.0)
                || (result.blocked_right && body.velocity_x > 0.0)
            {
                body.velocity_x = 0.0;
            }
            if (result.blocked_down && body.velocity_y > 0.0)
                || (result.blocked_up && body.velocity_y < 0.0)
            {
                body.velocity_y = 0.0;
            }

            if result.any_contact() {
                events.push(ContactEvent { body: BodyId(index) });
            }
        }
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
