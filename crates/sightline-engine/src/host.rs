//! hecs-backed host world, the reference collaborator implementation.
//!
//! Real hosts adapt their own scene and physics structures to the
//! collaborator traits. This adapter gives demos and tests a complete
//! world: category-tagged candidates, spherical collision bodies on
//! geometry layers, and optional labels for reports.

use glam::DVec3;
use hecs::{Entity, World};

use sightline_core::types::{Candidate, CandidateId};

use crate::world::{PopulationProvider, RayHit, VisibilityProbe};

/// World-space position component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub DVec3);

/// Membership in a detectable category.
#[derive(Debug, Clone)]
pub struct Detectable {
    pub category: String,
}

/// Spherical collision body on the given geometry layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub radius: f64,
    pub layers: u32,
}

/// Human-readable name surfaced through the describe capability.
#[derive(Debug, Clone)]
pub struct Label(pub String);

/// hecs world with spawn helpers for the shapes the engine cares about.
#[derive(Default)]
pub struct HostWorld {
    world: World,
}

impl HostWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidate without a collision body: rays pass straight through it.
    pub fn spawn_candidate(&mut self, category: &str, position: DVec3) -> CandidateId {
        let entity = self.world.spawn((
            Position(position),
            Detectable {
                category: category.to_string(),
            },
        ));
        id_of(entity)
    }

    /// Candidate with a spherical body that rays can strike.
    pub fn spawn_candidate_with_body(
        &mut self,
        category: &str,
        position: DVec3,
        radius: f64,
        layers: u32,
    ) -> CandidateId {
        let entity = self.world.spawn((
            Position(position),
            Detectable {
                category: category.to_string(),
            },
            Body { radius, layers },
        ));
        id_of(entity)
    }

    /// Non-candidate geometry: a wall, a crate, any occluder.
    pub fn spawn_obstacle(&mut self, position: DVec3, radius: f64, layers: u32) -> CandidateId {
        let entity = self.world.spawn((Position(position), Body { radius, layers }));
        id_of(entity)
    }

    /// Attach a label that reports can surface.
    pub fn set_label(&mut self, id: CandidateId, label: &str) {
        if let Some(entity) = entity_of(id) {
            let _ = self.world.insert_one(entity, Label(label.to_string()));
        }
    }

    pub fn set_position(&mut self, id: CandidateId, position: DVec3) {
        if let Some(entity) = entity_of(id) {
            if let Ok(mut pos) = self.world.get::<&mut Position>(entity) {
                pos.0 = position;
            }
        }
    }

    pub fn despawn(&mut self, id: CandidateId) {
        if let Some(entity) = entity_of(id) {
            let _ = self.world.despawn(entity);
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }
}

impl PopulationProvider for HostWorld {
    fn candidates_in(&self, category: &str, out: &mut Vec<Candidate>) {
        out.clear();
        let mut query = self.world.query::<(&Position, &Detectable)>();
        for (entity, (position, detectable)) in query.iter() {
            if detectable.category == category {
                out.push(Candidate::new(id_of(entity), position.0));
            }
        }
    }

    fn is_alive(&self, id: CandidateId) -> bool {
        entity_of(id).is_some_and(|entity| self.world.contains(entity))
    }

    fn describe(&self, id: CandidateId) -> Option<String> {
        let entity = entity_of(id)?;
        let label = self.world.get::<&Label>(entity).ok()?;
        Some(label.0.clone())
    }
}

impl VisibilityProbe for HostWorld {
    /// Nearest sphere intersection along the segment, honoring layers and
    /// the excluded entity.
    fn cast_ray(
        &self,
        origin: DVec3,
        target: DVec3,
        exclude: Option<CandidateId>,
        mask: u32,
    ) -> Option<RayHit> {
        let delta = target - origin;
        let length = delta.length();
        if length < 1e-9 {
            return None;
        }
        let direction = delta / length;

        let mut nearest: Option<RayHit> = None;
        let mut query = self.world.query::<(&Position, &Body)>();
        for (entity, (position, body)) in query.iter() {
            if body.layers & mask == 0 {
                continue;
            }
            let id = id_of(entity);
            if exclude == Some(id) {
                continue;
            }
            let Some(distance) = ray_sphere(origin, direction, length, position.0, body.radius)
            else {
                continue;
            };
            if nearest.map_or(true, |hit| distance < hit.distance) {
                nearest = Some(RayHit {
                    entity: Some(id),
                    distance,
                });
            }
        }
        nearest
    }
}

fn id_of(entity: Entity) -> CandidateId {
    CandidateId(entity.to_bits().get())
}

fn entity_of(id: CandidateId) -> Option<Entity> {
    Entity::from_bits(id.0)
}

/// Closest intersection of a segment with a sphere, as a distance from the
/// origin. `None` when the segment misses, or the sphere lies entirely
/// behind the origin.
fn ray_sphere(
    origin: DVec3,
    direction: DVec3,
    length: f64,
    center: DVec3,
    radius: f64,
) -> Option<f64> {
    let m = origin - center;
    let b = m.dot(direction);
    let c = m.length_squared() - radius * radius;
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-b - discriminant.sqrt()).max(0.0);
    (t <= length).then_some(t)
}
