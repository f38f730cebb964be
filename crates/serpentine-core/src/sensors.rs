//! Sensory encoding for agents
//!
//! Turns (agent, world) into a fixed feature vector expressed relative to the
//! agent's heading. Directional groups are computed in absolute order
//! `[Up, Right, Down, Left]` and then turned by [`rotate`] so index 0 always
//! means "ahead", 1 "right", 2 "behind" and 3 "left".
//!
//! Layout:
//! - `0..6`   danger pairs `(wall, body)` for `[TurnLeft, Straight, TurnRight]`
//! - `6..10`  resource on the ray in each relative direction
//! - `10..14` a non-head body cell on the ray in each relative direction
//! - `14..18` cells between the head and the wall in each relative direction

use serde::{Deserialize, Serialize};

use crate::agent::{Action, Agent, Heading};
use crate::world::{Cell, World};

/// Length of the encoded feature vector
pub const FEATURE_COUNT: usize = 18;

/// Rotate an absolute `[Up, Right, Down, Left]` group into heading-relative
/// `[ahead, right, behind, left]` order
pub fn rotate<T: Copy>(absolute: [T; 4], heading: Heading) -> [T; 4] {
    let h = heading.index();
    std::array::from_fn(|k| absolute[(h + k) % 4])
}

/// True if `target` lies on the ray leaving `origin` along `heading`,
/// excluding `origin` itself
pub fn on_ray(origin: Cell, target: Cell, heading: Heading) -> bool {
    let offset = target - origin;
    let d = heading.delta();
    if d.x == 0 {
        offset.x == 0 && offset.y * d.y > 0
    } else {
        offset.y == 0 && offset.x * d.x > 0
    }
}

/// Decoded sensor groups for a single agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorFrame {
    /// `(would hit wall, would hit own body)` per candidate action
    pub danger: [(bool, bool); 3],
    /// Resource on the ray ahead/right/behind/left
    pub resource: [bool; 4],
    /// Own body on the ray ahead/right/behind/left
    pub body: [bool; 4],
    /// Cells beyond the head up to and including the wall-adjacent cell
    pub boundary: [u32; 4],
}

impl SensorFrame {
    /// Encode the agent's view of its world. Pure: no state is touched.
    pub fn encode(agent: &Agent, world: &World) -> Self {
        let head = agent.head();
        let heading = agent.heading();

        let danger = Action::ALL.map(|action| probe(agent, world, action));

        let resource = rotate(
            Heading::ALL.map(|dir| on_ray(head, world.resource(), dir)),
            heading,
        );

        let body = rotate(
            Heading::ALL.map(|dir| agent.body().iter().skip(1).any(|c| on_ray(head, *c, dir))),
            heading,
        );

        let absolute_boundary = [
            head.y,
            world.width() - 1 - head.x,
            world.height() - 1 - head.y,
            head.x,
        ]
        .map(|d| d.max(0) as u32);
        let boundary = rotate(absolute_boundary, heading);

        Self {
            danger,
            resource,
            body,
            boundary,
        }
    }

    /// Flatten into the policy input vector
    pub fn to_vec(&self) -> Vec<f32> {
        let mut features = Vec::with_capacity(FEATURE_COUNT);
        for (wall, body) in self.danger {
            features.push(flag(wall));
            features.push(flag(body));
        }
        features.extend(self.resource.map(flag));
        features.extend(self.body.map(flag));
        features.extend(self.boundary.map(|d| d as f32));
        features
    }
}

fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}

/// Simulate one move for `action` without mutating the agent.
///
/// The simulated body keeps its tail only when the new head lands on the
/// resource, so moving into the cell the tail is vacating is safe.
fn probe(agent: &Agent, world: &World, action: Action) -> (bool, bool) {
    let heading = agent.heading().turned(action);
    let next = agent.head() + heading.delta();

    if world.is_out_of_bounds(next) {
        return (true, false);
    }

    let kept = if next == world.resource() {
        agent.len()
    } else {
        agent.len() - 1
    };
    let hits_body = agent.body().iter().take(kept).any(|c| *c == next);
    (false, hits_body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(cells: &[(i32, i32)], heading: Heading) -> Agent {
        Agent::new(cells.iter().map(|(x, y)| Cell::new(*x, *y)), heading).unwrap()
    }

    #[test]
    fn test_rotate_by_heading() {
        let absolute = ['u', 'r', 'd', 'l'];
        assert_eq!(rotate(absolute, Heading::Up), ['u', 'r', 'd', 'l']);
        assert_eq!(rotate(absolute, Heading::Right), ['r', 'd', 'l', 'u']);
        assert_eq!(rotate(absolute, Heading::Down), ['d', 'l', 'u', 'r']);
        assert_eq!(rotate(absolute, Heading::Left), ['l', 'u', 'r', 'd']);
    }

    #[test]
    fn test_on_ray() {
        let origin = Cell::new(3, 3);
        assert!(on_ray(origin, Cell::new(3, 0), Heading::Up));
        assert!(on_ray(origin, Cell::new(9, 3), Heading::Right));
        assert!(!on_ray(origin, Cell::new(9, 4), Heading::Right));
        assert!(!on_ray(origin, Cell::new(3, 3), Heading::Down));
        assert!(!on_ray(origin, Cell::new(2, 3), Heading::Right));
    }

    #[test]
    fn test_feature_count() {
        let world = World::with_resource(10, 10, Cell::new(0, 0)).unwrap();
        let a = agent(&[(5, 5), (4, 5), (3, 5)], Heading::Right);
        assert_eq!(SensorFrame::encode(&a, &world).to_vec().len(), FEATURE_COUNT);
    }

    #[test]
    fn test_danger_wall_ahead() {
        let world = World::with_resource(5, 5, Cell::new(0, 0)).unwrap();
        let a = agent(&[(4, 2), (3, 2), (2, 2)], Heading::Right);
        let frame = SensorFrame::encode(&a, &world);

        assert_eq!(frame.danger[1], (true, false));
        assert_eq!(frame.danger[0], (false, false));
        assert_eq!(frame.danger[2], (false, false));
    }

    #[test]
    fn test_danger_body_and_vacating_tail() {
        let world = World::with_resource(6, 6, Cell::new(5, 5)).unwrap();
        let a = agent(&[(1, 2), (1, 1), (2, 1), (2, 2), (2, 3)], Heading::Down);
        let frame = SensorFrame::encode(&a, &world);
        // Heading down, a left turn moves right onto (2,2) which is mid-body
        assert_eq!(frame.danger[0], (false, true));
        assert_eq!(frame.danger[1], (false, false));
        assert_eq!(frame.danger[2], (false, false));

        // Four-cell loop where the straight move lands on the tail
        let a = agent(&[(1, 2), (1, 1), (2, 1), (2, 2)], Heading::Right);
        let frame = SensorFrame::encode(&a, &world);
        assert_eq!(frame.danger[1], (false, false));
    }

    #[test]
    fn test_danger_tail_kept_when_eating() {
        // Resource sits on the tail cell: eating keeps the tail, so it is a hit
        let world = World::with_resource(6, 6, Cell::new(2, 2)).unwrap();
        let a = agent(&[(1, 2), (1, 1), (2, 1), (2, 2)], Heading::Down);
        let frame = SensorFrame::encode(&a, &world);
        assert_eq!(frame.danger[0], (false, true));
    }

    #[test]
    fn test_resource_direction_relative() {
        // Resource straight ahead for a right-facing agent
        let world = World::with_resource(10, 10, Cell::new(8, 5)).unwrap();
        let a = agent(&[(5, 5), (4, 5), (3, 5)], Heading::Right);
        let frame = SensorFrame::encode(&a, &world);
        assert_eq!(frame.resource, [true, false, false, false]);

        // Resource above: for a right-facing agent that is to its left
        let world = World::with_resource(10, 10, Cell::new(5, 1)).unwrap();
        let frame = SensorFrame::encode(&a, &world);
        assert_eq!(frame.resource, [false, false, false, true]);

        // Off-axis resource lights nothing
        let world = World::with_resource(10, 10, Cell::new(7, 7)).unwrap();
        let frame = SensorFrame::encode(&a, &world);
        assert_eq!(frame.resource, [false; 4]);
    }

    #[test]
    fn test_body_direction_relative() {
        let world = World::with_resource(10, 10, Cell::new(0, 0)).unwrap();
        let a = agent(&[(5, 5), (4, 5), (3, 5)], Heading::Right);
        let frame = SensorFrame::encode(&a, &world);
        assert_eq!(frame.body, [false, false, true, false]);
    }

    #[test]
    fn test_boundary_distances() {
        let world = World::with_resource(10, 8, Cell::new(0, 0)).unwrap();
        let a = agent(&[(2, 3), (2, 4), (2, 5)], Heading::Up);
        let frame = SensorFrame::encode(&a, &world);
        // ahead (up), right, behind (down), left
        assert_eq!(frame.boundary, [3, 7, 4, 2]);

        let a = agent(&[(2, 3), (1, 3), (0, 3)], Heading::Right);
        let frame = SensorFrame::encode(&a, &world);
        assert_eq!(frame.boundary, [7, 4, 2, 3]);
    }

    #[test]
    fn test_encoding_is_pure() {
        let world = World::with_resource(10, 10, Cell::new(7, 5)).unwrap();
        let a = agent(&[(5, 5), (4, 5), (3, 5)], Heading::Right);
        let before = a.clone();

        let first = SensorFrame::encode(&a, &world).to_vec();
        let second = SensorFrame::encode(&a, &world).to_vec();

        assert_eq!(first, second);
        assert_eq!(a, before);
    }
}
