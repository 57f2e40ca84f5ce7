//! Nodes driving along point paths.

use std::{f32::consts::PI, sync::Arc};

use cgmath::Vector3;

use crate::{data_structures::scene_graph::SceneNode, render::Render};

/// A route of points. Every step turns the follower by `angle_per_tick`
/// degrees around the y axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    pub points: Vec<Vector3<f32>>,
    /// Circular paths start over at the first point, open paths end.
    pub circular: bool,
    pub angle_per_tick: f32,
    pub initial_rotation: f32,
}

impl Path {
    pub fn new(
        points: Vec<Vector3<f32>>,
        circular: bool,
        angle_per_tick: f32,
        initial_rotation: f32,
    ) -> Self {
        Self {
            points,
            circular,
            angle_per_tick,
            initial_rotation,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Heading of a follower that started at the first point and is now at
    /// `index`.
    pub fn rotation_at(&self, index: usize) -> f32 {
        self.initial_rotation + self.angle_per_tick * index as f32
    }
}

/// `n` points on a circle in the xz plane at the height of `center`, starting
/// at `center + (radius, 0, 0)` and turning towards +z.
pub fn ring_points(center: Vector3<f32>, radius: f32, n: usize) -> Vec<Vector3<f32>> {
    (0..n)
        .map(|i| {
            let alpha = 2.0 * PI * i as f32 / n as f32;
            Vector3::new(
                center.x + radius * alpha.cos(),
                center.y,
                center.z + radius * alpha.sin(),
            )
        })
        .collect()
}

/// Where a follower is placed by one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathStep {
    pub point: Vector3<f32>,
    /// Rotation around y in degrees.
    pub rotation: f32,
}

impl PathStep {
    /// Moves the node (and its pivot) onto the point and turns it.
    pub fn apply(&self, node: &mut dyn SceneNode) {
        let mut transform = *node.get_transform();
        transform.position = self.point;
        transform.origin = self.point;
        transform.rotation = Vector3::new(0.0, self.rotation, 0.0);
        node.set_local_transform(transform);
    }
}

#[derive(Clone, Debug)]
pub struct PathFollower {
    path: Arc<Path>,
    position: usize,
    rotation: f32,
    finished: bool,
}

impl PathFollower {
    /// `None` for an empty path. `start` wraps around the path length.
    pub fn new(path: Arc<Path>, start: usize) -> Option<Self> {
        if path.is_empty() {
            return None;
        }
        let position = start % path.len();
        Some(Self {
            rotation: path.rotation_at(position),
            path,
            position,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Index of the point the next step goes to.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advances by one point. At the end a circular path starts over with
    /// the initial rotation, an open path finishes. Finished followers
    /// return `None`.
    pub fn step(&mut self) -> Option<PathStep> {
        if self.finished {
            return None;
        }
        self.rotation += self.path.angle_per_tick;
        let step = PathStep {
            point: self.path.points[self.position],
            rotation: self.rotation,
        };
        self.position += 1;
        if self.position >= self.path.len() {
            if self.path.circular {
                self.position = 0;
                self.rotation = self.path.initial_rotation;
            } else {
                self.finished = true;
            }
        }
        Some(step)
    }
}

/// Nodes driving along shared paths, one step per tick. Nodes on open paths
/// are dropped when they reach the end.
pub struct Traffic<N: SceneNode> {
    paths: Vec<Arc<Path>>,
    vehicles: Vec<(N, PathFollower)>,
}

impl<N: SceneNode> Default for Traffic<N> {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            vehicles: Vec::new(),
        }
    }
}

impl<N: SceneNode> Traffic<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index to place vehicles with.
    pub fn add_path(&mut self, path: Path) -> usize {
        self.paths.push(Arc::new(path));
        self.paths.len() - 1
    }

    pub fn paths(&self) -> &[Arc<Path>] {
        &self.paths
    }

    /// Puts `node` on path `path` at point `start` and makes the first step.
    pub fn add_vehicle(&mut self, mut node: N, path: usize, start: usize) -> anyhow::Result<()> {
        let Some(route) = self.paths.get(path) else {
            anyhow::bail!("no path with index {path} ({} paths)", self.paths.len());
        };
        let Some(mut follower) = PathFollower::new(route.clone(), start) else {
            anyhow::bail!("path {path} has no points");
        };
        if let Some(step) = follower.step() {
            step.apply(&mut node);
        }
        if follower.is_finished() {
            log::debug!("{}: placed at the end of open path {path}, dropped", node.get_label());
            return Ok(());
        }
        self.vehicles.push((node, follower));
        Ok(())
    }

    pub fn tick(&mut self) {
        for (node, follower) in &mut self.vehicles {
            if let Some(step) = follower.step() {
                step.apply(node);
            }
        }
        self.vehicles.retain(|(node, follower)| {
            if follower.is_finished() {
                log::debug!("{}: reached the end of its path", node.get_label());
            }
            !follower.is_finished()
        });
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &N> {
        self.vehicles.iter().map(|(node, _)| node)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn render(&self) -> Render<'_> {
        Render::Nodes(self.vehicles().map(|n| n as &dyn SceneNode).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::mesh::Mesh;
    use approx::assert_relative_eq;

    fn line(circular: bool) -> Path {
        Path::new(
            vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(2.0, 0.0, 0.0),
            ],
            circular,
            -2.0,
            90.0,
        )
    }

    #[test]
    fn ring_starts_on_the_x_axis() {
        let points = ring_points(Vector3::new(1.0, 2.0, 3.0), 10.0, 4);
        assert_eq!(points.len(), 4);
        assert_relative_eq!(points[0], Vector3::new(11.0, 2.0, 3.0), epsilon = 1e-5);
        assert_relative_eq!(points[1], Vector3::new(1.0, 2.0, 13.0), epsilon = 1e-5);
        assert_relative_eq!(points[2], Vector3::new(-9.0, 2.0, 3.0), epsilon = 1e-5);
    }

    #[test]
    fn circular_path_wraps_and_resets_rotation() {
        let mut follower = PathFollower::new(Arc::new(line(true)), 0).unwrap();
        let steps: Vec<_> = (0..4).filter_map(|_| follower.step()).collect();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0].rotation, 88.0);
        assert_eq!(steps[2].point, Vector3::new(2.0, 0.0, 0.0));
        assert_eq!(steps[2].rotation, 84.0);
        assert_eq!(steps[3].point, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(steps[3].rotation, 88.0);
        assert!(!follower.is_finished());
    }

    #[test]
    fn open_path_finishes() {
        let mut follower = PathFollower::new(Arc::new(line(false)), 1).unwrap();
        assert!(follower.step().is_some());
        assert!(follower.step().is_some());
        assert!(follower.is_finished());
        assert!(follower.step().is_none());
    }

    #[test]
    fn empty_path_has_no_follower() {
        let path = Arc::new(Path::new(Vec::new(), true, 0.0, 0.0));
        assert!(PathFollower::new(path, 0).is_none());
    }

    #[test]
    fn traffic_moves_and_drops_vehicles() {
        let mut traffic = Traffic::new();
        let open = traffic.add_path(line(false));
        let ring = traffic.add_path(line(true));
        traffic.add_vehicle(Mesh::new(vec![0.0; 9]).with_label("a"), open, 0).unwrap();
        traffic.add_vehicle(Mesh::new(vec![0.0; 9]).with_label("b"), ring, 0).unwrap();
        assert!(traffic.add_vehicle(Mesh::new(vec![0.0; 9]), 7, 0).is_err());
        assert_eq!(traffic.len(), 2);

        let first = traffic.vehicles().next().unwrap();
        assert_eq!(first.transform().position, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(first.transform().origin, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(first.transform().rotation, Vector3::new(0.0, 88.0, 0.0));

        traffic.tick();
        assert_eq!(traffic.len(), 2);
        traffic.tick();
        assert_eq!(traffic.len(), 1);
        assert_eq!(traffic.vehicles().next().unwrap().label(), "b");
    }
}
