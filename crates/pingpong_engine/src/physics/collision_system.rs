//! Collision registry and per-frame detection
//!
//! Every registered volume is tested against every other one, once per
//! unordered pair, in registration order. For each colliding pair the first
//! volume's handler runs with `(first, second)`, then the second volume's
//! handler runs with `(second, first)`; a volume without a handler is simply
//! skipped. Handlers get mutable access to the [`Scene`] so they can push
//! animators around, but not to the registry, so the set of volumes cannot
//! change during a pass.

use crate::foundation::collections::{ShapeArena, ShapeKey, SlotMap, VolumeKey};
use crate::physics::{BoundingVolume, CollisionError};
use crate::scene::Scene;

/// Callback run when a volume collides
pub type CollisionHandler = Box<dyn FnMut(CollisionEvent, &mut Scene)>;

/// One side of a collision, from the point of view of `this`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    /// The volume whose handler is running
    pub this: VolumeKey,
    /// The volume it collided with
    pub other: VolumeKey,
    /// Shape `this` is attached to
    pub this_shape: Option<ShapeKey>,
    /// Shape `other` is attached to
    pub other_shape: Option<ShapeKey>,
}

/// Two volumes found colliding, in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionPair {
    /// Registered earlier
    pub first: VolumeKey,
    /// Registered later
    pub second: VolumeKey,
}

impl CollisionPair {
    /// Whether `volume` is one of the two
    pub fn involves(&self, volume: VolumeKey) -> bool {
        self.first == volume || self.second == volume
    }

    /// The partner of `volume`, if it is part of this pair
    pub fn other(&self, volume: VolumeKey) -> Option<VolumeKey> {
        if self.first == volume {
            Some(self.second)
        } else if self.second == volume {
            Some(self.first)
        } else {
            None
        }
    }
}

struct RegisteredVolume {
    volume: BoundingVolume,
    handler: Option<CollisionHandler>,
}

/// Registered volumes and the pairs found in the last pass
pub struct CollisionSystem {
    volumes: SlotMap<VolumeKey, RegisteredVolume>,
    order: Vec<VolumeKey>,
    current_pairs: Vec<CollisionPair>,
    /// Log every pair found
    pub debug_enabled: bool,
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionSystem {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            volumes: SlotMap::with_key(),
            order: Vec::new(),
            current_pairs: Vec::new(),
            debug_enabled: false,
        }
    }

    /// Register a volume without a handler
    pub fn add(&mut self, volume: BoundingVolume) -> VolumeKey {
        self.add_volume(volume, None)
    }

    /// Register a volume with a handler
    pub fn add_with_handler(
        &mut self,
        volume: BoundingVolume,
        handler: impl FnMut(CollisionEvent, &mut Scene) + 'static,
    ) -> VolumeKey {
        self.add_volume(volume, Some(Box::new(handler)))
    }

    /// Register a volume; it takes part in every later detection pass
    pub fn add_volume(&mut self, volume: BoundingVolume, handler: Option<CollisionHandler>) -> VolumeKey {
        let key = self.volumes.insert(RegisteredVolume { volume, handler });
        self.order.push(key);
        key
    }

    /// Unregister a volume
    pub fn remove_volume(&mut self, key: VolumeKey) -> Option<BoundingVolume> {
        let removed = self.volumes.remove(key)?;
        self.order.retain(|k| *k != key);
        self.current_pairs.retain(|pair| !pair.involves(key));
        Some(removed.volume)
    }

    /// Replace a volume's handler
    pub fn set_handler(
        &mut self,
        key: VolumeKey,
        handler: impl FnMut(CollisionEvent, &mut Scene) + 'static,
    ) -> Result<(), CollisionError> {
        let entry = self.volumes.get_mut(key).ok_or(CollisionError::MissingVolume(key))?;
        entry.handler = Some(Box::new(handler));
        Ok(())
    }

    /// Remove a volume's handler; the volume still collides
    pub fn clear_handler(&mut self, key: VolumeKey) -> Result<(), CollisionError> {
        let entry = self.volumes.get_mut(key).ok_or(CollisionError::MissingVolume(key))?;
        entry.handler = None;
        Ok(())
    }

    /// A registered volume
    pub fn volume(&self, key: VolumeKey) -> Option<&BoundingVolume> {
        self.volumes.get(key).map(|entry| &entry.volume)
    }

    /// A registered volume, mutably
    pub fn volume_mut(&mut self, key: VolumeKey) -> Option<&mut BoundingVolume> {
        self.volumes.get_mut(key).map(|entry| &mut entry.volume)
    }

    /// Number of registered volumes
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys in registration order
    pub fn keys(&self) -> &[VolumeKey] {
        &self.order
    }

    /// Every colliding pair, without running any handler
    ///
    /// The first error aborts the search.
    pub fn find_pairs(&self, shapes: &ShapeArena) -> Result<Vec<CollisionPair>, CollisionError> {
        let mut pairs = Vec::new();
        for (i, &first) in self.order.iter().enumerate() {
            for &second in &self.order[i + 1..] {
                let a = &self.volumes[first].volume;
                let b = &self.volumes[second].volume;
                if a.detect_collision(b, shapes)? {
                    pairs.push(CollisionPair { first, second });
                }
            }
        }
        Ok(pairs)
    }

    /// Run one detection pass and dispatch handlers
    ///
    /// All pairs are found against the scene as it is when the pass starts;
    /// handlers then run in pair order and may move shapes, but those moves
    /// only show up in the next pass.
    pub fn detect(&mut self, scene: &mut Scene) -> Result<&[CollisionPair], CollisionError> {
        self.current_pairs = self.find_pairs(scene.shapes())?;

        for pair in &self.current_pairs {
            if self.debug_enabled {
                log::debug!("Collision between {:?} and {:?}", pair.first, pair.second);
            }
            let first_shape = self.volumes[pair.first].volume.attached_shape();
            let second_shape = self.volumes[pair.second].volume.attached_shape();

            if let Some(handler) = self.volumes[pair.first].handler.as_mut() {
                handler(
                    CollisionEvent {
                        this: pair.first,
                        other: pair.second,
                        this_shape: first_shape,
                        other_shape: second_shape,
                    },
                    scene,
                );
            }
            if let Some(handler) = self.volumes[pair.second].handler.as_mut() {
                handler(
                    CollisionEvent {
                        this: pair.second,
                        other: pair.first,
                        this_shape: second_shape,
                        other_shape: first_shape,
                    },
                    scene,
                );
            }
        }
        Ok(&self.current_pairs)
    }

    /// Pairs from the last pass
    pub fn current_collisions(&self) -> &[CollisionPair] {
        &self.current_pairs
    }

    /// Whether `key` collided with anything in the last pass
    pub fn is_colliding(&self, key: VolumeKey) -> bool {
        self.current_pairs.iter().any(|pair| pair.involves(key))
    }

    /// Volumes `key` collided with in the last pass
    pub fn collisions_for(&self, key: VolumeKey) -> Vec<VolumeKey> {
        self.current_pairs.iter().filter_map(|pair| pair.other(key)).collect()
    }

    /// Drop every volume and pair
    pub fn clear(&mut self) {
        self.volumes.clear();
        self.order.clear();
        self.current_pairs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::physics::VolumeKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn unit_box_at(x: f32) -> BoundingVolume {
        BoundingVolume::cuboid(1.0, 1.0, 1.0).at(Vec3::new(x, 0.0, 0.0))
    }

    #[test]
    fn test_handlers_fire_both_ways_in_order() {
        let mut scene = Scene::new();
        let mut system = CollisionSystem::new();
        let log: Rc<RefCell<Vec<(VolumeKey, VolumeKey)>>> = Rc::default();

        let log_a = Rc::clone(&log);
        let a = system.add_with_handler(unit_box_at(0.0), move |event, _| {
            log_a.borrow_mut().push((event.this, event.other));
        });
        let log_b = Rc::clone(&log);
        let b = system.add_with_handler(unit_box_at(0.5), move |event, _| {
            log_b.borrow_mut().push((event.this, event.other));
        });

        let pairs = system.detect(&mut scene).unwrap().to_vec();
        assert_eq!(pairs, vec![CollisionPair { first: a, second: b }]);
        assert_eq!(*log.borrow(), vec![(a, b), (b, a)]);
    }

    #[test]
    fn test_pair_visited_once_per_pass() {
        let mut scene = Scene::new();
        let mut system = CollisionSystem::new();
        let count = Rc::new(RefCell::new(0));

        let counter = Rc::clone(&count);
        system.add_with_handler(unit_box_at(0.0), move |_, _| *counter.borrow_mut() += 1);
        system.add(unit_box_at(0.5));
        system.add(unit_box_at(0.9));
        system.add(unit_box_at(10.0));

        let pairs = system.detect(&mut scene).unwrap().len();
        // (0, 0.5), (0, 0.9), (0.5, 0.9)
        assert_eq!(pairs, 3);
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_one_sided_handler() {
        let mut scene = Scene::new();
        let mut system = CollisionSystem::new();
        let hits = Rc::new(RefCell::new(Vec::new()));

        let a = system.add(unit_box_at(0.0));
        let sink = Rc::clone(&hits);
        let b = system.add_with_handler(unit_box_at(0.5), move |event, _| {
            sink.borrow_mut().push(event.other);
        });

        system.detect(&mut scene).unwrap();
        assert_eq!(*hits.borrow(), vec![a]);
        assert!(system.is_colliding(b));
        assert_eq!(system.collisions_for(a), vec![b]);
    }

    #[test]
    fn test_unsupported_pair_aborts_pass() {
        let mut scene = Scene::new();
        let mut system = CollisionSystem::new();
        system.add(BoundingVolume::point());
        system.add(BoundingVolume::point());
        assert_eq!(
            system.detect(&mut scene).err(),
            Some(CollisionError::Unsupported {
                a: VolumeKind::Point,
                b: VolumeKind::Point
            })
        );
    }

    #[test]
    fn test_remove_volume() {
        let mut scene = Scene::new();
        let mut system = CollisionSystem::new();
        let a = system.add(unit_box_at(0.0));
        let b = system.add(unit_box_at(0.5));
        system.detect(&mut scene).unwrap();
        assert!(system.is_colliding(a));

        assert!(system.remove_volume(b).is_some());
        assert!(!system.is_colliding(a));
        assert_eq!(system.len(), 1);
        assert!(system.detect(&mut scene).unwrap().is_empty());
        assert_eq!(
            system.set_handler(b, |_, _| {}),
            Err(CollisionError::MissingVolume(b))
        );
    }
}
