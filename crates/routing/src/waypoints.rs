use std::fmt;

use model::{RouteMarkType, Waypoint, WaypointKey};

/// Backend holding the route marks shown to the user. The store keeps its
/// rules (replacement, ordering, limits) on top of it.
pub trait MarkStorage: Send + Sync {
    fn list(&self) -> Vec<Waypoint>;
    fn get(&self, key: WaypointKey) -> Option<Waypoint>;
    fn create(&mut self, waypoint: Waypoint);
    /// Replaces the mark stored under `key`. Returns false if there is none.
    fn update(&mut self, key: WaypointKey, waypoint: Waypoint) -> bool;
    fn remove(&mut self, key: WaypointKey) -> Option<Waypoint>;
    fn clear(&mut self);
}

#[derive(Debug, Default)]
pub struct MemoryMarks {
    marks: Vec<Waypoint>,
}

impl MarkStorage for MemoryMarks {
    fn list(&self) -> Vec<Waypoint> {
        self.marks.clone()
    }

    fn get(&self, key: WaypointKey) -> Option<Waypoint> {
        self.marks.iter().find(|mark| mark.key() == key).cloned()
    }

    fn create(&mut self, waypoint: Waypoint) {
        self.marks.push(waypoint);
    }

    fn update(&mut self, key: WaypointKey, waypoint: Waypoint) -> bool {
        match self.marks.iter_mut().find(|mark| mark.key() == key) {
            Some(mark) => {
                *mark = waypoint;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, key: WaypointKey) -> Option<Waypoint> {
        let index = self.marks.iter().position(|mark| mark.key() == key)?;
        Some(self.marks.remove(index))
    }

    fn clear(&mut self) {
        self.marks.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaypointError {
    IntermediateLimitReached { limit: usize },
    NotFound(WaypointKey),
}

impl std::error::Error for WaypointError {}

impl fmt::Display for WaypointError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WaypointError::IntermediateLimitReached { limit } => {
                write!(f, "at most {} intermediate points are allowed", limit)
            }
            WaypointError::NotFound(key) => write!(f, "no {} point", key),
        }
    }
}

/// Ordered route points: at most one start, at most one finish and a bounded
/// sequence of intermediate points whose indices are always `0..n`.
pub struct WaypointStore {
    marks: Box<dyn MarkStorage>,
    max_intermediate_points: usize,
    ordered: Option<Vec<Waypoint>>,
}

impl WaypointStore {
    pub fn new(marks: Box<dyn MarkStorage>, max_intermediate_points: usize) -> Self {
        Self {
            marks,
            max_intermediate_points,
            ordered: None,
        }
    }

    pub fn in_memory(max_intermediate_points: usize) -> Self {
        Self::new(Box::<MemoryMarks>::default(), max_intermediate_points)
    }

    /// Adds a point. A start or finish replaces the existing one, an
    /// intermediate point is appended.
    pub fn add(&mut self, mut waypoint: Waypoint) -> Result<WaypointKey, WaypointError> {
        match waypoint.mark_type {
            RouteMarkType::Start | RouteMarkType::Finish => {
                let key = WaypointKey::new(waypoint.mark_type, 0);
                if self.marks.remove(key).is_some() {
                    log::debug!("replacing {} point", key);
                }
                waypoint.intermediate_index = 0;
            }
            RouteMarkType::Intermediate => {
                if !self.can_add_intermediate() {
                    return Err(WaypointError::IntermediateLimitReached {
                        limit: self.max_intermediate_points,
                    });
                }
                waypoint.intermediate_index = self.intermediate_count();
            }
        }
        waypoint.is_visible = !waypoint.is_my_position;

        let key = waypoint.key();
        self.marks.create(waypoint);
        self.invalidate();
        Ok(key)
    }

    pub fn remove(&mut self, key: WaypointKey) -> Option<Waypoint> {
        let removed = self.marks.remove(key)?;
        if key.mark_type == RouteMarkType::Intermediate {
            // close the gap, lowest index first so keys never collide
            let count = self.intermediate_count() + 1;
            for index in key.intermediate_index + 1..count {
                self.reindex(index, index - 1);
            }
        }
        self.invalidate();
        Some(removed)
    }

    /// Moves a point to another role or index, keeping its payload.
    pub fn move_point(
        &mut self,
        from: WaypointKey,
        to: WaypointKey,
    ) -> Result<(), WaypointError> {
        let mut waypoint = self.marks.get(from).ok_or(WaypointError::NotFound(from))?;
        if from == to {
            return Ok(());
        }
        if to.mark_type == RouteMarkType::Intermediate
            && from.mark_type != RouteMarkType::Intermediate
            && !self.can_add_intermediate()
        {
            return Err(WaypointError::IntermediateLimitReached {
                limit: self.max_intermediate_points,
            });
        }

        self.remove(from);
        waypoint.mark_type = to.mark_type;
        match to.mark_type {
            RouteMarkType::Start | RouteMarkType::Finish => {
                self.marks.remove(to);
                waypoint.intermediate_index = 0;
                self.marks.create(waypoint);
            }
            RouteMarkType::Intermediate => {
                let count = self.intermediate_count();
                let index = to.intermediate_index.min(count);
                // make room, highest index first
                for current in (index..count).rev() {
                    self.reindex(current, current + 1);
                }
                waypoint.intermediate_index = index;
                self.marks.create(waypoint);
            }
        }
        self.invalidate();
        Ok(())
    }

    pub fn get(&self, key: WaypointKey) -> Option<Waypoint> {
        self.marks.get(key)
    }

    /// Hides a point without removing it from the route.
    pub fn hide(&mut self, key: WaypointKey) -> bool {
        let Some(mut waypoint) = self.marks.get(key) else {
            return false;
        };
        waypoint.is_visible = false;
        let updated = self.marks.update(key, waypoint);
        self.invalidate();
        updated
    }

    pub fn is_my_position(&self, key: WaypointKey) -> bool {
        self.marks
            .get(key)
            .is_some_and(|waypoint| waypoint.is_my_position)
    }

    pub fn count(&self) -> usize {
        self.marks.list().len()
    }

    pub fn intermediate_count(&self) -> usize {
        self.marks
            .list()
            .iter()
            .filter(|mark| mark.mark_type == RouteMarkType::Intermediate)
            .count()
    }

    pub fn can_add_intermediate(&self) -> bool {
        self.intermediate_count() < self.max_intermediate_points
    }

    /// Start, intermediate points in order, finish. Visibility does not
    /// matter here: hidden points still take part in a route.
    pub fn snapshot(&mut self) -> &[Waypoint] {
        let marks = &self.marks;
        self.ordered.get_or_insert_with(|| {
            let mut points = marks.list();
            points.sort_by_key(|point| {
                let rank = match point.mark_type {
                    RouteMarkType::Start => 0,
                    RouteMarkType::Intermediate => 1,
                    RouteMarkType::Finish => 2,
                };
                (rank, point.intermediate_index)
            });
            points
        })
    }

    pub fn clear(&mut self) {
        self.marks.clear();
        self.invalidate();
    }

    fn reindex(&mut self, from: usize, to: usize) {
        let key = WaypointKey::intermediate(from);
        if let Some(mut waypoint) = self.marks.get(key) {
            waypoint.intermediate_index = to;
            self.marks.update(key, waypoint);
        }
    }

    fn invalidate(&mut self) {
        self.ordered = None;
    }
}
