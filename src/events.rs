use crate::operator::Operator;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Compass classification of a horizontal vector: the axis with the larger
/// magnitude decides East/West vs North/South, the sign decides polarity.
/// +Z is South, matching the authored world layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn classify(v: Vec3) -> Self {
        if v.x.abs() > v.z.abs() {
            if v.x > 0.0 {
                Direction::East
            } else {
                Direction::West
            }
        } else if v.z > 0.0 {
            Direction::South
        } else {
            Direction::North
        }
    }
}

type EdgeCallback = Box<dyn FnMut(&mut Operator, Direction)>;
type UpdateCallback = Box<dyn FnMut(&mut Operator)>;

/// Radius-triggered zone with enter/update/exit callbacks. `active` is the
/// only persisted state; crossing the radius inward fires `on_start` with
/// the entry direction, crossing back out fires `on_finish` with the exit
/// direction, and `on_update` runs every frame in between.
pub struct TriggerZone {
    id: String,
    origin: Vec3,
    trigger_radius: f32,
    active: bool,
    on_start: Option<EdgeCallback>,
    on_update: Option<UpdateCallback>,
    on_finish: Option<EdgeCallback>,
}

impl TriggerZone {
    pub fn new(id: impl Into<String>, origin: Vec3, trigger_radius: f32) -> Self {
        Self {
            id: id.into(),
            origin,
            trigger_radius,
            active: false,
            on_start: None,
            on_update: None,
            on_finish: None,
        }
    }

    pub fn on_start(mut self, callback: impl FnMut(&mut Operator, Direction) + 'static) -> Self {
        self.on_start = Some(Box::new(callback));
        self
    }

    pub fn on_update(mut self, callback: impl FnMut(&mut Operator) + 'static) -> Self {
        self.on_update = Some(Box::new(callback));
        self
    }

    pub fn on_finish(mut self, callback: impl FnMut(&mut Operator, Direction) + 'static) -> Self {
        self.on_finish = Some(Box::new(callback));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn crossing_direction(&self, actor_position: Vec3) -> Direction {
        let outward = actor_position - self.origin;
        let outward = if outward.length_squared() > f32::EPSILON { outward.normalize() } else { outward };
        Direction::classify(outward)
    }

    pub fn check(&mut self, actor_position: Vec3, operator: &mut Operator) {
        let distance = actor_position.distance(self.origin);
        if !self.active && distance < self.trigger_radius {
            self.active = true;
            let entry = self.crossing_direction(actor_position);
            if let Some(callback) = self.on_start.as_mut() {
                callback(operator, entry);
            }
        } else if self.active && distance > self.trigger_radius {
            self.active = false;
            let exit = self.crossing_direction(actor_position);
            if let Some(callback) = self.on_finish.as_mut() {
                callback(operator, exit);
            }
        }
        if self.active {
            if let Some(callback) = self.on_update.as_mut() {
                callback(operator);
            }
        }
    }
}

/// Ordered zone list, evaluated in insertion order every frame. No spatial
/// partitioning; zone counts stay small (< 20).
#[derive(Default)]
pub struct EventManager {
    zones: Vec<TriggerZone>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, zone: TriggerZone) {
        self.zones.push(zone);
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn check(&mut self, actor_position: Vec3, operator: &mut Operator) {
        for zone in &mut self.zones {
            zone.check(actor_position, operator);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::Operator;
    use std::cell::Cell;
    use std::rc::Rc;

    fn bare_operator() -> Operator {
        Operator::new(Vec::new(), Vec::new(), crate::config::OperatorConfig::default())
    }

    #[test]
    fn classify_picks_the_dominant_axis() {
        assert_eq!(Direction::classify(Vec3::new(3.0, 0.0, 1.0)), Direction::East);
        assert_eq!(Direction::classify(Vec3::new(-3.0, 0.0, 1.0)), Direction::West);
        assert_eq!(Direction::classify(Vec3::new(1.0, 0.0, 3.0)), Direction::South);
        assert_eq!(Direction::classify(Vec3::new(1.0, 0.0, -3.0)), Direction::North);
    }

    #[test]
    fn zone_fires_start_and_finish_once_per_crossing() {
        let starts = Rc::new(Cell::new(0));
        let finishes = Rc::new(Cell::new(0));
        let start_count = Rc::clone(&starts);
        let finish_count = Rc::clone(&finishes);
        let mut zone = TriggerZone::new("hysteresis", Vec3::ZERO, 5.0)
            .on_start(move |_, _| start_count.set(start_count.get() + 1))
            .on_finish(move |_, _| finish_count.set(finish_count.get() + 1));
        let mut operator = bare_operator();

        // Approach 10 -> 3 -> back out to 10; several frames at each range.
        for distance in [10.0, 8.0, 3.0, 2.0, 3.0, 8.0, 10.0] {
            zone.check(Vec3::new(0.0, 0.0, distance), &mut operator);
        }
        assert_eq!(starts.get(), 1, "exactly one enter");
        assert_eq!(finishes.get(), 1, "exactly one exit");
    }

    #[test]
    fn zone_reports_entry_direction() {
        let seen = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        let mut zone = TriggerZone::new("direction", Vec3::ZERO, 5.0)
            .on_start(move |_, direction| sink.set(Some(direction)));
        let mut operator = bare_operator();
        // Enter from the east side.
        zone.check(Vec3::new(4.0, 0.0, 1.0), &mut operator);
        assert_eq!(seen.get(), Some(Direction::East));
    }

    #[test]
    fn update_fires_every_active_frame() {
        let updates = Rc::new(Cell::new(0));
        let update_count = Rc::clone(&updates);
        let mut zone = TriggerZone::new("update", Vec3::ZERO, 5.0)
            .on_update(move |_| update_count.set(update_count.get() + 1));
        let mut operator = bare_operator();
        zone.check(Vec3::new(0.0, 0.0, 2.0), &mut operator);
        zone.check(Vec3::new(0.0, 0.0, 2.5), &mut operator);
        zone.check(Vec3::new(0.0, 0.0, 9.0), &mut operator);
        assert_eq!(updates.get(), 2, "on_update runs only while active");
    }
}
