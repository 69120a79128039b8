use std::collections::VecDeque;

use rover_proto::BatterySample;
use serde::Serialize;

/// Radar return projected into the scene plane, origin at the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectionPoint {
    pub x: f32,
    pub y: f32,
}

impl DetectionPoint {
    pub fn from_polar(angle_deg: f32, distance: f32) -> Self {
        let rad = angle_deg.to_radians();
        Self { x: distance * rad.cos(), y: distance * rad.sin() }
    }
}

/// Most recent radar detections, oldest evicted first.
#[derive(Debug, Clone)]
pub struct DetectionHistory {
    points: VecDeque<DetectionPoint>,
    capacity: usize,
}

impl DetectionHistory {
    pub fn new(capacity: usize) -> Self {
        Self { points: VecDeque::with_capacity(capacity + 1), capacity }
    }

    /// Adds the newest point and returns the one evicted to make room, if any.
    pub fn push(&mut self, point: DetectionPoint) -> Option<DetectionPoint> {
        self.points.push_back(point);
        if self.points.len() > self.capacity {
            return self.points.pop_front();
        }
        None
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&DetectionPoint> {
        self.points.back()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &DetectionPoint> {
        self.points.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// wall clock, hh:mm:ss
    pub timestamp: String,
    pub bus_voltage: f32,
    pub shunt_voltage: f32,
    pub load_voltage: f32,
    pub current: f32,
    pub power: f32,
}

impl HistoryEntry {
    pub fn new(timestamp: String, s: &BatterySample) -> Self {
        Self {
            timestamp,
            bus_voltage: s.bus_voltage,
            shunt_voltage: s.shunt_voltage,
            load_voltage: s.load_voltage,
            current: s.current,
            power: s.power,
        }
    }
}

/// Fixed window of battery readings, newest in slot 0.
#[derive(Debug, Clone)]
pub struct BatteryHistory {
    slots: VecDeque<HistoryEntry>,
    window: usize,
}

impl BatteryHistory {
    pub fn new(window: usize) -> Self {
        Self { slots: VecDeque::with_capacity(window), window }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.slots.push_front(entry);
        self.slots.truncate(self.window);
    }

    /// Newest first.
    pub fn slots(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
