//! Running mean of spawned asset locations.
use glam::DVec3;

/// Arithmetic mean of the points added so far.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Centroid {
    mean: DVec3,
    count: usize,
}

impl Centroid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, point: DVec3) {
        self.count += 1;
        self.mean += (point - self.mean) / self.count as f64;
    }

    /// The mean, or `None` if no point was added.
    pub fn point(&self) -> Option<DVec3> {
        (self.count > 0).then_some(self.mean)
    }

    pub fn point_or_origin(&self) -> DVec3 {
        self.point().unwrap_or(DVec3::ZERO)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Extend<DVec3> for Centroid {
    fn extend<I: IntoIterator<Item = DVec3>>(&mut self, iter: I) {
        for point in iter {
            self.add(point);
        }
    }
}
