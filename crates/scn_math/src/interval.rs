/// A closed range `[min, max]` along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Create a new interval given min and max values.
    ///
    /// The bounds are taken as given; `min > max` produces an empty interval.
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Returns the size of the interval (max - min).
    pub fn size(&self) -> f32 {
        self.max - self.min
    }

    /// Returns true if the interval contains nothing (min > max).
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Returns true if x is within the interval [min, max] (inclusive).
    pub fn contains(&self, x: f32) -> bool {
        self.min <= x && x <= self.max
    }

    /// Returns true if the two intervals share at least one point.
    ///
    /// Touching endpoints count as overlap. Empty intervals overlap nothing.
    pub fn overlaps(&self, other: &Interval) -> bool {
        !self.is_empty() && !other.is_empty() && self.min <= other.max && other.min <= self.max
    }

    /// Creates an interval that surrounds two other intervals.
    pub fn surrounding(a: &Interval, b: &Interval) -> Interval {
        Interval::new(a.min.min(b.min), a.max.max(b.max))
    }

    /// An empty interval (min > max, contains nothing).
    pub const EMPTY: Interval = Interval {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_size() {
        let interval = Interval::new(2.0, 7.0);
        assert_eq!(interval.size(), 5.0);

        let negative = Interval::new(-5.0, 5.0);
        assert_eq!(negative.size(), 10.0);
    }

    #[test]
    fn test_interval_contains() {
        let interval = Interval::new(0.0, 10.0);

        // Inclusive bounds
        assert!(interval.contains(0.0));
        assert!(interval.contains(10.0));
        assert!(interval.contains(5.0));

        assert!(!interval.contains(-0.1));
        assert!(!interval.contains(10.1));
    }

    #[test]
    fn test_interval_overlaps() {
        let a = Interval::new(0.0, 5.0);

        assert!(a.overlaps(&Interval::new(3.0, 8.0)));
        assert!(a.overlaps(&Interval::new(5.0, 8.0)), "touching endpoints overlap");
        assert!(a.overlaps(&Interval::new(1.0, 2.0)));
        assert!(!a.overlaps(&Interval::new(5.1, 8.0)));
        assert!(!a.overlaps(&Interval::EMPTY));
        assert!(!Interval::EMPTY.overlaps(&Interval::EMPTY));
    }

    #[test]
    fn test_interval_empty() {
        let empty = Interval::EMPTY;

        assert!(empty.is_empty());
        assert!(!empty.contains(0.0));
        assert!(!empty.contains(f32::INFINITY));

        // Reversed bounds are empty too
        assert!(Interval::new(1.0, 0.0).is_empty());
        assert!(!Interval::new(1.0, 1.0).is_empty());
    }

    #[test]
    fn test_interval_surrounding_empty_is_identity() {
        let a = Interval::new(-1.0, 2.0);
        assert_eq!(Interval::surrounding(&a, &Interval::EMPTY), a);
        assert_eq!(Interval::surrounding(&Interval::EMPTY, &a), a);
    }
}
