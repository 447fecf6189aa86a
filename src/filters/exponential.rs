use super::Smoother;
use nalgebra::Vector3;

/// Values that can be blended toward a target by a fixed fraction
pub trait Blend: Clone {
    /// Move `alpha` of the way from `self` to `target`
    #[must_use]
    fn blend(&self, target: &Self, alpha: f64) -> Self;
}

impl Blend for f64 {
    fn blend(&self, target: &Self, alpha: f64) -> Self {
        alpha.mul_add(target - self, *self)
    }
}

impl Blend for Vector3<f64> {
    fn blend(&self, target: &Self, alpha: f64) -> Self {
        self + (target - self) * alpha
    }
}

/// First-order exponential smoothing filter
///
/// `current = current + (target - current) * alpha`, with no velocity term.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialSmoother<T> {
    value: T,
}

impl<T: Blend> ExponentialSmoother<T> {
    /// Create a smoother resting at `initial`
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self { value: initial }
    }
}

impl<T: Blend> Smoother for ExponentialSmoother<T> {
    type Value = T;

    fn update(&mut self, target: &T, alpha: f64) -> T {
        self.value = self.value.blend(target, alpha.clamp(0.0, 1.0));
        self.value.clone()
    }

    fn value(&self) -> T {
        self.value.clone()
    }

    fn reset(&mut self, value: T) {
        self.value = value;
    }

    fn name(&self) -> &str {
        "ExponentialSmoother"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_smoother() {
        let mut filter = ExponentialSmoother::new(10.0);

        let v1 = filter.update(&20.0, 0.5);
        assert_eq!(v1, 15.0); // 10 + 0.5 * (20 - 10)

        let v2 = filter.update(&20.0, 0.5);
        assert_eq!(v2, 17.5);
        assert_eq!(filter.value(), 17.5);
    }

    #[test]
    fn test_alpha_bounds() {
        // High alpha = less smoothing
        let mut filter1 = ExponentialSmoother::new(10.0);
        let v = filter1.update(&20.0, 0.9);
        assert!((v - 19.0).abs() < 0.001);

        // Low alpha = more smoothing
        let mut filter2 = ExponentialSmoother::new(10.0);
        let v = filter2.update(&20.0, 0.1);
        assert!((v - 11.0).abs() < 0.001);

        // Out-of-range alpha is clamped rather than overshooting
        let mut filter3 = ExponentialSmoother::new(10.0);
        assert_eq!(filter3.update(&20.0, 1.5), 20.0);
    }

    #[test]
    fn test_vector_smoother() {
        let mut filter = ExponentialSmoother::new(Vector3::new(0.0, 0.0, 0.0));
        let v = filter.update(&Vector3::new(10.0, -20.0, 4.0), 0.25);
        assert_eq!(v, Vector3::new(2.5, -5.0, 1.0));
    }

    #[test]
    fn test_reset_reseeds() {
        let mut filter = ExponentialSmoother::new(1.0);
        filter.update(&3.0, 0.5);
        filter.reset(7.0);
        assert_eq!(filter.value(), 7.0);
    }
}
