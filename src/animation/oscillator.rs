/// A value swinging back and forth between two bounds, such as the rocking
/// of a boat.
///
/// Each tick moves the value by `step`. The direction flips once the value
/// has passed a bound, so it overshoots by at most one step.
#[derive(Clone, Debug, PartialEq)]
pub struct Oscillator {
    value: f32,
    step: f32,
    min: f32,
    max: f32,
    rising: bool,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(0.05, -5.0, 3.0)
    }
}

impl Oscillator {
    /// Starts at zero, rising.
    pub fn new(step: f32, min: f32, max: f32) -> Self {
        Self {
            value: 0.0,
            step,
            min,
            max,
            rising: true,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_rising(&self) -> bool {
        self.rising
    }

    pub fn tick(&mut self) -> f32 {
        if self.rising {
            self.value += self.step;
        } else {
            self.value -= self.step;
        }
        if self.value > self.max || self.value < self.min {
            self.rising = !self.rising;
        }
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turns_around_past_the_bounds() {
        let mut osc = Oscillator::new(1.0, -2.0, 2.0);
        let values: Vec<_> = (0..9).map(|_| osc.tick()).collect();
        assert_eq!(values, [1.0, 2.0, 3.0, 2.0, 1.0, 0.0, -1.0, -2.0, -3.0]);
        assert!(osc.is_rising());
    }

    #[test]
    fn stays_near_the_bounds() {
        let mut osc = Oscillator::default();
        for _ in 0..10_000 {
            let v = osc.tick();
            assert!((-5.1..=3.1).contains(&v));
        }
    }
}
