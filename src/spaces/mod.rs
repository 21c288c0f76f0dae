/// Action and observation spaces.

pub mod space;

use ndarray::Array4;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

pub use space::Space;

/// A discrete space of integers in [0, n).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Discrete {
    n: u32,
}

impl Discrete {
    pub fn new(n: u32) -> Self {
        assert!(n > 0, "Discrete space requires n > 0");
        Self { n }
    }

    pub fn n(&self) -> u32 { self.n }
}

impl Space for Discrete {
    type Element = u32;

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Element {
        if self.n == 1 { return 0; }
        let dist = Uniform::from(0..self.n);
        dist.sample(rng)
    }

    fn contains(&self, elem: &Self::Element) -> bool { *elem < self.n }
}

/// Stacked image frames `(frames, height, width, channels)` of bytes in an
/// inclusive range, `[0, 255]` unless narrowed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSpace {
    shape: [usize; 4],
    low: u8,
    high: u8,
}

impl ImageSpace {
    pub fn new(shape: [usize; 4]) -> Self { Self::with_bounds(shape, 0, 255) }

    pub fn with_bounds(shape: [usize; 4], low: u8, high: u8) -> Self {
        assert!(low <= high, "low > high");
        Self { shape, low, high }
    }

    pub fn shape(&self) -> [usize; 4] { self.shape }
    pub fn low(&self) -> u8 { self.low }
    pub fn high(&self) -> u8 { self.high }
}

impl Space for ImageSpace {
    type Element = Array4<u8>;

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Element {
        let dist = Uniform::new_inclusive(self.low, self.high);
        let [n, h, w, c] = self.shape;
        Array4::from_shape_simple_fn((n, h, w, c), || dist.sample(&mut *rng))
    }

    fn contains(&self, elem: &Self::Element) -> bool {
        elem.shape() == self.shape.as_slice()
            && elem.iter().all(|&v| self.low <= v && v <= self.high)
    }
}
