use ndarray::{Array4, ArrayView3, ArrayView4, ArrayViewMut3, Axis};

use super::shift_back;
use crate::core::{GymError, Result};

/// Read-only view of the frame history, shaped `(H, height, width, channels)`
/// with slot 0 the most recent frame.
///
/// The view borrows the environment's buffer, so it cannot outlive the next
/// `step` or `reset`, and it offers no way to write:
///
/// ```compile_fail
/// use gym_dm_atari::frame::HistoryBuffer;
///
/// let mut history = HistoryBuffer::new(2, 1, 1, 1).unwrap();
/// let mut obs = history.observation();
/// obs[[0, 0, 0, 0]] = 1;
/// ```
pub type Observation<'a> = ArrayView4<'a, u8>;

/// The last `H` processed frames, newest first.
#[derive(Clone, Debug)]
pub struct HistoryBuffer {
    frames: Array4<u8>,
}

impl HistoryBuffer {
    pub fn new(hist_len: usize, height: usize, width: usize, channels: usize) -> Result<Self> {
        if hist_len == 0 {
            return Err(GymError::InvalidConfig("hist_len must be > 0".into()));
        }
        if height == 0 || width == 0 || channels == 0 {
            return Err(GymError::InvalidConfig(format!(
                "history frame shape must be non-zero, got {}x{}x{}",
                height, width, channels
            )));
        }
        Ok(Self { frames: Array4::zeros((hist_len, height, width, channels)) })
    }

    pub fn len(&self) -> usize { self.frames.len_of(Axis(0)) }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Shape of a single frame, `(height, width, channels)`.
    pub fn frame_shape(&self) -> (usize, usize, usize) {
        let s = self.frames.shape();
        (s[1], s[2], s[3])
    }

    /// Full observation shape, `(H, height, width, channels)`.
    pub fn shape(&self) -> [usize; 4] {
        let s = self.frames.shape();
        [s[0], s[1], s[2], s[3]]
    }

    pub fn fill(&mut self, value: u8) { self.frames.fill(value); }

    /// Shifts every frame back one slot, dropping the oldest, and returns the
    /// newest slot for the caller to overwrite.
    ///
    /// The returned slot still holds the previous newest frame until written.
    pub fn advance(&mut self) -> ArrayViewMut3<'_, u8> {
        shift_back(&mut self.frames);
        self.frames.index_axis_mut(Axis(0), 0)
    }

    /// Pushes a copy of `frame` as the newest entry.
    pub fn push(&mut self, frame: ArrayView3<u8>) -> Result<()> {
        if frame.dim() != self.frame_shape() {
            return Err(GymError::InvalidObservation(format!(
                "frame shape {:?} does not match history slot shape {:?}",
                frame.dim(),
                self.frame_shape()
            )));
        }
        self.advance().assign(&frame);
        Ok(())
    }

    /// Frame at `index`, 0 being the most recent.
    pub fn frame(&self, index: usize) -> ArrayView3<'_, u8> {
        self.frames.index_axis(Axis(0), index)
    }

    pub fn observation(&self) -> Observation<'_> { self.frames.view() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn push_orders_most_recent_first() {
        let mut history = HistoryBuffer::new(2, 2, 2, 1).unwrap();
        let f1 = Array3::from_elem((2, 2, 1), 1u8);
        let f2 = Array3::from_elem((2, 2, 1), 2u8);
        history.push(f1.view()).unwrap();
        history.push(f2.view()).unwrap();
        assert_eq!(history.frame(0), f2);
        assert_eq!(history.frame(1), f1);
    }

    #[test]
    fn oldest_frame_is_evicted() {
        let mut history = HistoryBuffer::new(3, 1, 1, 1).unwrap();
        for v in 1..=5u8 {
            history.push(Array3::from_elem((1, 1, 1), v).view()).unwrap();
        }
        let obs = history.observation();
        assert_eq!(obs.iter().copied().collect::<Vec<_>>(), vec![5, 4, 3]);
    }

    #[test]
    fn advance_keeps_previous_newest_until_written() {
        let mut history = HistoryBuffer::new(4, 1, 2, 1).unwrap();
        for v in 1..=4u8 {
            history.push(Array3::from_elem((1, 2, 1), v).view()).unwrap();
        }
        let slot = history.advance();
        assert!(slot.iter().all(|&v| v == 4));
        let obs: Vec<u8> = history.observation().outer_iter().map(|f| f[[0, 0, 0]]).collect();
        assert_eq!(obs, vec![4, 4, 3, 2]);
    }

    #[test]
    fn fill_zeroes_every_slot() {
        let mut history = HistoryBuffer::new(2, 1, 2, 3).unwrap();
        history.push(Array3::from_elem((1, 2, 3), 9u8).view()).unwrap();
        history.fill(0);
        assert!(history.observation().iter().all(|&v| v == 0));
        assert_eq!(history.shape(), [2, 1, 2, 3]);
    }

    #[test]
    fn mismatched_frame_is_rejected() {
        let mut history = HistoryBuffer::new(2, 2, 2, 1).unwrap();
        let rgb = Array3::<u8>::zeros((2, 2, 3));
        assert!(matches!(history.push(rgb.view()), Err(GymError::InvalidObservation(_))));
    }

    #[test]
    fn zero_depth_is_rejected() {
        assert!(matches!(HistoryBuffer::new(0, 84, 84, 1), Err(GymError::InvalidConfig(_))));
    }

    #[test]
    fn observation_shares_storage() {
        let mut history = HistoryBuffer::new(2, 1, 1, 1).unwrap();
        let before = history.observation().as_ptr();
        history.push(Array3::from_elem((1, 1, 1), 3u8).view()).unwrap();
        assert_eq!(history.observation().as_ptr(), before);
    }
}
