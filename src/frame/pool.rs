use ndarray::{Array4, ArrayView3, ArrayViewMut3, Axis, Zip};

use super::shift_back;
use crate::core::{GymError, Result};

/// The last `P` raw RGB frames, newest first.
///
/// Frames are shifted on push rather than kept in a ring; `P` is small
/// (usually 2) so the shift is a single frame copy.
#[derive(Clone, Debug)]
pub struct PoolingBuffer {
    frames: Array4<u8>,
}

impl PoolingBuffer {
    /// Allocates `pool_len` zeroed frames of `height x width x 3`.
    pub fn new(pool_len: usize, height: usize, width: usize) -> Result<Self> {
        if pool_len == 0 {
            return Err(GymError::InvalidConfig("pool_len must be > 0".into()));
        }
        if height == 0 || width == 0 {
            return Err(GymError::InvalidConfig(format!(
                "raw frame dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        Ok(Self { frames: Array4::zeros((pool_len, height, width, 3)) })
    }

    pub fn len(&self) -> usize { self.frames.len_of(Axis(0)) }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Shape of a single frame, `(height, width, 3)`.
    pub fn frame_shape(&self) -> (usize, usize, usize) {
        let s = self.frames.shape();
        (s[1], s[2], s[3])
    }

    pub fn fill(&mut self, value: u8) { self.frames.fill(value); }

    /// Evicts the oldest frame and lets `write` fill the newest slot in place.
    pub fn push_with<F: FnOnce(&mut [u8])>(&mut self, write: F) -> Result<()> {
        shift_back(&mut self.frames);
        let mut newest = self.frames.index_axis_mut(Axis(0), 0);
        let slot = newest
            .as_slice_mut()
            .ok_or_else(|| GymError::InvalidObservation("pool slot is not contiguous".into()))?;
        write(slot);
        Ok(())
    }

    /// Copies `frame` into the newest slot, evicting the oldest.
    pub fn push(&mut self, frame: ArrayView3<u8>) -> Result<()> {
        if frame.dim() != self.frame_shape() {
            return Err(GymError::InvalidObservation(format!(
                "raw frame shape {:?} does not match pool slot shape {:?}",
                frame.dim(),
                self.frame_shape()
            )));
        }
        shift_back(&mut self.frames);
        self.frames.index_axis_mut(Axis(0), 0).assign(&frame);
        Ok(())
    }

    /// Frame at `index`, 0 being the most recent.
    pub fn frame(&self, index: usize) -> ArrayView3<'_, u8> {
        self.frames.index_axis(Axis(0), index)
    }

    /// Writes the pixel-wise maximum over all slots into `out`.
    ///
    /// Reads never modify the slots, so repeated calls without a push in
    /// between produce identical output.
    pub fn reduce_into(&self, mut out: ArrayViewMut3<u8>) {
        out.assign(&self.frame(0));
        for frame in self.frames.outer_iter().skip(1) {
            Zip::from(&mut out).and(&frame).for_each(|o, &v| {
                if v > *o {
                    *o = v;
                }
            });
        }
    }
}
