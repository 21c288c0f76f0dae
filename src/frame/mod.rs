//! Frame buffers and the preprocessing chain between them.
//!
//! Raw emulator frames land in a [`PoolingBuffer`]; once per agent step the
//! [`TransformStage`] max-reduces the pool, optionally converts it to
//! greyscale and rescales it, and writes the result into the newest slot of
//! the [`HistoryBuffer`], whose read-only view is the observation.

pub mod history;
pub mod pool;
pub mod transform;

pub use history::{HistoryBuffer, Observation};
pub use pool::PoolingBuffer;
pub use transform::{greyscale, luma, PipelineKind, Resampler, TransformStage};

use ndarray::{s, Array4, Axis};

/// Moves every frame one slot towards the back, dropping the last one.
/// Slot 0 keeps its previous contents.
pub(crate) fn shift_back(frames: &mut Array4<u8>) {
    for i in (1..frames.len_of(Axis(0))).rev() {
        let (mut dst, src) = frames.multi_slice_mut((s![i, .., .., ..], s![i - 1, .., .., ..]));
        dst.assign(&src);
    }
}
