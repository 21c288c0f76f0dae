use ndarray::{Array3, ArrayView3, ArrayViewMut3, Axis, Zip};

use super::pool::PoolingBuffer;

/// Which of the four preprocessing chains a [`TransformStage`] runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineKind {
    /// The pool reduction is written straight into the history slot.
    Raw,
    Greyscale,
    Rescale,
    GreyscaleRescale,
}

impl PipelineKind {
    pub fn new(use_greyscale: bool, use_rescale: bool) -> Self {
        match (use_greyscale, use_rescale) {
            (true, true) => PipelineKind::GreyscaleRescale,
            (true, false) => PipelineKind::Greyscale,
            (false, true) => PipelineKind::Rescale,
            (false, false) => PipelineKind::Raw,
        }
    }
}

/// Buffers of each chain, allocated once when the stage is built.
#[derive(Clone, Debug)]
enum Pipeline {
    Raw,
    Greyscale { reduced: Array3<u8> },
    Rescale { reduced: Array3<u8>, resampler: Resampler },
    GreyscaleRescale { reduced: Array3<u8>, grey: Array3<u8>, resampler: Resampler },
}

/// Turns the pooled raw frames into one processed frame.
///
/// The chain is fixed at construction: max-reduce, then greyscale if
/// requested, then bilinear rescale if requested. The final step of the chain
/// writes into the caller's destination (the newest history slot), so a step
/// allocates nothing.
#[derive(Clone, Debug)]
pub struct TransformStage {
    pipeline: Pipeline,
    output_shape: (usize, usize, usize),
}

impl TransformStage {
    /// `native` is the raw `(height, width)`; `rescale` the output `(height, width)`, if any.
    pub fn new(native: (usize, usize), use_greyscale: bool, rescale: Option<(usize, usize)>) -> Self {
        let (height, width) = native;
        let channels = if use_greyscale { 1 } else { 3 };
        let (out_h, out_w) = rescale.unwrap_or(native);
        let pipeline = match PipelineKind::new(use_greyscale, rescale.is_some()) {
            PipelineKind::Raw => Pipeline::Raw,
            PipelineKind::Greyscale => Pipeline::Greyscale { reduced: Array3::zeros((height, width, 3)) },
            PipelineKind::Rescale => Pipeline::Rescale {
                reduced: Array3::zeros((height, width, 3)),
                resampler: Resampler::new((height, width), (out_h, out_w)),
            },
            PipelineKind::GreyscaleRescale => Pipeline::GreyscaleRescale {
                reduced: Array3::zeros((height, width, 3)),
                grey: Array3::zeros((height, width, 1)),
                resampler: Resampler::new((height, width), (out_h, out_w)),
            },
        };
        Self { pipeline, output_shape: (out_h, out_w, channels) }
    }

    pub fn kind(&self) -> PipelineKind {
        match self.pipeline {
            Pipeline::Raw => PipelineKind::Raw,
            Pipeline::Greyscale { .. } => PipelineKind::Greyscale,
            Pipeline::Rescale { .. } => PipelineKind::Rescale,
            Pipeline::GreyscaleRescale { .. } => PipelineKind::GreyscaleRescale,
        }
    }

    /// Shape of the processed frame, `(height, width, channels)`.
    pub fn output_shape(&self) -> (usize, usize, usize) { self.output_shape }

    /// Reduces `pool` and runs the chain, writing the result into `out`.
    pub fn apply(&mut self, pool: &PoolingBuffer, out: ArrayViewMut3<u8>) {
        match &mut self.pipeline {
            Pipeline::Raw => pool.reduce_into(out),
            Pipeline::Greyscale { reduced } => {
                pool.reduce_into(reduced.view_mut());
                greyscale(reduced.view(), out);
            }
            Pipeline::Rescale { reduced, resampler } => {
                pool.reduce_into(reduced.view_mut());
                resampler.apply(reduced.view(), out);
            }
            Pipeline::GreyscaleRescale { reduced, grey, resampler } => {
                pool.reduce_into(reduced.view_mut());
                greyscale(reduced.view(), grey.view_mut());
                resampler.apply(grey.view(), out);
            }
        }
    }
}

/// ITU-R BT.601 luma in 14-bit fixed point, rounded to nearest.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + (1 << 13)) >> 14) as u8
}

/// Converts an `(h, w, 3)` RGB frame into an `(h, w, 1)` luma frame.
pub fn greyscale(input: ArrayView3<u8>, mut out: ArrayViewMut3<u8>) {
    Zip::from(out.lanes_mut(Axis(2)))
        .and(input.lanes(Axis(2)))
        .for_each(|mut o, px| o[0] = luma(px[0], px[1], px[2]));
}

/// Source taps `(lo, hi, weight of hi)` for one output coordinate.
type Tap = (usize, usize, f32);

/// Bilinear resampling with pixel-centre alignment and edge clamping.
/// Tap tables are computed once per output size.
#[derive(Clone, Debug)]
pub struct Resampler {
    rows: Vec<Tap>,
    cols: Vec<Tap>,
}

impl Resampler {
    /// Maps `(height, width)` frames onto `(out_height, out_width)`.
    pub fn new(input: (usize, usize), output: (usize, usize)) -> Self {
        Self { rows: taps(input.0, output.0), cols: taps(input.1, output.1) }
    }

    pub fn apply(&self, input: ArrayView3<u8>, mut out: ArrayViewMut3<u8>) {
        Zip::indexed(&mut out).for_each(|(y, x, c), o| {
            let (y0, y1, wy) = self.rows[y];
            let (x0, x1, wx) = self.cols[x];
            let top = input[[y0, x0, c]] as f32 * (1.0 - wx) + input[[y0, x1, c]] as f32 * wx;
            let bottom = input[[y1, x0, c]] as f32 * (1.0 - wx) + input[[y1, x1, c]] as f32 * wx;
            let v = top * (1.0 - wy) + bottom * wy;
            *o = (v + 0.5).clamp(0.0, 255.0) as u8;
        });
    }
}

fn taps(src: usize, dst: usize) -> Vec<Tap> {
    let scale = src as f32 / dst as f32;
    (0..dst)
        .map(|d| {
            let f = (d as f32 + 0.5) * scale - 0.5;
            if f <= 0.0 {
                return (0, 0, 0.0);
            }
            let lo = f.floor() as usize;
            if lo >= src - 1 {
                return (src - 1, src - 1, 0.0);
            }
            (lo, lo + 1, f - lo as f32)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_with(frames: &[Array3<u8>]) -> PoolingBuffer {
        let (h, w, _) = frames[0].dim();
        let mut pool = PoolingBuffer::new(frames.len(), h, w).unwrap();
        for f in frames {
            pool.push(f.view()).unwrap();
        }
        pool
    }

    #[test]
    fn kind_is_chosen_from_flags() {
        assert_eq!(PipelineKind::new(true, true), PipelineKind::GreyscaleRescale);
        assert_eq!(PipelineKind::new(true, false), PipelineKind::Greyscale);
        assert_eq!(PipelineKind::new(false, true), PipelineKind::Rescale);
        assert_eq!(PipelineKind::new(false, false), PipelineKind::Raw);
    }

    #[test]
    fn luma_matches_bt601() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(0, 0, 255), 29);
    }

    #[test]
    fn raw_pipeline_outputs_pooled_rgb() {
        let a = Array3::from_shape_vec((1, 2, 3), vec![1, 2, 3, 4, 5, 6]).unwrap();
        let b = Array3::from_shape_vec((1, 2, 3), vec![6, 5, 4, 3, 2, 1]).unwrap();
        let pool = pool_with(&[a, b]);
        let mut stage = TransformStage::new((1, 2), false, None);
        assert_eq!(stage.kind(), PipelineKind::Raw);
        assert_eq!(stage.output_shape(), (1, 2, 3));
        let mut out = Array3::<u8>::zeros((1, 2, 3));
        stage.apply(&pool, out.view_mut());
        assert_eq!(out.as_slice().unwrap(), &[6, 5, 4, 4, 5, 6]);
    }

    #[test]
    fn greyscale_pipeline_outputs_one_channel() {
        let white = Array3::from_elem((2, 2, 3), 255u8);
        let pool = pool_with(&[white]);
        let mut stage = TransformStage::new((2, 2), true, None);
        assert_eq!(stage.output_shape(), (2, 2, 1));
        let mut out = Array3::<u8>::zeros((2, 2, 1));
        stage.apply(&pool, out.view_mut());
        assert!(out.iter().all(|&v| v == 255));
    }

    #[test]
    fn rescale_of_constant_frame_is_constant() {
        let frame = Array3::from_elem((210, 160, 3), 77u8);
        let pool = pool_with(&[frame]);
        let mut stage = TransformStage::new((210, 160), false, Some((84, 84)));
        assert_eq!(stage.kind(), PipelineKind::Rescale);
        let mut out = Array3::<u8>::zeros((84, 84, 3));
        stage.apply(&pool, out.view_mut());
        assert!(out.iter().all(|&v| v == 77));
    }

    #[test]
    fn greyscale_then_rescale_has_requested_shape() {
        let frame = Array3::from_elem((210, 160, 3), 255u8);
        let pool = pool_with(&[frame]);
        let mut stage = TransformStage::new((210, 160), true, Some((84, 84)));
        assert_eq!(stage.output_shape(), (84, 84, 1));
        let mut out = Array3::<u8>::zeros((84, 84, 1));
        stage.apply(&pool, out.view_mut());
        assert!(out.iter().all(|&v| v == 255));
    }

    #[test]
    fn identity_resample_is_exact() {
        let input = Array3::from_shape_fn((3, 4, 1), |(y, x, _)| (y * 40 + x * 10) as u8);
        let mut out = Array3::<u8>::zeros((3, 4, 1));
        Resampler::new((3, 4), (3, 4)).apply(input.view(), out.view_mut());
        assert_eq!(out, input);
    }

    #[test]
    fn upsampling_interpolates_between_neighbours() {
        let input = Array3::from_shape_vec((1, 2, 1), vec![0u8, 100]).unwrap();
        let mut out = Array3::<u8>::zeros((1, 4, 1));
        Resampler::new((1, 2), (1, 4)).apply(input.view(), out.view_mut());
        assert_eq!(out.as_slice().unwrap(), &[0, 25, 75, 100]);
    }

    #[test]
    fn downsampling_uses_pixel_centre_taps_without_widening() {
        let input = Array3::from_shape_vec((1, 4, 1), vec![0u8, 100, 200, 250]).unwrap();
        let mut out = Array3::<u8>::zeros((1, 2, 1));
        Resampler::new((1, 4), (1, 2)).apply(input.view(), out.view_mut());
        assert_eq!(out.as_slice().unwrap(), &[50, 225]);
    }
}
