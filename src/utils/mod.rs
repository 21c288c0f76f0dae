pub mod rng;
pub mod render;
pub mod render2d;

pub use rng::{RngStream, SeedSequence, rng_from_seed, split_n};
pub use render::{encode_frame_png, encode_png, save_frame_png, save_png};
pub use render2d::{Canvas, Color};
