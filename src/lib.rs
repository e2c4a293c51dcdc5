// Polyphase scaler pipeline library

pub mod cli;
pub mod filter;
pub mod gamma;
pub mod geometry;
pub mod logging;
pub mod mask;
pub mod pipeline;
pub mod pixmap;
pub mod scaler;

pub use filter::FilterData;
pub use gamma::GammaTable;
pub use geometry::{Placement, ScalingMode};
pub use mask::ShadowMask;
pub use pipeline::{OutputConfig, Pipeline};
pub use pixmap::Pixmap;
