//! Rasterizes trajectory frames as scatter plots and writes them out as GIF,
//! MP4 or a PNG sequence.

pub mod animate;
pub mod scatter;
pub mod sink;
pub mod text;

pub use animate::animate;
pub use scatter::{frame_title, ScatterPlot, ScatterStyle};
pub use sink::{open_sink, FrameSink, OutputFormat, SinkOptions};
