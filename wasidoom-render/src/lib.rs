//! GPU presentation of a fixed-size RGB frame, scaled to the window.

mod pipeline;
mod presenter;

pub use presenter::FramePresenter;
