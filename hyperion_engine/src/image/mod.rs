/// Image module - pixel formats and GPU images

pub mod format;
pub mod image;

pub use format::*;
pub use image::Image;
