mod generator;

pub use generator::{encode, render_image, render_unicode, save_png};
