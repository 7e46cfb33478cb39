pub mod html;
pub mod renderer;

pub use renderer::{DocumentRenderer, WkhtmltopdfRenderer};
