mod app;
mod render;

pub use app::{App, Executor};
pub use render::draw;
