mod loader;
mod overlay;

pub use loader::load_image;
pub use overlay::BoxOverlay;
