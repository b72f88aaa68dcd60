mod metadata;
mod selection;
mod summary;

pub use metadata::{Annotation, BoundingBox, Metadata};
pub use selection::FrameSelection;
pub use summary::Summary;
