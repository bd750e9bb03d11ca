// Resume preview pipeline: values → scale → ordered section renderers → document.
// Rendering is synchronous and pure; the only owned resources are the width
// feed (scaler) and pending-photo object URLs (photo).

pub mod document;
pub mod handlers;
pub mod pagination;
pub mod photo;
pub mod scaler;
pub mod sections;
pub mod typography;

pub use document::{render_document, render_print_page, RenderedDocument};
pub use photo::{ObjectUrlRegistry, PhotoResolver};
pub use scaler::{compute_scale, ContainerHandle, LayoutScaler, ScaleState};
