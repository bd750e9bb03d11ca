// Resume editor: open sessions holding the values being edited, the current
// form step, the measured preview container and the photo on screen.

pub mod handlers;
pub mod session;
pub mod steps;
