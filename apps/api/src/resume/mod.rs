// Resume data model, the validation boundary in front of persistence, and the
// saved-resume endpoints.

pub mod handlers;
pub mod model;
pub mod persistence;
pub mod validation;

