pub mod accounts;
pub mod courses;
pub mod generation;
pub mod liveness;
pub mod payments;
pub mod readiness;
pub mod speech;
pub mod status;
pub mod videos;
