pub mod decorator;
pub mod ease;
pub mod geometry;
pub mod walk;
