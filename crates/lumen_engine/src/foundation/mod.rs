//! Foundation utilities shared by every subsystem

pub mod bounds;
pub mod color;
pub mod math;
pub mod time;
