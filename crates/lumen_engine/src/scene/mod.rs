//! Scene graph: the transform hierarchy components attach to

pub mod graph;
pub mod object;

pub use graph::Scene;
pub use object::{Object, ObjectKey};
