//! Base resource contract
//!
//! Resources are named, shared assets held behind `Arc`. Owners keep
//! strong references; every cross-reference (model to mesh, drawable to
//! shader, permutation cache to program) is a `Weak` so teardown order
//! never dangles.

/// A named, shared asset
pub trait Resource {
    /// Registry name, unique within one manager
    fn name(&self) -> &str;
}
