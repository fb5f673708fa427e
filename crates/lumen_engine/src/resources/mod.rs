//! Shared, name-keyed engine resources
//!
//! Everything here is reference-counted: owners hold `Arc`s, observers
//! hold `Weak`s, and the [`manager::ResourceManager`] is the registry of
//! record. Dropping a registry entry expires every observer without any
//! explicit invalidation pass.

pub mod manager;
pub mod material;
pub mod mesh;
pub mod model;
pub mod resource;
pub mod shader;
pub mod texture;

pub use manager::{ResourceError, ResourceManager, ResourceStore};
pub use material::{MapSlot, Material, MaterialAttributes};
pub use mesh::{Mesh, Vertex};
pub use model::Model;
pub use resource::Resource;
pub use shader::Shader;
pub use texture::{Texture, TextureFormat};
