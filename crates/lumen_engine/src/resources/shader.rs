//! Shader program resources

use crate::render::backend::{ProgramId, RenderBackend, RenderError};
use crate::resources::resource::Resource;

/// A compiled, linked shader program
#[derive(Debug)]
pub struct Shader {
    name: String,
    program: ProgramId,
    should_serialize: bool,
}

impl Shader {
    /// Compile a program from sources
    ///
    /// `preamble` is prepended to every stage (version line plus
    /// preprocessor definitions).
    pub fn compile(
        name: impl Into<String>,
        backend: &mut dyn RenderBackend,
        preamble: &str,
        vertex: &str,
        geometry: Option<&str>,
        fragment: &str,
    ) -> Result<Self, RenderError> {
        let name = name.into();
        let vertex_src = format!("{preamble}{vertex}");
        let geometry_src = geometry.map(|g| format!("{preamble}{g}"));
        let fragment_src = format!("{preamble}{fragment}");

        let program = backend.compile_program(
            &name,
            &vertex_src,
            geometry_src.as_deref(),
            &fragment_src,
        )?;

        log::debug!("compiled shader program '{name}'");

        Ok(Self {
            name,
            program,
            should_serialize: true,
        })
    }

    /// Backend program handle
    pub fn program(&self) -> ProgramId {
        self.program
    }

    /// Mark this shader as a derived artifact that scene files must not record
    pub fn set_should_serialize(&mut self, serialize: bool) {
        self.should_serialize = serialize;
    }

    /// Whether scene serialization should record this shader
    pub fn should_serialize(&self) -> bool {
        self.should_serialize
    }
}

impl Resource for Shader {
    fn name(&self) -> &str {
        &self.name
    }
}
