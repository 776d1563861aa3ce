//! Shader program sources and per-node programs.
//!
//! A program is named by two source identifiers, one per stage. Files are
//! WGSL with `vs_main` / `fs_main` entry points; when both identifiers name the
//! same source it is used once, otherwise the vertex source is followed by the
//! fragment source in a single module.

use std::{borrow::Cow, fmt, fs, path::PathBuf};

use crate::gfx::rendering::backend::{RenderBackend, RenderError};

const TEXTURED_WGSL: &str = include_str!("../rendering/shaders/textured.wgsl");
const SKYBOX_WGSL: &str = include_str!("../rendering/shaders/skybox.wgsl");

/// Opaque handle to a compiled program, issued by a [`RenderBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(u32);

impl ShaderHandle {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Where one stage's source comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    File(PathBuf),
    Inline {
        name: String,
        source: Cow<'static, str>,
    },
}

impl ShaderStage {
    fn load(&self) -> Result<Cow<'static, str>, RenderError> {
        match self {
            ShaderStage::File(path) => fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| RenderError::ShaderSource {
                    path: path.clone(),
                    source,
                }),
            ShaderStage::Inline { source, .. } => Ok(source.clone()),
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::File(path) => write!(f, "{}", path.display()),
            ShaderStage::Inline { name, .. } => write!(f, "{}", name),
        }
    }
}

/// The two source identifiers of a program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderSource {
    pub vertex: ShaderStage,
    pub fragment: ShaderStage,
}

impl ShaderSource {
    pub fn from_files(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self {
            vertex: ShaderStage::File(vertex.into()),
            fragment: ShaderStage::File(fragment.into()),
        }
    }

    /// A single in-memory module holding both entry points.
    pub fn inline(name: &str, source: impl Into<Cow<'static, str>>) -> Self {
        let stage = ShaderStage::Inline {
            name: name.to_string(),
            source: source.into(),
        };
        Self {
            vertex: stage.clone(),
            fragment: stage,
        }
    }

    /// Built-in program: diffuse texture times vertex color with a
    /// normal-mapped directional light.
    pub fn textured() -> Self {
        Self::inline("textured", TEXTURED_WGSL)
    }

    /// Built-in program for skybox nodes.
    pub fn skybox() -> Self {
        Self::inline("skybox", SKYBOX_WGSL)
    }

    /// Loads the sources into one WGSL module.
    pub fn resolve(&self) -> Result<String, RenderError> {
        let vertex = self.vertex.load()?;
        if self.vertex == self.fragment {
            return Ok(vertex.into_owned());
        }
        let fragment = self.fragment.load()?;
        Ok(format!("{}\n{}", vertex, fragment))
    }

    pub fn label(&self) -> String {
        if self.vertex == self.fragment {
            self.vertex.to_string()
        } else {
            format!("{}+{}", self.vertex, self.fragment)
        }
    }
}

/// A node's program: its sources and, once compiled, the backend handle.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    source: ShaderSource,
    handle: Option<ShaderHandle>,
}

impl ShaderProgram {
    pub fn new(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self::from_source(ShaderSource::from_files(vertex, fragment))
    }

    pub fn from_source(source: ShaderSource) -> Self {
        Self {
            source,
            handle: None,
        }
    }

    pub fn textured() -> Self {
        Self::from_source(ShaderSource::textured())
    }

    pub fn skybox() -> Self {
        Self::from_source(ShaderSource::skybox())
    }

    pub fn source(&self) -> &ShaderSource {
        &self.source
    }

    pub fn handle(&self) -> Option<ShaderHandle> {
        self.handle
    }

    pub fn is_compiled(&self) -> bool {
        self.handle.is_some()
    }

    /// Compiles through `backend` on first use and returns the cached handle.
    pub fn ensure_compiled(
        &mut self,
        backend: &mut dyn RenderBackend,
    ) -> Result<ShaderHandle, RenderError> {
        if let Some(handle) = self.handle {
            return Ok(handle);
        }
        let handle = backend.compile(&self.source)?;
        self.handle = Some(handle);
        Ok(handle)
    }
}
