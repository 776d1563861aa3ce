//! # Model Importer
//!
//! Loads Wavefront OBJ meshes into a [`Geometry`], deduplicating vertices that
//! share the same `(position, texcoord, normal)` reference triple and
//! fan-triangulating polygons.
//!
//! ## Supported directives
//!
//! - `v`, `vt`, `vn`: attribute pools (1-based, negative indices count back)
//! - `f`: faces with `pos`, `pos/tex`, `pos//norm` or `pos/tex/norm` references
//! - `mtllib`: material library next to the OBJ file; its `map_Kd` and
//!   `map_Bump`/`bump` entries become the diffuse and normal map paths
//!
//! Everything else (`o`, `g`, `s`, `usemtl`, ...) is ignored.
//!
//! ## Error model
//!
//! Only a missing or unreadable OBJ file aborts an import ([`ImportError`]).
//! Problems inside the file are recoverable: they are logged and collected as
//! [`ImportWarning`]s on the returned [`ImportedModel`].
//!
//! ```no_run
//! use arbor::gfx::importer::ModelImporter;
//!
//! let model = ModelImporter::new().import("assets/house/house.obj")?;
//! println!("{} triangles", model.geometry.triangle_count());
//! for warning in &model.warnings {
//!     println!("warning: {warning}");
//! }
//! # Ok::<(), arbor::gfx::importer::ImportError>(())
//! ```

pub mod mtl;
pub mod obj;

use std::{
    fmt,
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use log::{debug, warn};
use thiserror::Error;

use crate::gfx::geometry::{Geometry, GeometryError};

use self::{mtl::MaterialMaps, obj::ObjParser};

pub use obj::VertexKey;

/// Placeholder vertex color; OBJ carries none.
pub const DEFAULT_VERTEX_COLOR: [f32; 3] = [1.0, 0.0, 0.0];

/// Fatal import failures.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("model file not found: {path}")]
    FileNotFound { path: PathBuf },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Which optional per-vertex attribute a reference pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    TexCoord,
    Normal,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::TexCoord => write!(f, "texture coordinate"),
            Attribute::Normal => write!(f, "normal"),
        }
    }
}

/// Recoverable problems met while importing. Line numbers are 1-based.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ImportWarning {
    #[error("material library {path} unavailable: {reason}")]
    MaterialUnavailable { path: PathBuf, reason: String },
    #[error("line {line}: face with {references} references skipped")]
    DegenerateFace { line: usize, references: usize },
    #[error("line {line}: vertex index {index} out of range, face skipped")]
    VertexOutOfRange { line: usize, index: i64 },
    #[error("line {line}: {attribute} index {index} out of range, using default")]
    AttributeOutOfRange {
        line: usize,
        attribute: Attribute,
        index: i64,
    },
    #[error("line {line}: {reason}")]
    TriangleRejected { line: usize, reason: GeometryError },
    #[error("line {line}: cannot parse `{content}`")]
    MalformedLine { line: usize, content: String },
}

/// Result of a successful import.
#[derive(Debug, Clone)]
pub struct ImportedModel {
    /// Deduplicated mesh. Not yet packed; call [`Geometry::gen`] before upload.
    pub geometry: Geometry,
    pub diffuse_map: Option<PathBuf>,
    pub normal_map: Option<PathBuf>,
    pub warnings: Vec<ImportWarning>,
}

/// OBJ importer.
#[derive(Debug, Clone)]
pub struct ModelImporter {
    default_color: [f32; 3],
}

impl Default for ModelImporter {
    fn default() -> Self {
        Self {
            default_color: DEFAULT_VERTEX_COLOR,
        }
    }
}

impl ModelImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the color given to every imported vertex (builder pattern)
    pub fn with_default_color(mut self, color: [f32; 3]) -> Self {
        self.default_color = color;
        self
    }

    /// Imports the OBJ file at `path`.
    ///
    /// Material libraries and texture maps are resolved relative to the
    /// directory containing `path`.
    ///
    /// # Errors
    /// [`ImportError::FileNotFound`] if the file does not exist,
    /// [`ImportError::Io`] if it cannot be opened or read
    pub fn import(&self, path: impl AsRef<Path>) -> Result<ImportedModel, ImportError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ImportError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => ImportError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        debug!("Importing model {}", path.display());
        self.parse(BufReader::new(file), base_dir, path)
    }

    /// Imports OBJ text from any buffered reader.
    ///
    /// # Arguments
    /// * `reader` - OBJ source
    /// * `base_dir` - Directory material libraries and textures are resolved against
    pub fn import_from_reader<R: BufRead>(
        &self,
        reader: R,
        base_dir: impl AsRef<Path>,
    ) -> Result<ImportedModel, ImportError> {
        let base_dir = base_dir.as_ref();
        self.parse(reader, base_dir, base_dir)
    }

    fn parse<R: BufRead>(
        &self,
        mut reader: R,
        base_dir: &Path,
        origin: &Path,
    ) -> Result<ImportedModel, ImportError> {
        let mut parser = ObjParser::new(self.default_color);

        // Byte lines: exporters write Latin-1 comments and object names.
        let mut line = Vec::new();
        let mut number = 0;
        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|source| ImportError::Io {
                    path: origin.to_path_buf(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            number += 1;
            parser.parse_line(number, &String::from_utf8_lossy(&line));
        }

        let mut maps = MaterialMaps::default();
        for library in &parser.material_libraries {
            let library_path = base_dir.join(library);
            match mtl::load_material_maps(&library_path, base_dir) {
                Ok(found) => {
                    debug!("Loaded material library {}", library_path.display());
                    maps.merge(found);
                }
                Err(reason) => {
                    let warning = ImportWarning::MaterialUnavailable {
                        path: library_path,
                        reason,
                    };
                    warn!("{}", warning);
                    parser.warnings.push(warning);
                }
            }
        }

        debug!(
            "Imported {}: {} vertices, {} triangles, {} warnings",
            origin.display(),
            parser.geometry.vertex_count(),
            parser.geometry.triangle_count(),
            parser.warnings.len()
        );

        Ok(ImportedModel {
            geometry: parser.geometry,
            diffuse_map: maps.diffuse,
            normal_map: maps.normal,
            warnings: parser.warnings,
        })
    }
}
