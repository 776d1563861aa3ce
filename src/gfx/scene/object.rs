//! Renderable objects: an imported mesh plus its optional textures.
//!
//! A [`RenderObject`] is immutable once built and is shared between scene nodes
//! through `Arc`. GPU resources for it are created lazily by the backend and
//! cached under its [`ObjectId`].

use std::{
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
};

use log::{info, warn};

use crate::gfx::{
    geometry::Geometry,
    importer::{ImportError, ImportWarning, ModelImporter},
    resources::texture::{ImageDecoder, Texture},
};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a render object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub struct RenderObject {
    id: ObjectId,
    name: String,
    geometry: Geometry,
    diffuse: Option<Texture>,
    normal_map: Option<Texture>,
    warnings: Vec<ImportWarning>,
}

impl RenderObject {
    /// Wraps already built geometry. The geometry is packed here.
    pub fn new(name: impl Into<String>, mut geometry: Geometry) -> Self {
        geometry.gen();
        Self {
            id: ObjectId::next(),
            name: name.into(),
            geometry,
            diffuse: None,
            normal_map: None,
            warnings: Vec::new(),
        }
    }

    /// Imports an OBJ model and decodes the textures its material names.
    ///
    /// Textures are flipped after decoding. A texture that fails to load is
    /// logged and left absent.
    ///
    /// # Arguments
    /// * `path` - OBJ file
    /// * `decoder` - Decoder for the referenced texture images
    ///
    /// # Errors
    /// Only the fatal [`ImportError`]s of the OBJ file itself
    pub fn load_obj(
        path: impl AsRef<Path>,
        decoder: &dyn ImageDecoder,
    ) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let model = ModelImporter::new().import(path)?;

        let load_map = |map: Option<&Path>| {
            map.and_then(|texture_path| match Texture::load(texture_path, decoder, true) {
                Ok(texture) => Some(texture),
                Err(e) => {
                    warn!("Skipping texture {}: {}", texture_path.display(), e);
                    None
                }
            })
        };
        let diffuse = load_map(model.diffuse_map.as_deref());
        let normal_map = load_map(model.normal_map.as_deref());

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let object = Self::new(name, model.geometry)
            .with_textures(diffuse, normal_map)
            .with_warnings(model.warnings);

        info!(
            "Loaded object '{}' ({} vertices, {} triangles)",
            object.name,
            object.geometry.vertex_count(),
            object.geometry.triangle_count()
        );
        Ok(object)
    }

    pub fn with_diffuse(mut self, texture: Texture) -> Self {
        self.diffuse = Some(texture);
        self
    }

    pub fn with_normal_map(mut self, texture: Texture) -> Self {
        self.normal_map = Some(texture);
        self
    }

    fn with_textures(mut self, diffuse: Option<Texture>, normal_map: Option<Texture>) -> Self {
        self.diffuse = diffuse;
        self.normal_map = normal_map;
        self
    }

    fn with_warnings(mut self, warnings: Vec<ImportWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn diffuse(&self) -> Option<&Texture> {
        self.diffuse.as_ref()
    }

    pub fn normal_map(&self) -> Option<&Texture> {
        self.normal_map.as_ref()
    }

    /// Recoverable problems reported while importing this object.
    pub fn import_warnings(&self) -> &[ImportWarning] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::resources::texture::{TextureError, TextureImage};

    struct SolidDecoder;

    impl ImageDecoder for SolidDecoder {
        fn decode(&self, _bytes: &[u8]) -> Result<TextureImage, TextureError> {
            Ok(TextureImage::new(1, 1, vec![10, 20, 30]))
        }
    }

    fn triangle() -> Geometry {
        let mut g = Geometry::new();
        g.add_vertex([0.0; 3], [0.0; 3], [1.0, 0.0, 0.0], [0.0; 2]);
        g.add_vertex([1.0, 0.0, 0.0], [0.0; 3], [1.0, 0.0, 0.0], [0.0; 2]);
        g.add_vertex([0.0, 1.0, 0.0], [0.0; 3], [1.0, 0.0, 0.0], [0.0; 2]);
        g.make_triangle(0, 1, 2).unwrap();
        g
    }

    #[test]
    fn test_ids_are_unique() {
        let a = RenderObject::new("a", triangle());
        let b = RenderObject::new("b", triangle());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_new_packs_geometry() {
        let object = RenderObject::new("tri", triangle());
        assert_eq!(object.geometry().buffer_data().len(), 33);
        assert!(object.diffuse().is_none());
    }

    #[test]
    fn test_load_obj_with_material() {
        let dir = std::env::temp_dir().join("arbor_object_load_obj");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("tri.obj"),
            "mtllib tri.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1 2/1 3/1\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("tri.mtl"),
            "newmtl surface\nmap_Kd color.ppm\nmap_Bump missing_normal.ppm\n",
        )
        .unwrap();
        std::fs::write(dir.join("color.ppm"), b"P3\n1 1\n255\n0 0 0\n").unwrap();

        let object = RenderObject::load_obj(dir.join("tri.obj"), &SolidDecoder).unwrap();
        assert_eq!(object.name(), "tri");
        assert_eq!(object.geometry().triangle_count(), 1);
        assert_eq!(
            object.diffuse().map(|t| t.image().pixels.clone()),
            Some(vec![10, 20, 30])
        );
        assert!(object.normal_map().is_none());
        assert!(object.import_warnings().is_empty());
    }
}
