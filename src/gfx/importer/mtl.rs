//! Material library lookup.
//!
//! Only the texture maps matter here: the diffuse map (`map_Kd`) and the normal
//! map (`map_Bump` / `bump`). Parsing is delegated to `tobj`.

use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

/// Texture maps found in one material library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialMaps {
    pub diffuse: Option<PathBuf>,
    pub normal: Option<PathBuf>,
}

impl MaterialMaps {
    /// Overlays `other` on top of `self`; maps present in `other` win.
    pub fn merge(&mut self, other: MaterialMaps) {
        if other.diffuse.is_some() {
            self.diffuse = other.diffuse;
        }
        if other.normal.is_some() {
            self.normal = other.normal;
        }
    }
}

/// Directives that name a diffuse or normal map.
const MAP_DIRECTIVES: [&str; 4] = ["map_Kd", "map_Bump", "map_bump", "bump"];

/// Material name given to maps that appear before any `newmtl`.
const UNNAMED_MATERIAL: &str = "unnamed";

/// Reads the material library at `path` and resolves its texture maps against
/// `base_dir`. When several materials name the same map, the last one wins.
///
/// # Returns
/// The maps, or a human-readable reason the library could not be used
pub fn load_material_maps(path: &Path, base_dir: &Path) -> Result<MaterialMaps, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    let source = map_lines(&String::from_utf8_lossy(&bytes));

    let (materials, _) =
        tobj::load_mtl_buf(&mut Cursor::new(source.as_bytes())).map_err(|e| e.to_string())?;

    let mut maps = MaterialMaps::default();
    for material in &materials {
        maps.merge(MaterialMaps {
            diffuse: material
                .diffuse_texture
                .as_deref()
                .and_then(texture_file_name)
                .map(|name| base_dir.join(name)),
            normal: material
                .normal_texture
                .as_deref()
                .or_else(|| {
                    ["map_bump", "bump"]
                        .iter()
                        .find_map(|key| material.unknown_param.get(*key))
                        .map(String::as_str)
                })
                .and_then(texture_file_name)
                .map(|name| base_dir.join(name)),
        });
    }
    Ok(maps)
}

/// Keeps only the `newmtl` and texture map lines of a material library.
///
/// Color and scalar lines are dropped unparsed, so a malformed `Kd` or `Ns`
/// cannot fail the library. Maps before the first `newmtl` are placed in an
/// unnamed material.
fn map_lines(source: &str) -> String {
    let mut kept = String::new();
    let mut in_material = false;

    for line in source.lines() {
        let mut tokens = line.split_whitespace();
        let (Some(directive), Some(argument)) = (tokens.next(), tokens.next()) else {
            continue;
        };

        if directive == "newmtl" {
            in_material = true;
        } else if MAP_DIRECTIVES.contains(&directive) {
            if !in_material {
                kept.push_str("newmtl ");
                kept.push_str(UNNAMED_MATERIAL);
                kept.push('\n');
                in_material = true;
            }
        } else {
            continue;
        }

        kept.push_str(directive);
        kept.push(' ');
        kept.push_str(argument);
        for token in tokens {
            kept.push(' ');
            kept.push_str(token);
        }
        kept.push('\n');
    }
    kept
}

/// Strips map options such as `-bm 0.5`; the file name is the last token.
fn texture_file_name(value: &str) -> Option<&str> {
    value.split_whitespace().last()
}
