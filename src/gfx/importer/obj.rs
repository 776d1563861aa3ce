//! OBJ statement parsing and vertex deduplication.

use std::collections::HashMap;

use log::warn;

use crate::gfx::geometry::Geometry;

use super::{Attribute, ImportWarning};

/// Identity of an output vertex: resolved 0-based indices into the position,
/// texcoord and normal pools. An absent attribute is `None`, so `f 1 ...` and
/// `f 1/1/1 ...` never share a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexKey {
    pub position: usize,
    pub tex_coord: Option<usize>,
    pub normal: Option<usize>,
}

/// One `pos[/tex[/norm]]` token as written in the file (1-based or negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FaceRef {
    pub position: i64,
    pub tex_coord: Option<i64>,
    pub normal: Option<i64>,
}

pub(crate) fn parse_face_ref(token: &str) -> Option<FaceRef> {
    let mut parts = token.split('/');
    let position = parts.next()?.parse::<i64>().ok()?;

    let optional = |part: Option<&str>| -> Option<Option<i64>> {
        match part {
            None | Some("") => Some(None),
            Some(text) => text.parse::<i64>().ok().map(Some),
        }
    };

    let tex_coord = optional(parts.next())?;
    let normal = optional(parts.next())?;
    if parts.next().is_some() {
        return None;
    }

    Some(FaceRef {
        position,
        tex_coord,
        normal,
    })
}

/// Converts an OBJ index into a 0-based index into a pool of `len` entries.
///
/// Positive indices are 1-based; negative ones count back from the current end
/// of the pool. Zero and anything outside the pool yield `None`.
pub(crate) fn resolve_index(raw: i64, len: usize) -> Option<usize> {
    let resolved = match raw {
        0 => return None,
        r if r > 0 => r - 1,
        r => len as i64 + r,
    };
    (0..len as i64).contains(&resolved).then_some(resolved as usize)
}

/// Parses at least `required` and at most `N` floats; missing trailing
/// components are zero and extra components are ignored.
fn parse_floats<'a, const N: usize>(
    tokens: impl Iterator<Item = &'a str>,
    required: usize,
) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    let mut count = 0;
    for token in tokens.take(N) {
        out[count] = token.parse().ok()?;
        count += 1;
    }
    (count >= required).then_some(out)
}

/// Streaming state for one OBJ import.
pub(crate) struct ObjParser {
    positions: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    vertex_map: HashMap<VertexKey, u32>,
    default_color: [f32; 3],
    pub geometry: Geometry,
    pub material_libraries: Vec<String>,
    pub warnings: Vec<ImportWarning>,
}

impl ObjParser {
    pub fn new(default_color: [f32; 3]) -> Self {
        Self {
            positions: Vec::new(),
            tex_coords: Vec::new(),
            normals: Vec::new(),
            vertex_map: HashMap::new(),
            default_color,
            geometry: Geometry::new(),
            material_libraries: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, warning: ImportWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn malformed(&mut self, line: usize, content: &str) {
        self.warn(ImportWarning::MalformedLine {
            line,
            content: content.to_string(),
        });
    }

    /// Feeds one raw line (1-based `line` number for diagnostics).
    pub fn parse_line(&mut self, line: usize, raw: &str) {
        let content = raw.trim();
        if content.is_empty() || content.starts_with('#') {
            return;
        }

        let mut tokens = content.split_whitespace();
        let Some(directive) = tokens.next() else {
            return;
        };

        match directive {
            "v" => match parse_floats::<3>(tokens, 3) {
                Some(p) => self.positions.push(p),
                None => self.malformed(line, content),
            },
            "vt" => match parse_floats::<2>(tokens, 1) {
                Some(t) => self.tex_coords.push(t),
                None => self.malformed(line, content),
            },
            "vn" => match parse_floats::<3>(tokens, 3) {
                Some(n) => self.normals.push(n),
                None => self.malformed(line, content),
            },
            "f" => {
                let refs: Option<Vec<FaceRef>> = tokens.map(parse_face_ref).collect();
                match refs {
                    Some(refs) => self.face(line, &refs),
                    None => self.malformed(line, content),
                }
            }
            "mtllib" => {
                let libraries: Vec<String> = tokens.map(str::to_string).collect();
                if libraries.is_empty() {
                    self.malformed(line, content);
                } else {
                    self.material_libraries.extend(libraries);
                }
            }
            _ => {}
        }
    }

    fn face(&mut self, line: usize, refs: &[FaceRef]) {
        if refs.len() < 3 {
            self.warn(ImportWarning::DegenerateFace {
                line,
                references: refs.len(),
            });
            return;
        }

        let mut keys = Vec::with_capacity(refs.len());
        for face_ref in refs {
            let Some(position) = resolve_index(face_ref.position, self.positions.len()) else {
                self.warn(ImportWarning::VertexOutOfRange {
                    line,
                    index: face_ref.position,
                });
                return;
            };
            let tex_coord = self.resolve_attribute(line, Attribute::TexCoord, face_ref.tex_coord);
            let normal = self.resolve_attribute(line, Attribute::Normal, face_ref.normal);
            keys.push(VertexKey {
                position,
                tex_coord,
                normal,
            });
        }

        let indices: Vec<u32> = keys.into_iter().map(|key| self.vertex_for(key)).collect();

        for i in 1..indices.len() - 1 {
            if let Err(reason) = self
                .geometry
                .make_triangle(indices[0], indices[i], indices[i + 1])
            {
                self.warn(ImportWarning::TriangleRejected { line, reason });
            }
        }
    }

    fn resolve_attribute(
        &mut self,
        line: usize,
        attribute: Attribute,
        raw: Option<i64>,
    ) -> Option<usize> {
        let raw = raw?;
        let len = match attribute {
            Attribute::TexCoord => self.tex_coords.len(),
            Attribute::Normal => self.normals.len(),
        };
        let resolved = resolve_index(raw, len);
        if resolved.is_none() {
            self.warn(ImportWarning::AttributeOutOfRange {
                line,
                attribute,
                index: raw,
            });
        }
        resolved
    }

    /// Returns the output vertex for `key`, synthesizing it on first sight.
    fn vertex_for(&mut self, key: VertexKey) -> u32 {
        if let Some(&index) = self.vertex_map.get(&key) {
            return index;
        }

        let position = self.positions[key.position];
        let tex_coord = key
            .tex_coord
            .map(|i| self.tex_coords[i])
            .unwrap_or([0.0, 0.0]);
        let normal = key.normal.map(|i| self.normals[i]).unwrap_or([0.0; 3]);

        let index = self
            .geometry
            .add_vertex(position, normal, self.default_color, tex_coord);
        self.vertex_map.insert(key, index);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ObjParser {
        let mut parser = ObjParser::new([1.0, 0.0, 0.0]);
        for (n, line) in source.lines().enumerate() {
            parser.parse_line(n + 1, line);
        }
        parser
    }

    #[test]
    fn test_parse_face_ref_forms() {
        assert_eq!(
            parse_face_ref("3"),
            Some(FaceRef {
                position: 3,
                tex_coord: None,
                normal: None
            })
        );
        assert_eq!(
            parse_face_ref("3/2"),
            Some(FaceRef {
                position: 3,
                tex_coord: Some(2),
                normal: None
            })
        );
        assert_eq!(
            parse_face_ref("3//7"),
            Some(FaceRef {
                position: 3,
                tex_coord: None,
                normal: Some(7)
            })
        );
        assert_eq!(
            parse_face_ref("-1/-2/-3"),
            Some(FaceRef {
                position: -1,
                tex_coord: Some(-2),
                normal: Some(-3)
            })
        );
        assert_eq!(parse_face_ref("a/1"), None);
        assert_eq!(parse_face_ref("1/2/3/4"), None);
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(1, 3), Some(0));
        assert_eq!(resolve_index(3, 3), Some(2));
        assert_eq!(resolve_index(4, 3), None);
        assert_eq!(resolve_index(0, 3), None);
        assert_eq!(resolve_index(-1, 3), Some(2));
        assert_eq!(resolve_index(-3, 3), Some(0));
        assert_eq!(resolve_index(-4, 3), None);
    }

    #[test]
    fn test_single_triangle() {
        let parser = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        assert_eq!(parser.geometry.vertex_count(), 3);
        assert_eq!(parser.geometry.indices(), &[0, 1, 2]);
        assert!(parser.warnings.is_empty());
    }

    #[test]
    fn test_quad_fan_triangulation() {
        let parser = parse("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n");
        assert_eq!(parser.geometry.indices(), &[0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_shared_keys_reuse_vertices() {
        let parser = parse(
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\n\
             f 1/1/1 2/1/1 3/1/1\nf 1/1/1 3/1/1 4/1/1\n",
        );
        assert_eq!(parser.geometry.vertex_count(), 4);
        assert_eq!(parser.vertex_map.len(), 4);
        assert_eq!(parser.geometry.indices(), &[0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_absent_attributes_are_distinct_keys() {
        let parser = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1 2 3\nf 1/1/1 2 3\n");
        assert_eq!(parser.geometry.vertex_count(), 4);
        assert_eq!(parser.geometry.indices(), &[0, 1, 2, 3, 1, 2]);
    }

    #[test]
    fn test_negative_indices_resolve_to_same_vertex() {
        let parser = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\nf 1 2 3\n");
        assert_eq!(parser.geometry.vertex_count(), 3);
        assert_eq!(parser.geometry.indices(), &[0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_degenerate_face_is_skipped() {
        let parser = parse("v 0 0 0\nv 1 0 0\nf 1 2\n");
        assert_eq!(parser.geometry.triangle_count(), 0);
        assert_eq!(
            parser.warnings,
            vec![ImportWarning::DegenerateFace {
                line: 3,
                references: 2
            }]
        );
    }

    #[test]
    fn test_out_of_range_position_skips_face() {
        let parser = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\nf 1 2 3\n");
        assert_eq!(parser.geometry.indices(), &[0, 1, 2]);
        assert!(matches!(
            parser.warnings[0],
            ImportWarning::VertexOutOfRange { line: 4, index: 9 }
        ));
    }

    #[test]
    fn test_out_of_range_attribute_falls_back_to_default() {
        let parser = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//5\n");
        assert_eq!(parser.geometry.triangle_count(), 1);
        assert_eq!(parser.geometry.normals()[2], [0.0, 0.0, 0.0]);
        assert_eq!(parser.geometry.normals()[0], [0.0, 0.0, 1.0]);
        assert!(matches!(
            parser.warnings[0],
            ImportWarning::AttributeOutOfRange {
                attribute: Attribute::Normal,
                index: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_lines_are_reported() {
        let parser = parse("v 0 0\nv 0 0 0\nf 1 x 1\n# comment\n\ns off\n");
        assert_eq!(parser.warnings.len(), 2);
        assert!(parser
            .warnings
            .iter()
            .all(|w| matches!(w, ImportWarning::MalformedLine { .. })));
    }

    #[test]
    fn test_default_attributes() {
        let parser = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        let mut geometry = parser.geometry;
        geometry.gen();
        let v = geometry.vertices()[1];
        assert_eq!(v.position, [1.0, 0.0, 0.0]);
        assert_eq!(v.color, [1.0, 0.0, 0.0]);
        assert_eq!(v.normal, [0.0, 0.0, 0.0]);
        assert_eq!(v.tex_coords, [0.0, 0.0]);
    }
}
