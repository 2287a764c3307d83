//! Reader for the position/face subset of Wavefront `.obj` files.
//!
//! Only two records are understood:
//! - `v x y z`: one vertex position
//! - `f a b c`: one triangle, 1-based vertex indices
//!
//! Everything else is skipped token by token. A marker word that appears
//! somewhere unexpected (for example `# v 1 2 3` inside a comment) is still
//! read as a record; comments are not recognised. A record that cannot be
//! read ends the parse: everything before it is kept and the reason is left
//! in [`Mesh::truncated`].

pub mod error;
pub mod lexer;

use std::path::Path;

pub use error::ObjError;
use lexer::{Lexer, Token};

const VERTEX_MARKER: &str = "v";
const FACE_MARKER: &str = "f";

/// Triangle mesh as loaded from a model file.
///
/// `triangles` hold 0-based indices into `positions`. Indices are not range
/// checked; see [`Mesh::out_of_range_indices`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub triangles: Vec<[i32; 3]>,
    /// The [`ObjError::Malformed`] record parsing stopped at, if any.
    pub truncated: Option<ObjError>,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangle corners that reference a position outside
    /// `[0, position_count)`.
    pub fn out_of_range_indices(&self) -> usize {
        let n = self.positions.len() as i64;
        self.triangles
            .iter()
            .flatten()
            .filter(|&&i| i < 0 || i64::from(i) >= n)
            .count()
    }
}

/// Reads and parses a model file. Only an unreadable file is an error.
pub fn load(path: impl AsRef<Path>) -> Result<Mesh, ObjError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| ObjError::Io {
        path: path.to_path_buf(),
        kind: e.kind(),
        message: e.to_string(),
    })?;
    Ok(parse_str(&text))
}

/// Parses model text, stopping at the first record that cannot be read.
pub fn parse_str(src: &str) -> Mesh {
    let mut lexer = Lexer::new(src);
    let mut mesh = Mesh::default();
    if let Err(e) = read_records(&mut lexer, &mut mesh) {
        mesh.truncated = Some(e);
    }
    mesh
}

fn read_records(lexer: &mut Lexer<'_>, mesh: &mut Mesh) -> Result<(), ObjError> {
    while let Some(tok) = lexer.next() {
        match tok.text {
            VERTEX_MARKER => {
                let position = read_triple(lexer, tok, parse_coord)?;
                mesh.positions.push(position);
            }
            FACE_MARKER => {
                let corners = read_triple(lexer, tok, parse_face_index)?;
                mesh.triangles.push(to_zero_based(corners, tok)?);
            }
            _ => {}
        }
    }
    Ok(())
}

/// File indices start at 1.
fn to_zero_based(corners: [i32; 3], marker: Token<'_>) -> Result<[i32; 3], ObjError> {
    let mut out = [0; 3];
    for (slot, i) in out.iter_mut().zip(corners) {
        *slot = i.checked_sub(1).ok_or_else(|| {
            ObjError::malformed(format!("face index {i} is out of range"), marker.line)
        })?;
    }
    Ok(out)
}

fn read_triple<'s, T: Copy + Default>(
    lexer: &mut Lexer<'s>,
    marker: Token<'s>,
    parse: fn(&str) -> Option<T>,
) -> Result<[T; 3], ObjError> {
    let mut out = [T::default(); 3];
    for slot in &mut out {
        let Some(tok) = lexer.next() else {
            return Err(ObjError::malformed(
                format!("`{}` record ends before three values", marker.text),
                marker.line,
            ));
        };
        *slot = parse(tok.text).ok_or_else(|| {
            ObjError::malformed(
                format!("`{}` expects a number, found `{}`", marker.text, tok.text),
                tok.line,
            )
        })?;
    }
    Ok(out)
}

fn parse_coord(s: &str) -> Option<f32> {
    s.parse().ok()
}

/// Face corners may be written `i`, `i/t`, `i//n` or `i/t/n`; only the
/// position index is used.
fn parse_face_index(s: &str) -> Option<i32> {
    let head = s.split('/').next()?;
    head.parse().ok()
}
