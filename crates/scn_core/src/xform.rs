//! Transform editing: accumulate command-line transform operations and
//! compose the result onto the scene root.
//!
//! Matrices use glam's column-vector convention (`a * b` applies `b` first).
//! Each operation is appended on the right of the accumulated matrix, so the
//! operation given last is the first one applied to geometry: `-tx 5 -sx 2`
//! maps (1, 0, 0) to (7, 0, 0). Reading the flags as "later operations apply
//! after earlier ones" would give (12, 0, 0) for that command line instead;
//! the (7, 0, 0) result is the one kept.

use std::fs;
use std::path::{Path, PathBuf};

use scn_math::{Mat4, Vec3};
use thiserror::Error;

use crate::scene::Scene;

/// Errors that can occur reading a matrix file.
#[derive(Error, Debug)]
pub enum MatrixFileError {
    #[error("Unable to open matrix file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid number in matrix file: {0}")]
    InvalidNumber(String),

    #[error("Matrix file has {0} values, expected 16")]
    TooFewValues(usize),
}

/// Coordinate axis for per-axis operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Unit vector along this axis.
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

/// One transform edit, in the order given on the command line.
#[derive(Clone, Debug, PartialEq)]
pub enum TransformOp {
    /// Uniform scale
    Scale(f32),

    /// Translate along one axis
    Translate(Axis, f32),

    /// Scale along one axis
    AxisScale(Axis, f32),

    /// Rotate about one axis, in degrees
    Rotate(Axis, f32),

    /// Arbitrary matrix read from a file when accumulated
    MatrixFile(PathBuf),
}

impl TransformOp {
    /// The primitive matrix of this operation.
    pub fn to_matrix(&self) -> Result<Mat4, MatrixFileError> {
        Ok(match self {
            TransformOp::Scale(s) => Mat4::from_scale(Vec3::splat(*s)),
            TransformOp::Translate(axis, d) => Mat4::from_translation(axis.unit() * *d),
            TransformOp::AxisScale(axis, s) => {
                Mat4::from_scale(Vec3::ONE + axis.unit() * (*s - 1.0))
            }
            TransformOp::Rotate(axis, degrees) => {
                let radians = degrees.to_radians();
                match axis {
                    Axis::X => Mat4::from_rotation_x(radians),
                    Axis::Y => Mat4::from_rotation_y(radians),
                    Axis::Z => Mat4::from_rotation_z(radians),
                }
            }
            TransformOp::MatrixFile(path) => read_matrix_file(path)?,
        })
    }
}

/// Accumulates [`TransformOp`]s into one matrix and applies it to a scene.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformComposer {
    accumulated: Mat4,
}

impl Default for TransformComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformComposer {
    pub fn new() -> Self {
        Self {
            accumulated: Mat4::IDENTITY,
        }
    }

    /// Compose every operation in order. Operations whose matrix file cannot
    /// be read are logged and skipped.
    pub fn from_ops<'a>(ops: impl IntoIterator<Item = &'a TransformOp>) -> Self {
        let mut composer = Self::new();
        for op in ops {
            if let Err(e) = composer.push(op) {
                log::error!("{}; transform not applied", e);
            }
        }
        composer
    }

    /// Compose one operation. On error the accumulated matrix is unchanged.
    pub fn push(&mut self, op: &TransformOp) -> Result<(), MatrixFileError> {
        let primitive = op.to_matrix()?;
        // Uniform scale included: every op post-multiplies onto the current state
        self.accumulated *= primitive;
        Ok(())
    }

    pub fn matrix(&self) -> Mat4 {
        self.accumulated
    }

    /// Exact comparison: any real edit, however small, gets applied.
    pub fn is_identity(&self) -> bool {
        self.accumulated == Mat4::IDENTITY
    }

    /// Compose the accumulated matrix onto the root's existing transform.
    ///
    /// Returns `false` without touching the root when there is nothing to apply.
    pub fn apply(&self, scene: &mut Scene) -> bool {
        if self.is_identity() {
            return false;
        }

        let root = scene.root();
        let current = scene.node(root).transform;
        scene.set_transform(root, self.accumulated * current);
        true
    }
}

/// Read a 4x4 matrix file: 16 whitespace-separated numbers, row-major.
pub fn read_matrix_file(path: impl AsRef<Path>) -> Result<Mat4, MatrixFileError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| MatrixFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_matrix(&content)
}

/// Parse 16 row-major numbers. Anything after the 16th value is ignored.
pub fn parse_matrix(content: &str) -> Result<Mat4, MatrixFileError> {
    let mut values = [0.0_f32; 16];
    let mut count = 0;

    for token in content.split_whitespace().take(16) {
        values[count] = token
            .parse()
            .map_err(|_| MatrixFileError::InvalidNumber(token.to_string()))?;
        count += 1;
    }

    if count < 16 {
        return Err(MatrixFileError::TooFewValues(count));
    }

    // File rows are matrix rows; glam stores columns
    Ok(Mat4::from_cols_array(&values).transpose())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneNode;

    const IDENTITY_TEXT: &str = "1 0 0 0\n0 1 0 0\n0 0 1 0\n0 0 0 1\n";

    fn compose(ops: &[TransformOp]) -> Mat4 {
        TransformComposer::from_ops(ops).matrix()
    }

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("scn_core_xform_{}_{}", std::process::id(), name));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_translate_then_axis_scale_order() {
        let m = compose(&[
            TransformOp::Translate(Axis::X, 5.0),
            TransformOp::AxisScale(Axis::X, 2.0),
        ]);

        let p = m.transform_point3(Vec3::X);
        assert!((p - Vec3::new(7.0, 0.0, 0.0)).length() < 0.001, "got {:?}", p);
    }

    #[test]
    fn test_uniform_scales_accumulate() {
        let m = compose(&[TransformOp::Scale(2.0), TransformOp::Scale(3.0)]);

        let p = m.transform_point3(Vec3::ONE);
        assert!((p - Vec3::splat(6.0)).length() < 0.001);
    }

    #[test]
    fn test_scale_after_translate_keeps_translation() {
        let m = compose(&[TransformOp::Translate(Axis::Y, 1.0), TransformOp::Scale(2.0)]);

        let p = m.transform_point3(Vec3::Y);
        assert!((p - Vec3::new(0.0, 3.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_rotate_uses_degrees() {
        let m = compose(&[TransformOp::Rotate(Axis::Z, 90.0)]);

        let p = m.transform_point3(Vec3::X);
        assert!((p - Vec3::Y).length() < 0.001);
    }

    #[test]
    fn test_axis_ops() {
        let p = compose(&[TransformOp::AxisScale(Axis::Y, 3.0)]).transform_point3(Vec3::ONE);
        assert!((p - Vec3::new(1.0, 3.0, 1.0)).length() < 0.001);

        let p = compose(&[TransformOp::Translate(Axis::Z, -2.0)]).transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(0.0, 0.0, -2.0)).length() < 0.001);

        let p = compose(&[TransformOp::Rotate(Axis::X, 90.0)]).transform_point3(Vec3::Y);
        assert!((p - Vec3::Z).length() < 0.001);
    }

    #[test]
    fn test_parse_matrix_row_major() {
        let m = parse_matrix("1 0 0 4\n0 1 0 5\n0 0 1 6\n0 0 0 1").unwrap();

        let p = m.transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(4.0, 5.0, 6.0)).length() < 0.001);
    }

    #[test]
    fn test_parse_matrix_ignores_trailing_values() {
        let m = parse_matrix(&format!("{} 99 98", IDENTITY_TEXT)).unwrap();
        assert_eq!(m, Mat4::IDENTITY);
    }

    #[test]
    fn test_parse_matrix_errors() {
        assert!(matches!(parse_matrix("1 0 0"), Err(MatrixFileError::TooFewValues(3))));
        assert!(matches!(parse_matrix(""), Err(MatrixFileError::TooFewValues(0))));
        assert!(matches!(
            parse_matrix("1 0 0 0 x 1 0 0 0 0 1 0 0 0 0 1"),
            Err(MatrixFileError::InvalidNumber(ref t)) if t == "x"
        ));
    }

    #[test]
    fn test_identity_matrix_file_leaves_root_untouched() {
        let path = temp_file("identity.txt", IDENTITY_TEXT);
        let mut scene = Scene::new("test");
        let root = scene.root();
        let original = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        scene.set_transform(root, original);

        let composer = TransformComposer::from_ops(&[TransformOp::MatrixFile(path.clone())]);

        assert!(composer.is_identity());
        assert!(!composer.apply(&mut scene));
        assert_eq!(scene.node(root).transform, original);

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_matrix_file_composes() {
        let path = temp_file("translate.txt", "1 0 0 0\n0 1 0 0\n0 0 1 10\n0 0 0 1\n");
        let m = compose(&[
            TransformOp::MatrixFile(path.clone()),
            TransformOp::Scale(2.0),
        ]);

        let p = m.transform_point3(Vec3::Z);
        assert!((p - Vec3::new(0.0, 0.0, 12.0)).length() < 0.001);

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_matrix_file_is_skipped() {
        let missing = std::env::temp_dir().join("scn_core_xform_does_not_exist.txt");
        let m = compose(&[
            TransformOp::Translate(Axis::X, 1.0),
            TransformOp::MatrixFile(missing.clone()),
            TransformOp::Translate(Axis::X, 1.0),
        ]);

        let p = m.transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(2.0, 0.0, 0.0)).length() < 0.001);

        let mut composer = TransformComposer::new();
        let err = composer.push(&TransformOp::MatrixFile(missing)).unwrap_err();
        assert!(matches!(err, MatrixFileError::Io { .. }));
        assert!(composer.is_identity());
    }

    #[test]
    fn test_apply_composes_onto_root() {
        let mut scene = Scene::new("test");
        let root = scene.root();
        scene.set_transform(root, Mat4::from_scale(Vec3::splat(2.0)));
        let child = scene.add_child(root, SceneNode::named("child"));

        let composer = TransformComposer::from_ops(&[TransformOp::Translate(Axis::X, 5.0)]);
        assert!(composer.apply(&mut scene));

        // Existing root placement first, then the edit
        let p = scene.world_transform(child).transform_point3(Vec3::X);
        assert!((p - Vec3::new(7.0, 0.0, 0.0)).length() < 0.001);
        assert_eq!(scene.node(child).transform, Mat4::IDENTITY);
    }

    #[test]
    fn test_identity_composer_does_not_apply() {
        let mut scene = Scene::new("test");
        let composer = TransformComposer::from_ops(&[]);
        assert!(!composer.apply(&mut scene));

        let cancelled = TransformComposer::from_ops(&[
            TransformOp::Translate(Axis::X, 3.0),
            TransformOp::Translate(Axis::X, -3.0),
        ]);
        assert!(cancelled.is_identity());
    }

    #[test]
    fn test_tiny_edit_still_applies() {
        let mut scene = Scene::new("test");
        let composer = TransformComposer::from_ops(&[TransformOp::Translate(Axis::X, 5e-7)]);

        assert!(!composer.is_identity());
        assert!(composer.apply(&mut scene));
        assert_eq!(scene.node(scene.root()).transform.w_axis.x, 5e-7);
    }
}
