//! Command-line parsing.
//!
//! Flags are spelled with a single dash (`-tx 5`) as well as with two
//! (`--tx 5`). Transform flags may repeat, and their relative order on the
//! command line is the order they are composed in. Any other flag given
//! twice keeps its last value.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use scn_core::{Axis, ConvertOptions, Selection, TransformOp};
use scn_math::{Aabb, Vec3};

#[derive(Parser, Debug)]
#[command(name = "scn2scn")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert a scene file, optionally editing it on the way", long_about = None)]
#[command(args_override_self = true)]
pub struct Cli {
    /// Input scene file (.json or .obj)
    pub input: PathBuf,

    /// Output scene file (.json or .obj)
    pub output: PathBuf,

    /// Print timings and scene statistics
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Inline every referenced scene
    #[arg(long = "remove_references")]
    pub remove_references: bool,

    /// Put every node with geometry directly under the root
    #[arg(long = "remove_hierarchy")]
    pub remove_hierarchy: bool,

    /// Bake node transforms into geometry
    #[arg(long = "remove_transformations")]
    pub remove_transformations: bool,

    /// Keep only this node, its ancestors and its descendants
    #[arg(long = "select_nodes_in_subtree", value_name = "NAME", allow_hyphen_values = true)]
    pub select_nodes_in_subtree: Option<String>,

    /// Keep only nodes whose world box intersects this box
    #[arg(
        long = "select_nodes_in_bbox",
        num_args = 6,
        action = ArgAction::Set,
        value_names = ["X0", "Y0", "Z0", "X1", "Y1", "Z1"],
        allow_negative_numbers = true
    )]
    pub select_nodes_in_bbox: Option<Vec<f32>>,

    /// Uniform scale
    #[arg(long, value_name = "S", allow_negative_numbers = true)]
    pub scale: Vec<f32>,

    /// Translate along X
    #[arg(long, value_name = "D", allow_negative_numbers = true)]
    pub tx: Vec<f32>,

    /// Translate along Y
    #[arg(long, value_name = "D", allow_negative_numbers = true)]
    pub ty: Vec<f32>,

    /// Translate along Z
    #[arg(long, value_name = "D", allow_negative_numbers = true)]
    pub tz: Vec<f32>,

    /// Scale along X
    #[arg(long, value_name = "S", allow_negative_numbers = true)]
    pub sx: Vec<f32>,

    /// Scale along Y
    #[arg(long, value_name = "S", allow_negative_numbers = true)]
    pub sy: Vec<f32>,

    /// Scale along Z
    #[arg(long, value_name = "S", allow_negative_numbers = true)]
    pub sz: Vec<f32>,

    /// Rotate about X, in degrees
    #[arg(long, value_name = "DEGREES", allow_negative_numbers = true)]
    pub rx: Vec<f32>,

    /// Rotate about Y, in degrees
    #[arg(long, value_name = "DEGREES", allow_negative_numbers = true)]
    pub ry: Vec<f32>,

    /// Rotate about Z, in degrees
    #[arg(long, value_name = "DEGREES", allow_negative_numbers = true)]
    pub rz: Vec<f32>,

    /// Compose a 4x4 row-major matrix read from a file
    #[arg(long, value_name = "FILE")]
    pub xform: Vec<PathBuf>,

    /// Subdivide triangles until no edge is longer than this
    #[arg(long = "max_edge_length", value_name = "L", allow_negative_numbers = true)]
    pub max_edge_length: Option<f32>,

    /// Category table (CSV) keyed by model id
    #[arg(long, value_name = "FILE")]
    pub categories: Option<PathBuf>,

    /// Lights table (JSON) keyed by model id
    #[arg(long, value_name = "FILE")]
    pub lights: Option<PathBuf>,
}

/// Long flags that may also be given with a single dash.
const LEGACY_FLAGS: &[&str] = &[
    "remove_references",
    "remove_hierarchy",
    "remove_transformations",
    "select_nodes_in_subtree",
    "select_nodes_in_bbox",
    "scale",
    "tx",
    "ty",
    "tz",
    "sx",
    "sy",
    "sz",
    "rx",
    "ry",
    "rz",
    "xform",
    "max_edge_length",
    "categories",
    "lights",
];

/// Parsed command line: how loud to be and what to do.
#[derive(Debug)]
pub struct Invocation {
    pub verbose: bool,
    pub options: ConvertOptions,
}

/// Parse the command line, printing usage and exiting on error.
pub fn parse(args: impl IntoIterator<Item = OsString>) -> Invocation {
    try_parse(args).unwrap_or_else(|e| e.exit())
}

pub fn try_parse(args: impl IntoIterator<Item = OsString>) -> Result<Invocation, clap::Error> {
    let matches = Cli::command().try_get_matches_from(normalize_legacy_flags(args))?;
    let cli = Cli::from_arg_matches(&matches)?;
    let transform_ops = transform_ops(&matches);

    let bbox = match cli.select_nodes_in_bbox.as_deref() {
        Some(&[x0, y0, z0, x1, y1, z1]) => {
            Aabb::from_min_max(Vec3::new(x0, y0, z0), Vec3::new(x1, y1, z1))
        }
        _ => Aabb::EMPTY,
    };

    let options = ConvertOptions {
        input: cli.input,
        output: cli.output,
        categories: cli.categories,
        lights: cli.lights,
        selection: Selection {
            bbox,
            subtree: cli.select_nodes_in_subtree,
        },
        transform_ops,
        remove_references: cli.remove_references,
        remove_hierarchy: cli.remove_hierarchy,
        remove_transformations: cli.remove_transformations,
        max_edge_length: cli.max_edge_length,
    };

    Ok(Invocation {
        verbose: cli.verbose,
        options,
    })
}

/// Rewrite `-name` to `--name` for every known long flag.
fn normalize_legacy_flags(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| {
            let long = arg
                .to_str()
                .and_then(|s| s.strip_prefix('-'))
                .filter(|name| LEGACY_FLAGS.contains(name))
                .map(|name| format!("--{}", name));
            long.map(OsString::from).unwrap_or(arg)
        })
        .collect()
}

/// Collect every transform flag occurrence in command-line order.
fn transform_ops(matches: &ArgMatches) -> Vec<TransformOp> {
    let scalar_ops: [(&str, fn(f32) -> TransformOp); 10] = [
        ("scale", TransformOp::Scale),
        ("tx", |d| TransformOp::Translate(Axis::X, d)),
        ("ty", |d| TransformOp::Translate(Axis::Y, d)),
        ("tz", |d| TransformOp::Translate(Axis::Z, d)),
        ("sx", |s| TransformOp::AxisScale(Axis::X, s)),
        ("sy", |s| TransformOp::AxisScale(Axis::Y, s)),
        ("sz", |s| TransformOp::AxisScale(Axis::Z, s)),
        ("rx", |r| TransformOp::Rotate(Axis::X, r)),
        ("ry", |r| TransformOp::Rotate(Axis::Y, r)),
        ("rz", |r| TransformOp::Rotate(Axis::Z, r)),
    ];

    let mut ops: Vec<(usize, TransformOp)> = Vec::new();
    for (id, make) in scalar_ops {
        if let (Some(indices), Some(values)) = (matches.indices_of(id), matches.get_many::<f32>(id)) {
            ops.extend(indices.zip(values).map(|(i, v)| (i, make(*v))));
        }
    }
    if let (Some(indices), Some(paths)) = (
        matches.indices_of("xform"),
        matches.get_many::<PathBuf>("xform"),
    ) {
        ops.extend(indices.zip(paths).map(|(i, p)| (i, TransformOp::MatrixFile(p.clone()))));
    }

    ops.sort_by_key(|(i, _)| *i);
    ops.into_iter().map(|(_, op)| op).collect()
}
