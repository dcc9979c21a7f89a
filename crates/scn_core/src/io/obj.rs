//! Wavefront OBJ reading (via `tobj`) and writing.
//!
//! OBJ has no hierarchy, so writing flattens the scene: every shape becomes
//! one `o` group in world space, with referenced scenes expanded in place.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use scn_math::{Mat4, Mat4Ext, Vec3};

use super::{scene_name, SceneIoError, SceneIoResult};
use crate::mesh::Mesh;
use crate::scene::{Element, Material, Scene, SceneNode, Shape};

/// Read an OBJ file. Each OBJ model becomes one child of the root.
pub fn load_obj<P: AsRef<Path>>(path: P) -> SceneIoResult<Scene> {
    let path = path.as_ref();
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        },
    )?;

    let mut scene = Scene::new(scene_name(path));

    match materials {
        Ok(materials) => {
            for material in &materials {
                scene.add_material(convert_material(material));
            }
        }
        Err(e) => log::warn!("No materials loaded for {}: {}", path.display(), e),
    }

    let root = scene.root();
    for model in models {
        let Some(mesh) = convert_mesh(&model.mesh) else {
            log::warn!("Skipping empty OBJ model {}", model.name);
            continue;
        };
        mesh.validate().map_err(|message| SceneIoError::InvalidMesh {
            node: model.name.clone(),
            message,
        })?;

        let mut shape = Shape::new(mesh);
        shape.material = model
            .mesh
            .material_id
            .filter(|&i| i < scene.material_count());

        let name = (!model.name.is_empty()).then_some(model.name);
        scene.add_child(root, SceneNode::new(name).with_element(Element::Shape(shape)));
    }

    log::info!(
        "Loaded {}: {} shapes, {} triangles, {} materials",
        path.display(),
        scene.children(root).len(),
        scene.triangle_count(),
        scene.material_count()
    );
    Ok(scene)
}

fn convert_mesh(mesh: &tobj::Mesh) -> Option<Mesh> {
    if mesh.positions.is_empty() {
        return None;
    }

    let positions: Vec<Vec3> = mesh.positions.chunks_exact(3).map(Vec3::from_slice).collect();

    let normals = (mesh.normals.len() == mesh.positions.len())
        .then(|| mesh.normals.chunks_exact(3).map(Vec3::from_slice).collect());

    Some(Mesh::new(positions, mesh.indices.clone(), normals))
}

fn convert_material(material: &tobj::Material) -> Material {
    let defaults = Material::default();
    let emissive = material
        .unknown_param
        .get("Ke")
        .and_then(|value| parse_vec3(value))
        .unwrap_or(defaults.emissive_color);

    Material {
        name: material.name.clone(),
        diffuse_color: material.diffuse.map(Vec3::from).unwrap_or(defaults.diffuse_color),
        specular_color: material.specular.map(Vec3::from).unwrap_or(defaults.specular_color),
        emissive_color: emissive,
        opacity: material.dissolve.unwrap_or(defaults.opacity),
        diffuse_texture: material.diffuse_texture.clone(),
    }
}

fn parse_vec3(value: &str) -> Option<Vec3> {
    let mut parts = value.split_whitespace().map(|p| p.parse::<f32>().ok());
    Some(Vec3::new(parts.next()??, parts.next()??, parts.next()??))
}

/// Write an OBJ file, plus a `.mtl` library next to it when any shape has a
/// material.
pub fn save_obj<P: AsRef<Path>>(scene: &Scene, path: P) -> SceneIoResult<()> {
    let path = path.as_ref();

    let mut library = Vec::new();
    let names = MaterialNames::collect(scene, &mut HashSet::new(), &mut library);

    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "# {}", scene.name)?;

    let mtl_path = path.with_extension("mtl");
    if !library.is_empty() {
        if let Some(file_name) = mtl_path.file_name().and_then(|n| n.to_str()) {
            writeln!(out, "mtllib {}", file_name)?;
        }
    }

    let mut writer = ObjWriter {
        out: &mut out,
        vertex_base: 1,
        shape_count: 0,
        triangle_count: 0,
    };
    writer.write_scene(scene, &names, &Mat4::IDENTITY)?;
    let (shapes, triangles) = (writer.shape_count, writer.triangle_count);
    out.flush()?;

    if !library.is_empty() {
        write_mtl(&mtl_path, &library)?;
    }

    log::info!(
        "Wrote {}: {} shapes, {} triangles, {} materials",
        path.display(),
        shapes,
        triangles,
        library.len()
    );
    Ok(())
}

/// Output material names for one scene and, recursively, its referenced scenes.
struct MaterialNames {
    names: Vec<String>,
    referenced: Vec<MaterialNames>,
}

impl MaterialNames {
    fn collect(
        scene: &Scene,
        used: &mut HashSet<String>,
        library: &mut Vec<(String, Arc<Material>)>,
    ) -> Self {
        let names = scene
            .materials
            .iter()
            .map(|material| {
                let base = if material.name.is_empty() {
                    "material"
                } else {
                    material.name.as_str()
                };

                let mut name = base.to_string();
                let mut suffix = 1;
                while used.contains(&name) {
                    name = format!("{}_{}", base, suffix);
                    suffix += 1;
                }

                used.insert(name.clone());
                library.push((name.clone(), material.clone()));
                name
            })
            .collect();

        let referenced = scene
            .referenced_scenes
            .iter()
            .map(|r| MaterialNames::collect(&r.scene, used, library))
            .collect();

        Self { names, referenced }
    }
}

struct ObjWriter<'a, W: Write> {
    out: &'a mut W,
    /// 1-based index of the next vertex written
    vertex_base: usize,
    shape_count: usize,
    triangle_count: usize,
}

impl<W: Write> ObjWriter<'_, W> {
    fn write_scene(&mut self, scene: &Scene, names: &MaterialNames, base: &Mat4) -> std::io::Result<()> {
        for id in scene.node_ids() {
            let world = *base * scene.world_transform(id);
            let node = scene.node(id);

            for element in &node.elements {
                match element {
                    Element::Shape(shape) => {
                        let material = shape.material.and_then(|i| names.names.get(i));
                        self.write_shape(node.name(), &shape.mesh, material, &world)?;
                    }
                    Element::Reference(index) => {
                        if let (Some(referenced), Some(inner)) =
                            (scene.referenced_scenes.get(*index), names.referenced.get(*index))
                        {
                            self.write_scene(&referenced.scene, inner, &world)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn write_shape(
        &mut self,
        name: Option<&str>,
        mesh: &Mesh,
        material: Option<&String>,
        world: &Mat4,
    ) -> std::io::Result<()> {
        match name {
            Some(name) => writeln!(self.out, "o {}", name)?,
            None => writeln!(self.out, "o shape_{}", self.shape_count)?,
        }

        for p in &mesh.positions {
            let p = world.transform_point3(*p);
            writeln!(self.out, "v {} {} {}", p.x, p.y, p.z)?;
        }
        if let Some(normals) = &mesh.normals {
            for n in normals {
                let n = world.transform_normal3(*n);
                writeln!(self.out, "vn {} {} {}", n.x, n.y, n.z)?;
            }
        }
        if let Some(material) = material {
            writeln!(self.out, "usemtl {}", material)?;
        }

        let base = self.vertex_base;
        let flip = world.flips_winding();
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| base + i as usize);
            let (b, c) = if flip { (c, b) } else { (b, c) };
            if mesh.has_normals() {
                writeln!(self.out, "f {a}//{a} {b}//{b} {c}//{c}")?;
            } else {
                writeln!(self.out, "f {a} {b} {c}")?;
            }
        }

        self.vertex_base += mesh.vertex_count();
        self.shape_count += 1;
        self.triangle_count += mesh.triangle_count();
        Ok(())
    }
}

fn write_mtl(path: &Path, library: &[(String, Arc<Material>)]) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for (name, material) in library {
        let [kd, ks, ke] = [
            material.diffuse_color,
            material.specular_color,
            material.emissive_color,
        ];
        writeln!(out, "newmtl {}", name)?;
        writeln!(out, "Kd {} {} {}", kd.x, kd.y, kd.z)?;
        writeln!(out, "Ks {} {} {}", ks.x, ks.y, ks.z)?;
        writeln!(out, "Ke {} {} {}", ke.x, ke.y, ke.z)?;
        writeln!(out, "d {}", material.opacity)?;
        if let Some(texture) = &material.diffuse_texture {
            writeln!(out, "map_Kd {}", texture)?;
        }
        writeln!(out)?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::tests::temp_path;
    use crate::io::{load_scene, save_scene};
    use crate::scene::tests::box_mesh;
    use std::fs;

    const TRIANGLE_OBJ: &str = "\
o tri
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o quad
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
f 4 5 6 7
";

    #[test]
    fn test_load_obj_models_become_children() {
        let path = temp_path("load.obj");
        fs::write(&path, TRIANGLE_OBJ).unwrap();

        let scene = load_scene(&path).unwrap();
        let root = scene.root();

        assert_eq!(scene.children(root).len(), 2);
        let quad = scene.find_node("quad").unwrap();
        assert_eq!(scene.parent(quad), Some(root));
        // Quad triangulated
        assert_eq!(scene.triangle_count(), 3);
        assert!((scene.world_bbox(quad).min() - Vec3::new(0.0, 0.0, 1.0)).length() < 0.001);

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_save_obj_writes_world_space() {
        let mut scene = Scene::new("moved");
        let root = scene.root();
        scene.set_transform(root, Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        scene.add_child(
            root,
            SceneNode::named("cube")
                .with_transform(Mat4::from_scale(Vec3::splat(2.0)))
                .with_mesh(box_mesh(Vec3::ZERO, Vec3::ONE)),
        );
        let path = temp_path("world.obj");

        save_scene(&scene, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("o cube"));
        assert!(!text.contains("mtllib"));

        let loaded = load_obj(&path).unwrap();
        let bounds = loaded.bounds();
        assert!((bounds.min() - Vec3::new(10.0, 0.0, 0.0)).length() < 0.001);
        assert!((bounds.max() - Vec3::new(12.0, 2.0, 2.0)).length() < 0.001);
        assert_eq!(loaded.triangle_count(), 12);

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_save_obj_mirrored_faces_keep_winding() {
        let mut scene = Scene::new("mirrored");
        let root = scene.root();
        scene.add_child(
            root,
            SceneNode::named("tri")
                .with_transform(Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0)))
                .with_mesh(Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2], None)),
        );
        let path = temp_path("mirrored.obj");

        save_scene(&scene, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();

        assert!(text.contains("f 1 3 2"));

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_save_obj_expands_references_and_materials() {
        let mut chair = Scene::new("chair");
        let wood = chair.add_material(Material::new("wood", Vec3::new(0.5, 0.25, 0.0)));
        let chair_root = chair.root();
        chair.add_child(
            chair_root,
            SceneNode::named("seat")
                .with_element(Element::Shape(Shape::new(box_mesh(Vec3::ZERO, Vec3::ONE)).with_material(wood))),
        );

        let mut room = Scene::new("room");
        room.add_material(Material::new("wood", Vec3::ONE));
        let index = room.add_referenced_scene("chair", chair);
        let root = room.root();
        for x in [0.0, 5.0] {
            room.add_child(
                root,
                SceneNode::new(None)
                    .with_transform(Mat4::from_translation(Vec3::new(x, 0.0, 0.0)))
                    .with_element(Element::Reference(index)),
            );
        }

        let path = temp_path("refs.obj");
        save_obj(&room, &path).unwrap();

        let loaded = load_obj(&path).unwrap();
        assert_eq!(loaded.triangle_count(), 24);
        assert!((loaded.bounds().max() - Vec3::new(6.0, 1.0, 1.0)).length() < 0.001);

        // Same-named materials from different scenes stay distinct
        let names: Vec<&str> = loaded.materials.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"wood"));
        assert!(names.contains(&"wood_1"));
        let chair_wood = loaded.materials.iter().find(|m| m.name == "wood_1").unwrap();
        assert!((chair_wood.diffuse_color - Vec3::new(0.5, 0.25, 0.0)).length() < 0.001);

        fs::remove_file(&path).ok();
        fs::remove_file(path.with_extension("mtl")).ok();
    }

    #[test]
    fn test_missing_obj_file() {
        let missing = temp_path("does_not_exist.obj");
        assert!(matches!(load_obj(&missing), Err(SceneIoError::Obj(_))));
    }

    #[test]
    fn test_parse_vec3() {
        assert_eq!(parse_vec3("1 0.5 0"), Some(Vec3::new(1.0, 0.5, 0.0)));
        assert_eq!(parse_vec3("1 x 0"), None);
        assert_eq!(parse_vec3("1 2"), None);
    }
}
