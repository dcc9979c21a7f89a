//! Example: Load and inspect a scene file.
//!
//! Run with: cargo run --example inspect_scene -- house.json

use std::env;

use scn_core::io::load_scene;
use scn_core::{Element, NodeId, Scene};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: inspect_scene <path-to-scene-file>");
        println!("\nExamples:");
        println!("  cargo run --example inspect_scene -- house.json");
        println!("  cargo run --example inspect_scene -- model.obj");
        return;
    }

    let path = &args[1];
    println!("Loading scene file: {}", path);

    match load_scene(path) {
        Ok(scene) => {
            println!("\n=== Scene: {} ===", scene.name);
            println!("Nodes: {}", scene.node_count());
            println!("Materials: {}", scene.material_count());
            println!("Lights: {}", scene.light_count());
            println!("Referenced scenes: {}", scene.referenced_scene_count());
            println!("Triangles: {}", scene.triangle_count());

            println!("\n--- Hierarchy ---");
            print_node(&scene, scene.root(), 0);

            let bounds = scene.bounds();
            println!("\n--- World Bounds ---");
            println!("  Min: ({:.2}, {:.2}, {:.2})", bounds.min().x, bounds.min().y, bounds.min().z);
            println!("  Max: ({:.2}, {:.2}, {:.2})", bounds.max().x, bounds.max().y, bounds.max().z);
        }
        Err(e) => {
            eprintln!("Error loading scene file: {}", e);
        }
    }
}

fn print_node(scene: &Scene, id: NodeId, depth: usize) {
    let node = scene.node(id);
    let pos = scene.world_transform(id).transform_point3(scn_math::Vec3::ZERO);

    let mut triangles = 0;
    let mut references = Vec::new();
    for element in &node.elements {
        match element {
            Element::Shape(shape) => triangles += shape.mesh.triangle_count(),
            Element::Reference(index) => {
                if let Some(r) = scene.referenced_scenes.get(*index) {
                    references.push(r.name.as_str());
                }
            }
        }
    }

    print!(
        "{}{} at ({:.2}, {:.2}, {:.2})",
        "  ".repeat(depth + 1),
        node.name().unwrap_or("<unnamed>"),
        pos.x,
        pos.y,
        pos.z
    );
    if triangles > 0 {
        print!(", {} triangles", triangles);
    }
    if !references.is_empty() {
        print!(", references {}", references.join(", "));
    }
    if let Some(category) = &node.category {
        print!(" [{}]", category.fine_grained_class.as_deref().unwrap_or(&category.model_id));
    }
    println!();

    for &child in node.children() {
        print_node(scene, child, depth + 1);
    }
}
