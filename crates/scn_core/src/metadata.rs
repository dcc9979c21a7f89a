//! Category and light tables keyed by model id.
//!
//! Both tables annotate nodes whose name equals a model id:
//!
//! - categories: CSV with a header row and a `model_id` column, plus optional
//!   `fine_grained_class` and `coarse_grained_class` columns;
//! - lights: JSON object mapping model id to a list of model-space lights.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::scene::{Category, Light, Scene};

/// Errors that can occur reading metadata tables.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Category table is empty")]
    EmptyTable,

    #[error("Category table has no `{0}` column")]
    MissingColumn(&'static str),

    #[error("Category table line {line}: expected {expected} fields, found {found}")]
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Category table line {0}: unterminated quote")]
    UnterminatedQuote(usize),

    #[error("Invalid lights file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Read a category table and attach categories to matching nodes.
///
/// Returns the number of nodes annotated.
pub fn read_categories<P: AsRef<Path>>(scene: &mut Scene, path: P) -> MetadataResult<usize> {
    let content = fs::read_to_string(path)?;
    let categories = parse_categories(&content)?;
    Ok(apply_categories(scene, &categories))
}

/// Parse a category CSV into records keyed by model id.
pub fn parse_categories(content: &str) -> MetadataResult<HashMap<String, Category>> {
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let (header_index, header) = lines.next().ok_or(MetadataError::EmptyTable)?;
    let columns = split_fields(header).ok_or(MetadataError::UnterminatedQuote(header_index + 1))?;
    let column = |name: &str| columns.iter().position(|c| c == name);

    let model_id = column("model_id").ok_or(MetadataError::MissingColumn("model_id"))?;
    let fine = column("fine_grained_class");
    let coarse = column("coarse_grained_class");

    let mut categories = HashMap::new();
    for (index, line) in lines {
        let fields = split_fields(line).ok_or(MetadataError::UnterminatedQuote(index + 1))?;
        if fields.len() <= model_id {
            return Err(MetadataError::ShortRow {
                line: index + 1,
                expected: columns.len(),
                found: fields.len(),
            });
        }

        let field = |i: Option<usize>| {
            i.and_then(|i| fields.get(i))
                .filter(|v| !v.is_empty())
                .cloned()
        };

        let category = Category {
            model_id: fields[model_id].clone(),
            fine_grained_class: field(fine),
            coarse_grained_class: field(coarse),
        };
        categories.insert(category.model_id.clone(), category);
    }

    Ok(categories)
}

/// Split one CSV line. Quoted fields may hold commas, and `""` inside quotes
/// is a literal quote. `None` if a quote is left open.
fn split_fields(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field).trim().to_string()),
            _ => field.push(c),
        }
    }

    if quoted {
        return None;
    }
    fields.push(field.trim().to_string());
    Some(fields)
}

/// Attach categories to every node named after a model id.
pub fn apply_categories(scene: &mut Scene, categories: &HashMap<String, Category>) -> usize {
    let mut annotated = 0;
    for id in scene.node_ids() {
        let category = scene
            .node(id)
            .name()
            .and_then(|name| categories.get(name))
            .cloned();
        if let Some(category) = category {
            scene.node_mut(id).category = Some(category);
            annotated += 1;
        }
    }

    log::info!("Annotated {} nodes with categories", annotated);
    annotated
}

/// Read a lights table and add lights for every node named after a model id.
///
/// Lights are placed by the world transform of the matching node. Returns
/// the number of lights added.
pub fn read_lights<P: AsRef<Path>>(scene: &mut Scene, path: P) -> MetadataResult<usize> {
    let content = fs::read_to_string(path)?;
    let table: HashMap<String, Vec<Light>> = serde_json::from_str(&content)?;
    Ok(apply_lights(scene, &table))
}

/// Add model-space lights for every node named after a table key.
pub fn apply_lights(scene: &mut Scene, table: &HashMap<String, Vec<Light>>) -> usize {
    let mut added = 0;
    for id in scene.node_ids() {
        let Some(lights) = scene.node(id).name().and_then(|name| table.get(name)) else {
            continue;
        };
        let world = scene.world_transform(id);
        let placed: Vec<Light> = lights.iter().map(|l| l.transformed(&world)).collect();

        added += placed.len();
        scene.lights.extend(placed);
    }

    log::info!("Added {} lights", added);
    added
}
