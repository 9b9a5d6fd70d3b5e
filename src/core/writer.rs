//! FR-006: Default-factoring serializer — the inverse of the category
//! store's parse side.
//!
//! A field whose value is identical across every item of a category is
//! emitted once in the shared default section; everything else lands in the
//! item's own indexed section. Reference fields encode as the ordinal of
//! the matching item in the referenced category, with an identity fallback
//! for bounds, which are flattened right before serialization and therefore
//! never compare equal by value.

use crate::core::bounds::bounds_to_item;
use crate::core::persist;
use crate::core::types::{
    category_fields, Category, FieldSpec, FieldType, Item, SharedBounds, SharedItem, Value,
    DEFAULT_SUFFIX,
};
use std::path::Path;
use std::rc::Rc;
use tracing::error;

enum Identity {
    Item(SharedItem),
    Bounds(SharedBounds),
}

struct CategoryList {
    items: Vec<Item>,
    identities: Vec<Identity>,
}

struct ExportLists {
    tool: CategoryList,
    process: CategoryList,
    bounds: CategoryList,
    task: CategoryList,
}

impl ExportLists {
    fn get(&self, category: Category) -> &CategoryList {
        match category {
            Category::Tool => &self.tool,
            Category::Process => &self.process,
            Category::Bounds => &self.bounds,
            Category::Task => &self.task,
        }
    }
}

fn snapshot(items: &[SharedItem]) -> CategoryList {
    CategoryList {
        items: items.iter().map(|rc| rc.borrow().clone()).collect(),
        identities: items.iter().map(|rc| Identity::Item(rc.clone())).collect(),
    }
}

fn snapshot_bounds(bounds: &[SharedBounds]) -> CategoryList {
    CategoryList {
        items: bounds.iter().map(|rc| bounds_to_item(&rc.borrow())).collect(),
        identities: bounds
            .iter()
            .map(|rc| Identity::Bounds(rc.clone()))
            .collect(),
    }
}

/// Serialize explicit item lists for all four categories into
/// configuration text that parses back to equivalent resolved values.
pub fn config_text(
    tools: &[SharedItem],
    processes: &[SharedItem],
    bounds: &[SharedBounds],
    tasks: &[SharedItem],
) -> String {
    let lists = ExportLists {
        tool: snapshot(tools),
        process: snapshot(processes),
        bounds: snapshot_bounds(bounds),
        task: snapshot(tasks),
    };

    let mut out: Vec<String> = Vec::new();
    for category in Category::ALL {
        let list = lists.get(category);
        let fields = category_fields(category);

        let common: Vec<&FieldSpec> = fields
            .iter()
            .filter(|spec| is_common(&list.items, spec.name))
            .collect();

        if !common.is_empty() {
            out.push(format!("[{}{}]", category.prefix(), DEFAULT_SUFFIX));
            for spec in &common {
                if let Some(text) = value_text(&lists, spec, &list.items[0][spec.name]) {
                    out.push(format!("{}: {}", spec.name, text));
                }
            }
            out.push(String::new());
        }

        for (ordinal, item) in list.items.iter().enumerate() {
            out.push(format!("[{}{}]", category.prefix(), ordinal));
            for spec in fields {
                if common.iter().any(|c| c.name == spec.name) {
                    continue;
                }
                let Some(value) = item.get(spec.name) else {
                    continue;
                };
                if let Some(text) = value_text(&lists, spec, value) {
                    out.push(format!("{}: {}", spec.name, text));
                }
            }
            out.push(String::new());
        }
    }
    out.join("\n")
}

/// Serialize and write to a file. Failures are logged and reported as
/// `false`, matching the load path.
pub fn write_config_file(
    path: &Path,
    tools: &[SharedItem],
    processes: &[SharedItem],
    bounds: &[SharedBounds],
    tasks: &[SharedItem],
) -> bool {
    let text = config_text(tools, processes, bounds, tasks);
    match persist::write_config(path, &text) {
        Ok(()) => true,
        Err(e) => {
            error!("failed to write configuration file: {}", e);
            false
        }
    }
}

// Common iff every item carries the field and all values agree.
fn is_common(items: &[Item], name: &str) -> bool {
    let mut values = items.iter().map(|item| item.get(name));
    let Some(Some(first)) = values.next() else {
        return false;
    };
    values.all(|v| v == Some(first))
}

fn value_text(lists: &ExportLists, spec: &FieldSpec, value: &Value) -> Option<String> {
    match spec.ftype {
        FieldType::Str => value.as_str().map(str::to_string),
        FieldType::Float => value.as_float().map(|f| f.to_string()),
        FieldType::Int => value.as_int().map(|i| i.to_string()),
        FieldType::Bool => value.as_bool().map(|b| if b { "1" } else { "0" }.to_string()),
        FieldType::Ref(target) => {
            reference_ordinal(lists.get(target), value).map(|i| i.to_string())
        }
    }
}

// Ordinal-equality match first; identity fallback second. Unresolvable
// references are omitted.
fn reference_ordinal(list: &CategoryList, value: &Value) -> Option<usize> {
    if let Value::Item(rc) = value {
        let needle = rc.borrow();
        if let Some(ordinal) = list.items.iter().position(|item| *item == *needle) {
            return Some(ordinal);
        }
    }
    list.identities.iter().position(|identity| {
        match (identity, value) {
            (Identity::Item(a), Value::Item(b)) => Rc::ptr_eq(a, b),
            (Identity::Bounds(a), Value::Bounds(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    })
}
