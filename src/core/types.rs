//! FR-001: Settings schema and value model.
//!
//! Declares the four configuration categories (tool, process, bounds, task),
//! the fixed field table per category, and the typed `Value` carried by
//! resolved items. Reference fields are restricted to non-task targets by
//! the schema itself, so recursive resolution is bounded.

use crate::core::bounds::Bounds;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Suffix of the shared per-category default section (`ToolDefault`, ...).
pub const DEFAULT_SUFFIX: &str = "Default";

// ============================================================================
// Categories
// ============================================================================

/// One configuration category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Tool,
    Process,
    Bounds,
    Task,
}

impl Category {
    /// All categories in serialization order.
    pub const ALL: [Category; 4] = [
        Category::Tool,
        Category::Process,
        Category::Bounds,
        Category::Task,
    ];

    /// Section-name prefix (`Tool0`, `Tool1`, ..., `ToolDefault`).
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Tool => "Tool",
            Self::Process => "Process",
            Self::Bounds => "Bounds",
            Self::Task => "Task",
        }
    }

    /// Look up a category by its lowercase name.
    pub fn from_name(name: &str) -> Option<Category> {
        match name {
            "tool" => Some(Self::Tool),
            "process" => Some(Self::Process),
            "bounds" => Some(Self::Bounds),
            "task" => Some(Self::Task),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tool => write!(f, "tool"),
            Self::Process => write!(f, "process"),
            Self::Bounds => write!(f, "bounds"),
            Self::Task => write!(f, "task"),
        }
    }
}

// ============================================================================
// Field schema
// ============================================================================

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Float,
    Int,
    Bool,
    /// Ordinal reference into another category's item list.
    Ref(Category),
}

/// One field declaration in a category schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ftype: FieldType,
}

const fn field(name: &'static str, ftype: FieldType) -> FieldSpec {
    FieldSpec { name, ftype }
}

const TOOL_FIELDS: [FieldSpec; 6] = [
    field("name", FieldType::Str),
    field("shape", FieldType::Str),
    field("tool_radius", FieldType::Float),
    field("torus_radius", FieldType::Float),
    field("feedrate", FieldType::Float),
    field("speed", FieldType::Float),
];

const PROCESS_FIELDS: [FieldSpec; 9] = [
    field("name", FieldType::Str),
    field("path_strategy", FieldType::Str),
    field("path_direction", FieldType::Str),
    field("milling_style", FieldType::Str),
    field("material_allowance", FieldType::Float),
    field("overlap_percent", FieldType::Int),
    field("step_down", FieldType::Float),
    field("engrave_offset", FieldType::Float),
    field("pocketing_type", FieldType::Str),
];

const BOUNDS_FIELDS: [FieldSpec; 8] = [
    field("name", FieldType::Str),
    field("type", FieldType::Str),
    field("x_low", FieldType::Float),
    field("x_high", FieldType::Float),
    field("y_low", FieldType::Float),
    field("y_high", FieldType::Float),
    field("z_low", FieldType::Float),
    field("z_high", FieldType::Float),
];

// Task references stay non-task, so task -> task cycles cannot be declared.
const TASK_FIELDS: [FieldSpec; 5] = [
    field("name", FieldType::Str),
    field("tool", FieldType::Ref(Category::Tool)),
    field("process", FieldType::Ref(Category::Process)),
    field("bounds", FieldType::Ref(Category::Bounds)),
    field("enabled", FieldType::Bool),
];

/// The fixed field table of a category.
pub fn category_fields(category: Category) -> &'static [FieldSpec] {
    match category {
        Category::Tool => &TOOL_FIELDS,
        Category::Process => &PROCESS_FIELDS,
        Category::Bounds => &BOUNDS_FIELDS,
        Category::Task => &TASK_FIELDS,
    }
}

// ============================================================================
// Values and items
// ============================================================================

/// A resolved configuration item: ordered field -> value mapping.
pub type Item = IndexMap<String, Value>;

/// Item handle shared between a cached list and every resolved reference.
pub type SharedItem = Rc<RefCell<Item>>;

/// Bounds handle, shared the same way.
pub type SharedBounds = Rc<RefCell<Bounds>>;

/// A typed settings value.
#[derive(Debug, Clone)]
pub enum Value {
    Str(String),
    Float(f64),
    Int(i64),
    Bool(bool),
    /// Comma-separated numeric list (toolpath metadata only).
    FloatList(Vec<f64>),
    /// Resolved reference to another category's item.
    Item(SharedItem),
    /// Resolved reference to a bounds definition.
    Bounds(SharedBounds),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view; integers widen to float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_item(&self) -> Option<SharedItem> {
        match self {
            Self::Item(rc) => Some(rc.clone()),
            _ => None,
        }
    }

    pub fn as_bounds(&self) -> Option<SharedBounds> {
        match self {
            Self::Bounds(rc) => Some(rc.clone()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Float(_) => "float",
            Self::Int(_) => "integer",
            Self::Bool(_) => "boolean",
            Self::FloatList(_) => "float list",
            Self::Item(_) => "item reference",
            Self::Bounds(_) => "bounds reference",
        }
    }
}

// Scalars compare by value. References compare by pointer identity first,
// then structurally, so two equal-valued items still factor together.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::FloatList(a), Self::FloatList(b)) => a == b,
            (Self::Item(a), Self::Item(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Bounds(a), Self::Bounds(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Str(s) => serializer.serialize_str(s),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::FloatList(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for v in list {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Self::Item(rc) => rc.borrow().serialize(serializer),
            Self::Bounds(rc) => rc.borrow().serialize(serializer),
        }
    }
}

/// The fixed truthy token set used by every boolean field.
pub fn parse_bool_token(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fr001_category_prefixes() {
        assert_eq!(Category::Tool.prefix(), "Tool");
        assert_eq!(Category::Process.prefix(), "Process");
        assert_eq!(Category::Bounds.prefix(), "Bounds");
        assert_eq!(Category::Task.prefix(), "Task");
    }

    #[test]
    fn test_fr001_category_from_name() {
        assert_eq!(Category::from_name("tool"), Some(Category::Tool));
        assert_eq!(Category::from_name("task"), Some(Category::Task));
        assert_eq!(Category::from_name("cutter"), None);
    }

    #[test]
    fn test_fr001_task_references_are_non_task() {
        for spec in category_fields(Category::Task) {
            if let FieldType::Ref(target) = spec.ftype {
                assert_ne!(target, Category::Task, "field {}", spec.name);
            }
        }
    }

    #[test]
    fn test_fr001_every_category_has_name_field() {
        for category in Category::ALL {
            assert!(category_fields(category)
                .iter()
                .any(|s| s.name == "name" && s.ftype == FieldType::Str));
        }
    }

    #[test]
    fn test_fr001_bool_tokens() {
        for raw in ["1", "true", "yes", "on", "On", "YES", " true "] {
            assert!(parse_bool_token(raw), "{:?}", raw);
        }
        for raw in ["no", "0", "false", "", "maybe", "off"] {
            assert!(!parse_bool_token(raw), "{:?}", raw);
        }
    }

    #[test]
    fn test_fr001_scalar_equality() {
        assert_eq!(Value::from(1.5), Value::from(1.5));
        assert_ne!(Value::from(1.5), Value::from("1.5"));
        assert_ne!(Value::from(1i64), Value::from(1.0));
    }

    #[test]
    fn test_fr001_item_equality_identity_and_structural() {
        let a: SharedItem = Rc::new(RefCell::new(Item::from([(
            "name".to_string(),
            Value::from("Rough"),
        )])));
        let same = Value::Item(a.clone());
        assert_eq!(Value::Item(a.clone()), same);

        let twin: SharedItem = Rc::new(RefCell::new(a.borrow().clone()));
        assert_eq!(Value::Item(a.clone()), Value::Item(twin.clone()));

        twin.borrow_mut()
            .insert("name".to_string(), Value::from("Finish"));
        assert_ne!(Value::Item(a), Value::Item(twin));
    }

    #[test]
    fn test_fr001_shared_item_mutation_is_visible() {
        let item: SharedItem = Rc::new(RefCell::new(Item::new()));
        let alias = Value::Item(item.clone());
        item.borrow_mut()
            .insert("speed".to_string(), Value::from(1000.0));
        let held = alias.as_item().unwrap();
        assert_eq!(held.borrow().get("speed"), Some(&Value::from(1000.0)));
    }

    #[test]
    fn test_fr001_value_json() {
        let item: SharedItem = Rc::new(RefCell::new(Item::from([
            ("name".to_string(), Value::from("Cylindrical")),
            ("speed".to_string(), Value::from(1000.0)),
        ])));
        let json = serde_json::to_string(&Value::Item(item)).unwrap();
        assert_eq!(json, r#"{"name":"Cylindrical","speed":1000.0}"#);

        let list = Value::FloatList(vec![1.0, 2.5]);
        assert_eq!(serde_json::to_string(&list).unwrap(), "[1.0,2.5]");
    }
}
