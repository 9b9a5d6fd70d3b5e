//! FR-005: Category store — parses configuration text into resolved,
//! cached per-category item lists.
//!
//! Resolution layers three sources per field: the item's own indexed
//! section, the category's shared default section, and (when loading user
//! files) the built-in baseline that reset layers underneath. A field
//! absent everywhere is omitted, never defaulted to zero. Reference fields
//! resolve eagerly into the referenced item itself.

use crate::core::bounds::bounds_from_item;
use crate::core::document::ConfDoc;
use crate::core::persist;
use crate::core::types::{
    category_fields, parse_bool_token, Category, FieldType, Item, SharedBounds, SharedItem, Value,
    DEFAULT_SUFFIX,
};
use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use tracing::error;

/// Factory configuration used when no user file exists yet.
pub const DEFAULT_CONFIG: &str = "\
[ToolDefault]
torus_radius: 0.25
feedrate: 200
speed: 1000

[Tool0]
name: Cylindrical
shape: cylindrical
tool_radius: 1.5

[Tool1]
name: Toroidal
shape: toroidal
tool_radius: 1
torus_radius: 0.2

[Tool2]
name: Spherical
shape: spherical
tool_radius: 0.5

[ProcessDefault]
path_direction: x
path_strategy: surface
milling_style: ignore
engrave_offset: 0.0
step_down: 3.0
material_allowance: 0.0
overlap_percent: 0
pocketing_type: none

[Process0]
name: Remove material
path_strategy: push_remove
material_allowance: 0.5
step_down: 3.0

[Process1]
name: Carve contour
path_strategy: contour_follow
material_allowance: 0.2
step_down: 1.5
milling_style: conventional

[Process2]
name: Cleanup
path_strategy: surface
material_allowance: 0.0
overlap_percent: 60

[Process3]
name: Gravure
path_strategy: engrave
step_down: 1.0
milling_style: conventional

[BoundsDefault]
type: relative_margin
x_low: 0.0
x_high: 0.0
y_low: 0.0
y_high: 0.0
z_low: 0.0
z_high: 0.0

[Bounds0]
name: Minimum

[Bounds1]
name: 10% margin
x_low: 0.10
x_high: 0.10
y_low: 0.10
y_high: 0.10

[TaskDefault]
enabled: yes
bounds: 1

[Task0]
name: Rough
tool: 0
process: 0

[Task1]
name: Semi-finish
tool: 1
process: 1

[Task2]
name: Finish
tool: 2
process: 2

[Task3]
name: Gravure
enabled: no
tool: 2
process: 3
";

/// Minimal baseline layered under user-supplied text, so fields missing
/// from an older saved file still receive a value.
pub const BASIC_DEFAULT_CONFIG: &str = "\
[ToolDefault]
name: Cylindrical
shape: cylindrical
tool_radius: 1.5
torus_radius: 0.25
feedrate: 200
speed: 1000

[ProcessDefault]
name: Remove material
path_strategy: push_remove
path_direction: x
milling_style: ignore
material_allowance: 0.0
overlap_percent: 0
step_down: 3.0
engrave_offset: 0.0
pocketing_type: none

[BoundsDefault]
name: No margin
type: relative_margin
x_low: 0.0
x_high: 0.0
y_low: 0.0
y_high: 0.0
z_low: 0.0
z_high: 0.0

[TaskDefault]
name: Default
enabled: yes
tool: 0
process: 0
bounds: 0
";

struct CacheSlot {
    generation: u64,
    entries: Vec<Value>,
}

/// Owns parsed configuration text and resolves category item lists.
///
/// Lists are computed lazily on first request and memoized; cache slots are
/// tagged with the store generation, which every reset bumps, so a stale
/// slot is recomputed instead of served. Returned lists are copies, but the
/// items inside are shared handles: mutating one is visible to every holder,
/// including resolved task references.
pub struct SettingsStore {
    doc: ConfDoc,
    cache: RefCell<FxHashMap<Category, CacheSlot>>,
    generation: Cell<u64>,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore {
    /// A store initialized from the built-in factory configuration.
    pub fn new() -> SettingsStore {
        let mut store = SettingsStore {
            doc: ConfDoc::default(),
            cache: RefCell::new(FxHashMap::default()),
            generation: Cell::new(0),
        };
        let _ = store.reset(None);
        store
    }

    /// Replace the store contents wholesale.
    ///
    /// `None` re-parses the factory configuration. `Some` parses the
    /// baseline first, then layers the supplied text over it. On failure
    /// the store is left empty; the caller must re-initialize.
    pub fn reset(&mut self, text: Option<&str>) -> Result<(), String> {
        self.generation.set(self.generation.get() + 1);
        self.cache.borrow_mut().clear();
        self.doc = ConfDoc::default();
        self.doc = match text {
            None => ConfDoc::parse(DEFAULT_CONFIG)?,
            Some(supplied) => {
                let mut layered = ConfDoc::parse(BASIC_DEFAULT_CONFIG)?;
                layered.merge(ConfDoc::parse(supplied)?);
                layered
            }
        };
        Ok(())
    }

    /// Load configuration text. Parse failures are logged and reported as
    /// `false`; the caller is free to retry with different input.
    pub fn load_from_text(&mut self, text: &str) -> bool {
        match self.reset(Some(text)) {
            Ok(()) => true,
            Err(e) => {
                error!("failed to parse configuration: {}", e);
                false
            }
        }
    }

    /// Load a configuration file, layering it over the baseline.
    pub fn load_file(&mut self, path: &Path) -> bool {
        match persist::read_config(path) {
            Ok(text) => self.load_from_text(&text),
            Err(e) => {
                error!("failed to read configuration file: {}", e);
                false
            }
        }
    }

    /// Resolved entries of one category, in ordinal order. Tool, process
    /// and task entries are `Value::Item`; bounds entries are
    /// `Value::Bounds`.
    pub fn category_entries(&self, category: Category) -> Vec<Value> {
        if let Some(slot) = self.cache.borrow().get(&category) {
            if slot.generation == self.generation.get() {
                return slot.entries.clone();
            }
        }
        let entries = self.resolve_category(category);
        self.cache.borrow_mut().insert(
            category,
            CacheSlot {
                generation: self.generation.get(),
                entries: entries.clone(),
            },
        );
        entries
    }

    pub fn tools(&self) -> Vec<SharedItem> {
        self.items_of(Category::Tool)
    }

    pub fn processes(&self) -> Vec<SharedItem> {
        self.items_of(Category::Process)
    }

    pub fn tasks(&self) -> Vec<SharedItem> {
        self.items_of(Category::Task)
    }

    pub fn bounds(&self) -> Vec<SharedBounds> {
        self.category_entries(Category::Bounds)
            .iter()
            .filter_map(Value::as_bounds)
            .collect()
    }

    fn items_of(&self, category: Category) -> Vec<SharedItem> {
        self.category_entries(category)
            .iter()
            .filter_map(Value::as_item)
            .collect()
    }

    fn resolve_category(&self, category: Category) -> Vec<Value> {
        let prefix = category.prefix();
        let default_section = format!("{}{}", prefix, DEFAULT_SUFFIX);
        let mut entries = Vec::new();

        for ordinal in 0.. {
            let section = format!("{}{}", prefix, ordinal);
            if !self.doc.has_section(&section) {
                break;
            }
            let mut item = Item::new();
            for spec in category_fields(category) {
                let raw = self
                    .doc
                    .get(&section, spec.name)
                    .or_else(|| self.doc.get(&default_section, spec.name));
                let Some(raw) = raw else {
                    continue;
                };
                if let Some(value) = self.coerce(raw, spec.ftype) {
                    item.insert(spec.name.to_string(), value);
                }
            }
            entries.push(if category == Category::Bounds {
                Value::Bounds(Rc::new(RefCell::new(bounds_from_item(&item))))
            } else {
                Value::Item(Rc::new(RefCell::new(item)))
            });
        }

        entries
    }

    // Coercion failures yield omission, never an error: an unparsable
    // number or an out-of-range ordinal drops the field.
    fn coerce(&self, raw: &str, ftype: FieldType) -> Option<Value> {
        match ftype {
            FieldType::Str => Some(Value::Str(raw.to_string())),
            FieldType::Float => raw.trim().parse::<f64>().ok().map(Value::Float),
            FieldType::Int => raw.trim().parse::<i64>().ok().map(Value::Int),
            FieldType::Bool => Some(Value::Bool(parse_bool_token(raw))),
            FieldType::Ref(target) => {
                let ordinal: usize = raw.trim().parse().ok()?;
                self.category_entries(target).get(ordinal).cloned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bounds::BoundsKind;
    use std::rc::Rc;

    fn field(item: &SharedItem, key: &str) -> Value {
        item.borrow().get(key).cloned().unwrap()
    }

    #[test]
    fn test_fr005_default_config_parses() {
        assert!(ConfDoc::parse(DEFAULT_CONFIG).is_ok());
        assert!(ConfDoc::parse(BASIC_DEFAULT_CONFIG).is_ok());
    }

    #[test]
    fn test_fr005_default_tools() {
        let store = SettingsStore::new();
        let tools = store.tools();
        assert_eq!(tools.len(), 3);

        let names: Vec<String> = tools
            .iter()
            .map(|t| field(t, "name").as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["Cylindrical", "Toroidal", "Spherical"]);

        for (index, tool) in tools.iter().enumerate() {
            assert_eq!(field(tool, "feedrate"), Value::Float(200.0));
            assert_eq!(field(tool, "speed"), Value::Float(1000.0));
            let expected_torus = if index == 1 { 0.2 } else { 0.25 };
            assert_eq!(field(tool, "torus_radius"), Value::Float(expected_torus));
        }
    }

    #[test]
    fn test_fr005_default_inheritance_override() {
        let store = SettingsStore::new();
        let processes = store.processes();
        assert_eq!(processes.len(), 4);
        // Process1 overrides milling_style, Process0 inherits it.
        assert_eq!(field(&processes[0], "milling_style"), Value::from("ignore"));
        assert_eq!(
            field(&processes[1], "milling_style"),
            Value::from("conventional")
        );
        // overlap_percent is an integer field.
        assert_eq!(field(&processes[2], "overlap_percent"), Value::Int(60));
    }

    #[test]
    fn test_fr005_task_reference_resolution() {
        let store = SettingsStore::new();
        let tasks = store.tasks();
        assert_eq!(tasks.len(), 4);

        let tools = store.tools();
        let rough_tool = field(&tasks[0], "tool").as_item().unwrap();
        assert!(Rc::ptr_eq(&rough_tool, &tools[0]));

        // TaskDefault points every task at bounds ordinal 1.
        let bounds = store.bounds();
        for task in &tasks {
            let b = field(task, "bounds").as_bounds().unwrap();
            assert!(Rc::ptr_eq(&b, &bounds[1]));
        }

        assert_eq!(field(&tasks[3], "enabled"), Value::Bool(false));
        assert_eq!(field(&tasks[0], "enabled"), Value::Bool(true));
    }

    #[test]
    fn test_fr005_bounds_entries_are_derived_values() {
        let store = SettingsStore::new();
        let bounds = store.bounds();
        assert_eq!(bounds.len(), 2);
        let margin = bounds[1].borrow();
        assert_eq!(margin.name, "10% margin");
        assert_eq!(margin.kind, BoundsKind::RelativeMargin);
        assert_eq!(margin.volume.lower, [0.1, 0.1, 0.0]);
        assert_eq!(margin.volume.upper, [0.1, 0.1, 0.0]);
    }

    #[test]
    fn test_fr005_out_of_range_reference_is_omitted() {
        let text = "\
[Process0]
name: First

[Process1]
name: Second

[Task0]
name: Orphan
process: 2
";
        let mut store = SettingsStore::new();
        assert!(store.load_from_text(text));
        assert_eq!(store.processes().len(), 2);
        let tasks = store.tasks();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].borrow().get("process").is_none());
        assert_eq!(
            tasks[0].borrow().get("name"),
            Some(&Value::from("Orphan"))
        );
    }

    #[test]
    fn test_fr005_non_numeric_reference_is_omitted() {
        let text = "[Tool0]\nname: T\n[Task0]\nname: A\ntool: first\n";
        let mut store = SettingsStore::new();
        assert!(store.load_from_text(text));
        let tasks = store.tasks();
        assert!(tasks[0].borrow().get("tool").is_none());
    }

    #[test]
    fn test_fr005_negative_reference_is_omitted() {
        let text = "[Tool0]\nname: T\n[Task0]\nname: A\ntool: -1\n";
        let mut store = SettingsStore::new();
        assert!(store.load_from_text(text));
        assert!(store.tasks()[0].borrow().get("tool").is_none());
    }

    #[test]
    fn test_fr005_unparsable_number_is_omitted() {
        let text = "[Tool0]\nname: T\ntool_radius: wide\nspeed: 900\n";
        let mut store = SettingsStore::new();
        assert!(store.load_from_text(text));
        let tool = &store.tools()[0];
        assert!(tool.borrow().get("tool_radius").is_none());
        assert_eq!(field(tool, "speed"), Value::Float(900.0));
    }

    #[test]
    fn test_fr005_baseline_layering_fills_missing_fields() {
        let minimal = "\
[Tool0]
name: Lone cutter

[Process0]
name: Lone process

[Bounds0]
name: Lone bounds

[Task0]
name: Lone task
";
        let mut store = SettingsStore::new();
        assert!(store.load_from_text(minimal));

        let tool = &store.tools()[0];
        assert_eq!(field(tool, "name"), Value::from("Lone cutter"));
        assert_eq!(field(tool, "shape"), Value::from("cylindrical"));
        assert_eq!(field(tool, "tool_radius"), Value::Float(1.5));
        assert_eq!(field(tool, "torus_radius"), Value::Float(0.25));
        assert_eq!(field(tool, "feedrate"), Value::Float(200.0));
        assert_eq!(field(tool, "speed"), Value::Float(1000.0));

        let process = &store.processes()[0];
        assert_eq!(field(process, "path_strategy"), Value::from("push_remove"));
        assert_eq!(field(process, "overlap_percent"), Value::Int(0));

        let bounds = store.bounds();
        assert_eq!(bounds[0].borrow().kind, BoundsKind::RelativeMargin);

        let task = &store.tasks()[0];
        assert_eq!(field(task, "enabled"), Value::Bool(true));
        assert!(Rc::ptr_eq(
            &field(task, "tool").as_item().unwrap(),
            &store.tools()[0]
        ));
        assert!(Rc::ptr_eq(
            &field(task, "bounds").as_bounds().unwrap(),
            &bounds[0]
        ));
    }

    #[test]
    fn test_fr005_supplied_text_overrides_baseline() {
        let text = "[ToolDefault]\nfeedrate: 120\n[Tool0]\nname: X\n";
        let mut store = SettingsStore::new();
        assert!(store.load_from_text(text));
        assert_eq!(field(&store.tools()[0], "feedrate"), Value::Float(120.0));
    }

    #[test]
    fn test_fr005_cache_returns_same_handles() {
        let store = SettingsStore::new();
        let first = store.tools();
        let second = store.tools();
        assert!(Rc::ptr_eq(&first[0], &second[0]));

        // Returned lists are copies; items are shared.
        first[0]
            .borrow_mut()
            .insert("speed".to_string(), Value::Float(1.0));
        assert_eq!(field(&second[0], "speed"), Value::Float(1.0));
    }

    #[test]
    fn test_fr005_reset_invalidates_cache() {
        let mut store = SettingsStore::new();
        let before = store.tools();
        assert!(store.load_from_text("[Tool0]\nname: Only\n"));
        let after = store.tools();
        assert_eq!(after.len(), 1);
        assert!(!Rc::ptr_eq(&before[0], &after[0]));
    }

    #[test]
    fn test_fr005_parse_failure_leaves_empty_store() {
        let mut store = SettingsStore::new();
        assert!(!store.load_from_text("[Tool0]\nga rba ge\n"));
        assert!(store.tools().is_empty());
        assert!(store.tasks().is_empty());
        // Recoverable: the next load starts from scratch.
        assert!(store.load_from_text("[Tool0]\nname: Back\n"));
        assert_eq!(store.tools().len(), 1);
    }

    #[test]
    fn test_fr005_ordinal_enumeration_stops_at_gap() {
        let text = "[Tool0]\nname: A\n[Tool2]\nname: C\n";
        let mut store = SettingsStore::new();
        assert!(store.load_from_text(text));
        // Tool2 is unreachable without Tool1.
        assert_eq!(store.tools().len(), 1);
    }

    #[test]
    fn test_fr005_bool_coercion_through_store() {
        let text = "\
[Tool0]
name: T

[Process0]
name: P

[Bounds0]
name: B

[Task0]
name: A
enabled: On

[Task1]
name: B
enabled: maybe
";
        let mut store = SettingsStore::new();
        assert!(store.load_from_text(text));
        let tasks = store.tasks();
        assert_eq!(field(&tasks[0], "enabled"), Value::Bool(true));
        assert_eq!(field(&tasks[1], "enabled"), Value::Bool(false));
    }
}
