//! FR-007: Toolpath metadata codec.
//!
//! A much narrower sibling of the category store: four fixed
//! single-instance sections (`Bounds`, `Tool`, `Program`, `Process`) with
//! no defaults and no references, embedded as a text block in generated
//! toolpath output so the settings that produced it travel with it. Built
//! fresh per generation event, never cached.

use crate::core::bounds::{Bounds, BoundsBox, BoundsKind};
use crate::core::document::ConfDoc;
use crate::core::types::{parse_bool_token, Item, Value};
use tracing::{error, warn};

/// Marker lines a host document may use to delimit an embedded metadata
/// block. Recognizing them is the host's job, not the codec's.
pub const TOOLPATH_META_START: &str = "FRESAR_TOOLPATH_SETTINGS: START";
pub const TOOLPATH_META_END: &str = "FRESAR_TOOLPATH_SETTINGS: END";

// ============================================================================
// Metadata schema
// ============================================================================

/// Declared type of a metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaType {
    Str,
    Float,
    Int,
    Bool,
    /// Comma-separated list of floats.
    FloatList,
}

/// One field declaration in a metadata section schema.
#[derive(Debug, Clone, Copy)]
pub struct MetaField {
    pub name: &'static str,
    pub ftype: MetaType,
}

const fn meta(name: &'static str, ftype: MetaType) -> MetaField {
    MetaField { name, ftype }
}

/// The four fixed metadata sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaSection {
    Bounds,
    Tool,
    Program,
    Process,
}

const BOUNDS_META: [MetaField; 6] = [
    meta("minx", MetaType::Float),
    meta("maxx", MetaType::Float),
    meta("miny", MetaType::Float),
    meta("maxy", MetaType::Float),
    meta("minz", MetaType::Float),
    meta("maxz", MetaType::Float),
];

const TOOL_META: [MetaField; 5] = [
    meta("shape", MetaType::Str),
    meta("tool_radius", MetaType::Float),
    meta("torus_radius", MetaType::Float),
    meta("speed", MetaType::Float),
    meta("feedrate", MetaType::Float),
];

const PROGRAM_META: [MetaField; 1] = [meta("unit", MetaType::Str)];

const PROCESS_META: [MetaField; 9] = [
    meta("generator", MetaType::Str),
    meta("postprocessor", MetaType::Str),
    meta("path_direction", MetaType::Str),
    meta("material_allowance", MetaType::Float),
    meta("overlap_percent", MetaType::Int),
    meta("step_down", MetaType::Float),
    meta("engrave_offset", MetaType::Float),
    meta("milling_style", MetaType::Str),
    meta("pocketing_type", MetaType::Str),
];

impl MetaSection {
    pub const ALL: [MetaSection; 4] = [
        MetaSection::Bounds,
        MetaSection::Tool,
        MetaSection::Program,
        MetaSection::Process,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bounds => "Bounds",
            Self::Tool => "Tool",
            Self::Program => "Program",
            Self::Process => "Process",
        }
    }

    pub fn fields(&self) -> &'static [MetaField] {
        match self {
            Self::Bounds => &BOUNDS_META,
            Self::Tool => &TOOL_META,
            Self::Program => &PROGRAM_META,
            Self::Process => &PROCESS_META,
        }
    }
}

// ============================================================================
// Process parameters
// ============================================================================

/// Inputs for the process sub-record.
#[derive(Debug, Clone)]
pub struct ProcessParams {
    pub generator: String,
    pub postprocessor: String,
    pub path_direction: String,
    pub material_allowance: f64,
    pub overlap_percent: i64,
    pub step_down: f64,
    pub engrave_offset: f64,
    pub milling_style: String,
    pub pocketing_type: String,
}

impl Default for ProcessParams {
    fn default() -> Self {
        Self {
            generator: String::new(),
            postprocessor: String::new(),
            path_direction: "x".to_string(),
            material_allowance: 0.0,
            overlap_percent: 0,
            step_down: 1.0,
            engrave_offset: 0.0,
            milling_style: "ignore".to_string(),
            pocketing_type: "none".to_string(),
        }
    }
}

// ============================================================================
// The metadata record
// ============================================================================

/// Provenance record stamped onto generated toolpath output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolpathMeta {
    pub bounds: Item,
    pub tool: Item,
    pub program: Item,
    pub process: Item,
}

impl ToolpathMeta {
    pub fn new() -> ToolpathMeta {
        ToolpathMeta::default()
    }

    fn record(&self, section: MetaSection) -> &Item {
        match section {
            MetaSection::Bounds => &self.bounds,
            MetaSection::Tool => &self.tool,
            MetaSection::Program => &self.program,
            MetaSection::Process => &self.process,
        }
    }

    fn record_mut(&mut self, section: MetaSection) -> &mut Item {
        match section {
            MetaSection::Bounds => &mut self.bounds,
            MetaSection::Tool => &mut self.tool,
            MetaSection::Program => &mut self.program,
            MetaSection::Process => &mut self.process,
        }
    }

    /// Record the absolute machining volume.
    pub fn set_bounds(&mut self, volume: &BoundsBox) {
        let b = &mut self.bounds;
        b.insert("minx".to_string(), Value::Float(volume.lower[0]));
        b.insert("maxx".to_string(), Value::Float(volume.upper[0]));
        b.insert("miny".to_string(), Value::Float(volume.lower[1]));
        b.insert("maxy".to_string(), Value::Float(volume.upper[1]));
        b.insert("minz".to_string(), Value::Float(volume.lower[2]));
        b.insert("maxz".to_string(), Value::Float(volume.upper[2]));
    }

    /// Rebuild a bounds value from the recorded volume. `None` until all
    /// six corners are present.
    pub fn bounds_value(&self) -> Option<Bounds> {
        let corner = |key: &str| self.bounds.get(key).and_then(Value::as_float);
        let volume = BoundsBox::new(
            [corner("minx")?, corner("miny")?, corner("minz")?],
            [corner("maxx")?, corner("maxy")?, corner("maxz")?],
        );
        Some(Bounds::new("", BoundsKind::Custom, volume))
    }

    /// Record the tool that cut this path. A toroidal radius only applies
    /// to toroidal shapes; pass `None` to leave it out.
    pub fn set_tool(
        &mut self,
        shape: &str,
        tool_radius: f64,
        torus_radius: Option<f64>,
        speed: f64,
        feedrate: f64,
    ) {
        let t = &mut self.tool;
        t.clear();
        t.insert("shape".to_string(), Value::from(shape));
        t.insert("tool_radius".to_string(), Value::Float(tool_radius));
        if let Some(torus) = torus_radius {
            t.insert("torus_radius".to_string(), Value::Float(torus));
        }
        t.insert("speed".to_string(), Value::Float(speed));
        t.insert("feedrate".to_string(), Value::Float(feedrate));
    }

    /// Record the process parameters.
    pub fn set_process(&mut self, params: &ProcessParams) {
        // Contour and engrave generators ignore stock allowance.
        let material_allowance = match params.generator.as_str() {
            "contour_follow" | "engrave" => 0.0,
            _ => params.material_allowance,
        };
        let p = &mut self.process;
        p.clear();
        p.insert("generator".to_string(), Value::from(params.generator.as_str()));
        p.insert(
            "postprocessor".to_string(),
            Value::from(params.postprocessor.as_str()),
        );
        p.insert(
            "path_direction".to_string(),
            Value::from(params.path_direction.as_str()),
        );
        p.insert(
            "material_allowance".to_string(),
            Value::Float(material_allowance),
        );
        p.insert("overlap_percent".to_string(), Value::Int(params.overlap_percent));
        p.insert("step_down".to_string(), Value::Float(params.step_down));
        p.insert(
            "engrave_offset".to_string(),
            Value::Float(params.engrave_offset),
        );
        p.insert(
            "milling_style".to_string(),
            Value::from(params.milling_style.as_str()),
        );
        p.insert(
            "pocketing_type".to_string(),
            Value::from(params.pocketing_type.as_str()),
        );
    }

    pub fn set_unit_size(&mut self, unit: &str) {
        self.program.insert("unit".to_string(), Value::from(unit));
    }

    /// Measurement unit of the program; millimeters unless recorded.
    pub fn unit_size(&self) -> String {
        self.program
            .get("unit")
            .and_then(Value::as_str)
            .unwrap_or("mm")
            .to_string()
    }

    /// Merge an embedded metadata block into this record. Missing keys are
    /// skipped silently; a field that fails coercion is logged and skipped
    /// on its own; malformed syntax fails the whole parse.
    pub fn parse(&mut self, text: &str) -> bool {
        let doc = match ConfDoc::parse(text) {
            Ok(doc) => doc,
            Err(e) => {
                error!("failed to parse toolpath metadata: {}", e);
                return false;
            }
        };
        for section in MetaSection::ALL {
            for field in section.fields() {
                let Some(raw) = doc.get(section.name(), field.name) else {
                    continue;
                };
                match coerce_meta(raw, field.ftype) {
                    Some(value) => {
                        self.record_mut(section)
                            .insert(field.name.to_string(), value);
                    }
                    None => warn!(
                        "ignored invalid setting ({} -> {}): {}",
                        section.name(),
                        field.name,
                        raw
                    ),
                }
            }
        }
        true
    }

    /// Emit one section per non-empty sub-record, fields in schema order.
    /// A stored value whose runtime type does not match the declared field
    /// type is dropped rather than emitted.
    pub fn to_text(&self) -> String {
        let mut out: Vec<String> = Vec::new();
        for section in MetaSection::ALL {
            let record = self.record(section);
            if record.is_empty() {
                continue;
            }
            out.push(format!("[{}]", section.name()));
            for field in section.fields() {
                let Some(value) = record.get(field.name) else {
                    continue;
                };
                if let Some(text) = meta_value_text(value, field.ftype) {
                    out.push(format!("{} = {}", field.name, text));
                }
            }
            out.push(String::new());
        }
        out.join("\n")
    }
}

fn coerce_meta(raw: &str, ftype: MetaType) -> Option<Value> {
    match ftype {
        MetaType::Str => Some(Value::Str(raw.to_string())),
        MetaType::Float => raw.trim().parse::<f64>().ok().map(Value::Float),
        MetaType::Int => raw.trim().parse::<i64>().ok().map(Value::Int),
        MetaType::Bool => Some(Value::Bool(parse_bool_token(raw))),
        MetaType::FloatList => raw
            .split(',')
            .map(|part| part.trim().parse::<f64>().ok())
            .collect::<Option<Vec<f64>>>()
            .map(Value::FloatList),
    }
}

// Exact variant match only: an integer stored in a float field is a caller
// mistake and is dropped, not coerced.
fn meta_value_text(value: &Value, ftype: MetaType) -> Option<String> {
    match (ftype, value) {
        (MetaType::Str, Value::Str(s)) => Some(s.clone()),
        (MetaType::Float, Value::Float(f)) => Some(f.to_string()),
        (MetaType::Int, Value::Int(i)) => Some(i.to_string()),
        (MetaType::Bool, Value::Bool(b)) => Some(if *b { "1" } else { "0" }.to_string()),
        (MetaType::FloatList, Value::FloatList(list)) => Some(
            list.iter()
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
        _ => None,
    }
}
