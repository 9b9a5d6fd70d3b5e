//! FR-004: Boundary volumes and their flat-field adapter.
//!
//! A `Bounds` is the derived value a bounds section resolves into: a name,
//! a margin interpretation, and one lower/upper corner per axis. The adapter
//! converts between that value and the flat six-corner mapping used by the
//! text format.

use crate::core::types::{Item, Value};
use serde::Serialize;

/// How the corner offsets are interpreted against a model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsKind {
    RelativeMargin,
    FixedMargin,
    #[default]
    Custom,
}

impl BoundsKind {
    /// Textual tag used by the configuration format.
    pub fn token(&self) -> &'static str {
        match self {
            Self::RelativeMargin => "relative_margin",
            Self::FixedMargin => "fixed_margin",
            Self::Custom => "custom",
        }
    }

    /// Unrecognized tokens map to `Custom`.
    pub fn from_token(token: &str) -> BoundsKind {
        match token {
            "relative_margin" => Self::RelativeMargin,
            "fixed_margin" => Self::FixedMargin,
            _ => Self::Custom,
        }
    }
}

/// An axis-aligned volume: one lower and one upper corner per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoundsBox {
    pub lower: [f64; 3],
    pub upper: [f64; 3],
}

impl BoundsBox {
    pub fn new(lower: [f64; 3], upper: [f64; 3]) -> BoundsBox {
        BoundsBox { lower, upper }
    }
}

/// A named boundary volume definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Bounds {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BoundsKind,
    pub volume: BoundsBox,
}

impl Bounds {
    pub fn new(name: &str, kind: BoundsKind, volume: BoundsBox) -> Bounds {
        Bounds {
            name: name.to_string(),
            kind,
            volume,
        }
    }
}

const AXES: [char; 3] = ['x', 'y', 'z'];

/// Flatten a bounds value into the six corner fields plus name and type tag.
/// The caller keeps the source handle alongside for identity matching.
pub fn bounds_to_item(bounds: &Bounds) -> Item {
    let mut item = Item::new();
    item.insert("name".to_string(), Value::from(bounds.name.as_str()));
    item.insert("type".to_string(), Value::from(bounds.kind.token()));
    for (axis, name) in AXES.iter().enumerate() {
        item.insert(
            format!("{}_low", name),
            Value::Float(bounds.volume.lower[axis]),
        );
        item.insert(
            format!("{}_high", name),
            Value::Float(bounds.volume.upper[axis]),
        );
    }
    item
}

/// Inverse of [`bounds_to_item`]. A missing corner degrades to 0.0; missing
/// or unknown type tags map to `Custom`.
pub fn bounds_from_item(item: &Item) -> Bounds {
    let corner = |key: &str| item.get(key).and_then(Value::as_float).unwrap_or(0.0);
    let mut lower = [0.0; 3];
    let mut upper = [0.0; 3];
    for (axis, name) in AXES.iter().enumerate() {
        lower[axis] = corner(&format!("{}_low", name));
        upper[axis] = corner(&format!("{}_high", name));
    }
    Bounds {
        name: item
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        kind: item
            .get("type")
            .and_then(Value::as_str)
            .map(BoundsKind::from_token)
            .unwrap_or_default(),
        volume: BoundsBox::new(lower, upper),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fr004_kind_tokens_roundtrip() {
        for kind in [
            BoundsKind::RelativeMargin,
            BoundsKind::FixedMargin,
            BoundsKind::Custom,
        ] {
            assert_eq!(BoundsKind::from_token(kind.token()), kind);
        }
    }

    #[test]
    fn test_fr004_unknown_token_is_custom() {
        assert_eq!(BoundsKind::from_token("spherical_margin"), BoundsKind::Custom);
        assert_eq!(BoundsKind::from_token(""), BoundsKind::Custom);
    }

    #[test]
    fn test_fr004_to_item() {
        let b = Bounds::new(
            "10% margin",
            BoundsKind::RelativeMargin,
            BoundsBox::new([0.1, 0.1, 0.0], [0.1, 0.1, 0.0]),
        );
        let item = bounds_to_item(&b);
        assert_eq!(item.get("name"), Some(&Value::from("10% margin")));
        assert_eq!(item.get("type"), Some(&Value::from("relative_margin")));
        assert_eq!(item.get("x_low"), Some(&Value::Float(0.1)));
        assert_eq!(item.get("z_high"), Some(&Value::Float(0.0)));
        assert_eq!(item.len(), 8);
    }

    #[test]
    fn test_fr004_from_item_roundtrip() {
        let b = Bounds::new(
            "Stock",
            BoundsKind::FixedMargin,
            BoundsBox::new([-1.0, 0.0, 0.5], [1.0, 2.0, 3.5]),
        );
        assert_eq!(bounds_from_item(&bounds_to_item(&b)), b);
    }

    #[test]
    fn test_fr004_from_item_missing_fields() {
        let item = Item::from([("x_low".to_string(), Value::Float(2.0))]);
        let b = bounds_from_item(&item);
        assert_eq!(b.name, "");
        assert_eq!(b.kind, BoundsKind::Custom);
        assert_eq!(b.volume.lower, [2.0, 0.0, 0.0]);
        assert_eq!(b.volume.upper, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fr004_integer_corner_widens() {
        let item = Item::from([("y_high".to_string(), Value::Int(3))]);
        assert_eq!(bounds_from_item(&item).volume.upper[1], 3.0);
    }
}
