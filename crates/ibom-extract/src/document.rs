//! Conversion of the raw pcbdata JSON tree into a [`PcbDocument`].
//!
//! ibom has shipped two footprint layouts over the years: `footprints[]`
//! (current, addressed by index) and `modules.F` / `modules.B` (legacy,
//! addressed by reference only). Both are resolved here into one
//! [`Footprint`] shape so nothing downstream sees the difference.
//!
//! Everything below the top level is read leniently: missing or mistyped
//! fields fall back to defaults instead of failing the load.

use crate::bom::is_lcsc_code;
use crate::types::*;
use log::{debug, info, warn};
use serde_json::{Map, Value};

/// Raw footprint layouts found in the document.
enum RawLayout<'a> {
    Footprints(&'a [Value]),
    Modules { front: &'a [Value], back: &'a [Value] },
}

impl PcbDocument {
    /// Build a document from the parsed pcbdata tree.
    pub fn from_value(root: &Value) -> Self {
        let layouts = raw_layouts(root);
        let schema = match (
            layouts.iter().any(|l| matches!(l, RawLayout::Footprints(_))),
            layouts.iter().any(|l| matches!(l, RawLayout::Modules { .. })),
        ) {
            (true, true) => Schema::Mixed,
            (true, false) => Schema::Footprints,
            (false, true) => Schema::Modules,
            (false, false) => Schema::Empty,
        };

        let mut footprints = Vec::new();
        for layout in &layouts {
            match layout {
                RawLayout::Footprints(items) => {
                    for (id, item) in items.iter().enumerate() {
                        let layer = Side::from_layer(str_field(item, "layer").unwrap_or("F"));
                        footprints.extend(parse_footprint(item, Some(id), layer));
                    }
                }
                RawLayout::Modules { front, back } => {
                    for (items, layer) in [(front, Side::Front), (back, Side::Back)] {
                        for item in items.iter() {
                            footprints.extend(parse_footprint(item, None, layer));
                        }
                    }
                }
            }
        }

        let edges_bbox = root
            .get("edges_bbox")
            .or_else(|| root.get("board").and_then(|b| b.get("edges_bbox")))
            .and_then(Value::as_object)
            .and_then(parse_edges_bbox);

        let edges = root
            .get("edges")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let tracks = root.get("tracks").cloned().unwrap_or(Value::Null);
        let drawings = root.get("drawings").cloned().unwrap_or(Value::Null);
        let bom = root.get("bom").map(parse_bom);

        info!(
            "Parsed pcbdata ({schema:?}): {} footprints, {} edges, {} tracks, {} BOM rows",
            footprints.len(),
            edges.len(),
            count_tracks(&tracks),
            bom.as_ref().map_or(0, |b| b.rows.len())
        );

        PcbDocument {
            schema,
            edges_bbox,
            footprints,
            bom,
            metadata: parse_metadata(root.get("metadata")),
            ibom_version: str_field(root, "ibom_version").map(str::to_string),
            edges,
            tracks,
            drawings,
        }
    }
}

fn raw_layouts(root: &Value) -> Vec<RawLayout<'_>> {
    let mut layouts = Vec::new();
    if let Some(modules) = root.get("modules").and_then(Value::as_object) {
        layouts.push(RawLayout::Modules {
            front: side_items(modules, "F"),
            back: side_items(modules, "B"),
        });
    }
    if let Some(items) = root.get("footprints").and_then(Value::as_array) {
        layouts.push(RawLayout::Footprints(items));
    }
    layouts
}

fn side_items<'a>(modules: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    modules
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn parse_footprint(item: &Value, id: Option<usize>, layer: Side) -> Option<Footprint> {
    let ref_ = str_field(item, "ref").unwrap_or("").trim();
    if ref_.is_empty() {
        debug!("Skipping footprint {id:?} without a reference");
        return None;
    }
    let pads: Vec<Point> = item
        .get("pads")
        .and_then(Value::as_array)
        .map(|pads| pads.iter().filter_map(|p| p.get("pos").and_then(point)).collect())
        .unwrap_or_default();

    Some(Footprint {
        ref_: ref_.to_string(),
        id,
        layer,
        center: item.get("center").and_then(point),
        bbox: item.get("bbox").and_then(Value::as_object).and_then(parse_footprint_bbox),
        pads,
    })
}

fn parse_footprint_bbox(obj: &Map<String, Value>) -> Option<FootprintBBox> {
    if let Some(pos) = obj.get("pos").and_then(point) {
        return Some(FootprintBBox::Oriented {
            pos,
            relpos: obj.get("relpos").and_then(point).unwrap_or([0.0, 0.0]),
            size: obj.get("size").and_then(point).unwrap_or([0.0, 0.0]),
            angle: obj.get("angle").and_then(Value::as_f64).unwrap_or(0.0),
        });
    }
    if obj.contains_key("minx") {
        return Some(FootprintBBox::Extents(BBox {
            minx: num(obj, "minx", 0.0),
            miny: num(obj, "miny", 0.0),
            maxx: num(obj, "maxx", 0.0),
            maxy: num(obj, "maxy", 0.0),
        }));
    }
    None
}

/// An outline box with none of its keys is treated as absent.
fn parse_edges_bbox(obj: &Map<String, Value>) -> Option<BBox> {
    if !["minx", "miny", "maxx", "maxy"].iter().any(|k| obj.contains_key(*k)) {
        debug!("edges_bbox has no extents, ignoring it");
        return None;
    }
    let bbox = BBox {
        minx: num(obj, "minx", 0.0),
        miny: num(obj, "miny", 0.0),
        maxx: num(obj, "maxx", 100.0),
        maxy: num(obj, "maxy", 100.0),
    };
    if !bbox.is_proper() {
        warn!("edges_bbox is degenerate: {bbox:?}");
    }
    Some(bbox)
}

/// Column names that carry the LCSC part number in the grouped layout.
const LCSC_COLUMNS: [&str; 3] = ["LCSC", "LCSC PART", "LCSC_PART"];

/// Flatten either `bom` layout into one row per reference.
///
/// Groups come from `both`, or from `F` then `B` when `both` is missing.
/// A group whose first element is a `[ref, id]` pair is indexed; one that
/// starts with the value string is grouped.
fn parse_bom(bom: &Value) -> BomTable {
    let groups: Vec<&Vec<Value>> = match bom.get("both").and_then(Value::as_array) {
        Some(both) => both.iter().filter_map(Value::as_array).collect(),
        None => ["F", "B"]
            .iter()
            .filter_map(|side| bom.get(*side).and_then(Value::as_array))
            .flatten()
            .filter_map(Value::as_array)
            .collect(),
    };

    let grouped = groups
        .iter()
        .any(|group| group.first().is_some_and(|first| !first.is_array()));
    if grouped {
        BomTable {
            layout: BomLayout::Grouped,
            rows: grouped_rows(&groups, bom.get("fields")),
        }
    } else {
        BomTable {
            layout: BomLayout::Indexed,
            rows: indexed_rows(&groups, bom.get("fields")),
        }
    }
}

/// Join `[ref, id]` groups against the `fields` object keyed by footprint id.
///
/// Field 0 is the value, field 1 the package name, and the first later field
/// that looks like an LCSC code is the embedded part number.
fn indexed_rows(groups: &[&Vec<Value>], fields: Option<&Value>) -> Vec<BomRow> {
    let fields = fields.and_then(Value::as_object);
    groups
        .iter()
        .flat_map(|group| group.iter().filter_map(parse_bom_ref))
        .map(|bom_ref| {
            let columns = bom_ref
                .footprint_id
                .and_then(|id| fields?.get(&id.to_string()))
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            BomRow {
                value: columns.first().map(field_str).unwrap_or_default(),
                footprint: columns.get(1).map(field_str).unwrap_or_default(),
                lcsc: columns
                    .iter()
                    .skip(2)
                    .filter_map(Value::as_str)
                    .find(|s| is_lcsc_code(s))
                    .map(str::to_string),
                reference: bom_ref.reference,
                footprint_id: bom_ref.footprint_id,
            }
        })
        .collect()
}

/// Expand `[value, footprint, refs, extra_fields]` groups; `fields` names the
/// extra columns and the LCSC one is found by name.
fn grouped_rows(groups: &[&Vec<Value>], fields: Option<&Value>) -> Vec<BomRow> {
    let lcsc_column = fields.and_then(Value::as_array).and_then(|names| {
        names.iter().position(|name| {
            name.as_str()
                .is_some_and(|n| LCSC_COLUMNS.contains(&n.trim().to_uppercase().as_str()))
        })
    });
    if lcsc_column.is_none() {
        debug!("Grouped BOM has no LCSC column");
    }

    let mut rows = Vec::new();
    for group in groups {
        let Some(refs) = group.get(2).and_then(Value::as_array) else {
            debug!("Skipping BOM group without references");
            continue;
        };
        let value = group.first().map(field_str).unwrap_or_default();
        let footprint = group.get(1).map(field_str).unwrap_or_default();
        let lcsc = lcsc_column
            .and_then(|i| group.get(3)?.as_array()?.get(i))
            .map(field_str)
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty());

        rows.extend(refs.iter().filter_map(parse_bom_ref).map(|bom_ref| BomRow {
            reference: bom_ref.reference,
            footprint_id: bom_ref.footprint_id,
            value: value.clone(),
            footprint: footprint.clone(),
            lcsc: lcsc.clone(),
        }));
    }
    rows
}

/// `[reference, footprint_id]` or a bare reference string; the id may be a
/// number or a numeric string.
fn parse_bom_ref(item: &Value) -> Option<BomRef> {
    if let Some(reference) = item.as_str() {
        return Some(BomRef {
            reference: reference.to_string(),
            footprint_id: None,
        });
    }
    let pair = item.as_array()?;
    let reference = pair.first()?.as_str()?.to_string();
    let footprint_id = match pair.get(1) {
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    Some(BomRef {
        reference,
        footprint_id,
    })
}

fn field_str(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn parse_metadata(meta: Option<&Value>) -> Metadata {
    let field = |key: &str| {
        meta.and_then(|m| str_field(m, key))
            .unwrap_or("")
            .to_string()
    };
    Metadata {
        title: field("title"),
        revision: field("revision"),
        company: field("company"),
        date: field("date"),
    }
}

fn count_tracks(tracks: &Value) -> usize {
    tracks
        .as_object()
        .map(|layers| {
            layers
                .values()
                .filter_map(Value::as_array)
                .map(Vec::len)
                .sum()
        })
        .unwrap_or(0)
}

fn str_field<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key).and_then(Value::as_str)
}

fn num(obj: &Map<String, Value>, key: &str, default: f64) -> f64 {
    obj.get(key).and_then(Value::as_f64).unwrap_or(default)
}

fn point(v: &Value) -> Option<Point> {
    let arr = v.as_array()?;
    Some([arr.first()?.as_f64()?, arr.get(1)?.as_f64()?])
}
