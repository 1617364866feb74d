use serde::{Serialize, Serializer};
use serde_json::Value;
use std::f64::consts::PI;

/// Round a float to N decimal places.
pub fn round_f64(v: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (v * factor).round() / factor
}

/// Wrapper that rounds f64 to 6 decimal places on serialization.
pub(crate) fn serialize_f64_rounded<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round_f64(*v, 6))
}

pub type Point = [f64; 2];

// ─── Bounding Box ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub minx: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub miny: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub maxx: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub maxy: f64,
}

impl BBox {
    pub fn empty() -> Self {
        Self {
            minx: f64::INFINITY,
            miny: f64::INFINITY,
            maxx: f64::NEG_INFINITY,
            maxy: f64::NEG_INFINITY,
        }
    }

    /// Board extent used when nothing better is known.
    pub fn default_board() -> Self {
        Self {
            minx: 0.0,
            miny: 0.0,
            maxx: 100.0,
            maxy: 100.0,
        }
    }

    /// Box spanning two corners given in any order.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            minx: x1.min(x2),
            miny: y1.min(y2),
            maxx: x1.max(x2),
            maxy: y1.max(y2),
        }
    }

    pub fn expand_point(&mut self, x: f64, y: f64) {
        self.minx = self.minx.min(x);
        self.miny = self.miny.min(y);
        self.maxx = self.maxx.max(x);
        self.maxy = self.maxy.max(y);
    }

    pub fn is_empty(&self) -> bool {
        self.minx == f64::INFINITY
    }

    /// Finite with positive width and height.
    pub fn is_proper(&self) -> bool {
        [self.minx, self.miny, self.maxx, self.maxy]
            .iter()
            .all(|v| v.is_finite())
            && self.maxx > self.minx
            && self.maxy > self.miny
    }

    pub fn center(&self) -> Point {
        [(self.minx + self.maxx) / 2.0, (self.miny + self.maxy) / 2.0]
    }

    /// Closed containment: points on the edge are inside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.minx && x <= self.maxx && y >= self.miny && y <= self.maxy
    }

    pub fn grow(&self, margin: f64) -> Self {
        Self {
            minx: self.minx - margin,
            miny: self.miny - margin,
            maxx: self.maxx + margin,
            maxy: self.maxy + margin,
        }
    }
}

// ─── Side helper ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Side {
    #[serde(rename = "F")]
    Front,
    #[serde(rename = "B")]
    Back,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Front => "F",
            Side::Back => "B",
        }
    }

    /// Anything other than "B" is treated as the front.
    pub fn from_layer(layer: &str) -> Self {
        if layer.eq_ignore_ascii_case("B") {
            Side::Back
        } else {
            Side::Front
        }
    }
}

// ─── Footprint ───────────────────────────────────────────────────────

/// The two shapes ibom uses for a footprint's bounding box.
#[derive(Debug, Clone, PartialEq)]
pub enum FootprintBBox {
    /// Box of `size` at `pos + relpos`, rotated by `angle` degrees about `pos`.
    Oriented {
        pos: Point,
        relpos: Point,
        size: Point,
        angle: f64,
    },
    /// Plain axis-aligned extents.
    Extents(BBox),
}

impl FootprintBBox {
    /// Axis-aligned extents of the box.
    pub fn extents(&self) -> BBox {
        match self {
            FootprintBBox::Oriented {
                pos,
                relpos,
                size,
                angle,
            } => {
                let mut bbox = BBox::empty();
                for (dx, dy) in [(0.0, 0.0), (size[0], 0.0), (0.0, size[1]), (size[0], size[1])] {
                    let (x, y) =
                        rotate_and_translate(relpos[0] + dx, relpos[1] + dy, pos[0], pos[1], *angle);
                    bbox.expand_point(x, y);
                }
                bbox
            }
            FootprintBBox::Extents(bbox) => *bbox,
        }
    }
}

/// One placed component instance, whichever schema it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub ref_: String,
    /// Index into `footprints[]`; legacy `modules` entries have none.
    pub id: Option<usize>,
    pub layer: Side,
    pub center: Option<Point>,
    pub bbox: Option<FootprintBBox>,
    /// Pad positions; shape and rotation only matter for rendering.
    pub pads: Vec<Point>,
}

impl Footprint {
    /// Representative point: bbox origin, then center, then the box midpoint,
    /// then the mean pad position, else the origin.
    pub fn anchor(&self) -> Point {
        if let Some(FootprintBBox::Oriented { pos, .. }) = &self.bbox {
            return *pos;
        }
        if let Some(center) = self.center {
            return center;
        }
        if let Some(FootprintBBox::Extents(bbox)) = &self.bbox {
            return bbox.center();
        }
        if !self.pads.is_empty() {
            let n = self.pads.len() as f64;
            let sx: f64 = self.pads.iter().map(|p| p[0]).sum();
            let sy: f64 = self.pads.iter().map(|p| p[1]).sum();
            return [sx / n, sy / n];
        }
        [0.0, 0.0]
    }
}

// ─── Metadata ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub title: String,
    pub revision: String,
    pub company: String,
    pub date: String,
}

// ─── BOM data ────────────────────────────────────────────────────────

/// BOM ref entry: reference designator and, when present, footprint index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BomRef {
    pub reference: String,
    pub footprint_id: Option<usize>,
}

/// Which `bom` layout the export used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BomLayout {
    /// Groups of `[ref, id]` pairs; `fields` maps footprint id to columns.
    Indexed,
    /// Groups of `[value, footprint, refs, extra_fields]`; `fields` names
    /// the extra columns.
    Grouped,
}

/// One BOM line per reference, before LCSC overrides are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BomRow {
    pub reference: String,
    pub footprint_id: Option<usize>,
    pub value: String,
    pub footprint: String,
    /// LCSC code carried by the export itself.
    pub lcsc: Option<String>,
}

/// The `bom` table, flattened to one row per reference.
#[derive(Debug, Clone, PartialEq)]
pub struct BomTable {
    pub layout: BomLayout,
    pub rows: Vec<BomRow>,
}

// ─── Top-level document ──────────────────────────────────────────────

/// Which footprint layout the document used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// `footprints[]`, indexed by footprint id.
    Footprints,
    /// `modules.F` / `modules.B`, keyed by reference only.
    Modules,
    /// Both layouts present; both contribute.
    Mixed,
    /// Neither layout present.
    Empty,
}

/// Parsed pcbdata. Rendering-only data (edges, tracks, drawings) is kept as
/// raw JSON for whoever draws the board.
#[derive(Debug, Clone, PartialEq)]
pub struct PcbDocument {
    pub schema: Schema,
    pub edges_bbox: Option<BBox>,
    pub footprints: Vec<Footprint>,
    pub bom: Option<BomTable>,
    pub metadata: Metadata,
    pub ibom_version: Option<String>,
    pub edges: Vec<Value>,
    pub tracks: Value,
    pub drawings: Value,
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Rotate point (lx, ly) by angle degrees and translate to (tx, ty).
pub fn rotate_and_translate(lx: f64, ly: f64, tx: f64, ty: f64, angle_deg: f64) -> (f64, f64) {
    if angle_deg == 0.0 {
        return (lx + tx, ly + ty);
    }
    let angle_rad = -angle_deg * PI / 180.0;
    let cos_a = angle_rad.cos();
    let sin_a = angle_rad.sin();
    let rx = lx * cos_a - ly * sin_a;
    let ry = lx * sin_a + ly * cos_a;
    (rx + tx, ry + ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn footprint() -> Footprint {
        Footprint {
            ref_: "R1".to_string(),
            id: Some(0),
            layer: Side::Front,
            center: None,
            bbox: None,
            pads: vec![],
        }
    }

    #[test]
    fn test_anchor_prefers_bbox_pos() {
        let fp = Footprint {
            center: Some([1.0, 1.0]),
            bbox: Some(FootprintBBox::Oriented {
                pos: [3.0, 4.0],
                relpos: [-1.0, -1.0],
                size: [2.0, 2.0],
                angle: 0.0,
            }),
            pads: vec![[9.0, 9.0]],
            ..footprint()
        };
        assert_eq!(fp.anchor(), [3.0, 4.0]);
    }

    #[test]
    fn test_anchor_center_before_extents() {
        let fp = Footprint {
            center: Some([1.0, 2.0]),
            bbox: Some(FootprintBBox::Extents(BBox::from_corners(10.0, 10.0, 20.0, 20.0))),
            ..footprint()
        };
        assert_eq!(fp.anchor(), [1.0, 2.0]);

        let fp = Footprint {
            center: None,
            ..fp
        };
        assert_eq!(fp.anchor(), [15.0, 15.0]);
    }

    #[test]
    fn test_anchor_pad_mean_then_origin() {
        let fp = Footprint {
            pads: vec![[0.0, 0.0], [4.0, 2.0], [2.0, 4.0]],
            ..footprint()
        };
        assert_eq!(fp.anchor(), [2.0, 2.0]);
        assert_eq!(footprint().anchor(), [0.0, 0.0]);
    }

    #[test]
    fn test_oriented_extents() {
        let bbox = FootprintBBox::Oriented {
            pos: [10.0, 10.0],
            relpos: [-1.0, -0.5],
            size: [2.0, 1.0],
            angle: 0.0,
        };
        assert_eq!(bbox.extents(), BBox::from_corners(9.0, 9.5, 11.0, 10.5));

        let rotated = FootprintBBox::Oriented {
            pos: [20.0, 10.0],
            relpos: [-1.0, -0.5],
            size: [2.0, 1.0],
            angle: 90.0,
        };
        let ext = rotated.extents();
        assert_abs_diff_eq!(ext.minx, 19.5, epsilon = 1e-9);
        assert_abs_diff_eq!(ext.maxx, 20.5, epsilon = 1e-9);
        assert_abs_diff_eq!(ext.miny, 9.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ext.maxy, 11.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bbox_contains_edges() {
        let bbox = BBox::from_corners(5.0, 5.0, 0.0, 0.0);
        assert!(bbox.contains(0.0, 0.0));
        assert!(bbox.contains(5.0, 2.5));
        assert!(!bbox.contains(5.000001, 2.5));
    }

    #[test]
    fn test_bbox_proper() {
        assert!(BBox::default_board().is_proper());
        assert!(!BBox::from_corners(1.0, 1.0, 1.0, 5.0).is_proper());
        assert!(!BBox::empty().is_proper());
    }

    #[test]
    fn test_side_from_layer() {
        assert_eq!(Side::from_layer("B"), Side::Back);
        assert_eq!(Side::from_layer("F"), Side::Front);
        assert_eq!(Side::from_layer(""), Side::Front);
        assert_eq!(Side::Back.as_str(), "B");
    }

    #[test]
    fn test_round_f64() {
        assert_eq!(round_f64(1.23456789, 6), 1.234568);
    }
}
