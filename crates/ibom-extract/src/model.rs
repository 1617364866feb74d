use crate::bom::{build_bom, BomEntry};
use crate::lcsc::LcscOverrides;
use crate::select::{select, SelectionRect};
use crate::types::*;
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Margin added around the component cloud when the board outline is unknown.
pub const BOARD_MARGIN: f64 = 5.0;

/// A placed component with its BOM data merged in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub x: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub y: f64,
    pub layer: Side,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
    pub value: String,
    pub footprint: String,
    pub lcsc: String,
    #[serde(skip)]
    pub footprint_id: Option<usize>,
}

/// Lookup tables over the BOM rows. Duplicate keys resolve to the last row.
#[derive(Debug, Clone, Default)]
struct BomIndex {
    by_pair: HashMap<(String, usize), usize>,
    by_ref: HashMap<String, usize>,
    by_id: HashMap<usize, usize>,
}

impl BomIndex {
    fn new(entries: &[BomEntry]) -> Self {
        let mut index = Self::default();
        for (i, entry) in entries.iter().enumerate() {
            if index.by_ref.insert(entry.reference.clone(), i).is_some() {
                warn!("Duplicate reference {} in BOM, keeping the last row", entry.reference);
            }
            if let Some(id) = entry.footprint_id {
                index.by_pair.insert((entry.reference.clone(), id), i);
                index.by_id.insert(id, i);
            }
        }
        index
    }

    fn find(&self, reference: &str, footprint_id: Option<usize>) -> Option<usize> {
        footprint_id
            .and_then(|id| self.by_pair.get(&(reference.to_string(), id)))
            .or_else(|| self.by_ref.get(reference))
            .or_else(|| footprint_id.and_then(|id| self.by_id.get(&id)))
            .copied()
    }
}

/// The canonical board: parsed document, merged components and BOM, and the
/// board extent. Built wholesale from a document; never patched in place.
#[derive(Debug, Clone)]
pub struct BoardModel {
    document: Arc<PcbDocument>,
    components: Vec<Component>,
    bom: Vec<BomEntry>,
    bom_index: BomIndex,
    board_bbox: BBox,
    overrides: LcscOverrides,
}

impl BoardModel {
    pub fn new(document: PcbDocument, overrides: LcscOverrides) -> Self {
        Self::build(Arc::new(document), overrides)
    }

    fn build(document: Arc<PcbDocument>, overrides: LcscOverrides) -> Self {
        let bom = document
            .bom
            .as_ref()
            .map(|table| build_bom(table, &overrides))
            .unwrap_or_default();
        let bom_index = BomIndex::new(&bom);

        let components: Vec<Component> = document
            .footprints
            .iter()
            .map(|fp| {
                let [x, y] = fp.anchor();
                let entry = bom_index.find(&fp.ref_, fp.id).map(|i| &bom[i]);
                if entry.is_none() {
                    debug!("No BOM row for {}", fp.ref_);
                }
                Component {
                    reference: fp.ref_.clone(),
                    x,
                    y,
                    layer: fp.layer,
                    bbox: fp.bbox.as_ref().map(FootprintBBox::extents),
                    value: entry.map(|e| e.value.clone()).unwrap_or_default(),
                    footprint: entry.map(|e| e.footprint.clone()).unwrap_or_default(),
                    lcsc: entry
                        .map(|e| e.lcsc.clone())
                        .unwrap_or_else(|| overrides.get(&fp.ref_).unwrap_or("").to_string()),
                    footprint_id: fp.id,
                }
            })
            .collect();

        let board_bbox = board_bbox(document.edges_bbox.as_ref(), &components);

        Self {
            document,
            components,
            bom,
            bom_index,
            board_bbox,
            overrides,
        }
    }

    /// Re-merge a new override mapping without re-parsing the document.
    pub fn apply_lcsc_overrides(&mut self, overrides: LcscOverrides) {
        *self = Self::build(Arc::clone(&self.document), overrides);
    }

    pub fn document(&self) -> &PcbDocument {
        &self.document
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn bom(&self) -> &[BomEntry] {
        &self.bom
    }

    pub fn board_bbox(&self) -> BBox {
        self.board_bbox
    }

    pub fn lcsc_overrides(&self) -> &LcscOverrides {
        &self.overrides
    }

    /// BOM row for a reference, preferring an exact footprint id match.
    pub fn bom_for(&self, reference: &str, footprint_id: Option<usize>) -> Option<&BomEntry> {
        self.bom_index
            .find(reference, footprint_id)
            .map(|i| &self.bom[i])
    }

    /// Components whose representative point lies in the rectangle (edges included).
    pub fn select(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> Vec<&Component> {
        select(&self.components, &SelectionRect::new(x1, y1, x2, y2))
    }

    /// Like [`select`](Self::select), restricted to one side of the board.
    pub fn select_on(&self, rect: &SelectionRect, side: Side) -> Vec<&Component> {
        select(&self.components, rect)
            .into_iter()
            .filter(|c| c.layer == side)
            .collect()
    }
}

/// Board extent: the exported outline box when usable, else the component
/// points plus [`BOARD_MARGIN`], else a 100×100 default.
pub fn board_bbox(edges_bbox: Option<&BBox>, components: &[Component]) -> BBox {
    if let Some(bbox) = edges_bbox.filter(|b| b.is_proper()) {
        return *bbox;
    }
    let mut bbox = BBox::empty();
    for comp in components {
        bbox.expand_point(comp.x, comp.y);
    }
    if bbox.is_empty() {
        return BBox::default_board();
    }
    let bbox = bbox.grow(BOARD_MARGIN);
    if bbox.is_proper() {
        bbox
    } else {
        BBox::default_board()
    }
}
