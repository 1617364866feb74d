use crate::model::Component;
use crate::types::BBox;

/// Selection rectangle. Corners may be given in any order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect(BBox);

impl SelectionRect {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self(BBox::from_corners(x1, y1, x2, y2))
    }

    pub fn bounds(&self) -> BBox {
        self.0
    }

    pub fn contains(&self, component: &Component) -> bool {
        self.0.contains(component.x, component.y)
    }
}

impl std::str::FromStr for SelectionRect {
    type Err = String;

    /// Parse `x1,y1,x2,y2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coords = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid coordinate in {s:?}: {e}"))?;
        match coords.as_slice() {
            [x1, y1, x2, y2] => Ok(Self::new(*x1, *y1, *x2, *y2)),
            _ => Err(format!("expected x1,y1,x2,y2, got {s:?}")),
        }
    }
}

/// Components whose representative point lies inside `rect`, edges included.
/// A linear scan; result order follows the input.
pub fn select<'a>(components: &'a [Component], rect: &SelectionRect) -> Vec<&'a Component> {
    components.iter().filter(|c| rect.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    fn grid() -> Vec<Component> {
        let mut comps = Vec::new();
        for x in 0..=4 {
            for y in 0..=4 {
                comps.push(Component {
                    reference: format!("U{x}{y}"),
                    x: f64::from(x) * 10.0,
                    y: f64::from(y) * 10.0,
                    layer: Side::Front,
                    bbox: None,
                    value: String::new(),
                    footprint: String::new(),
                    lcsc: String::new(),
                    footprint_id: None,
                });
            }
        }
        comps
    }

    fn refs(selected: &[&Component]) -> Vec<String> {
        let mut refs: Vec<String> = selected.iter().map(|c| c.reference.clone()).collect();
        refs.sort();
        refs
    }

    #[test]
    fn test_select_inclusive_edges() {
        let comps = grid();
        let selected = select(&comps, &SelectionRect::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(refs(&selected), vec!["U11", "U12", "U21", "U22"]);
    }

    #[test]
    fn test_select_corner_order_irrelevant() {
        let comps = grid();
        let a = select(&comps, &SelectionRect::new(35.0, 5.0, 15.0, 25.0));
        let b = select(&comps, &SelectionRect::new(15.0, 25.0, 35.0, 5.0));
        assert_eq!(refs(&a), refs(&b));
        assert_eq!(refs(&a), vec!["U21", "U22", "U31", "U32"]);
    }

    #[test]
    fn test_select_degenerate_rect() {
        let comps = grid();
        // A zero-area rectangle on a grid line still catches points on it.
        let selected = select(&comps, &SelectionRect::new(0.0, 0.0, 0.0, 40.0));
        assert_eq!(selected.len(), 5);
        assert!(select(&comps, &SelectionRect::new(1.0, 1.0, 9.0, 9.0)).is_empty());
    }

    #[test]
    fn test_parse_rect() {
        let rect: SelectionRect = "10, 20,0,5".parse().unwrap();
        assert_eq!(rect.bounds(), BBox::from_corners(0.0, 5.0, 10.0, 20.0));
        assert!("1,2,3".parse::<SelectionRect>().is_err());
        assert!("1,2,x,4".parse::<SelectionRect>().is_err());
    }
}
