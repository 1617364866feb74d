use crate::lcsc::LcscOverrides;
use crate::model::Component;
use crate::types::*;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static OHM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s*ohm\s*").unwrap());

/// One BOM row for a single reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BomEntry {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footprint_id: Option<usize>,
    pub value: String,
    pub footprint: String,
    pub lcsc: String,
}

/// Turn the exported BOM rows into entries, filling missing LCSC codes from
/// `overrides`. Rows with no data still produce an (empty) entry.
pub fn build_bom(table: &BomTable, overrides: &LcscOverrides) -> Vec<BomEntry> {
    table
        .rows
        .iter()
        .map(|row| BomEntry {
            reference: row.reference.clone(),
            footprint_id: row.footprint_id,
            value: row.value.clone(),
            footprint: row.footprint.clone(),
            lcsc: resolve_lcsc(row.lcsc.as_deref(), &row.reference, overrides),
        })
        .collect()
}

/// Embedded code if present, else the override for the reference, else empty.
pub fn resolve_lcsc(embedded: Option<&str>, reference: &str, overrides: &LcscOverrides) -> String {
    embedded
        .filter(|code| !code.is_empty())
        .or_else(|| overrides.get(reference))
        .unwrap_or("")
        .to_string()
}

/// "C" followed by one or more digits.
pub fn is_lcsc_code(s: &str) -> bool {
    s.strip_prefix('C')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

// ─── Grouping ────────────────────────────────────────────────────────

/// Components sharing a value, footprint and LCSC code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentGroup {
    pub quantity: usize,
    pub references: Vec<String>,
    pub value: String,
    pub footprint: String,
    pub lcsc: String,
}

/// Group components into BOM rows keyed by (normalized value, footprint, LCSC).
///
/// Rows are ordered by their first reference, and references within a row
/// in natural order (R2 before R10).
pub fn group_components<'a, I>(components: I) -> Vec<ComponentGroup>
where
    I: IntoIterator<Item = &'a Component>,
{
    let mut groups: Vec<(String, ComponentGroup)> = Vec::new();

    for comp in components {
        let key_val = normalize_value(&comp.value);
        if let Some((_, group)) = groups.iter_mut().find(|(v, g)| {
            v == &key_val && g.footprint == comp.footprint && g.lcsc == comp.lcsc
        }) {
            group.references.push(comp.reference.clone());
        } else {
            groups.push((
                key_val,
                ComponentGroup {
                    quantity: 0,
                    references: vec![comp.reference.clone()],
                    value: comp.value.clone(),
                    footprint: comp.footprint.clone(),
                    lcsc: comp.lcsc.clone(),
                },
            ));
        }
    }

    let mut rows: Vec<ComponentGroup> = groups
        .into_iter()
        .map(|(_, mut group)| {
            group
                .references
                .sort_by(|a, b| natural_sort_key(a).cmp(&natural_sort_key(b)));
            group.quantity = group.references.len();
            group
        })
        .collect();
    rows.sort_by(|a, b| natural_sort_key(&a.references[0]).cmp(&natural_sort_key(&b.references[0])));
    rows
}

/// Canonical spelling of a component value so "4R7", "4.7 Ω" and "4.7ohm" group together.
pub fn normalize_value(value: &str) -> String {
    let stripped = value.trim().replace(['\u{3a9}', '\u{2126}'], "");
    let mut normalized: String = OHM_RE.replace_all(&stripped, "").split_whitespace().collect();

    let bytes = normalized.as_bytes();
    if let Some(r) = bytes.iter().position(|b| b.eq_ignore_ascii_case(&b'r')) {
        let (digits, rest) = (&normalized[..r], &normalized[r + 1..]);
        let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if is_digits(digits) && rest.is_empty() {
            normalized = digits.to_string();
        } else if is_digits(digits) && is_digits(rest) {
            normalized = format!("{digits}.{rest}");
        }
    }

    normalized.replace('K', "k")
}

/// Natural sort key: split into (prefix, number) for sorting like R1, R2, R10.
fn natural_sort_key(s: &str) -> (String, u64) {
    let prefix_end = s
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let prefix = s[..prefix_end].to_string();
    let num: u64 = s[prefix_end..].parse().unwrap_or(0);
    (prefix, num)
}
