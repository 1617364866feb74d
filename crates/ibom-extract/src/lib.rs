pub mod bom;
pub mod document;
pub mod error;
pub mod html;
pub mod lcsc;
pub mod lzstring;
pub mod model;
pub mod select;
pub mod session;
pub mod types;

use error::ExtractError;
use lcsc::LcscOverrides;
use log::info;
use model::BoardModel;
use std::path::{Path, PathBuf};
use types::PcbDocument;

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Override CSV to merge LCSC codes from.
    pub lcsc_csv: Option<PathBuf>,
    /// Look for `BOM-lcsc.csv` near the HTML when no CSV is given.
    pub discover_lcsc: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            lcsc_csv: None,
            discover_lcsc: true,
        }
    }
}

/// Read an ibom HTML export and build the board model.
pub fn load_file(path: &Path, opts: &LoadOptions) -> Result<BoardModel, ExtractError> {
    let html = std::fs::read_to_string(path)?;
    let csv = opts.lcsc_csv.clone().or_else(|| {
        opts.discover_lcsc
            .then(|| LcscOverrides::discover(path))
            .flatten()
    });
    let overrides = csv.map(|p| LcscOverrides::load(&p)).unwrap_or_default();
    let model = load_html(&html, overrides)?;
    info!(
        "Loaded {}: {} components, {} BOM rows",
        path.display(),
        model.components().len(),
        model.bom().len()
    );
    Ok(model)
}

/// Build the board model from HTML text already in memory.
pub fn load_html(html: &str, overrides: LcscOverrides) -> Result<BoardModel, ExtractError> {
    let root = html::parse_pcbdata(html)?;
    let document = PcbDocument::from_value(&root);
    Ok(BoardModel::new(document, overrides))
}
