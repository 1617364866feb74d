use crate::error::ExtractError;
use crate::lcsc::LcscOverrides;
use crate::model::BoardModel;
use crate::{load_file, load_html, LoadOptions};
use std::path::Path;

/// Holds the most recently loaded board.
///
/// A failed load leaves the previous board in place; a successful one
/// replaces it entirely.
#[derive(Debug, Default)]
pub struct Session {
    model: Option<BoardModel>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> Option<&BoardModel> {
        self.model.as_ref()
    }

    pub fn load_file(&mut self, path: &Path, opts: &LoadOptions) -> Result<&BoardModel, ExtractError> {
        let model = load_file(path, opts)?;
        Ok(self.model.insert(model))
    }

    pub fn load_html(
        &mut self,
        html: &str,
        overrides: LcscOverrides,
    ) -> Result<&BoardModel, ExtractError> {
        let model = load_html(html, overrides)?;
        Ok(self.model.insert(model))
    }

    /// Swap in a new override mapping for the loaded board, if any.
    pub fn set_lcsc_overrides(&mut self, overrides: LcscOverrides) {
        if let Some(model) = self.model.as_mut() {
            model.apply_lcsc_overrides(overrides);
        }
    }

    pub fn clear(&mut self) {
        self.model = None;
    }
}
