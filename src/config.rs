//! Per-call transcoding options
//!
//! Every core operation takes an explicit [`TranscodeOptions`]; there are no
//! hidden global defaults. Options can be loaded from YAML:
//!
//! ```yaml
//! header_line: 1
//! start_line: 3
//! pivot: false
//! preserve_formulas: true
//! use_display_dates: false
//! ```

use crate::error::{TabulaError, TabulaResult};
use crate::types::Orientation;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranscodeOptions {
    /// 1-based row (normal) or column (pivot) holding the field names
    pub header_line: usize,
    /// First data row (normal) or column (pivot)
    pub start_line: usize,
    /// Records are columns instead of rows
    pub pivot: bool,
    /// Snapshot formulas before a write and replay them afterwards
    pub preserve_formulas: bool,
    /// Decode date cells as their displayed text
    pub use_display_dates: bool,
    /// Read at most this many header positions
    pub field_cap: Option<usize>,
    /// Reject duplicate header names instead of aliasing them
    pub strict_headers: bool,
    /// Suppress warning logs (warnings are still returned in reports)
    pub mute: bool,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            header_line: 1,
            start_line: 2,
            pivot: false,
            preserve_formulas: false,
            use_display_dates: false,
            field_cap: None,
            strict_headers: true,
            mute: false,
        }
    }
}

impl TranscodeOptions {
    pub fn from_yaml_str(yaml: &str) -> TabulaResult<Self> {
        let options: TranscodeOptions = serde_yaml::from_str(yaml)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_file(path: &Path) -> TabulaResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::from_pivot(self.pivot)
    }

    pub fn validate(&self) -> TabulaResult<()> {
        if self.header_line == 0 || self.start_line == 0 {
            return Err(TabulaError::InvalidParameters(format!(
                "header_line and start_line are 1-based (got {} and {})",
                self.header_line, self.start_line
            )));
        }
        if self.field_cap == Some(0) {
            return Err(TabulaError::InvalidParameters(
                "field_cap must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_lines(mut self, header_line: usize, start_line: usize) -> Self {
        self.header_line = header_line;
        self.start_line = start_line;
        self
    }

    pub fn with_pivot(mut self, pivot: bool) -> Self {
        self.pivot = pivot;
        self
    }

    pub fn with_preserve_formulas(mut self, preserve: bool) -> Self {
        self.preserve_formulas = preserve;
        self
    }

    pub fn with_display_dates(mut self, display: bool) -> Self {
        self.use_display_dates = display;
        self
    }

    pub fn with_strict_headers(mut self, strict: bool) -> Self {
        self.strict_headers = strict;
        self
    }

    pub fn with_field_cap(mut self, cap: Option<usize>) -> Self {
        self.field_cap = cap;
        self
    }

    pub fn muted(mut self) -> Self {
        self.mute = true;
        self
    }
}
