use serde::{Deserialize, Serialize};

/// Category of a non-fatal decode finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The fallback rule saw a plausible-looking offset/length pair but read a literal.
    AmbiguousEntry,
    /// A fallback pair was accepted without an image signature in the referenced span.
    LowConfidenceReference,
    /// The `area_num` list stopped short of the configured count.
    AreaCount,
    /// A record's `drawType` is not covered by any explicit rule.
    UnknownField,
    /// A fixed-width text field did not round-trip cleanly to a string.
    LossyText,
    /// Bytes after the last complete layer record.
    TrailingData,
}

/// Non-fatal warning recorded while decoding, attached to a layer record by index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Category.
    pub kind: DiagnosticKind,
    /// Index of the affected layer record, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<usize>,
    /// Index of the affected entry within the record, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<usize>,
    /// Absolute file offset where the finding was made.
    pub offset: usize,
    /// Human-readable detail.
    pub message: String,
}

/// Collected findings for one decode session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Record a finding and mirror it to the log.
    pub fn push(&mut self, diag: Diagnostic) {
        tracing::warn!(
            kind = ?diag.kind,
            layer = ?diag.layer,
            entry = ?diag.entry,
            offset = diag.offset,
            "{}",
            diag.message
        );
        self.items.push(diag);
    }

    /// All findings in discovery order.
    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Findings attached to layer `layer`.
    pub fn for_layer(&self, layer: usize) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.layer == Some(layer))
    }

    /// Findings of a given kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    /// Number of findings.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/diag.rs"]
mod tests;
