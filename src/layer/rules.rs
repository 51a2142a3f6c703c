//! Entry decision list.
//!
//! The shape of entry `idx` in a record is decided by the first row of
//! [`RULES`] whose conditions hold, falling back to [`FALLBACK_RULE`]. Adding
//! a new `drawType`/`dataType` combination means adding a row here.

/// Which entry indices a rule applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexMatch {
    /// Every index.
    Any,
    /// `idx < n`.
    Below(usize),
    /// `idx >= n`.
    AtLeast(usize),
    /// One of the listed indices.
    OneOf(&'static [usize]),
}

impl IndexMatch {
    fn matches(self, idx: usize) -> bool {
        match self {
            Self::Any => true,
            Self::Below(n) => idx < n,
            Self::AtLeast(n) => idx >= n,
            Self::OneOf(set) => set.contains(&idx),
        }
    }
}

/// What a matched entry looks like on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryShape {
    /// `x_off`, `y_off`, `offset`, `length`.
    Pointer,
    /// One i32.
    Literal,
    /// 30-byte NUL-padded text.
    FixedText,
    /// `offset`, `length`; always an image reference.
    ImagePair,
    /// `offset` plus a speculative `length`, read as a reference only if it
    /// looks like one.
    Heuristic,
}

/// One row of the decision list. `None` conditions match anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryRule {
    /// Short name used in logs.
    pub name: &'static str,
    /// Matching `drawType` values.
    pub draw_types: Option<&'static [i32]>,
    /// Matching `dataType` values.
    pub data_types: Option<&'static [i32]>,
    /// Matching entry indices.
    pub index: IndexMatch,
    /// Resulting shape.
    pub shape: EntryShape,
}

impl EntryRule {
    /// Whether this row applies to entry `idx` of a record.
    pub fn matches(&self, draw_type: i32, data_type: i32, idx: usize) -> bool {
        self.draw_types.is_none_or(|set| set.contains(&draw_type))
            && self.data_types.is_none_or(|set| set.contains(&data_type))
            && self.index.matches(idx)
    }
}

const POINTER_DRAW_TYPES: &[i32] = &[10, 15, 21];
const DIGIT_DRAW_TYPES: &[i32] = &[71, 72, 73, 74, 75, 76];

/// Explicit rows, in precedence order.
pub const RULES: &[EntryRule] = &[
    EntryRule {
        name: "pointer",
        draw_types: Some(POINTER_DRAW_TYPES),
        data_types: None,
        index: IndexMatch::Any,
        shape: EntryShape::Pointer,
    },
    EntryRule {
        name: "draw100-params",
        draw_types: Some(&[100]),
        data_types: None,
        index: IndexMatch::Below(7),
        shape: EntryShape::Literal,
    },
    EntryRule {
        name: "draw100-images",
        draw_types: Some(&[100]),
        data_types: None,
        index: IndexMatch::AtLeast(7),
        shape: EntryShape::ImagePair,
    },
    EntryRule {
        name: "digit-spacing",
        draw_types: Some(DIGIT_DRAW_TYPES),
        data_types: None,
        index: IndexMatch::OneOf(&[0, 1]),
        shape: EntryShape::Literal,
    },
    EntryRule {
        name: "digit-images",
        draw_types: Some(DIGIT_DRAW_TYPES),
        data_types: None,
        index: IndexMatch::AtLeast(2),
        shape: EntryShape::ImagePair,
    },
    EntryRule {
        name: "draw55-text",
        draw_types: Some(&[55]),
        data_types: None,
        index: IndexMatch::OneOf(&[2]),
        shape: EntryShape::FixedText,
    },
    EntryRule {
        name: "data64-params",
        draw_types: None,
        data_types: Some(&[64, 65, 66, 67]),
        index: IndexMatch::OneOf(&[10, 11]),
        shape: EntryShape::Literal,
    },
    EntryRule {
        name: "draw8-params",
        draw_types: Some(&[8]),
        data_types: None,
        index: IndexMatch::OneOf(&[0, 1, 2]),
        shape: EntryShape::Literal,
    },
];

/// Row used when nothing in [`RULES`] matches.
pub const FALLBACK_RULE: EntryRule = EntryRule {
    name: "fallback",
    draw_types: None,
    data_types: None,
    index: IndexMatch::Any,
    shape: EntryShape::Heuristic,
};

/// First matching row for entry `idx`.
pub fn select(draw_type: i32, data_type: i32, idx: usize) -> &'static EntryRule {
    RULES
        .iter()
        .find(|rule| rule.matches(draw_type, data_type, idx))
        .unwrap_or(&FALLBACK_RULE)
}

/// Whether any explicit row names `draw_type`.
pub fn draw_type_is_known(draw_type: i32) -> bool {
    RULES
        .iter()
        .any(|rule| rule.draw_types.is_some_and(|set| set.contains(&draw_type)))
}

#[cfg(test)]
#[path = "../../tests/unit/layer/rules.rs"]
mod tests;
