//! The edit-script data model: [`Op`], [`Edit`], [`EditScript`],
//! [`Patch`], [`PatchList`], and the derived quantities computed over a
//! script (`text1`, `text2`, `levenshtein`, `x_index`).

/// One of the three edit operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equal,
    Insert,
    Delete,
}

/// A single edit: an operation paired with the text it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub op: Op,
    pub text: String,
}

impl Edit {
    pub fn equal(text: impl Into<String>) -> Self {
        Self { op: Op::Equal, text: text.into() }
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Self { op: Op::Insert, text: text.into() }
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self { op: Op::Delete, text: text.into() }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// An ordered sequence of edits transforming one text into another.
///
/// After normalization no two adjacent edits share an `op`, and empty-text
/// edits are dropped except transiently inside a cleanup pass.
pub type EditScript = Vec<Edit>;

/// A localized edit script with context and source/result offsets.
///
/// Character offsets, not byte offsets: `start1`/`start2` and `length1`/
/// `length2` all count `char`s, matching the character-level contract the
/// whole engine operates under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub edits: EditScript,
    pub start1: usize,
    pub start2: usize,
    pub length1: usize,
    pub length2: usize,
}

impl Patch {
    pub fn empty() -> Self {
        Self { edits: Vec::new(), start1: 0, start2: 0, length1: 0, length2: 0 }
    }
}

/// An ordered sequence of patches, scan-order matching the underlying diff.
pub type PatchList = Vec<Patch>;

/// Derived quantities over an [`EditScript`]: `text1`, `text2`,
/// `levenshtein`, and `x_index`.
pub trait EditScriptExt {
    /// Concatenation of `text` over edits with `op ∈ {Equal, Delete}`.
    fn text1(&self) -> String;
    /// Concatenation of `text` over edits with `op ∈ {Equal, Insert}`.
    fn text2(&self) -> String;
    /// Sum over maximal non-equal runs of `max(inserted_chars, deleted_chars)`.
    fn levenshtein(&self) -> usize;
    /// Translate a character offset in `text1` to the equivalent offset in
    /// `text2`. An offset inside a deletion maps to the position just after
    /// the deletion.
    fn x_index(&self, loc: usize) -> usize;
}

impl EditScriptExt for [Edit] {
    fn text1(&self) -> String {
        let mut out = String::new();
        for edit in self {
            if edit.op != Op::Insert {
                out.push_str(&edit.text);
            }
        }
        out
    }

    fn text2(&self) -> String {
        let mut out = String::new();
        for edit in self {
            if edit.op != Op::Delete {
                out.push_str(&edit.text);
            }
        }
        out
    }

    fn levenshtein(&self) -> usize {
        let mut total = 0usize;
        let mut inserted = 0usize;
        let mut deleted = 0usize;
        for edit in self {
            match edit.op {
                Op::Insert => inserted += edit.char_len(),
                Op::Delete => deleted += edit.char_len(),
                Op::Equal => {
                    total += inserted.max(deleted);
                    inserted = 0;
                    deleted = 0;
                }
            }
        }
        total + inserted.max(deleted)
    }

    fn x_index(&self, loc: usize) -> usize {
        let mut chars1 = 0usize;
        let mut chars2 = 0usize;
        let mut last_chars1 = 0usize;
        let mut last_chars2 = 0usize;
        let mut last_edit: Option<&Edit> = None;

        for edit in self {
            if edit.op != Op::Insert {
                last_chars1 = chars1;
                chars1 += edit.char_len();
            }
            if edit.op != Op::Delete {
                last_chars2 = chars2;
                chars2 += edit.char_len();
            }
            if chars1 > loc {
                last_edit = Some(edit);
                break;
            }
            last_chars1 = chars1;
            last_chars2 = chars2;
        }

        if let Some(edit) = last_edit {
            if edit.op == Op::Delete {
                // Inside (or just past) a deletion: snap to right after it.
                return last_chars2;
            }
        }
        loc - last_chars1 + last_chars2
    }
}
