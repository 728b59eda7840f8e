#![forbid(unsafe_code)]

//! Rows of the shared aligned row space.
//!
//! Every pane holds one [`Row`] per row of the engine. A row is either a
//! content line or an explicit [`Row::Spacer`] meaning "this pane has no
//! line here".

use std::rc::Rc;

/// One logical line of a pane.
///
/// `text` is the committed content as read from the source (absent for lines
/// the user typed into a spacer row). `edit` is an uncommitted in-memory
/// replacement. `line_number` is the line's position in the source it was
/// read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    text: Option<Rc<str>>,
    edit: Option<Rc<str>>,
    line_number: Option<usize>,
}

impl Line {
    /// A line read from a source at `line_number`.
    #[must_use]
    pub fn new(text: impl Into<Rc<str>>, line_number: usize) -> Self {
        Self {
            text: Some(text.into()),
            edit: None,
            line_number: Some(line_number),
        }
    }

    /// A line with no committed text, carrying only an edit overlay.
    #[must_use]
    pub fn synthesized(edit: impl Into<Rc<str>>) -> Self {
        Self {
            text: None,
            edit: Some(edit.into()),
            line_number: None,
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    #[must_use]
    pub fn edit(&self) -> Option<&str> {
        self.edit.as_deref()
    }

    #[must_use]
    pub fn line_number(&self) -> Option<usize> {
        self.line_number
    }

    /// True when an uncommitted overlay is present.
    #[must_use]
    pub fn is_edited(&self) -> bool {
        self.edit.is_some()
    }

    /// The string shown and compared: the edit, else the text, else "".
    #[must_use]
    pub fn display(&self) -> &str {
        self.edit
            .as_deref()
            .or(self.text.as_deref())
            .unwrap_or_default()
    }

    /// The committed string, ignoring any edit overlay.
    #[must_use]
    pub fn committed(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// Copy of this line with its overlay replaced.
    #[must_use]
    pub fn with_edit(&self, edit: Option<Rc<str>>) -> Self {
        Self {
            text: self.text.clone(),
            edit,
            line_number: self.line_number,
        }
    }
}

/// One pane's entry at one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Content(Line),
    Spacer,
}

impl Row {
    /// Shorthand for a content row read from a source.
    #[must_use]
    pub fn line(text: impl Into<Rc<str>>, line_number: usize) -> Self {
        Self::Content(Line::new(text, line_number))
    }

    #[must_use]
    pub fn is_spacer(&self) -> bool {
        matches!(self, Self::Spacer)
    }

    #[must_use]
    pub fn is_content(&self) -> bool {
        matches!(self, Self::Content(_))
    }

    #[must_use]
    pub fn as_line(&self) -> Option<&Line> {
        match self {
            Self::Content(line) => Some(line),
            Self::Spacer => None,
        }
    }

    /// Display string; "" for spacers.
    #[must_use]
    pub fn display(&self) -> &str {
        self.as_line().map_or("", Line::display)
    }

    /// Committed string; "" for spacers.
    #[must_use]
    pub fn committed(&self) -> &str {
        self.as_line().map_or("", Line::committed)
    }
}

/// `n` spacer rows.
pub(crate) fn spacers(n: usize) -> impl Iterator<Item = Row> {
    std::iter::repeat_n(Row::Spacer, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefers_edit_then_text() {
        let line = Line::new("abc", 3);
        assert_eq!(line.display(), "abc");
        assert_eq!(line.committed(), "abc");

        let edited = line.with_edit(Some(Rc::from("xyz")));
        assert_eq!(edited.display(), "xyz");
        assert_eq!(edited.committed(), "abc");
        assert_eq!(edited.line_number(), Some(3));
        assert!(edited.is_edited());
    }

    #[test]
    fn synthesized_line_has_no_committed_text() {
        let line = Line::synthesized("typed");
        assert_eq!(line.text(), None);
        assert_eq!(line.display(), "typed");
        assert_eq!(line.committed(), "");
        assert_eq!(line.line_number(), None);
    }

    #[test]
    fn spacer_strings_are_empty() {
        assert_eq!(Row::Spacer.display(), "");
        assert_eq!(Row::Spacer.committed(), "");
        assert!(Row::Spacer.is_spacer());
        assert!(Row::line("a", 0).is_content());
        assert_eq!(spacers(3).count(), 3);
    }
}
