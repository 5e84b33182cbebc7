use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::images::image_fragment;
use crate::domain::error::DomainError;

/// A `(start, end)` range in UTF-16 code units, as a browser textarea reports
/// `selectionStart`/`selectionEnd`, always normalised so that `start <= end`.
/// An empty selection is a caret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    start: usize,
    end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn caret(position: usize) -> Self {
        Self::new(position, position)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    fn clamped(self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }
}

/// Markdown constructs offered by the editor toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkdownSyntax {
    Bold,
    Italic,
    #[serde(rename = "h2")]
    Heading2,
    #[serde(rename = "h3")]
    Heading3,
    Link,
    #[serde(rename = "list")]
    ListItem,
    #[serde(rename = "code")]
    InlineCode,
    #[serde(rename = "codeblock")]
    CodeBlock,
    Image,
}

impl MarkdownSyntax {
    pub const ALL: [MarkdownSyntax; 9] = [
        MarkdownSyntax::Bold,
        MarkdownSyntax::Italic,
        MarkdownSyntax::Heading2,
        MarkdownSyntax::Heading3,
        MarkdownSyntax::Link,
        MarkdownSyntax::ListItem,
        MarkdownSyntax::InlineCode,
        MarkdownSyntax::CodeBlock,
        MarkdownSyntax::Image,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MarkdownSyntax::Bold => "bold",
            MarkdownSyntax::Italic => "italic",
            MarkdownSyntax::Heading2 => "h2",
            MarkdownSyntax::Heading3 => "h3",
            MarkdownSyntax::Link => "link",
            MarkdownSyntax::ListItem => "list",
            MarkdownSyntax::InlineCode => "code",
            MarkdownSyntax::CodeBlock => "codeblock",
            MarkdownSyntax::Image => "image",
        }
    }

    /// Text used in place of an empty selection.
    pub fn placeholder(self) -> &'static str {
        match self {
            MarkdownSyntax::Bold => "bold text",
            MarkdownSyntax::Italic => "italic text",
            MarkdownSyntax::Heading2 => "Heading",
            MarkdownSyntax::Heading3 => "Subheading",
            MarkdownSyntax::Link => "link text",
            MarkdownSyntax::ListItem => "list item",
            MarkdownSyntax::InlineCode => "code",
            MarkdownSyntax::CodeBlock => "code block",
            MarkdownSyntax::Image => "",
        }
    }

    /// Wrap `text` in this construct. Images have no textual template; they
    /// are inserted once an upload resolves.
    pub fn template(self, text: &str) -> Option<String> {
        let fragment = match self {
            MarkdownSyntax::Bold => format!("**{text}**"),
            MarkdownSyntax::Italic => format!("*{text}*"),
            MarkdownSyntax::Heading2 => format!("\n## {text}\n"),
            MarkdownSyntax::Heading3 => format!("\n### {text}\n"),
            MarkdownSyntax::Link => format!("[{text}](url)"),
            MarkdownSyntax::ListItem => format!("\n- {text}\n"),
            MarkdownSyntax::InlineCode => format!("`{text}`"),
            MarkdownSyntax::CodeBlock => format!("\n```\n{text}\n```\n"),
            MarkdownSyntax::Image => return None,
        };
        Some(fragment)
    }
}

impl fmt::Display for MarkdownSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkdownSyntax {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        MarkdownSyntax::ALL
            .into_iter()
            .find(|syntax| syntax.as_str() == value)
            .ok_or_else(|| DomainError::validation(format!("unknown markdown syntax `{value}`")))
    }
}

/// An image insertion waiting on an upload. It remembers the selection that
/// was active when the upload started; that range is where the image lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingImage {
    pub selection: Selection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    Inserted { fragment: String },
    ImageRequested(PendingImage),
}

/// The markdown source being edited plus the current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorBuffer {
    content: String,
    selection: Selection,
}

impl EditorBuffer {
    /// Start a buffer with the caret after the last character.
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let len = content.encode_utf16().count();
        Self {
            content,
            selection: Selection::caret(len),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Length in UTF-16 code units, the unit of every `Selection`.
    pub fn utf16_len(&self) -> usize {
        self.content.encode_utf16().count()
    }

    pub fn select(&mut self, start: usize, end: usize) {
        self.selection = Selection::new(start, end).clamped(self.utf16_len());
    }

    /// Replace the whole source, as the text surface does on every keystroke.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.selection = self.selection.clamped(self.utf16_len());
    }

    pub fn append(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Type `text` over the current selection and leave the caret after it.
    pub fn type_text(&mut self, text: &str) {
        let selection = self.selection;
        self.splice(selection, text);
    }

    pub fn selected_text(&self) -> &str {
        let selection = self.selection.clamped(self.utf16_len());
        let start = self.byte_index(selection.start);
        let end = self.byte_index(selection.end);
        &self.content[start..end]
    }

    /// Apply a toolbar construct at the current selection.
    pub fn apply(&mut self, syntax: MarkdownSyntax) -> Insertion {
        let selected = self.selected_text();
        let text = if selected.is_empty() {
            syntax.placeholder().to_string()
        } else {
            selected.to_string()
        };

        match syntax.template(&text) {
            Some(fragment) => {
                let selection = self.selection;
                self.splice(selection, &fragment);
                Insertion::Inserted { fragment }
            }
            None => Insertion::ImageRequested(self.begin_image_insertion()),
        }
    }

    /// Capture the current selection for an image whose URL is not known yet.
    pub fn begin_image_insertion(&self) -> PendingImage {
        PendingImage {
            selection: self.selection,
        }
    }

    /// Insert the image reference at the range captured by `pending`, even if
    /// the buffer changed while the upload was in flight. Offsets beyond the
    /// current end are clamped to it.
    pub fn complete_image_insertion(&mut self, pending: PendingImage, url: &str) -> String {
        let fragment = image_fragment(url);
        self.splice(pending.selection, &fragment);
        fragment
    }

    fn splice(&mut self, selection: Selection, fragment: &str) {
        let selection = selection.clamped(self.utf16_len());
        let start = self.byte_index(selection.start);
        let end = self.byte_index(selection.end);

        let mut next = String::with_capacity(self.content.len() + fragment.len());
        next.push_str(&self.content[..start]);
        next.push_str(fragment);
        next.push_str(&self.content[end..]);
        self.content = next;

        let caret = selection.start + fragment.encode_utf16().count();
        self.selection = Selection::caret(caret);
    }

    /// Byte index of the first char boundary at or after `offset` UTF-16
    /// units. An offset inside a surrogate pair lands after that character.
    fn byte_index(&self, offset: usize) -> usize {
        let mut units = 0;
        for (index, c) in self.content.char_indices() {
            if units >= offset {
                return index;
            }
            units += c.len_utf16();
        }
        self.content.len()
    }
}
