//! Markdown editor core: the text buffer with structured insertion, the
//! proportional scroll synchronisation between source and preview panes, and
//! the bookkeeping for images arriving out of band.

mod buffer;
mod images;
mod scroll;

pub use buffer::{EditorBuffer, Insertion, MarkdownSyntax, PendingImage, Selection};
pub use images::{
    ClipboardItem, ImageEvent, ImageLoadTracker, first_pasted_image, image_fragment,
    pasted_image_file_name,
};
pub use scroll::{
    DEFAULT_SCROLL_DEBOUNCE, Pane, ScrollMetrics, ScrollOutcome, ScrollSync, SyncState,
};
