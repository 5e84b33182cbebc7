use bytes::Bytes;
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

const PASTED_IMAGE_STAMP: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]-[minute]-[second]-[subsecond digits:3]Z"
);

/// Markdown inserted for an uploaded image.
pub fn image_fragment(url: &str) -> String {
    format!("\n![Image]({url})\n")
}

/// One entry of a clipboard paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    pub mime_type: String,
    pub file_name: Option<String>,
    pub data: Bytes,
}

impl ClipboardItem {
    pub fn is_image(&self) -> bool {
        self.mime_type.contains("image")
    }
}

/// Only the first image of a paste is uploaded; any others are dropped.
pub fn first_pasted_image(items: Vec<ClipboardItem>) -> Option<ClipboardItem> {
    items.into_iter().find(ClipboardItem::is_image)
}

/// Synthetic name for pasted image data, e.g.
/// `pasted-image-2026-10-17T08-30-00-123Z.png`.
pub fn pasted_image_file_name(now: OffsetDateTime) -> String {
    let stamp = now
        .to_offset(UtcOffset::UTC)
        .format(PASTED_IMAGE_STAMP)
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("pasted-image-{stamp}.png")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEvent {
    Loaded,
    Errored,
}

/// Tracks which images of one preview render have settled.
///
/// Loading images changes the preview's scroll height, so the scroll fraction
/// is recomputed once every image has either loaded or failed. Images are
/// identified by their position in the render's `image_sources`; repeated
/// events for one image count once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLoadTracker {
    settled: Vec<bool>,
    fired: bool,
}

impl ImageLoadTracker {
    pub fn new(total: usize) -> Self {
        Self {
            settled: vec![false; total],
            fired: total == 0,
        }
    }

    pub fn needs_wait(&self) -> bool {
        !self.fired
    }

    pub fn pending(&self) -> usize {
        self.settled.iter().filter(|settled| !**settled).count()
    }

    /// Record image `index` settling. Returns `true` exactly once, when the
    /// last outstanding image settles. Unknown indices are ignored.
    pub fn observe(&mut self, index: usize, _event: ImageEvent) -> bool {
        if self.fired {
            return false;
        }
        let Some(slot) = self.settled.get_mut(index) else {
            return false;
        };
        *slot = true;
        if self.pending() == 0 {
            self.fired = true;
            return true;
        }
        false
    }
}
