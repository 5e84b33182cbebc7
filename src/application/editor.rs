//! Editor session: one markdown buffer, its rendered preview and the scroll
//! coordinator between the two panes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

use crate::application::render::{PreviewRenderer, RenderError, RenderedPreview};
use crate::application::uploads::{ImageUploadService, UploadError, UploadedImage};
use crate::domain::editor::{
    ClipboardItem, EditorBuffer, ImageEvent, ImageLoadTracker, Insertion, MarkdownSyntax, Pane,
    PendingImage, ScrollMetrics, ScrollOutcome, ScrollSync, Selection, SyncState,
    first_pasted_image, pasted_image_file_name,
};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// The image half of a clipboard paste, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastedImage {
    pub pending: PendingImage,
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

pub struct EditorSession {
    buffer: EditorBuffer,
    scroll: ScrollSync,
    renderer: Arc<dyn PreviewRenderer>,
    preview: RenderedPreview,
    images: ImageLoadTracker,
}

impl EditorSession {
    pub fn new(
        content: impl Into<String>,
        renderer: Arc<dyn PreviewRenderer>,
        scroll_debounce: Duration,
    ) -> Result<Self, EditorError> {
        let buffer = EditorBuffer::new(content);
        let preview = renderer.render(buffer.content())?;
        let images = ImageLoadTracker::new(preview.image_count());
        Ok(Self {
            buffer,
            scroll: ScrollSync::new(scroll_debounce),
            renderer,
            preview,
            images,
        })
    }

    pub fn content(&self) -> &str {
        self.buffer.content()
    }

    pub fn selection(&self) -> Selection {
        self.buffer.selection()
    }

    pub fn preview(&self) -> &RenderedPreview {
        &self.preview
    }

    pub fn sync_state(&self) -> SyncState {
        self.scroll.state()
    }

    /// Whether the preview is still waiting on image loads.
    pub fn awaiting_images(&self) -> bool {
        self.images.needs_wait()
    }

    pub fn select(&mut self, start: usize, end: usize) {
        self.buffer.select(start, end);
    }

    /// Replace the source as direct typing does.
    pub fn set_content(&mut self, content: impl Into<String>) -> Result<(), EditorError> {
        self.buffer.set_content(content);
        self.refresh_preview()
    }

    pub fn type_text(&mut self, text: &str) -> Result<(), EditorError> {
        self.buffer.type_text(text);
        self.refresh_preview()
    }

    /// Apply a toolbar construct. Image requests leave the content untouched
    /// and hand back the pending insertion.
    pub fn apply_syntax(&mut self, syntax: MarkdownSyntax) -> Result<Insertion, EditorError> {
        let insertion = self.buffer.apply(syntax);
        if matches!(insertion, Insertion::Inserted { .. }) {
            self.refresh_preview()?;
        }
        Ok(insertion)
    }

    pub fn start_image_upload(&self) -> PendingImage {
        self.buffer.begin_image_insertion()
    }

    /// Insert an uploaded image at the range captured when the upload began.
    pub fn finish_image_upload(
        &mut self,
        pending: PendingImage,
        url: &str,
    ) -> Result<String, EditorError> {
        let fragment = self.buffer.complete_image_insertion(pending, url);
        self.refresh_preview()?;
        Ok(fragment)
    }

    /// Pick the first image of a paste and capture the current selection for
    /// it. The upload is always named after `now`, whatever name the
    /// clipboard carried. Returns `None` when the paste carries no image,
    /// leaving ordinary text pastes to the text surface.
    pub fn paste(&self, items: Vec<ClipboardItem>, now: OffsetDateTime) -> Option<PastedImage> {
        let item = first_pasted_image(items)?;
        let file_name = pasted_image_file_name(now);
        Some(PastedImage {
            pending: self.start_image_upload(),
            file_name,
            content_type: item.mime_type,
            data: item.data,
        })
    }

    /// Upload `data` and insert it at `pending`.
    pub async fn upload_image(
        &mut self,
        uploads: &ImageUploadService,
        pending: PendingImage,
        file_name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<UploadedImage, EditorError> {
        let uploaded = uploads.upload(file_name, content_type, data).await?;
        self.finish_image_upload(pending, &uploaded.url)?;
        Ok(uploaded)
    }

    /// Paste handler: uploads at most one image and inserts it.
    pub async fn paste_image(
        &mut self,
        uploads: &ImageUploadService,
        items: Vec<ClipboardItem>,
        now: OffsetDateTime,
    ) -> Result<Option<UploadedImage>, EditorError> {
        let Some(pasted) = self.paste(items, now) else {
            return Ok(None);
        };
        let uploaded = self
            .upload_image(
                uploads,
                pasted.pending,
                &pasted.file_name,
                Some(pasted.content_type.as_str()),
                pasted.data,
            )
            .await?;
        Ok(Some(uploaded))
    }

    pub fn on_editor_scroll(
        &mut self,
        editor: &ScrollMetrics,
        preview: &ScrollMetrics,
        now: Instant,
    ) -> ScrollOutcome {
        self.scroll.on_scroll(Pane::Editor, editor, preview, now)
    }

    pub fn on_preview_scroll(
        &mut self,
        preview: &ScrollMetrics,
        editor: &ScrollMetrics,
        now: Instant,
    ) -> ScrollOutcome {
        self.scroll.on_scroll(Pane::Preview, preview, editor, now)
    }

    pub fn settle(&mut self, now: Instant) -> SyncState {
        self.scroll.settle(now)
    }

    /// Record image `index` of the current preview (its position in
    /// `image_sources`) settling. Once every image has loaded or failed, the
    /// preview offset is recomputed from the editor.
    pub fn image_event(
        &mut self,
        index: usize,
        event: ImageEvent,
        editor: &ScrollMetrics,
        preview: &ScrollMetrics,
    ) -> Option<ScrollOutcome> {
        if self.images.observe(index, event) {
            debug!(
                target = "application::editor",
                "preview images settled; resyncing scroll"
            );
            return Some(self.scroll.resync(editor, preview));
        }
        None
    }

    fn refresh_preview(&mut self) -> Result<(), EditorError> {
        self.preview = self.renderer.render(self.buffer.content())?;
        self.images = ImageLoadTracker::new(self.preview.image_count());
        Ok(())
    }
}
