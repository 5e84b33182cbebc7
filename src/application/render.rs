//! Markdown preview rendering.
//!
//! The pipeline is pure: markdown goes in, sanitised HTML plus the list of
//! image sources comes out. The editor uses the image list to decide whether
//! it has to wait for image loads before resynchronising scroll positions.

use std::{cell::RefCell, rc::Rc};

use ammonia::Builder as AmmoniaBuilder;
use comrak::{Options, markdown_to_html};
use lol_html::{RewriteStrSettings, element, rewrite_str};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("document processing failed: {message}")]
    Document { message: String },
}

/// Result of rendering one markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPreview {
    pub html: String,
    /// `src` of every image in document order.
    pub image_sources: Vec<String>,
}

impl RenderedPreview {
    pub fn image_count(&self) -> usize {
        self.image_sources.len()
    }
}

/// Renderer interface. Implementations must be deterministic.
pub trait PreviewRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> Result<RenderedPreview, RenderError>;
}

/// Comrak with GitHub-flavoured extensions, sanitised by Ammonia.
pub struct MarkdownRenderer {
    options: Options<'static>,
    sanitizer: AmmoniaBuilder<'static>,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self {
            options: default_options(),
            sanitizer: build_sanitizer(),
        }
    }
}

impl PreviewRenderer for MarkdownRenderer {
    fn render(&self, markdown: &str) -> Result<RenderedPreview, RenderError> {
        let html = markdown_to_html(markdown, &self.options);
        let cleaned = self.sanitizer.clean(&html).to_string();
        decorate_images(&cleaned)
    }
}

fn default_options() -> Options<'static> {
    let mut options = Options::default();

    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;

    let render = &mut options.render;
    render.github_pre_lang = true;
    render.r#unsafe = false;

    options
}

fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();
    builder.add_tags(&["input"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);
    builder.add_tag_attributes("code", &["class"]);
    builder.add_tag_attributes("pre", &["lang"]);
    builder
}

fn decorate_images(html: &str) -> Result<RenderedPreview, RenderError> {
    let sources = Rc::new(RefCell::new(Vec::new()));

    let rewritten = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("img", {
                let sources = Rc::clone(&sources);
                move |el| {
                    if let Some(src) = el.get_attribute("src") {
                        sources.borrow_mut().push(src);
                    }
                    if el.get_attribute("loading").is_none() {
                        el.set_attribute("loading", "lazy")?;
                    }
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Document {
        message: err.to_string(),
    })?;

    let image_sources = sources.take();
    Ok(RenderedPreview {
        html: rewritten,
        image_sources,
    })
}
