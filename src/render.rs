//! Drawing surface abstraction for the loading animation.

use crate::color::Rgba;

/// A point on the drawing surface, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Style for centred overlay text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// CSS font string, e.g. `"90px serif"`
    pub font: String,
    pub fill: Rgba,
    pub stroke: Rgba,
}

/// A rectangular 2D raster target.
///
/// All calls are infallible from the caller's point of view; backends that
/// can fail (canvas) log and carry on.
pub trait Surface {
    /// Surface `(width, height)` in pixels.
    fn size(&self) -> (f64, f64);

    /// Clear a rectangular region to transparent.
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Paint a filled disc.
    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba);

    /// Fill and then stroke `text`, horizontally and vertically centred at `at`.
    fn draw_text(&mut self, text: &str, at: Point, style: &TextStyle);
}

/// A single recorded draw call.
///
/// This is a platform-agnostic representation of what was drawn, usable
/// for headless hosts and for inspecting frames in tests.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Circle {
        center: Point,
        radius: f64,
        color: Rgba,
    },
    Text {
        text: String,
        at: Point,
        style: TextStyle,
    },
}

/// Surface that records every draw call instead of rasterising.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    width: f64,
    height: f64,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// All commands recorded so far, oldest first.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drop recorded commands.
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn clear_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Clear { .. }))
            .count()
    }

    pub fn circle_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
            .count()
    }

    /// Text of every recorded text command, in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.commands.push(DrawCommand::Clear { x, y, width, height });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) {
        self.commands.push(DrawCommand::Circle { center, radius, color });
    }

    fn draw_text(&mut self, text: &str, at: Point, style: &TextStyle) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            at,
            style: style.clone(),
        });
    }
}

/// Web-specific rendering implementation.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use crate::error::{Error, Result};
    use js_sys::{Array, Object, Promise, Reflect};
    use wasm_bindgen::prelude::Closure;
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{CanvasRenderingContext2d, ClipboardItem, HtmlCanvasElement, HtmlImageElement};

    /// Get the 2D context of a canvas.
    pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
        canvas
            .get_context("2d")
            .map_err(|e| Error::Browser(format!("Failed to get 2d context: {e:?}")))?
            .ok_or_else(|| Error::Browser("No 2d context available".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| Error::Browser("Failed to cast to CanvasRenderingContext2d".into()))
    }

    /// [`Surface`] backed by an HTML canvas.
    ///
    /// The size is read once at construction; resizing the canvas afterwards
    /// is not tracked.
    #[derive(Clone, Debug)]
    pub struct CanvasSurface {
        ctx: CanvasRenderingContext2d,
        width: f64,
        height: f64,
    }

    impl CanvasSurface {
        pub fn new(canvas: &HtmlCanvasElement) -> Result<Self> {
            Ok(Self {
                ctx: context_2d(canvas)?,
                width: canvas.width() as f64,
                height: canvas.height() as f64,
            })
        }
    }

    impl Surface for CanvasSurface {
        fn size(&self) -> (f64, f64) {
            (self.width, self.height)
        }

        fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
            self.ctx.clear_rect(x, y, width, height);
        }

        fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) {
            self.ctx.begin_path();
            self.ctx.set_fill_style_str(&color.css());
            if let Err(e) = self
                .ctx
                .arc(center.x, center.y, radius, 0.0, std::f64::consts::TAU)
            {
                tracing::warn!("Failed to draw arc: {e:?}");
                return;
            }
            self.ctx.fill();
        }

        fn draw_text(&mut self, text: &str, at: Point, style: &TextStyle) {
            self.ctx.set_font(&style.font);
            self.ctx.set_text_align("center");
            self.ctx.set_text_baseline("middle");
            self.ctx.set_fill_style_str(&style.fill.css());
            self.ctx.set_stroke_style_str(&style.stroke.css());
            if let Err(e) = self.ctx.fill_text(text, at.x, at.y) {
                tracing::warn!("Failed to fill text: {e:?}");
            }
            if let Err(e) = self.ctx.stroke_text(text, at.x, at.y) {
                tracing::warn!("Failed to stroke text: {e:?}");
            }
        }
    }

    /// Draw a base64-encoded PNG scaled over the whole canvas.
    ///
    /// Decoding is asynchronous; the draw happens once the image loads.
    /// Call this only after the loading animation has been stopped.
    pub fn draw_base64_png(canvas: &HtmlCanvasElement, data: &str) -> Result<()> {
        let ctx = context_2d(canvas)?;
        let image = HtmlImageElement::new()
            .map_err(|e| Error::Browser(format!("Failed to create image element: {e:?}")))?;
        let (width, height) = (canvas.width() as f64, canvas.height() as f64);

        let loaded = image.clone();
        let onload = Closure::once(move || {
            let result = ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                &loaded,
                0.0,
                0.0,
                loaded.natural_width() as f64,
                loaded.natural_height() as f64,
                0.0,
                0.0,
                width,
                height,
            );
            if let Err(e) = result {
                tracing::warn!("Failed to draw generated image: {e:?}");
            }
        });
        image.set_onload(Some(onload.as_ref().unchecked_ref()));
        // The image element holds the only reference to the handler.
        onload.forget();

        image.set_src(&format!("data:image/png;base64,{data}"));
        Ok(())
    }

    /// Clipboard item holding the canvas content as `image/png`.
    ///
    /// The item carries a promise of the encoded blob, so it can be built
    /// synchronously inside a user gesture and written later.
    pub fn png_clipboard_item(canvas: &HtmlCanvasElement) -> Result<ClipboardItem> {
        let blob = Promise::new(&mut |resolve, reject| {
            let failed = reject.clone();
            let on_blob = Closure::once_into_js(move |blob: JsValue| {
                let settled = if blob.is_null() {
                    reject.call1(&JsValue::NULL, &JsValue::from("Canvas produced no image"))
                } else {
                    resolve.call1(&JsValue::NULL, &blob)
                };
                if let Err(e) = settled {
                    tracing::warn!("Failed to settle blob promise: {e:?}");
                }
            });
            if let Err(e) = canvas.to_blob(on_blob.unchecked_ref()) {
                let _ = failed.call1(&JsValue::NULL, &e);
            }
        });

        let record = Object::new();
        Reflect::set(&record, &JsValue::from("image/png"), &blob)
            .map_err(|e| Error::Browser(format!("Failed to build clipboard record: {e:?}")))?;
        ClipboardItem::new_with_record_from_str_to_blob_promise(&record)
            .map_err(|e| Error::Browser(format!("Failed to create clipboard item: {e:?}")))
    }

    /// Copy the canvas content to the system clipboard as a PNG.
    ///
    /// Browsers only allow this from a user gesture on a secure page.
    pub async fn copy_canvas_to_clipboard(canvas: &HtmlCanvasElement) -> Result<()> {
        let window = web_sys::window().ok_or_else(|| Error::Browser("No window available".into()))?;
        let item = png_clipboard_item(canvas)?;
        let write = window.navigator().clipboard().write(&Array::of1(&item));
        JsFuture::from(write)
            .await
            .map_err(|e| Error::Browser(format!("Clipboard write failed: {e:?}")))?;
        tracing::debug!("image copied to clipboard");
        Ok(())
    }
}
