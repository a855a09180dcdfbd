//! Headless Chromium render surface.

use super::{
    ClipRegion, ImageFormat, RawTextNode, RenderEngine, RenderSurface, Viewport, HIDE_TEXT_CSS,
};
use crate::convert::PrintPaper;
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::protocol::cdp::Page::{CaptureScreenshotFormatOption, Viewport as CdpClip};
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::util::Timeout;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Walks every text node of `document.body` and reports it unfiltered,
/// with the selection-range box shifted into document coordinates.
const MEASURE_SCRIPT: &str = r#"(() => {
  const nodes = [];
  const walker = document.createTreeWalker(document.body, NodeFilter.SHOW_TEXT, null);
  const sx = window.scrollX, sy = window.scrollY;
  let node;
  while ((node = walker.nextNode())) {
    if (!node.textContent.trim()) continue;
    const parent = node.parentElement;
    const range = document.createRange();
    range.selectNodeContents(node);
    const r = range.getBoundingClientRect();
    let style = null;
    if (parent) {
      const s = window.getComputedStyle(parent);
      style = {
        display: s.display, visibility: s.visibility, opacity: s.opacity,
        color: s.color, fontSize: s.fontSize, fontFamily: s.fontFamily,
        fontWeight: s.fontWeight, fontStyle: s.fontStyle, textAlign: s.textAlign
      };
    }
    nodes.push({
      text: node.textContent,
      parentTag: parent ? parent.tagName : null,
      rect: { x: r.left + sx, y: r.top + sy, width: r.width, height: r.height },
      style
    });
  }
  return JSON.stringify(nodes);
})()"#;

const SCROLL_HEIGHT_SCRIPT: &str = "document.documentElement.scrollHeight";

/// Resolves once pending images and web fonts settle, or with `"timeout"`
/// after `__TIMEOUT_MS__` milliseconds.
const READY_SCRIPT: &str = r#"(() => {
  const pending = Array.from(document.images)
    .filter(img => !img.complete)
    .map(img => new Promise(done => {
      img.addEventListener('load', done, { once: true });
      img.addEventListener('error', done, { once: true });
    }));
  const settled = Promise.all(pending)
    .then(() => (document.fonts ? document.fonts.ready : null))
    .then(() => 'ready');
  const expired = new Promise(done => setTimeout(() => done('timeout'), __TIMEOUT_MS__));
  return Promise.race([settled, expired]);
})()"#;

/// Chromium refuses navigation URLs longer than this.
const MAX_URL_BYTES: usize = 2 * 1024 * 1024;

const DATA_URL_PREFIX: &str = "data:text/html;charset=utf-8;base64,";

fn render_err(context: &str, err: impl std::fmt::Display) -> Error {
    Error::Render(format!("{}: {}", context, err))
}

/// Map a wait failure, keeping timeouts distinguishable.
fn wait_err(context: &str, err: anyhow::Error, timeout: Duration) -> Error {
    if err.downcast_ref::<Timeout>().is_some() {
        Error::Timeout(timeout)
    } else {
        render_err(context, err)
    }
}

/// How markup reaches the tab.
#[derive(Debug, Clone, PartialEq)]
enum LoadPlan {
    /// Navigate straight to a base64 `data:` URL.
    DataUrl(String),
    /// Open `about:blank`, then replace the frame's document.
    ReplaceDocument,
}

impl LoadPlan {
    fn for_html(html: &str) -> Self {
        let url_len = DATA_URL_PREFIX.len() + html.len().div_ceil(3) * 4;
        if url_len <= MAX_URL_BYTES {
            LoadPlan::DataUrl(format!("{}{}", DATA_URL_PREFIX, STANDARD.encode(html)))
        } else {
            LoadPlan::ReplaceDocument
        }
    }
}

/// Engine launching one headless Chromium per request.
#[derive(Debug, Clone, Default)]
pub struct ChromeEngine {
    executable: Option<PathBuf>,
    sandbox: bool,
}

impl ChromeEngine {
    /// Create an engine using the auto-detected Chromium binary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific browser executable.
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// Enable the browser sandbox (disabled by default for container use).
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }
}

impl RenderEngine for ChromeEngine {
    type Surface = ChromeSurface;

    fn name(&self) -> &str {
        "chrome"
    }

    fn open(&self, viewport: &Viewport) -> Result<ChromeSurface> {
        let args: Vec<&OsStr> = vec![OsStr::new("--hide-scrollbars")];
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(self.sandbox)
            .window_size(Some((viewport.width, viewport.height)))
            .path(self.executable.clone())
            .args(args)
            .build()
            .map_err(|e| render_err("invalid launch options", e))?;

        let browser = Browser::new(options).map_err(|e| render_err("browser launch failed", e))?;
        let tab = browser
            .new_tab()
            .map_err(|e| render_err("could not open tab", e))?;
        log::debug!(
            "Chromium surface opened at {}x{} (scale {})",
            viewport.width,
            viewport.height,
            viewport.device_scale_factor
        );

        Ok(ChromeSurface {
            browser,
            tab,
            viewport: *viewport,
        })
    }
}

/// A loaded Chromium tab. Dropping it closes the browser.
pub struct ChromeSurface {
    browser: Browser,
    tab: Arc<Tab>,
    viewport: Viewport,
}

impl ChromeSurface {
    fn eval_json(&self, script: &str) -> Result<serde_json::Value> {
        let remote = self
            .tab
            .evaluate(script, false)
            .map_err(|e| render_err("evaluation failed", e))?;
        remote
            .value
            .ok_or_else(|| Error::Render("evaluation returned no value".to_string()))
    }

    fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| wait_err("navigation failed", e, timeout))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| wait_err("navigation failed", e, timeout))?;
        Ok(())
    }

    fn replace_document(&self, html: &str) -> Result<()> {
        let frame_id = self
            .tab
            .call_method(Page::GetFrameTree(None))
            .map_err(|e| render_err("could not read frame tree", e))?
            .frame_tree
            .frame
            .id;
        self.tab
            .call_method(Page::SetDocumentContent {
                frame_id,
                html: html.to_string(),
            })
            .map_err(|e| render_err("could not set document content", e))?;
        Ok(())
    }

    fn wait_for_resources(&self, timeout: Duration) -> Result<()> {
        let script = READY_SCRIPT.replace("__TIMEOUT_MS__", &timeout.as_millis().to_string());
        let state = self
            .tab
            .evaluate(&script, true)
            .map_err(|e| wait_err("waiting for resources failed", e, timeout))?
            .value;
        match state.as_ref().and_then(|v| v.as_str()) {
            Some("timeout") => Err(Error::Timeout(timeout)),
            _ => Ok(()),
        }
    }

    /// Append a stylesheet to the loaded document.
    pub(crate) fn add_stylesheet(&self, css: &str) -> Result<()> {
        let css = serde_json::to_string(css)
            .map_err(|e| render_err("could not encode stylesheet", e))?;
        let script = format!(
            "(() => {{ const s = document.createElement('style'); s.textContent = {}; \
             (document.head || document.documentElement).appendChild(s); return true; }})()",
            css
        );
        self.eval_json(&script)?;
        Ok(())
    }

    /// Print the loaded document to PDF on the given paper.
    pub(crate) fn print_pdf(&self, paper: &PrintPaper) -> Result<Vec<u8>> {
        let options = PrintToPdfOptions {
            landscape: Some(paper.landscape),
            display_header_footer: Some(false),
            print_background: Some(true),
            prefer_css_page_size: Some(true),
            paper_width: Some(paper.width_in),
            paper_height: Some(paper.height_in),
            margin_top: Some(paper.margin_in),
            margin_bottom: Some(paper.margin_in),
            margin_left: Some(paper.margin_in),
            margin_right: Some(paper.margin_in),
            ..Default::default()
        };
        self.tab
            .print_to_pdf(Some(options))
            .map_err(|e| render_err("printing failed", e))
    }
}

impl RenderSurface for ChromeSurface {
    fn load_html(&mut self, html: &str, timeout: Duration) -> Result<()> {
        self.tab.set_default_timeout(timeout);
        match LoadPlan::for_html(html) {
            LoadPlan::DataUrl(url) => self.navigate(&url, timeout)?,
            LoadPlan::ReplaceDocument => {
                log::debug!("{} bytes of HTML, loading through about:blank", html.len());
                self.navigate("about:blank", timeout)?;
                self.replace_document(html)?;
            }
        }
        self.wait_for_resources(timeout)
    }

    fn text_nodes(&mut self) -> Result<Vec<RawTextNode>> {
        let value = self.eval_json(MEASURE_SCRIPT)?;
        let json = value
            .as_str()
            .ok_or_else(|| Error::Render("measurement did not return a string".to_string()))?;
        serde_json::from_str(json).map_err(|e| render_err("malformed measurement", e))
    }

    fn scroll_height(&mut self) -> Result<f64> {
        let value = self.eval_json(SCROLL_HEIGHT_SCRIPT)?;
        value
            .as_f64()
            .ok_or_else(|| Error::Render("scrollHeight is not a number".to_string()))
    }

    fn hide_text(&mut self) -> Result<()> {
        self.add_stylesheet(HIDE_TEXT_CSS)
    }

    fn capture(&mut self, clip: &ClipRegion, format: ImageFormat) -> Result<Vec<u8>> {
        let data = self
            .tab
            .call_method(screenshot_request(clip, format))
            .map_err(|e| render_err("screenshot failed", e))?
            .data;
        STANDARD
            .decode(data)
            .map_err(|e| render_err("screenshot was not base64", e))
    }
}

/// Screenshot of one page slice in document coordinates.
fn screenshot_request(clip: &ClipRegion, format: ImageFormat) -> Page::CaptureScreenshot {
    let (cdp_format, quality) = match format {
        ImageFormat::Jpeg { quality } => (CaptureScreenshotFormatOption::Jpeg, Some(quality as u32)),
        ImageFormat::Png => (CaptureScreenshotFormatOption::Png, None),
    };
    // The viewport is one page tall; later pages lie below it.
    Page::CaptureScreenshot {
        format: Some(cdp_format),
        quality,
        clip: Some(CdpClip {
            x: clip.x,
            y: clip.y,
            width: clip.width,
            height: clip.height,
            scale: clip.scale,
        }),
        from_surface: Some(true),
        capture_beyond_viewport: Some(true),
        optimize_for_speed: None,
    }
}

impl Drop for ChromeSurface {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(false) {
            log::debug!("tab close failed during teardown: {}", e);
        }
        log::debug!(
            "Chromium surface released ({}x{}, pid {:?})",
            self.viewport.width,
            self.viewport.height,
            self.browser.get_process_id()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_html_uses_data_url() {
        let plan = LoadPlan::for_html("<p>Hello</p>");
        match plan {
            LoadPlan::DataUrl(url) => {
                assert!(url.starts_with(DATA_URL_PREFIX));
                let encoded = &url[DATA_URL_PREFIX.len()..];
                assert_eq!(STANDARD.decode(encoded).unwrap(), b"<p>Hello</p>");
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_large_html_replaces_document() {
        let image = "A".repeat(3 * 1024 * 1024);
        let html = format!("<img src=\"data:image/png;base64,{}\">", image);
        assert_eq!(LoadPlan::for_html(&html), LoadPlan::ReplaceDocument);
    }

    #[test]
    fn test_plan_threshold_follows_encoded_length() {
        let budget = (MAX_URL_BYTES - DATA_URL_PREFIX.len()) / 4 * 3;
        assert!(matches!(
            LoadPlan::for_html(&"x".repeat(budget)),
            LoadPlan::DataUrl(_)
        ));
        assert_eq!(
            LoadPlan::for_html(&"x".repeat(budget + 1)),
            LoadPlan::ReplaceDocument
        );
    }

    #[test]
    fn test_timeout_detected_by_type() {
        let err = wait_err("navigation failed", anyhow::Error::new(Timeout), Duration::from_secs(3));
        assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(3)));

        let err = wait_err(
            "navigation failed",
            anyhow::anyhow!("net::ERR_TIMED_OUT"),
            Duration::from_secs(3),
        );
        assert!(matches!(err, Error::Render(ref m) if m.contains("ERR_TIMED_OUT")));
    }

    #[test]
    fn test_later_pages_captured_below_viewport() {
        let clip = ClipRegion {
            x: 0.0,
            y: 2246.0,
            width: 794.0,
            height: 1123.0,
            scale: 2.0,
        };
        let request = screenshot_request(&clip, ImageFormat::Jpeg { quality: 90 });
        assert_eq!(request.capture_beyond_viewport, Some(true));
        assert_eq!(request.quality, Some(90));
        let region = request.clip.unwrap();
        assert_eq!((region.y, region.height, region.scale), (2246.0, 1123.0, 2.0));

        let request = screenshot_request(&clip, ImageFormat::Png);
        assert!(matches!(request.format, Some(CaptureScreenshotFormatOption::Png)));
        assert_eq!(request.quality, None);
    }

    #[test]
    fn test_ready_script_timeout_substitution() {
        let script = READY_SCRIPT.replace("__TIMEOUT_MS__", "1500");
        assert!(script.contains("done('timeout'), 1500)"));
        assert!(!script.contains("__TIMEOUT_MS__"));
    }
}
