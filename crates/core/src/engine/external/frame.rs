//! Pre-framing pages for the external converter.
//!
//! The converter sizes its PDF page to the SVG canvas, so the sizing policy
//! is applied before conversion: each page is wrapped in an outer `<svg>`
//! whose canvas is the computed page size, with the original document
//! nested at the content offset.

use crate::error::AssemblyError;
use iwb2pdf_layout::{SizingDecision, compute_sizing};
use iwb2pdf_types::{PageFile, PageSet, Size, SizingMode};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// A page's source text and its intrinsic size.
struct SourcePage<'a> {
    file: &'a PageFile,
    text: String,
    size: Size,
    declares_size: bool,
}

/// Writes one framed SVG per page into `scratch`, in page order.
///
/// Fails on the first page that cannot be read or has no usable size.
pub(crate) fn frame_pages(
    pages: &PageSet,
    mode: SizingMode,
    padding: f32,
    scratch: &Path,
) -> Result<Vec<PathBuf>, AssemblyError> {
    let sources = pages.iter().map(read_page).collect::<Result<Vec<_>, _>>()?;
    let sizes: Vec<Size> = sources.iter().map(|s| s.size).collect();
    let decisions = compute_sizing(&sizes, mode, padding);

    sources
        .iter()
        .zip(&decisions)
        .enumerate()
        .map(|(position, (source, decision))| -> Result<PathBuf, AssemblyError> {
            let framed = frame(source, decision).map_err(|reason| AssemblyError::PageRender {
                page: source.file.name(),
                reason,
            })?;
            let target = scratch.join(format!("frame_{position:04}_page_{}.svg", source.file.index));
            fs::write(&target, framed)?;
            debug!(
                "Framed {} at {}x{} with offset ({}, {})",
                source.file.name(),
                decision.page_width,
                decision.page_height,
                decision.content_offset_x,
                decision.content_offset_y
            );
            Ok(target)
        })
        .collect()
}

fn read_page(file: &PageFile) -> Result<SourcePage<'_>, AssemblyError> {
    let page_error = |reason: String| AssemblyError::PageRender {
        page: file.name(),
        reason,
    };
    let text = fs::read_to_string(&file.path).map_err(|e| page_error(e.to_string()))?;
    let (size, declares_size) = intrinsic_size(&text).map_err(page_error)?;
    Ok(SourcePage {
        file,
        text,
        size,
        declares_size,
    })
}

/// Reads the intrinsic size of an SVG document from the root `width` and
/// `height`, falling back to the `viewBox`. The flag reports whether both
/// came from `width` and `height`.
pub(crate) fn intrinsic_size(text: &str) -> Result<(Size, bool), String> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = roxmltree::Document::parse_with_options(text, options).map_err(|e| e.to_string())?;
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(format!("root element is <{}>, expected <svg>", root.tag_name().name()));
    }

    let view_box = root.attribute("viewBox").and_then(parse_view_box);
    let width = root.attribute("width").and_then(parse_length);
    let height = root.attribute("height").and_then(parse_length);

    let size = match (width, height, view_box) {
        (Some(w), Some(h), _) => (Size::new(w, h), true),
        (Some(w), None, Some(vb)) => (Size::new(w, w * vb.height / vb.width), false),
        (None, Some(h), Some(vb)) => (Size::new(h * vb.width / vb.height, h), false),
        (None, None, Some(vb)) => (vb, false),
        _ => return Err("document declares neither width/height nor viewBox".to_string()),
    };
    if !size.0.is_drawable() {
        return Err(format!("unusable size {}x{}", size.0.width, size.0.height));
    }
    Ok(size)
}

/// Parses an SVG length into user units (CSS pixels at 96 dpi).
/// Percentages and font-relative units are not resolvable here.
fn parse_length(value: &str) -> Option<f32> {
    let value = value.trim();
    let split = value
        .find(|c: char| c.is_ascii_alphabetic() || c == '%')
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: f32 = number.trim().parse().ok()?;
    let scale = match unit {
        "" | "px" => 1.0,
        "pt" => 4.0 / 3.0,
        "pc" => 16.0,
        "in" => 96.0,
        "cm" => 96.0 / 2.54,
        "mm" => 96.0 / 25.4,
        _ => return None,
    };
    Some(number * scale)
}

fn parse_view_box(value: &str) -> Option<Size> {
    let numbers: Vec<f32> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match numbers.as_slice() {
        [_, _, w, h] if *w > 0.0 && *h > 0.0 => Some(Size::new(*w, *h)),
        _ => None,
    }
}

fn frame(source: &SourcePage<'_>, decision: &SizingDecision) -> Result<String, String> {
    let doc = roxmltree::Document::parse_with_options(
        &source.text,
        roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        },
    )
    .map_err(|e| e.to_string())?;
    let range = doc.root_element().range();
    let mut inner = source.text[range].to_string();

    // A nested <svg> without width/height fills its parent, so pin it to
    // the intrinsic size.
    if !source.declares_size {
        let insert_at = inner
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .ok_or_else(|| "malformed root element".to_string())?;
        let root = doc.root_element();
        let mut pinned = String::new();
        if root.attribute("width").is_none() {
            pinned.push_str(&format!(" width=\"{}\"", source.size.width));
        }
        if root.attribute("height").is_none() {
            pinned.push_str(&format!(" height=\"{}\"", source.size.height));
        }
        inner.insert_str(insert_at, &pinned);
    }

    let base = source
        .file
        .path
        .parent()
        .and_then(|dir| dir.canonicalize().ok())
        .map(|dir| format!(" xml:base=\"{}/\"", escape_attribute(&dir.to_string_lossy())))
        .unwrap_or_default();

    // Page size in points with one user unit per point, as in-process pages are.
    Ok(format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<svg xmlns=\"http://www.w3.org/2000/svg\"{base} width=\"{w}pt\" height=\"{h}pt\" viewBox=\"0 0 {w} {h}\">\n",
            "<g transform=\"translate({x} {y})\">\n{inner}\n</g>\n</svg>\n"
        ),
        base = base,
        w = decision.page_width,
        h = decision.page_height,
        x = decision.content_offset_x,
        y = decision.content_offset_y,
        inner = inner,
    ))
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}
