use crate::canvas::{ImageXObject, PageCanvas};
use crate::error::RenderError;
use iwb2pdf_types::Size;
use log::{debug, warn};
use lopdf::Object;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use usvg::tiny_skia_path::PathSegment;

/// Fonts available to SVG text. Shared between pages of one run.
pub type FontDatabase = Arc<usvg::fontdb::Database>;

/// Builds the font database for SVG text, scanning the host system for
/// installed fonts when `load_system` is set. Without fonts, text is skipped.
pub fn system_font_database(load_system: bool) -> FontDatabase {
    let mut db = usvg::fontdb::Database::new();
    if load_system {
        db.load_system_fonts();
        debug!("Loaded {} system font face(s)", db.len());
    }
    Arc::new(db)
}

/// A parsed single-page SVG document.
///
/// Sizes are in SVG user units (CSS pixels); they are used unchanged as PDF
/// points, so a 100x50 drawing becomes 100x50 on the page.
pub struct SvgDrawing {
    tree: usvg::Tree,
    source: PathBuf,
}

impl SvgDrawing {
    pub fn load(path: &Path, fonts: &FontDatabase) -> Result<Self, RenderError> {
        let data = std::fs::read(path).map_err(|source| RenderError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_data(&data, path, fonts)
    }

    /// Parses SVG bytes. Relative image references resolve against the
    /// directory of `source`.
    pub fn from_data(data: &[u8], source: &Path, fonts: &FontDatabase) -> Result<Self, RenderError> {
        let options = usvg::Options {
            resources_dir: source.parent().map(Path::to_path_buf),
            fontdb: Arc::clone(fonts),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_data(data, &options)?;

        let drawing = Self {
            tree,
            source: source.to_path_buf(),
        };
        let size = drawing.size();
        if !size.is_drawable() {
            return Err(RenderError::InvalidSize {
                width: size.width,
                height: size.height,
            });
        }
        Ok(drawing)
    }

    pub fn size(&self) -> Size {
        let size = self.tree.size();
        Size::new(size.width(), size.height())
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Draws the page so that its top-left corner lands `offset_x`, `offset_y`
    /// from the top-left corner of the canvas.
    pub fn draw(&self, canvas: &mut PageCanvas, offset_x: f32, offset_y: f32) {
        let page_height = canvas.size().height;
        canvas.save_state();
        // SVG is y-down. Flip once here; everything below uses SVG coordinates.
        canvas.transform([1.0, 0.0, 0.0, -1.0, offset_x, page_height - offset_y]);
        draw_group(canvas, self.tree.root(), 1.0);
        canvas.restore_state();
    }
}

fn draw_group(canvas: &mut PageCanvas, group: &usvg::Group, opacity: f32) {
    let opacity = opacity * group.opacity().get();
    if group.clip_path().is_some() || group.mask().is_some() || !group.filters().is_empty() {
        debug!("Ignoring clip path, mask or filter on group '{}'", group.id());
    }

    for node in group.children() {
        match node {
            usvg::Node::Group(child) => draw_group(canvas, child, opacity),
            usvg::Node::Path(path) => draw_path(canvas, path, opacity),
            usvg::Node::Image(image) => draw_image(canvas, image, opacity),
            usvg::Node::Text(text) => draw_group(canvas, text.flattened(), opacity),
        }
    }
}

fn draw_path(canvas: &mut PageCanvas, path: &usvg::Path, opacity: f32) {
    if !path.is_visible() {
        return;
    }
    let fill = path.fill().and_then(|fill| Some((paint_color(fill.paint())?, fill)));
    let stroke = path.stroke().and_then(|stroke| Some((paint_color(stroke.paint())?, stroke)));

    let paint_op = match (fill, stroke) {
        (None, None) => return,
        (Some((_, fill)), Some(_)) if fill.rule() == usvg::FillRule::EvenOdd => "B*",
        (Some(_), Some(_)) => "B",
        (Some((_, fill)), None) if fill.rule() == usvg::FillRule::EvenOdd => "f*",
        (Some(_), None) => "f",
        (None, Some(_)) => "S",
    };

    canvas.save_state();
    canvas.transform(matrix(path.abs_transform()));

    let fill_alpha = fill.map_or(1.0, |(_, fill)| fill.opacity().get()) * opacity;
    let stroke_alpha = stroke.map_or(1.0, |(_, stroke)| stroke.opacity().get()) * opacity;
    if fill_alpha < 1.0 || stroke_alpha < 1.0 {
        let name = canvas.alpha_state(fill_alpha, stroke_alpha);
        canvas.push("gs", vec![Object::Name(name.into_bytes())]);
    }

    if let Some((color, _)) = fill {
        canvas.push("rg", rgb(color));
    }
    if let Some((color, stroke)) = stroke {
        apply_stroke_style(canvas, color, stroke);
    }

    append_path_data(canvas, path.data());
    canvas.push(paint_op, vec![]);
    canvas.restore_state();
}

fn apply_stroke_style(canvas: &mut PageCanvas, color: usvg::Color, stroke: &usvg::Stroke) {
    canvas.push("RG", rgb(color));
    canvas.push("w", vec![Object::Real(stroke.width().get())]);

    let cap = match stroke.linecap() {
        usvg::LineCap::Butt => 0,
        usvg::LineCap::Round => 1,
        usvg::LineCap::Square => 2,
    };
    let join = match stroke.linejoin() {
        usvg::LineJoin::Miter | usvg::LineJoin::MiterClip => 0,
        usvg::LineJoin::Round => 1,
        usvg::LineJoin::Bevel => 2,
    };
    canvas.push("J", vec![Object::Integer(cap)]);
    canvas.push("j", vec![Object::Integer(join)]);
    canvas.push("M", vec![Object::Real(stroke.miterlimit().get())]);

    if let Some(dashes) = stroke.dasharray() {
        let dashes = dashes.iter().map(|d| Object::Real(*d)).collect();
        canvas.push("d", vec![Object::Array(dashes), Object::Real(stroke.dashoffset())]);
    }
}

/// Emits path construction operators. PDF has no quadratic curves, so
/// quadratic segments are raised to cubics.
fn append_path_data(canvas: &mut PageCanvas, data: &usvg::tiny_skia_path::Path) {
    let mut start = (0.0_f32, 0.0_f32);
    let mut last = start;

    for segment in data.segments() {
        match segment {
            PathSegment::MoveTo(p) => {
                canvas.push("m", reals(&[p.x, p.y]));
                start = (p.x, p.y);
                last = start;
            }
            PathSegment::LineTo(p) => {
                canvas.push("l", reals(&[p.x, p.y]));
                last = (p.x, p.y);
            }
            PathSegment::QuadTo(c, p) => {
                let c1 = (last.0 + (c.x - last.0) * 2.0 / 3.0, last.1 + (c.y - last.1) * 2.0 / 3.0);
                let c2 = (p.x + (c.x - p.x) * 2.0 / 3.0, p.y + (c.y - p.y) * 2.0 / 3.0);
                canvas.push("c", reals(&[c1.0, c1.1, c2.0, c2.1, p.x, p.y]));
                last = (p.x, p.y);
            }
            PathSegment::CubicTo(c1, c2, p) => {
                canvas.push("c", reals(&[c1.x, c1.y, c2.x, c2.y, p.x, p.y]));
                last = (p.x, p.y);
            }
            PathSegment::Close => {
                canvas.push("h", vec![]);
                last = start;
            }
        }
    }
}

fn draw_image(canvas: &mut PageCanvas, image: &usvg::Image, opacity: f32) {
    if !image.is_visible() {
        return;
    }
    let size = image.size();

    match image.kind() {
        usvg::ImageKind::SVG(tree) => {
            let inner = tree.size();
            canvas.save_state();
            canvas.transform(matrix(image.abs_transform()));
            canvas.transform([
                size.width() / inner.width(),
                0.0,
                0.0,
                size.height() / inner.height(),
                0.0,
                0.0,
            ]);
            draw_group(canvas, tree.root(), opacity);
            canvas.restore_state();
        }
        usvg::ImageKind::JPEG(data) | usvg::ImageKind::PNG(data) | usvg::ImageKind::GIF(data) => {
            let xobject = match decode_raster(data) {
                Ok(xobject) => xobject,
                Err(e) => {
                    warn!("Skipping embedded image '{}': {}", image.id(), e);
                    return;
                }
            };
            let name = canvas.add_image(xobject);

            canvas.save_state();
            canvas.transform(matrix(image.abs_transform()));
            if opacity < 1.0 {
                let state = canvas.alpha_state(opacity, opacity);
                canvas.push("gs", vec![Object::Name(state.into_bytes())]);
            }
            // Image space is y-up; undo the page flip for the unit square.
            canvas.transform([size.width(), 0.0, 0.0, -size.height(), 0.0, size.height()]);
            canvas.push("Do", vec![Object::Name(name.into_bytes())]);
            canvas.restore_state();
        }
        #[allow(unreachable_patterns)]
        _ => debug!("Skipping embedded image '{}' in an unsupported format", image.id()),
    }
}

fn decode_raster(data: &[u8]) -> Result<ImageXObject, image::ImageError> {
    let rgba = image::load_from_memory(data)?.to_rgba8();
    let (width, height) = rgba.dimensions();

    let pixel_count = (width as usize) * (height as usize);
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }
    let alpha = alpha.iter().any(|a| *a < u8::MAX).then_some(alpha);

    Ok(ImageXObject { width, height, rgb, alpha })
}

/// Gradients are approximated by their first stop; patterns are not drawn.
fn paint_color(paint: &usvg::Paint) -> Option<usvg::Color> {
    match paint {
        usvg::Paint::Color(color) => Some(*color),
        usvg::Paint::LinearGradient(gradient) => gradient.stops().first().map(|stop| stop.color()),
        usvg::Paint::RadialGradient(gradient) => gradient.stops().first().map(|stop| stop.color()),
        usvg::Paint::Pattern(_) => {
            debug!("Pattern paint is not supported");
            None
        }
    }
}

fn matrix(ts: usvg::Transform) -> [f32; 6] {
    [ts.sx, ts.ky, ts.kx, ts.sy, ts.tx, ts.ty]
}

fn rgb(color: usvg::Color) -> Vec<Object> {
    reals(&[
        f32::from(color.red) / 255.0,
        f32::from(color.green) / 255.0,
        f32::from(color.blue) / 255.0,
    ])
}

fn reals(values: &[f32]) -> Vec<Object> {
    values.iter().map(|v| Object::Real(*v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_fonts() -> FontDatabase {
        system_font_database(false)
    }

    fn parse(svg: &str) -> Result<SvgDrawing, RenderError> {
        SvgDrawing::from_data(svg.as_bytes(), Path::new("page_1.svg"), &no_fonts())
    }

    fn operators(canvas: &PageCanvas) -> Vec<&str> {
        canvas.operations().iter().map(|op| op.operator.as_str()).collect()
    }

    #[test]
    fn test_intrinsic_size() {
        let drawing = parse(r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="30"/>"#).unwrap();
        assert_eq!(drawing.size(), Size::new(40.0, 30.0));
    }

    #[test]
    fn test_size_from_view_box() {
        let drawing = parse(r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 50"/>"#).unwrap();
        assert_eq!(drawing.size(), Size::new(100.0, 50.0));
    }

    #[test]
    fn test_filled_rect_is_drawn_with_flip_and_offset() {
        let drawing = parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="30">
                 <rect x="5" y="5" width="10" height="10" fill="red"/>
               </svg>"#,
        )
        .unwrap();
        let mut canvas = PageCanvas::new(Size::new(120.0, 70.0));
        drawing.draw(&mut canvas, 40.0, 20.0);

        let ops = operators(&canvas);
        assert_eq!(ops.first(), Some(&"q"));
        assert_eq!(ops.last(), Some(&"Q"));
        assert!(ops.contains(&"f"));
        assert!(ops.contains(&"rg"));

        let flip = &canvas.operations()[1];
        assert_eq!(flip.operator, "cm");
        assert_eq!(flip.operands[3].as_float().unwrap(), -1.0);
        assert_eq!(flip.operands[4].as_float().unwrap(), 40.0);
        assert_eq!(flip.operands[5].as_float().unwrap(), 50.0);
    }

    #[test]
    fn test_stroke_and_opacity() {
        let drawing = parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="30">
                 <path d="M 0 0 Q 10 10 20 0" fill="none" stroke="blue" stroke-width="2"
                       stroke-opacity="0.5" stroke-dasharray="4 2"/>
               </svg>"#,
        )
        .unwrap();
        let mut canvas = PageCanvas::new(Size::new(60.0, 50.0));
        drawing.draw(&mut canvas, 10.0, 10.0);

        let ops = operators(&canvas);
        assert!(ops.contains(&"S"));
        assert!(ops.contains(&"RG"));
        assert!(ops.contains(&"gs"));
        assert!(ops.contains(&"d"));
        assert!(ops.contains(&"c"), "quadratic segment should become a cubic");
        assert!(!ops.contains(&"f"));
    }

    #[test]
    fn test_invisible_content_emits_no_paint() {
        let drawing = parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="30">
                 <rect width="10" height="10" fill="none"/>
               </svg>"#,
        )
        .unwrap();
        let mut canvas = PageCanvas::new(Size::new(60.0, 50.0));
        drawing.draw(&mut canvas, 10.0, 10.0);
        assert_eq!(operators(&canvas), vec!["q", "cm", "Q"]);
    }

    #[test]
    fn test_malformed_svg_is_an_error() {
        assert!(parse("<svg").is_err());
        assert!(parse("not an svg at all").is_err());
    }
}
