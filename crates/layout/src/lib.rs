//! Page sizing policy.
//!
//! Both rendering engines size their pages through [`compute_sizing`], so a
//! document looks the same whichever engine produced it. The computation is
//! pure: the same drawing sizes, mode and padding always yield the same
//! decisions.

use iwb2pdf_types::{Size, SizingMode};

/// Padding added on every side of the content, in drawing units.
pub const DEFAULT_PADDING: f32 = 10.0;

/// Final page size and content placement for one page.
///
/// Offsets are measured from the top-left corner of the page to the
/// top-left corner of the content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingDecision {
    pub page_width: f32,
    pub page_height: f32,
    pub content_offset_x: f32,
    pub content_offset_y: f32,
}

impl SizingDecision {
    pub fn page_size(&self) -> Size {
        Size::new(self.page_width, self.page_height)
    }

    pub fn content_offset(&self) -> (f32, f32) {
        (self.content_offset_x, self.content_offset_y)
    }
}

/// Computes one [`SizingDecision`] per drawing, in input order.
///
/// - `Independent`: each page is its drawing plus `padding` on every side,
///   content at `(padding, padding)`.
/// - `Uniform`: every page is the largest width and largest height plus
///   `padding` on every side, each drawing centered on its page.
pub fn compute_sizing(drawings: &[Size], mode: SizingMode, padding: f32) -> Vec<SizingDecision> {
    debug_assert!(padding.is_finite() && padding >= 0.0);

    match mode {
        SizingMode::Independent => drawings
            .iter()
            .map(|drawing| {
                let page = drawing.padded(padding);
                SizingDecision {
                    page_width: page.width,
                    page_height: page.height,
                    content_offset_x: padding,
                    content_offset_y: padding,
                }
            })
            .collect(),
        SizingMode::Uniform => {
            let largest = drawings.iter().copied().fold(Size::default(), Size::max);
            let page = largest.padded(padding);
            log::debug!("Uniform page size {}x{} over {} drawing(s)", page.width, page.height, drawings.len());
            drawings
                .iter()
                .map(|drawing| SizingDecision {
                    page_width: page.width,
                    page_height: page.height,
                    content_offset_x: (page.width - drawing.width) / 2.0,
                    content_offset_y: (page.height - drawing.height) / 2.0,
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn assert_close(actual: f32, expected: f32) {
        assert!((actual - expected).abs() < EPSILON, "expected {expected}, got {actual}");
    }

    #[test]
    fn test_uniform_centers_content_on_largest_page() {
        let drawings = [Size::new(40.0, 30.0), Size::new(100.0, 50.0)];
        let decisions = compute_sizing(&drawings, SizingMode::Uniform, DEFAULT_PADDING);

        assert_eq!(decisions.len(), 2);
        for decision in &decisions {
            assert_close(decision.page_width, 120.0);
            assert_close(decision.page_height, 70.0);
        }
        assert_close(decisions[0].content_offset_x, 40.0);
        assert_close(decisions[0].content_offset_y, 20.0);
        assert_close(decisions[1].content_offset_x, 10.0);
        assert_close(decisions[1].content_offset_y, 10.0);
    }

    #[test]
    fn test_uniform_takes_width_and_height_from_different_drawings() {
        let drawings = [Size::new(300.0, 20.0), Size::new(50.0, 400.0)];
        let decisions = compute_sizing(&drawings, SizingMode::Uniform, 0.0);

        assert_close(decisions[0].page_width, 300.0);
        assert_close(decisions[0].page_height, 400.0);
        assert_close(decisions[0].content_offset_y, 190.0);
        assert_close(decisions[1].content_offset_x, 125.0);
    }

    #[test]
    fn test_independent_sizes_each_page_to_its_content() {
        let drawings = [Size::new(40.0, 30.0), Size::new(100.0, 50.0)];
        let decisions = compute_sizing(&drawings, SizingMode::Independent, DEFAULT_PADDING);

        assert_eq!(decisions[0].page_size(), Size::new(60.0, 50.0));
        assert_eq!(decisions[1].page_size(), Size::new(120.0, 70.0));
        for decision in &decisions {
            assert_eq!(decision.content_offset(), (DEFAULT_PADDING, DEFAULT_PADDING));
        }
    }

    #[test]
    fn test_single_drawing_is_identical_in_both_modes() {
        let drawings = [Size::new(72.5, 18.25)];
        let uniform = compute_sizing(&drawings, SizingMode::Uniform, 4.0);
        let independent = compute_sizing(&drawings, SizingMode::Independent, 4.0);
        assert_eq!(uniform, independent);
    }

    #[test]
    fn test_empty_input() {
        assert!(compute_sizing(&[], SizingMode::Uniform, DEFAULT_PADDING).is_empty());
        assert!(compute_sizing(&[], SizingMode::Independent, DEFAULT_PADDING).is_empty());
    }
}
