use iwb2pdf_types::Size;
use lopdf::Object;
use lopdf::content::Operation;

/// Decoded raster image ready to be written as an image XObject.
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    /// 8-bit RGB samples, row-major, top row first.
    pub rgb: Vec<u8>,
    /// 8-bit alpha samples; `None` for fully opaque images.
    pub alpha: Option<Vec<u8>>,
}

/// Content and resources of a single output page.
///
/// Coordinates follow PDF conventions: origin at the bottom-left, y up.
#[derive(Debug)]
pub struct PageCanvas {
    size: Size,
    operations: Vec<Operation>,
    alpha_states: Vec<(f32, f32)>,
    images: Vec<ImageXObject>,
}

impl PageCanvas {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            operations: Vec::new(),
            alpha_states: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn push(&mut self, op: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(op, operands));
    }

    pub fn save_state(&mut self) {
        self.push("q", vec![]);
    }

    pub fn restore_state(&mut self) {
        self.push("Q", vec![]);
    }

    /// Concatenates `[a b c d e f]` onto the current transformation matrix.
    pub fn transform(&mut self, matrix: [f32; 6]) {
        self.push("cm", matrix.iter().map(|v| Object::Real(*v)).collect());
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.transform([1.0, 0.0, 0.0, 1.0, dx, dy]);
    }

    /// Returns the resource name of a graphics state with the given fill and
    /// stroke alpha, registering it on first use.
    pub fn alpha_state(&mut self, fill: f32, stroke: f32) -> String {
        let position = match self.alpha_states.iter().position(|s| *s == (fill, stroke)) {
            Some(position) => position,
            None => {
                self.alpha_states.push((fill, stroke));
                self.alpha_states.len() - 1
            }
        };
        format!("GS{position}")
    }

    /// Registers an image and returns its resource name.
    pub fn add_image(&mut self, image: ImageXObject) -> String {
        self.images.push(image);
        format!("Im{}", self.images.len() - 1)
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub(crate) fn into_parts(self) -> (Size, Vec<Operation>, Vec<(f32, f32)>, Vec<ImageXObject>) {
        (self.size, self.operations, self.alpha_states, self.images)
    }
}
