use lopdf::content::{Content, Operation};
use lopdf::{Document as LopdfDocument, Object, ObjectId, Stream, dictionary};
use std::path::Path;

/// Page sizes (width, height) from each page's MediaBox, in page order.
/// An inherited MediaBox is looked up through the page tree.
pub fn page_sizes(doc: &LopdfDocument) -> Vec<(f32, f32)> {
    doc.get_pages()
        .values()
        .map(|page_id| {
            let media_box = media_box(doc, *page_id).expect("page without MediaBox");
            let coord = |i: usize| media_box[i].as_float().expect("non-numeric MediaBox");
            (coord(2) - coord(0), coord(3) - coord(1))
        })
        .collect()
}

fn media_box(doc: &LopdfDocument, mut node_id: ObjectId) -> Option<Vec<Object>> {
    loop {
        let node = doc.get_dictionary(node_id).ok()?;
        if let Ok(media_box) = node.get(b"MediaBox").and_then(Object::as_array) {
            return Some(media_box.clone());
        }
        node_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
}

/// Decoded content operations of one page (1-based)
pub fn page_operations(doc: &LopdfDocument, page_number: u32) -> Vec<Operation> {
    let page_id = doc.get_pages()[&page_number];
    let content = doc.get_page_content(page_id).expect("page content");
    Content::decode(&content).expect("decodable content").operations
}

/// Operands of the first operation named `operator`, as floats
pub fn first_operands(operations: &[Operation], operator: &str) -> Option<Vec<f32>> {
    operations
        .iter()
        .find(|op| op.operator == operator)
        .map(|op| op.operands.iter().filter_map(|o| o.as_float().ok()).collect())
}

/// Writes a single-page PDF of the given size, standing in for converter output
pub fn write_single_page_pdf(path: &Path, width: i64, height: i64) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = LopdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content = Content {
        operations: vec![
            Operation::new("re", vec![0.into(), 0.into(), width.into(), height.into()]),
            Operation::new("f", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    // MediaBox is inherited from the page tree, as some converters emit it.
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
    };
    doc.objects.insert(pages_id, pages.into());
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path)?;
    Ok(())
}

/// Assert the number of pages in a PDF
#[macro_export]
macro_rules! assert_pdf_page_count {
    ($pdf:expr, $count:expr) => {
        assert_eq!(
            $pdf.page_count(),
            $count,
            "Expected {} pages, got {}",
            $count,
            $pdf.page_count()
        );
    };
}

/// Assert every page size, in order, within a small tolerance
#[macro_export]
macro_rules! assert_page_sizes {
    ($pdf:expr, $expected:expr) => {
        let actual = $pdf.page_sizes();
        let expected: Vec<(f32, f32)> = $expected.to_vec();
        assert_eq!(actual.len(), expected.len(), "page count differs: {:?} vs {:?}", actual, expected);
        for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
            assert!(
                (a.0 - e.0).abs() < 0.01 && (a.1 - e.1).abs() < 0.01,
                "page {} is {:?}, expected {:?}",
                i + 1,
                a,
                e
            );
        }
    };
}
