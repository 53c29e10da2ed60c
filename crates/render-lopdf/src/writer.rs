use crate::canvas::{ImageXObject, PageCanvas};
use crate::error::RenderError;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::content::Content;
use lopdf::xref::{Xref, XrefEntry, XrefType};
use lopdf::{Dictionary, Object, ObjectId, Stream, dictionary};
use std::io::{self, Seek, Write};

const PRODUCER: &str = concat!("iwb2pdf ", env!("CARGO_PKG_VERSION"));

/// A PDF writer that emits every page as soon as it is finished.
///
/// Object IDs for the page tree root and the catalog are reserved up front
/// so that page objects can point at their parent before it is written.
pub struct StreamingPdfWriter<W: Write + Seek> {
    writer: W,
    xref: Xref,
    max_id: u32,
    pages_id: ObjectId,
    catalog_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl<W: Write + Seek> StreamingPdfWriter<W> {
    pub fn new(mut writer: W, version: &str) -> io::Result<Self> {
        writer.write_all(format!("%PDF-{}\n%âãÏÓ\n", version).as_bytes())?;

        Ok(Self {
            writer,
            xref: Xref::new(0, XrefType::CrossReferenceTable),
            max_id: 2,
            pages_id: (1, 0),
            catalog_id: (2, 0),
            page_ids: Vec::new(),
        })
    }

    pub fn new_object_id(&mut self) -> ObjectId {
        self.max_id += 1;
        (self.max_id, 0)
    }

    /// Writes `object` under a fresh ID.
    pub fn write_object(&mut self, object: &Object) -> io::Result<ObjectId> {
        let id = self.new_object_id();
        self.write_object_at(id, object)?;
        Ok(id)
    }

    fn write_object_at(&mut self, id: ObjectId, object: &Object) -> io::Result<()> {
        encode::write_indirect_object(&mut self.writer, id, object, &mut self.xref)
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Writes the content, resources and page object of a finished page.
    pub fn finish_page(&mut self, canvas: PageCanvas) -> Result<ObjectId, RenderError> {
        let (size, operations, alpha_states, images) = canvas.into_parts();

        let content = deflated_stream(dictionary! {}, &Content { operations }.encode()?)?;
        let content_id = self.write_object(&Object::Stream(content))?;

        let mut resources = Dictionary::new();
        if !alpha_states.is_empty() {
            let mut states = Dictionary::new();
            for (i, (fill, stroke)) in alpha_states.iter().enumerate() {
                states.set(
                    format!("GS{i}"),
                    dictionary! { "Type" => "ExtGState", "ca" => *fill, "CA" => *stroke },
                );
            }
            resources.set("ExtGState", states);
        }
        if !images.is_empty() {
            let mut xobjects = Dictionary::new();
            for (i, image) in images.into_iter().enumerate() {
                let image_id = self.write_image(image)?;
                xobjects.set(format!("Im{i}"), image_id);
            }
            resources.set("XObject", xobjects);
        }

        let page = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), size.width.into(), size.height.into()],
            "Contents" => content_id,
            "Resources" => resources,
        };
        let page_id = self.write_object(&page.into())?;
        self.writer.flush()?;
        self.page_ids.push(page_id);
        Ok(page_id)
    }

    fn write_image(&mut self, image: ImageXObject) -> Result<ObjectId, RenderError> {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
        };

        if let Some(alpha) = image.alpha {
            let mask = deflated_stream(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => image.width as i64,
                    "Height" => image.height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8_i64,
                },
                &alpha,
            )?;
            let mask_id = self.write_object(&Object::Stream(mask))?;
            dict.set("SMask", mask_id);
        }

        let stream = deflated_stream(dict, &image.rgb)?;
        Ok(self.write_object(&Object::Stream(stream))?)
    }

    /// Writes the page tree, catalog, document info, cross-reference table
    /// and trailer, and returns the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => self.page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<Object>>(),
            "Count" => self.page_ids.len() as i64,
        };
        self.write_object_at(self.pages_id, &pages_dict.into())?;

        let catalog_dict = dictionary! { "Type" => "Catalog", "Pages" => self.pages_id };
        self.write_object_at(self.catalog_id, &catalog_dict.into())?;

        let info_id = self.write_object(
            &dictionary! {
                "Producer" => Object::string_literal(PRODUCER),
            }
            .into(),
        )?;

        let xref_start = self.writer.stream_position()?;
        self.xref.size = self.max_id + 1;
        encode::write_xref(&mut self.writer, &self.xref)?;

        let trailer = dictionary! {
            "Size" => self.xref.size as i64,
            "Root" => self.catalog_id,
            "Info" => info_id,
        };
        writeln!(self.writer, "trailer")?;
        encode::write_dictionary(&mut self.writer, &trailer)?;
        writeln!(self.writer, "\nstartxref")?;
        writeln!(self.writer, "{}", xref_start)?;
        write!(self.writer, "%%EOF")?;

        self.writer.flush()?;
        Ok(self.writer)
    }
}

fn deflated_stream(mut dict: Dictionary, data: &[u8]) -> io::Result<Stream> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    dict.set("Filter", "FlateDecode");
    Ok(Stream::new(dict, encoder.finish()?))
}

/// PDF token serialisation for the streaming writer.
///
/// Objects are encoded into a byte buffer first, so an indirect object is
/// written with a single call once its offset is recorded.
mod encode {
    use super::*;
    use lopdf::StringFormat;

    const DELIMITERS: &[u8] = b"()<>[]{}/%#";

    pub fn write_indirect_object<W: Write + Seek>(
        writer: &mut W,
        id: ObjectId,
        object: &Object,
        xref: &mut Xref,
    ) -> io::Result<()> {
        let offset = u32::try_from(writer.stream_position()?)
            .map_err(|_| io::Error::other("PDF output exceeds the 4 GiB cross-reference limit"))?;
        xref.insert(id.0, XrefEntry::Normal { offset, generation: id.1 });

        let mut buf = format!("{} {} obj\n", id.0, id.1).into_bytes();
        object_into(&mut buf, object);
        buf.extend_from_slice(b"\nendobj\n");
        writer.write_all(&buf)
    }

    pub fn write_dictionary<W: Write>(writer: &mut W, dict: &Dictionary) -> io::Result<()> {
        let mut buf = Vec::new();
        dictionary_into(&mut buf, dict);
        writer.write_all(&buf)
    }

    fn object_into(buf: &mut Vec<u8>, object: &Object) {
        match object {
            Object::Null => buf.extend_from_slice(b"null"),
            Object::Boolean(value) => buf.extend_from_slice(if *value { b"true" } else { b"false" }),
            Object::Integer(value) => buf.extend_from_slice(value.to_string().as_bytes()),
            Object::Real(value) => real_into(buf, *value),
            Object::Name(name) => name_into(buf, name),
            Object::String(bytes, StringFormat::Literal) => literal_into(buf, bytes),
            Object::String(bytes, StringFormat::Hexadecimal) => {
                buf.push(b'<');
                for byte in bytes {
                    buf.extend_from_slice(format!("{byte:02X}").as_bytes());
                }
                buf.push(b'>');
            }
            Object::Array(items) => {
                buf.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        buf.push(b' ');
                    }
                    object_into(buf, item);
                }
                buf.push(b']');
            }
            Object::Dictionary(dict) => dictionary_into(buf, dict),
            Object::Stream(stream) => {
                let mut dict = stream.dict.clone();
                dict.set("Length", stream.content.len() as i64);
                dictionary_into(buf, &dict);
                buf.extend_from_slice(b"\nstream\n");
                buf.extend_from_slice(&stream.content);
                buf.extend_from_slice(b"\nendstream");
            }
            Object::Reference((number, generation)) => {
                buf.extend_from_slice(format!("{number} {generation} R").as_bytes());
            }
        }
    }

    /// Keys keep their insertion order.
    fn dictionary_into(buf: &mut Vec<u8>, dict: &Dictionary) {
        buf.extend_from_slice(b"<<");
        for (key, value) in dict.iter() {
            name_into(buf, key);
            buf.push(b' ');
            object_into(buf, value);
            buf.push(b' ');
        }
        buf.extend_from_slice(b">>");
    }

    /// At most four decimals, trailing zeros dropped. PDF has no NaN or
    /// infinity, so those become 0.
    fn real_into(buf: &mut Vec<u8>, value: f32) {
        if !value.is_finite() {
            buf.push(b'0');
            return;
        }
        let text = format!("{value:.4}");
        let text = text.trim_end_matches('0').trim_end_matches('.');
        match text {
            "" | "-" | "-0" => buf.push(b'0'),
            text => buf.extend_from_slice(text.as_bytes()),
        }
    }

    fn name_into(buf: &mut Vec<u8>, name: &[u8]) {
        buf.push(b'/');
        for &byte in name {
            if (b'!'..=b'~').contains(&byte) && !DELIMITERS.contains(&byte) {
                buf.push(byte);
            } else {
                buf.extend_from_slice(format!("#{byte:02X}").as_bytes());
            }
        }
    }

    fn literal_into(buf: &mut Vec<u8>, bytes: &[u8]) {
        buf.push(b'(');
        for &byte in bytes {
            match byte {
                b'(' | b')' | b'\\' => buf.extend_from_slice(&[b'\\', byte]),
                b'\r' => buf.extend_from_slice(b"\\r"),
                b'\n' => buf.extend_from_slice(b"\\n"),
                _ => buf.push(byte),
            }
        }
        buf.push(b')');
    }

    /// Writes a single xref subsection covering IDs `0..xref.size`. IDs that
    /// were reserved but never written are listed as free.
    pub fn write_xref<W: Write>(writer: &mut W, xref: &Xref) -> io::Result<()> {
        let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", xref.size);
        for id in 1..xref.size {
            match xref.entries.get(&id) {
                Some(XrefEntry::Normal { offset, generation }) => {
                    table.push_str(&format!("{offset:010} {generation:05} n \n"));
                }
                _ => table.push_str("0000000000 65535 f \n"),
            }
        }
        writer.write_all(table.as_bytes())
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use iwb2pdf_types::Size;
    use std::io::Cursor;

    fn page(width: f32, height: f32) -> PageCanvas {
        let mut canvas = PageCanvas::new(Size::new(width, height));
        canvas.push("re", vec![0.into(), 0.into(), 5.into(), 5.into()]);
        canvas.push("f", vec![]);
        canvas
    }

    #[test]
    fn test_written_document_loads_with_pages_in_order() {
        let mut writer = StreamingPdfWriter::new(Cursor::new(Vec::new()), "1.7").unwrap();
        writer.finish_page(page(60.0, 50.0)).unwrap();
        writer.finish_page(page(120.0, 70.0)).unwrap();
        assert_eq!(writer.page_count(), 2);
        let bytes = writer.finish().unwrap().into_inner();

        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);

        let widths: Vec<f32> = pages
            .values()
            .map(|id| {
                let media_box = doc.get_dictionary(*id).unwrap().get(b"MediaBox").unwrap();
                media_box.as_array().unwrap()[2].as_float().unwrap()
            })
            .collect();
        assert_eq!(widths, vec![60.0, 120.0]);
    }

    #[test]
    fn test_alpha_states_and_images_become_resources() {
        let mut canvas = page(10.0, 10.0);
        let gs = canvas.alpha_state(0.5, 0.5);
        canvas.push("gs", vec![Object::Name(gs.into_bytes())]);
        let name = canvas.add_image(ImageXObject {
            width: 1,
            height: 1,
            rgb: vec![255, 0, 0],
            alpha: Some(vec![128]),
        });
        canvas.push("Do", vec![Object::Name(name.into_bytes())]);

        let mut writer = StreamingPdfWriter::new(Cursor::new(Vec::new()), "1.7").unwrap();
        let page_id = writer.finish_page(canvas).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let resources = doc.get_dictionary(page_id).unwrap().get(b"Resources").unwrap().as_dict().unwrap();
        assert!(resources.get(b"ExtGState").unwrap().as_dict().unwrap().has(b"GS0"));
        let image_id = resources
            .get(b"XObject")
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"Im0")
            .unwrap()
            .as_reference()
            .unwrap();
        let image = doc.get_object(image_id).unwrap().as_stream().unwrap();
        assert!(image.dict.has(b"SMask"));
    }

    #[test]
    fn test_empty_document_is_well_formed() {
        let writer = StreamingPdfWriter::new(Cursor::new(Vec::new()), "1.7").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().is_empty());
    }
}
