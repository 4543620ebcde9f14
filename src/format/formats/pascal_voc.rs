//! Pascal VOC XML format implementation.
//!
//! Implements the Pascal Visual Object Classes (VOC) annotation format,
//! which uses one XML file per image.

use std::io::Write;
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::format::common::{ensure_extension, parse_number, read_text, write_atomic};
use crate::format::error::FormatError;
use crate::format::image_info::ImageInfo;
use crate::format::traits::{LabelCodec, ReadContext, ReadOutcome, WriteContext};
use crate::model::{BoundingBox, Shape};

/// Pascal VOC XML format.
///
/// Supports:
/// - Bounding boxes with integer pixel coordinates
/// - The `difficult` flag per object
/// - The `verified` attribute on the root element
///
/// Does not support:
/// - Category colors
pub struct PascalVocFormat;

impl LabelCodec for PascalVocFormat {
    fn id(&self) -> &'static str {
        "voc"
    }

    fn display_name(&self) -> &'static str {
        "PascalVOC"
    }

    fn extension(&self) -> &'static str {
        "xml"
    }

    fn read(&self, path: &Path, _ctx: &ReadContext<'_>) -> Result<ReadOutcome, FormatError> {
        log::debug!("Reading Pascal VOC annotations from {:?}", path);

        let content = read_text(path)?;
        let outcome = parse_xml(path, &content)?;

        log::info!(
            "Read {} objects from {:?} (verified: {})",
            outcome.shapes.len(),
            path,
            outcome.verified
        );
        Ok(outcome)
    }

    fn write(
        &self,
        path: &Path,
        shapes: &[Shape],
        ctx: &WriteContext<'_>,
    ) -> Result<PathBuf, FormatError> {
        let path = ensure_extension(path, self.extension());
        log::debug!("Writing Pascal VOC annotations to {:?}", path);

        let xml_content = build_xml(ctx.image, shapes, ctx.verified)?;
        write_atomic(&path, &xml_content)?;

        log::info!("Wrote {} objects to {:?}", shapes.len(), path);
        Ok(path)
    }
}

/// Build XML content for an image.
fn build_xml(image: &ImageInfo, shapes: &[Shape], verified: bool) -> Result<Vec<u8>, FormatError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;

    let mut root = BytesStart::new("annotation");
    if verified {
        root.push_attribute(("verified", "yes"));
    }
    writer.write_event(Event::Start(root))?;

    write_text_element(&mut writer, "folder", &image.folder_name())?;
    write_text_element(&mut writer, "filename", &image.filename())?;
    write_text_element(&mut writer, "path", &image.path.to_string_lossy())?;

    writer.write_event(Event::Start(BytesStart::new("source")))?;
    write_text_element(&mut writer, "database", "Unknown")?;
    writer.write_event(Event::End(BytesEnd::new("source")))?;

    writer.write_event(Event::Start(BytesStart::new("size")))?;
    write_text_element(&mut writer, "width", &image.width.to_string())?;
    write_text_element(&mut writer, "height", &image.height.to_string())?;
    write_text_element(&mut writer, "depth", &image.depth.to_string())?;
    writer.write_event(Event::End(BytesEnd::new("size")))?;

    write_text_element(&mut writer, "segmented", "0")?;

    for shape in shapes {
        let Some(bbox) = shape.bounding_box() else {
            log::warn!("Skipping shape '{}' without points", shape.label);
            continue;
        };
        let (xmin, ymin, xmax, ymax) = pixel_bounds(&bbox);
        let truncated = xmin <= 0
            || ymin <= 0
            || xmax >= i64::from(image.width)
            || ymax >= i64::from(image.height);

        writer.write_event(Event::Start(BytesStart::new("object")))?;
        write_text_element(&mut writer, "name", &shape.label)?;
        write_text_element(&mut writer, "pose", "Unspecified")?;
        write_text_element(&mut writer, "truncated", if truncated { "1" } else { "0" })?;
        write_text_element(
            &mut writer,
            "difficult",
            if shape.difficult { "1" } else { "0" },
        )?;

        writer.write_event(Event::Start(BytesStart::new("bndbox")))?;
        write_text_element(&mut writer, "xmin", &xmin.to_string())?;
        write_text_element(&mut writer, "ymin", &ymin.to_string())?;
        write_text_element(&mut writer, "xmax", &xmax.to_string())?;
        write_text_element(&mut writer, "ymax", &ymax.to_string())?;
        writer.write_event(Event::End(BytesEnd::new("bndbox")))?;

        writer.write_event(Event::End(BytesEnd::new("object")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("annotation")))?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

/// Integer pixel bounds of a box, as stored in `<bndbox>`.
fn pixel_bounds(bbox: &BoundingBox) -> (i64, i64, i64, i64) {
    (
        bbox.x_min.round() as i64,
        bbox.y_min.round() as i64,
        bbox.x_max.round() as i64,
        bbox.y_max.round() as i64,
    )
}

/// Write a simple text element.
fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), FormatError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Object fields collected between `<object>` and `</object>`.
#[derive(Default)]
struct ObjectFields {
    name: String,
    difficult: bool,
    xmin: Option<f32>,
    ymin: Option<f32>,
    xmax: Option<f32>,
    ymax: Option<f32>,
}

impl ObjectFields {
    fn into_shape(self, path: &Path) -> Result<Option<Shape>, FormatError> {
        if self.name.is_empty() {
            log::debug!("Skipping unnamed object in {:?}", path);
            return Ok(None);
        }
        let (Some(xmin), Some(ymin), Some(xmax), Some(ymax)) =
            (self.xmin, self.ymin, self.xmax, self.ymax)
        else {
            return Err(FormatError::invalid_file(
                path,
                format!("Object '{}' has an incomplete <bndbox>", self.name),
            ));
        };

        // Stored bounds are integers; float text is truncated.
        let shape = Shape::rectangle(
            self.name,
            xmin.trunc(),
            ymin.trunc(),
            xmax.trunc(),
            ymax.trunc(),
        )
        .with_difficult(self.difficult);
        Ok(Some(shape))
    }
}

/// Parse a Pascal VOC XML document.
fn parse_xml(path: &Path, content: &str) -> Result<ReadOutcome, FormatError> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut outcome = ReadOutcome::default();
    let mut stack: Vec<String> = Vec::new();
    let mut object: Option<ObjectFields> = None;
    let mut saw_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                if stack.is_empty() {
                    if name != "annotation" {
                        return Err(FormatError::invalid_file(
                            path,
                            format!("Expected <annotation> root, found <{}>", name),
                        ));
                    }
                    saw_root = true;
                    for attr in e.attributes() {
                        let attr = attr.map_err(quick_xml::Error::from)?;
                        if attr.key.as_ref() == b"verified" {
                            outcome.verified = attr.unescape_value()? == "yes";
                        }
                    }
                } else if name == "object" {
                    object = Some(ObjectFields::default());
                }
                stack.push(name);
            }
            Event::End(_) => {
                if stack.pop().as_deref() == Some("object") {
                    if let Some(fields) = object.take() {
                        if let Some(shape) = fields.into_shape(path)? {
                            outcome.shapes.push(shape);
                        }
                    }
                }
            }
            Event::Text(ref e) => {
                let text = e.unescape()?.into_owned();
                let (Some(fields), Some(element)) = (object.as_mut(), stack.last()) else {
                    continue;
                };
                let in_bndbox = stack.len() >= 2 && stack[stack.len() - 2] == "bndbox";

                match (element.as_str(), in_bndbox) {
                    ("name", false) => fields.name = text,
                    ("difficult", false) => fields.difficult = text.trim() == "1",
                    ("xmin", true) => fields.xmin = parse_coordinate(path, &text)?,
                    ("ymin", true) => fields.ymin = parse_coordinate(path, &text)?,
                    ("xmax", true) => fields.xmax = parse_coordinate(path, &text)?,
                    ("ymax", true) => fields.ymax = parse_coordinate(path, &text)?,
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(FormatError::invalid_file(path, "Missing <annotation> root"));
    }
    if let Some(open) = stack.last() {
        return Err(FormatError::invalid_file(
            path,
            format!("Unexpected end of file inside <{}>", open),
        ));
    }
    Ok(outcome)
}

fn parse_coordinate(path: &Path, text: &str) -> Result<Option<f32>, FormatError> {
    parse_number(text)
        .map(Some)
        .ok_or_else(|| FormatError::invalid_file(path, format!("Invalid coordinate '{}'", text)))
}
