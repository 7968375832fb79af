//! XML reading and writing.
//!
//! Only elements and attributes are kept; text, comments, processing
//! instructions, and declarations are skipped on read. Output is indented by
//! two spaces per level and starts with an XML declaration.

use std::io::Write;
use std::path::Path;

use inv_types::Element;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;

use crate::error::{CodecError, CodecResult};

/// Parse a document into its root element.
pub fn parse_document(text: &str) -> CodecResult<Element> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| CodecError::Malformed {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;
        match event {
            Event::Start(start) => stack.push(element_from_start(&start, &reader)?),
            Event::Empty(start) => {
                let element = element_from_start(&start, &reader)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                // quick-xml verifies that end tags match their start tags.
                let element = stack.pop().ok_or_else(|| CodecError::Malformed {
                    position: reader.buffer_position() as u64,
                    message: "unexpected end tag".into(),
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(CodecError::Unclosed(open.name().to_string()));
    }
    root.ok_or(CodecError::EmptyDocument)
}

fn element_from_start(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> CodecResult<Element> {
    let malformed = |message: String| CodecError::Malformed {
        position: reader.buffer_position() as u64,
        message,
    };

    let name = std::str::from_utf8(start.name().as_ref())
        .map(str::to_owned)
        .map_err(|e| malformed(e.to_string()))?;
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| malformed(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map(str::to_owned)
            .map_err(|e| malformed(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| malformed(e.to_string()))?
            .into_owned();
        element.set_attr(key, value);
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> CodecResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.push_child(element),
        None if root.is_some() => return Err(CodecError::MultipleRoots),
        None => *root = Some(element),
    }
    Ok(())
}

/// Serialize a tree as an indented XML document.
pub fn write_document(root: &Element) -> CodecResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(write_err)?;
    write_element(&mut writer, root)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(write_err)
}

fn write_err(e: impl std::fmt::Display) -> CodecError {
    CodecError::Write(e.to_string())
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> CodecResult<()> {
    let mut start = BytesStart::new(element.name());
    for (name, value) in element.attributes() {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if element.children().is_empty() {
        writer.write_event(Event::Empty(start)).map_err(write_err)?;
    } else {
        writer.write_event(Event::Start(start)).map_err(write_err)?;
        for child in element.children() {
            write_element(writer, child)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(element.name())))
            .map_err(write_err)?;
    }
    Ok(())
}

/// Read and parse a document from disk.
pub fn load_file(path: &Path) -> CodecResult<Element> {
    let text = std::fs::read_to_string(path).map_err(|e| CodecError::from(e).in_file(path))?;
    parse_document(&text).map_err(|e| e.in_file(path))
}

/// Write a document to disk, replacing the file atomically.
///
/// Missing parent directories are created.
pub fn save_file(path: &Path, root: &Element) -> CodecResult<()> {
    let text = write_document(root)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.persist(path).map_err(|e| CodecError::from(e.error).in_file(path))?;
    debug!(path = %path.display(), bytes = text.len(), "wrote document");
    Ok(())
}
