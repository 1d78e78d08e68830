// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 empack contributors

//! GO XML descriptor generation for Editorial Manager ingest.
//!
//! The descriptor is the manifest the receiving system reads first: it names
//! the archive, the metadata file, and every archived member in order.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use crate::logic::settings::JournalConfig;

/// Schema the receiving Editorial Manager instance resolves internally.
const SCHEMA_LOCATION: &str =
    "app://Aries.EditorialManager/Resources/XmlDefineTransformFiles/aries_import_go_file.xsd";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const GO_VERSION: &str = "1.0";
const IMPORT_TYPE_ID: &str = "2";
const LICENSE_PARAMETER: &str = "license-code";

/// Name recorded for the metadata file.
// TODO: generate a real JATS metadata file and reference it here.
pub const METADATA_FILE_NAME: &str = "fake name";

/// Render the descriptor document for one bundle.
///
/// `file_names` must list the archive members in the order they were
/// written; the receiving side reads them positionally.
pub fn render_go_descriptor(
    config: &JournalConfig,
    archive_name: &str,
    file_names: &[String],
) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut go = BytesStart::new("GO");
    go.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
    go.push_attribute(("xsi:noNamespaceSchemaLocation", SCHEMA_LOCATION));
    writer.write_event(Event::Start(go))?;

    writer.write_event(Event::Start(BytesStart::new("header")))?;

    let mut version = BytesStart::new("version");
    version.push_attribute(("number", GO_VERSION));
    writer.write_event(Event::Empty(version))?;

    // Editorial Manager keys the ingest on the license code here, not on
    // the journal-code setting.
    let mut journal = BytesStart::new("journal");
    journal.push_attribute(("code", config.license_code.as_str()));
    writer.write_event(Event::Empty(journal))?;

    let mut import_type = BytesStart::new("import-type");
    import_type.push_attribute(("id", IMPORT_TYPE_ID));
    writer.write_event(Event::Empty(import_type))?;

    writer.write_event(Event::Start(BytesStart::new("parameters")))?;
    let license_value = format!("{}_{}", config.submission_partner_code, config.license_code);
    let mut parameter = BytesStart::new("parameter");
    parameter.push_attribute(("name", LICENSE_PARAMETER));
    parameter.push_attribute(("value", license_value.as_str()));
    writer.write_event(Event::Empty(parameter))?;
    writer.write_event(Event::End(BytesEnd::new("parameters")))?;

    writer.write_event(Event::End(BytesEnd::new("header")))?;

    writer.write_event(Event::Start(BytesStart::new("filegroup")))?;

    let mut archive = BytesStart::new("archive-file");
    archive.push_attribute(("name", archive_name));
    writer.write_event(Event::Empty(archive))?;

    let mut metadata = BytesStart::new("metadata-file");
    metadata.push_attribute(("name", METADATA_FILE_NAME));
    writer.write_event(Event::Empty(metadata))?;

    for name in file_names {
        let mut file = BytesStart::new("file");
        file.push_attribute(("name", name.as_str()));
        writer.write_event(Event::Empty(file))?;
    }

    writer.write_event(Event::End(BytesEnd::new("filegroup")))?;
    writer.write_event(Event::End(BytesEnd::new("GO")))?;

    Ok(writer.into_inner().into_inner())
}

/// Render and write the descriptor next to its archive.
pub fn write_go_descriptor(
    path: &Path,
    config: &JournalConfig,
    archive_name: &str,
    file_names: &[String],
) -> Result<()> {
    let document = render_go_descriptor(config, archive_name, file_names)?;
    fs::write(path, document).with_context(|| format!("Failed to write descriptor {:?}", path))
}

/// Parsed view of a descriptor, for structural assertions.
#[cfg(test)]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GoDescriptor {
    pub journal_code: String,
    pub license_parameter: String,
    pub archive_file: String,
    pub metadata_file: String,
    pub files: Vec<String>,
}

#[cfg(test)]
pub fn parse_go_descriptor(document: &[u8]) -> Result<GoDescriptor> {
    use quick_xml::Reader;

    let text = std::str::from_utf8(document).context("Descriptor is not valid UTF-8")?;
    let mut reader = Reader::from_str(text);
    let mut parsed = GoDescriptor::default();

    loop {
        match reader.read_event()? {
            Event::Start(element) | Event::Empty(element) => {
                let attr = |name: &str| -> Result<Option<String>> {
                    Ok(element
                        .try_get_attribute(name)?
                        .map(|attribute| {
                            attribute.unescape_value().map(|value| value.into_owned())
                        })
                        .transpose()?)
                };
                match element.name().as_ref() {
                    b"journal" => {
                        if let Some(code) = attr("code")? {
                            parsed.journal_code = code;
                        }
                    }
                    b"parameter" => {
                        if let Some(value) = attr("value")? {
                            parsed.license_parameter = value;
                        }
                    }
                    b"archive-file" => {
                        if let Some(name) = attr("name")? {
                            parsed.archive_file = name;
                        }
                    }
                    b"metadata-file" => {
                        if let Some(name) = attr("name")? {
                            parsed.metadata_file = name;
                        }
                    }
                    b"file" => {
                        if let Some(name) = attr("name")? {
                            parsed.files.push(name);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parsed)
}
