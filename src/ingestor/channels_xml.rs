//! Streaming parser for `*.channels.xml` files.
//!
//! Channel files are small, flat documents:
//!
//! ```xml
//! <channels>
//!   <channel site="tvguide.com" lang="en" xmltv_id="CNN.us" site_id="123">CNN</channel>
//! </channels>
//! ```
//!
//! Only `<channel>` elements that are direct children of a `<channels>` root
//! are collected. Malformed XML and documents without a top-level
//! `<channels>` element are errors so the caller can log and skip the file;
//! a `<channels>` root with no entries parses to an empty list.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

use crate::errors::{AppError, AppResult};

/// Raw channel element before field fallbacks are applied.
///
/// Attributes that are present but empty are kept as `Some("")`; the record
/// mapping layer treats those the same as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelEntry {
    pub site: Option<String>,
    pub lang: Option<String>,
    pub xmltv_id: Option<String>,
    pub site_id: Option<String>,
    pub name: Option<String>,
}

impl ChannelEntry {
    fn from_attributes(element: &BytesStart) -> Self {
        let attrs = parse_attributes(element);
        Self {
            site: attrs.get("site").cloned(),
            lang: attrs.get("lang").cloned(),
            xmltv_id: attrs.get("xmltv_id").cloned(),
            site_id: attrs.get("site_id").cloned(),
            name: None,
        }
    }
}

/// Parse one channel file into its raw entries.
///
/// `path` is only used for error context.
pub fn parse_channel_entries(path: &str, content: &str) -> AppResult<Vec<ChannelEntry>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut saw_collection = false;

    let mut current_entry: Option<ChannelEntry> = None;
    let mut element_stack: Vec<String> = Vec::new();
    let mut current_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = element_name(path, e.name().as_ref())?;

                if name == "channels" && element_stack.is_empty() {
                    saw_collection = true;
                }
                if name == "channel" && element_stack.as_slice() == ["channels"] {
                    current_entry = Some(ChannelEntry::from_attributes(e));
                }

                element_stack.push(name);
                current_text.clear();
            }

            Ok(Event::End(ref e)) => {
                let name = element_name(path, e.name().as_ref())?;

                if name == "channel" {
                    if let Some(mut entry) = current_entry.take() {
                        let text = current_text.trim();
                        if !text.is_empty() {
                            entry.name = Some(text.to_string());
                        }
                        entries.push(entry);
                    }
                }

                element_stack.pop();
                current_text.clear();
            }

            Ok(Event::Empty(ref e)) => {
                let name = element_name(path, e.name().as_ref())?;

                if name == "channels" && element_stack.is_empty() {
                    saw_collection = true;
                }
                // Self-closing channel carries no display name.
                if name == "channel" && element_stack.as_slice() == ["channels"] {
                    entries.push(ChannelEntry::from_attributes(e));
                }
            }

            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| AppError::file_parse(path, format!("invalid text: {e}")))?;
                current_text.push_str(&text);
            }

            Ok(Event::CData(e)) => {
                let text = std::str::from_utf8(&e)
                    .map_err(|e| AppError::file_parse(path, format!("invalid CDATA: {e}")))?;
                current_text.push_str(text);
            }

            Ok(Event::Eof) => break,

            Err(e) => {
                return Err(AppError::file_parse(path, format!("XML parsing error: {e}")));
            }

            _ => {} // Ignore comments, processing instructions, declarations.
        }
    }

    if !saw_collection {
        return Err(AppError::file_parse(path, "no <channels> element"));
    }

    Ok(entries)
}

fn element_name(path: &str, raw: &[u8]) -> AppResult<String> {
    std::str::from_utf8(raw)
        .map(|s| s.to_string())
        .map_err(|e| AppError::file_parse(path, format!("invalid UTF-8 in element name: {e}")))
}

fn parse_attributes(element: &BytesStart) -> HashMap<String, String> {
    let mut attrs = HashMap::new();

    for attr in element.attributes().flatten() {
        if let (Ok(key), Ok(value)) = (
            std::str::from_utf8(attr.key.as_ref()),
            attr.unescape_value(),
        ) {
            attrs.insert(key.to_string(), value.to_string());
        }
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_channel_elements() {
        let content = r#"<?xml version="1.0" encoding="UTF-8"?>
<channels>
  <channel site="tvguide.com" lang="en" xmltv_id="CNN.us" site_id="123">CNN</channel>
  <channel site="tvguide.com" lang="es" xmltv_id="Canal5.mx" site_id="456">Canal 5</channel>
</channels>"#;

        let entries = parse_channel_entries("test.channels.xml", content).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].site.as_deref(), Some("tvguide.com"));
        assert_eq!(entries[0].xmltv_id.as_deref(), Some("CNN.us"));
        assert_eq!(entries[0].name.as_deref(), Some("CNN"));
        assert_eq!(entries[1].lang.as_deref(), Some("es"));
        assert_eq!(entries[1].name.as_deref(), Some("Canal 5"));
    }

    #[test]
    fn test_self_closing_channel_has_no_name() {
        let content = r#"<channels><channel site="a.com" xmltv_id="A.us"/></channels>"#;

        let entries = parse_channel_entries("test.channels.xml", content).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, None);
        assert_eq!(entries[0].lang, None);
    }

    #[test]
    fn test_unescapes_entities_in_names_and_attributes() {
        let content = r#"<channels><channel xmltv_id="AandE.us" site="a&amp;e.com">A&amp;E</channel></channels>"#;

        let entries = parse_channel_entries("test.channels.xml", content).unwrap();
        assert_eq!(entries[0].name.as_deref(), Some("A&E"));
        assert_eq!(entries[0].site.as_deref(), Some("a&e.com"));
    }

    #[test]
    fn test_cdata_name() {
        let content = "<channels><channel xmltv_id=\"X.us\"><![CDATA[News & Weather]]></channel></channels>";

        let entries = parse_channel_entries("test.channels.xml", content).unwrap();
        assert_eq!(entries[0].name.as_deref(), Some("News & Weather"));
    }

    #[test]
    fn test_missing_channels_root_is_an_error() {
        let content = r#"<tv><channel xmltv_id="CNN.us">CNN</channel></tv>"#;

        let error = parse_channel_entries("sites/x/x.channels.xml", content).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("sites/x/x.channels.xml"));
        assert!(message.contains("no <channels> element"));
    }

    #[test]
    fn test_empty_collection_is_not_an_error() {
        for content in ["<channels></channels>", "<channels/>"] {
            let entries = parse_channel_entries("test.channels.xml", content).unwrap();
            assert!(entries.is_empty());
        }
    }

    #[test]
    fn test_nested_channel_elements_are_ignored() {
        let content = r#"<channels><group><channel xmltv_id="CNN.us">CNN</channel></group></channels>"#;

        let entries = parse_channel_entries("test.channels.xml", content).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let content = r#"<channels><channel xmltv_id="CNN.us">CNN</chan></channels>"#;

        let result = parse_channel_entries("test.channels.xml", content);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_attribute_is_preserved_as_empty() {
        let content = r#"<channels><channel site="" xmltv_id="X.us">X</channel></channels>"#;

        let entries = parse_channel_entries("test.channels.xml", content).unwrap();
        assert_eq!(entries[0].site.as_deref(), Some(""));
    }
}
