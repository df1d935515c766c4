//! SDF `<plugin>` descriptors.
//!
//! A model file attaches a plugin with an element such as:
//!
//! ```xml
//! <plugin name="flapper" filename="libflapping_plugin.so">
//!   <joint_name>wing_joint</joint_name>
//!   <amplitude>0.5</amplitude>
//! </plugin>
//! ```
//!
//! The host hands the parsed element to the plugin at load time. Children are
//! kept as raw text; the plugin decides how to interpret them.

use std::fmt::Display;
use std::io::BufRead;
use std::str::FromStr;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, Result};

/// A `<plugin>` element: instance name, library filename and flat fields.
///
/// # Example
///
/// ```
/// use sim_host::PluginElement;
///
/// let element = PluginElement::new("flapper", "libflapping_plugin.so")
///     .with("joint_name", "wing_joint")
///     .with("frequency", 2.0);
///
/// assert_eq!(element.get::<String>("joint_name").unwrap(), "wing_joint");
/// assert_eq!(element.get::<f64>("frequency").unwrap(), 2.0);
/// assert_eq!(element.get_or("z_frequency", 1.0).unwrap(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PluginElement {
    name: String,
    filename: String,
    fields: Vec<(String, String)>,
}

impl PluginElement {
    /// Create an element with no fields.
    #[must_use]
    pub fn new(name: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Instance name (`name` attribute).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Library filename (`filename` attribute).
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Check whether a field is present.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.get_str(key).is_some()
    }

    /// Raw text of a field.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parse a required field.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing or does not parse as `T`.
    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self
            .get_str(key)
            .ok_or_else(|| DescriptorError::missing_field(&self.name, key))?;
        self.parse_field(key, raw)
    }

    /// Parse an optional field, falling back to `default` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is present but does not parse as `T`.
    pub fn get_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get_str(key) {
            Some(raw) => self.parse_field(key, raw),
            None => Ok(default),
        }
    }

    /// Iterate over fields in document order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn parse_field<T>(&self, key: &str, raw: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| DescriptorError::InvalidField {
                plugin: self.name.clone(),
                field: key.to_string(),
                value: raw.to_string(),
                reason: e.to_string(),
            })
    }

    /// Parse the first `<plugin>` element found anywhere in `xml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML is malformed or contains no `<plugin>`.
    pub fn parse_str(xml: &str) -> Result<Self> {
        Self::parse_all(xml)?
            .into_iter()
            .next()
            .ok_or_else(|| DescriptorError::missing_element("plugin", "document"))
    }

    /// Parse every `<plugin>` element in `xml`, in document order.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML is malformed or a plugin lacks its
    /// `name` attribute.
    pub fn parse_all(xml: &str) -> Result<Vec<Self>> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        parse_plugins(&mut reader)
    }
}

fn parse_plugins<R: BufRead>(reader: &mut Reader<R>) -> Result<Vec<PluginElement>> {
    let mut buf = Vec::new();
    let mut plugins = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"plugin" => {
                plugins.push(parse_plugin(reader, e)?);
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"plugin" => {
                plugins.push(plugin_header(e)?);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(DescriptorError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(plugins)
}

fn plugin_header(start: &BytesStart) -> Result<PluginElement> {
    let name = get_attribute(start, "name")?;
    let filename = get_attribute_opt(start, "filename").unwrap_or_default();
    Ok(PluginElement::new(name, filename))
}

/// Parse the children of a `<plugin>` element as flat key/value fields.
fn parse_plugin<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<PluginElement> {
    let mut plugin = plugin_header(start)?;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let key = element_name(e);
                let value = read_text(reader, e.name().as_ref())?;
                plugin.set(key, value);
            }
            Ok(Event::Empty(ref e)) => {
                plugin.set(element_name(e), "");
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"plugin" => break,
            Ok(Event::Eof) => {
                return Err(DescriptorError::XmlParse("unexpected EOF in plugin".into()));
            }
            Ok(_) => {}
            Err(e) => return Err(DescriptorError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(plugin)
}

/// Collect the text content of the current element up to its end tag.
///
/// Nested elements are skipped.
fn read_text<R: BufRead>(reader: &mut Reader<R>, name: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Text(ref t)) => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| DescriptorError::XmlParse(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Ok(Event::CData(ref c)) => {
                text.push_str(&String::from_utf8_lossy(c));
            }
            Ok(Event::Start(ref e)) => {
                let nested = e.name().as_ref().to_vec();
                skip_element(reader, &nested)?;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == name => break,
            Ok(Event::Eof) => {
                return Err(DescriptorError::XmlParse(format!(
                    "unexpected EOF in {}",
                    String::from_utf8_lossy(name)
                )));
            }
            Ok(_) => {}
            Err(e) => return Err(DescriptorError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(text.trim().to_string())
}

/// Get a required attribute value.
fn get_attribute(e: &BytesStart, name: &'static str) -> Result<String> {
    get_attribute_opt(e, name)
        .ok_or_else(|| DescriptorError::missing_attribute(name, element_name(e)))
}

/// Get an optional attribute value.
fn get_attribute_opt(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return String::from_utf8(attr.value.to_vec()).ok();
        }
    }
    None
}

/// Get element name as string for error messages.
fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

/// Skip an element and all its children.
fn skip_element<R: BufRead>(reader: &mut Reader<R>, name: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == name => {
                depth += 1;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == name => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(DescriptorError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MODEL_SDF: &str = r#"
        <sdf version="1.6">
          <model name="flapper">
            <link name="body"/>
            <plugin name="flapping" filename="libflapping_plugin.so">
              <joint_name>wing_joint</joint_name>
              <amplitude>0.5</amplitude>
              <frequency> 2 </frequency>
              <z_amplitude>0.1</z_amplitude>
              <z_frequency>1</z_frequency>
            </plugin>
          </model>
        </sdf>
    "#;

    #[test]
    fn test_parse_plugin_inside_model() {
        let plugin = PluginElement::parse_str(MODEL_SDF).unwrap();
        assert_eq!(plugin.name(), "flapping");
        assert_eq!(plugin.filename(), "libflapping_plugin.so");
        assert_eq!(plugin.get_str("joint_name"), Some("wing_joint"));
        assert_relative_eq!(plugin.get::<f64>("amplitude").unwrap(), 0.5);
        assert_relative_eq!(plugin.get::<f64>("frequency").unwrap(), 2.0);
        assert_eq!(plugin.fields().count(), 5);
    }

    #[test]
    fn test_missing_and_invalid_fields() {
        let plugin = PluginElement::new("flapping", "").with("amplitude", "wide");

        let err = plugin.get::<f64>("frequency").unwrap_err();
        assert!(matches!(err, DescriptorError::MissingField { .. }));

        let err = plugin.get::<f64>("amplitude").unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidField { ref value, .. } if value == "wide"));

        // A present but invalid field is not silently defaulted
        assert!(plugin.get_or("amplitude", 0.5).is_err());
        assert_relative_eq!(plugin.get_or("frequency", 2.0).unwrap(), 2.0);
    }

    #[test]
    fn test_set_replaces() {
        let mut plugin = PluginElement::new("p", "lib.so").with("a", 1);
        plugin.set("a", 2);
        assert_eq!(plugin.get::<i32>("a").unwrap(), 2);
        assert_eq!(plugin.fields().count(), 1);
    }

    #[test]
    fn test_empty_plugin_and_empty_fields() {
        let plugins = PluginElement::parse_all(
            r#"<world><plugin name="a" filename="a.so"/><plugin name="b"><flag/></plugin></world>"#,
        )
        .unwrap();
        assert_eq!(plugins.len(), 2);
        assert_eq!(plugins[0].fields().count(), 0);
        assert_eq!(plugins[1].filename(), "");
        assert!(plugins[1].has("flag"));
        assert_eq!(plugins[1].get_str("flag"), Some(""));
    }

    #[test]
    fn test_nested_children_are_skipped() {
        let plugin = PluginElement::parse_str(
            r#"<plugin name="p"><joint_name>wing<note>ignored</note></joint_name></plugin>"#,
        )
        .unwrap();
        assert_eq!(plugin.get_str("joint_name"), Some("wing"));
    }

    #[test]
    fn test_parse_errors() {
        let err = PluginElement::parse_str("<model/>").unwrap_err();
        assert!(matches!(err, DescriptorError::MissingElement { .. }));

        let err = PluginElement::parse_str(r#"<plugin filename="x.so"/>"#).unwrap_err();
        assert!(matches!(err, DescriptorError::MissingAttribute { .. }));

        let err = PluginElement::parse_str(r#"<plugin name="p"><amplitude>0.5"#).unwrap_err();
        assert!(matches!(err, DescriptorError::XmlParse(_)));
    }
}
