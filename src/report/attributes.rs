//! Attribute listings (`showatts`, `showattsglob`)

use serde::Serialize;

use super::scan::{lines, split_key_value, unquote};
use super::{ParseError, Parser};

const SHOWATTS_SHAPE: &str = "attribute sections (Name: / key = value)";
const SHOWATTSGLOB_SHAPE: &str = "global attributes (key = value)";

/// Name of the section holding dataset-wide attributes
pub const GLOBAL_SECTION: &str = "Global";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

fn attribute(text: &str) -> Option<Attribute> {
    let (key, value) = split_key_value(text, '=')?;
    Some(Attribute {
        key: key.to_string(),
        value: unquote(value).to_string(),
    })
}

fn lookup<'a>(attributes: &'a [Attribute], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|a| a.key == key)
        .map(|a| a.value.as_str())
}

/// Attributes of one variable (or of the `Global` section)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableAttributes {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl VariableAttributes {
    pub fn get(&self, key: &str) -> Option<&str> {
        lookup(&self.attributes, key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeReport {
    pub variables: Vec<VariableAttributes>,
}

impl AttributeReport {
    pub fn variable(&self, name: &str) -> Option<&VariableAttributes> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn get(&self, variable: &str, key: &str) -> Option<&str> {
        self.variable(variable)?.get(key)
    }

    pub fn global(&self) -> Option<&VariableAttributes> {
        self.variable(GLOBAL_SECTION)
    }

    pub fn names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }
}

/// Section header: `tas:` or `Temperature attributes:`
fn section_name(text: &str) -> Option<&str> {
    if text.contains('=') {
        return None;
    }
    let name = text.strip_suffix(':')?.trim();
    let name = name.strip_suffix("attributes").unwrap_or(name).trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShowattsParser;

impl Parser for ShowattsParser {
    type Output = AttributeReport;

    fn shape(&self) -> &'static str {
        SHOWATTS_SHAPE
    }

    fn parse(&self, text: &str) -> Result<AttributeReport, ParseError> {
        let mut variables: Vec<VariableAttributes> = Vec::new();

        for line in lines(text) {
            if let Some(name) = section_name(line.text) {
                variables.push(VariableAttributes {
                    name: name.to_string(),
                    attributes: Vec::new(),
                });
                continue;
            }
            match (attribute(line.text), variables.last_mut()) {
                (Some(attr), Some(section)) => section.attributes.push(attr),
                _ => return Err(ParseError::unexpected(SHOWATTS_SHAPE, &line)),
            }
        }

        Ok(AttributeReport { variables })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalAttributes {
    pub attributes: Vec<Attribute>,
}

impl GlobalAttributes {
    pub fn get(&self, key: &str) -> Option<&str> {
        lookup(&self.attributes, key)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShowattsglobParser;

impl Parser for ShowattsglobParser {
    type Output = GlobalAttributes;

    fn shape(&self) -> &'static str {
        SHOWATTSGLOB_SHAPE
    }

    fn parse(&self, text: &str) -> Result<GlobalAttributes, ParseError> {
        let mut attributes = Vec::new();
        for line in lines(text) {
            if line.text.starts_with('#') || section_name(line.text) == Some(GLOBAL_SECTION) {
                continue;
            }
            match attribute(line.text) {
                Some(attr) => attributes.push(attr),
                None => return Err(ParseError::unexpected(SHOWATTSGLOB_SHAPE, &line)),
            }
        }
        Ok(GlobalAttributes { attributes })
    }
}
