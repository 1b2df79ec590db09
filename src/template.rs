use std::{
    collections::{hash_map::IntoIter as HashMapIter, BTreeSet, HashMap},
    ops::{Deref, DerefMut},
};

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while1},
    combinator::map,
    multi::many0,
    sequence::delimited,
    IResult,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TemplateError;

/// Placeholder values supplied per trigger call.
///
/// A value replaces a placeholder that forms a whole string leaf as-is, so structured values survive
/// substitution. Inside mixed text the value is stringified: strings are inserted raw, everything else as json.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values {
    vars: HashMap<String, Value>,
}

impl Deref for Values {
    type Target = HashMap<String, Value>;
    fn deref(&self) -> &Self::Target {
        &self.vars
    }
}
impl DerefMut for Values {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.vars
    }
}
impl IntoIterator for Values {
    type Item = (String, Value);
    type IntoIter = HashMapIter<String, Value>;
    fn into_iter(self) -> Self::IntoIter {
        self.vars.into_iter()
    }
}
impl<K: ToString, V: Into<Value>> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { vars: iter.into_iter().map(|(name, value)| (name.to_string(), value.into())).collect() }
    }
}

impl Values {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn render(&self, input: &str) -> Result<String, TemplateError> {
        let segments = Segment::split(input)?;
        self.assign_all(&segments)
    }

    pub fn substitute(&self, node: &Value) -> Result<Value, TemplateError> {
        match node {
            Value::String(s) => self.substitute_str(s),
            Value::Object(map) => Ok(Value::Object(
                map.iter().map(|(k, v)| Ok((k.clone(), self.substitute(v)?))).collect::<Result<_, TemplateError>>()?,
            )),
            Value::Array(array) => {
                Ok(Value::Array(array.iter().map(|v| self.substitute(v)).collect::<Result<_, _>>()?))
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => Ok(node.clone()),
        }
    }

    pub fn substitute_str(&self, input: &str) -> Result<Value, TemplateError> {
        match &Segment::split(input)?[..] {
            [Segment::Placeholder(name)] => Ok(self.lookup(name)?.clone()),
            segments => Ok(Value::String(self.assign_all(segments)?)),
        }
    }

    fn lookup(&self, name: &str) -> Result<&Value, TemplateError> {
        self.get(name).ok_or_else(|| TemplateError::MissingPlaceholder(name.to_string()))
    }

    fn assign_all(&self, segments: &[Segment]) -> Result<String, TemplateError> {
        let assigned = segments.iter().map(|s| s.assign(self)).collect::<Result<Vec<_>, _>>()?;
        Ok(assigned.join(""))
    }
}

/// Names of every placeholder referenced by string leaves of `node`.
pub fn placeholders(node: &Value) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect_placeholders(node, &mut names);
    names
}
fn collect_placeholders(node: &Value, names: &mut BTreeSet<String>) {
    match node {
        Value::String(s) => names.extend(Segment::split(s).unwrap_or_default().into_iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name),
            Segment::Literal(_) => None,
        })),
        Value::Object(map) => map.values().for_each(|v| collect_placeholders(v, names)),
        Value::Array(array) => array.iter().for_each(|v| collect_placeholders(v, names)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        v => v.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Literal(String),
    Placeholder(String),
}

impl Segment {
    pub fn split(input: &str) -> Result<Vec<Self>, TemplateError> {
        let (remain, parsed) = Self::parse(input).map_err(|e| TemplateError::Parse(e.to_string()))?;
        if remain.is_empty() {
            Ok(parsed)
        } else {
            Err(TemplateError::Parse(format!("remaining template: {}", remain)))
        }
    }

    pub fn assign(&self, values: &Values) -> Result<String, TemplateError> {
        match self {
            Self::Literal(text) => Ok(text.clone()),
            Self::Placeholder(name) => Ok(stringify(values.lookup(name)?)),
        }
    }

    pub fn is_name_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_' || c == '-'
    }

    pub fn parse_placeholder(input: &str) -> IResult<&str, Self> {
        map(delimited(tag("{"), take_while1(Self::is_name_char), tag("}")), |name: &str| {
            Self::Placeholder(name.to_string())
        })(input)
    }

    pub fn parse_literal(input: &str) -> IResult<&str, Self> {
        map(is_not("{"), |text: &str| Self::Literal(text.to_string()))(input)
    }

    // `{` that does not open a placeholder, such as `{}` or `{"a": 1}`
    pub fn parse_stray_brace(input: &str) -> IResult<&str, Self> {
        map(tag("{"), |text: &str| Self::Literal(text.to_string()))(input)
    }

    pub fn parse(input: &str) -> IResult<&str, Vec<Self>> {
        many0(alt((Self::parse_placeholder, Self::parse_literal, Self::parse_stray_brace)))(input)
    }
}
