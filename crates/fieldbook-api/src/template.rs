// URL templates
//
// Endpoint paths are declared once per entity type as `{name}` patterns
// (`/projects/{project_id}/tasks`) and resolved from the call's
// parameter object. Resolution is pure: a template that cannot be
// filled fails here, before any request is built.

use std::collections::{HashMap, HashSet};
use std::fmt;

use reqwest::Method;
use serde_json::{Map, Value};

use crate::error::Error;

/// Call parameters: a plain JSON object.
pub type Params = Map<String, Value>;

/// Logical operation a template is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Get,
    GetAll,
    Update,
    Delete,
    /// Entity-specific extension (e.g. `"geocode"`, `"import_csv"`).
    Custom(&'static str),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Get => "get",
            Self::GetAll => "getAll",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Custom(name) => name,
        }
    }

    /// Verb used when the endpoint table does not override it.
    pub fn default_method(&self) -> Method {
        match self {
            Self::Get | Self::GetAll => Method::GET,
            Self::Create | Self::Custom(_) => Method::POST,
            Self::Update => Method::PUT,
            Self::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One registered template plus the verb it is sent with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub template: String,
    pub method: Method,
}

/// A template filled in from call parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub method: Method,
    pub path: String,
    /// Parameter names consumed by placeholders.
    pub consumed: HashSet<String>,
}

impl ResolvedEndpoint {
    /// Scalar parameters that did not fill a placeholder, as query pairs.
    ///
    /// `null`, arrays and objects are skipped.
    pub fn query(&self, params: &Params) -> Vec<(String, String)> {
        params
            .iter()
            .filter(|(key, _)| !self.consumed.contains(key.as_str()))
            .filter_map(|(key, value)| stringify(value).map(|v| (key.clone(), v)))
            .collect()
    }
}

/// Immutable operation → template table for one entity type.
#[derive(Debug, Clone, Default)]
pub struct Endpoints {
    entries: HashMap<Operation, Endpoint>,
}

impl Endpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five CRUD templates with their default verbs.
    pub fn crud(create: &str, get: &str, get_all: &str, update: &str, delete: &str) -> Self {
        Self::new()
            .with(Operation::Create, create)
            .with(Operation::Get, get)
            .with(Operation::GetAll, get_all)
            .with(Operation::Update, update)
            .with(Operation::Delete, delete)
    }

    /// Register `template` under `op` with the operation's default verb.
    pub fn with(mut self, op: Operation, template: &str) -> Self {
        self.entries.insert(
            op,
            Endpoint {
                template: template.to_owned(),
                method: op.default_method(),
            },
        );
        self
    }

    /// Override the verb of an already registered operation.
    pub fn with_method(mut self, op: Operation, method: Method) -> Self {
        if let Some(entry) = self.entries.get_mut(&op) {
            entry.method = method;
        }
        self
    }

    pub fn endpoint(&self, op: Operation) -> Result<&Endpoint, Error> {
        self.entries.get(&op).ok_or_else(|| Error::UnknownOperation {
            operation: op.name().to_owned(),
        })
    }

    /// Resolve the template registered under `op`.
    pub fn resolve(&self, op: Operation, params: &Params) -> Result<ResolvedEndpoint, Error> {
        let endpoint = self.endpoint(op)?;
        let (path, consumed) = fill(&endpoint.template, params)?;
        Ok(ResolvedEndpoint {
            method: endpoint.method.clone(),
            path,
            consumed,
        })
    }
}

/// Substitute every `{key}` in `template` with the stringified `params[key]`.
///
/// A placeholder whose key is absent (or `null`) fails with
/// [`Error::MissingTemplateParameter`].
pub fn resolve_template(template: &str, params: &Params) -> Result<String, Error> {
    fill(template, params).map(|(path, _)| path)
}

/// Placeholder names in declaration order.
pub fn placeholders(template: &str) -> Result<Vec<&str>, Error> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| Error::MalformedTemplate {
            template: template.to_owned(),
        })?;
        let name = &after[..close];
        if name.is_empty() || name.contains('{') {
            return Err(Error::MalformedTemplate {
                template: template.to_owned(),
            });
        }
        names.push(name);
        rest = &after[close + 1..];
    }
    Ok(names)
}

fn fill(template: &str, params: &Params) -> Result<(String, HashSet<String>), Error> {
    let names = placeholders(template)?;
    let mut path = template.to_owned();
    let mut consumed = HashSet::with_capacity(names.len());

    for name in names {
        let value = params
            .get(name)
            .and_then(stringify)
            .ok_or_else(|| Error::MissingTemplateParameter {
                template: template.to_owned(),
                parameter: name.to_owned(),
            })?;
        path = path.replacen(&format!("{{{name}}}"), &value, 1);
        consumed.insert(name.to_owned());
    }

    Ok((path, consumed))
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
