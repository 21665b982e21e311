//! HTML template engine.
//!
//! A small Handlebars-style engine used to render the listing page.
//!
//! # Features
//!
//! - Variable expansion: `{{variable}}` (HTML-escaped)
//! - Conditionals: `{{#if condition}}...{{else}}...{{/if}}`
//! - Inverse conditionals: `{{#unless condition}}...{{/unless}}`
//! - Loops: `{{#each items}}...{{/each}}`
//! - Escaping: `\{{` to output literal `{{`
//!
//! # Example
//!
//! ```
//! use filedrop::template::{TemplateContext, TemplateEngine, Value};
//!
//! let mut engine = TemplateEngine::new();
//! engine.load("greeting", "Hello, {{name}}!").unwrap();
//!
//! let mut context = TemplateContext::new();
//! context.set("name", Value::from("<World>"));
//!
//! let result = engine.render("greeting", &context).unwrap();
//! assert_eq!(result, "Hello, &lt;World&gt;!");
//! ```

mod parser;
mod renderer;

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

pub use parser::{Node, Parser};
pub use renderer::{escape_html, Renderer};

/// Name of the listing page template.
pub const INDEX_TEMPLATE: &str = "index.html";

/// Listing page shipped with the binary, used unless overridden on disk.
const BUILTIN_INDEX: &str = include_str!("../../templates/index.html");

/// Template-related errors.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Template not found.
    #[error("Template not found: {0}")]
    NotFound(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Render error.
    #[error("Render error: {0}")]
    Render(String),

    /// Template file could not be read.
    #[error("Failed to read template {0}: {1}")]
    Io(String, std::io::Error),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// A value that can be used in templates.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A string value.
    String(String),
    /// A numeric value.
    Number(i64),
    /// A boolean value.
    Bool(bool),
    /// A list of values.
    List(Vec<Value>),
    /// An object (key-value pairs).
    Object(HashMap<String, Value>),
    /// A null/empty value.
    Null,
}

impl Value {
    /// Convert the value to a string for display.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::List(_) => "[list]".to_string(),
            Value::Object(_) => "[object]".to_string(),
            Value::Null => String::new(),
        }
    }

    /// Check if the value is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0,
            Value::Bool(b) => *b,
            Value::List(l) => !l.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Null => false,
        }
    }

    /// Get a nested value by dot-separated path.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = self;
        for part in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::List(list) => list.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Build an object from key/value pairs.
    pub fn object<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Context for template rendering.
///
/// A child context holds only its own variables and falls back to the
/// parent it borrows, so entering a loop body does not copy the outer scope.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext<'p> {
    variables: HashMap<String, Value>,
    parent: Option<&'p TemplateContext<'p>>,
}

impl<'p> TemplateContext<'p> {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable in the context.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Get a variable, with dot-notation lookup into objects and lists.
    ///
    /// The innermost scope defining the name (or its first dotted part) wins.
    pub fn get(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.variables.get(name) {
            return Some(value);
        }
        if let Some((root, rest)) = name.split_once('.') {
            if let Some(value) = self.variables.get(root) {
                return value.get_path(rest);
            }
        }
        self.parent.and_then(|parent| parent.get(name))
    }

    /// Create an empty child scope on top of this context.
    pub fn child(&self) -> TemplateContext<'_> {
        TemplateContext {
            variables: HashMap::new(),
            parent: Some(self),
        }
    }
}

/// Parsed templates by name.
#[derive(Debug, Default)]
pub struct TemplateEngine {
    templates: HashMap<String, Vec<Node>>,
}

impl TemplateEngine {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine holding the built-in templates.
    pub fn with_builtin() -> Result<Self> {
        let mut engine = Self::new();
        engine.load(INDEX_TEMPLATE, BUILTIN_INDEX)?;
        Ok(engine)
    }

    /// Create an engine from the built-in templates, overridden by any
    /// `*.html` file found in `dir`.
    ///
    /// A missing directory is not an error.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut engine = Self::with_builtin()?;
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Ok(engine);
        }

        let entries =
            std::fs::read_dir(dir).map_err(|e| TemplateError::Io(dir.display().to_string(), e))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let content = std::fs::read_to_string(&path)
                .map_err(|e| TemplateError::Io(path.display().to_string(), e))?;
            engine.load(name, &content)?;
            tracing::debug!("Loaded template: {}", path.display());
        }

        Ok(engine)
    }

    /// Parse and store a template.
    pub fn load(&mut self, name: impl Into<String>, content: &str) -> Result<()> {
        let nodes = Parser::new(content).parse()?;
        self.templates.insert(name.into(), nodes);
        Ok(())
    }

    /// Check whether a template is loaded.
    pub fn has(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Render a loaded template.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        let nodes = self
            .templates
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
        Renderer::new(context).render(nodes)
    }
}
