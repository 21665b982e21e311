//! Template renderer.
//!
//! Renders parsed template nodes with the given context. Variable output is
//! always HTML-escaped.

use super::parser::Node;
use super::{Result, TemplateContext, TemplateError, Value};

/// Escape text for HTML element content and quoted attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Template renderer.
pub struct Renderer<'a> {
    context: &'a TemplateContext<'a>,
}

impl<'a> Renderer<'a> {
    /// Create a new renderer with the given context.
    pub fn new(context: &'a TemplateContext<'a>) -> Self {
        Self { context }
    }

    /// Render a list of nodes to a string.
    pub fn render(&self, nodes: &[Node]) -> Result<String> {
        let mut output = String::new();
        for node in nodes {
            self.render_node(node, &mut output)?;
        }
        Ok(output)
    }

    fn render_node(&self, node: &Node, output: &mut String) -> Result<()> {
        match node {
            Node::Text(text) => output.push_str(text),
            // Missing variables render as empty, like Handlebars.
            Node::Variable(name) => {
                if let Some(value) = self.context.get(name) {
                    output.push_str(&escape_html(&value.to_display_string()));
                }
            }
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let branch = if self.is_truthy(condition) {
                    then_branch
                } else {
                    else_branch
                };
                output.push_str(&self.render(branch)?);
            }
            Node::Unless { condition, body } => {
                if !self.is_truthy(condition) {
                    output.push_str(&self.render(body)?);
                }
            }
            Node::Each {
                variable,
                item_name,
                body,
            } => self.render_each(variable, item_name.as_deref(), body, output)?,
        }
        Ok(())
    }

    fn is_truthy(&self, name: &str) -> bool {
        self.context
            .get(name)
            .map(Value::is_truthy)
            .unwrap_or(false)
    }

    fn render_each(
        &self,
        variable: &str,
        item_name: Option<&str>,
        body: &[Node],
        output: &mut String,
    ) -> Result<()> {
        let list = match self.context.get(variable) {
            Some(Value::List(items)) => items,
            Some(Value::Null) | None => return Ok(()),
            Some(_) => {
                return Err(TemplateError::Render(format!("'{variable}' is not a list")));
            }
        };

        let item_var_name = item_name.unwrap_or("this");

        for (index, item) in list.iter().enumerate() {
            let mut child_context = self.context.child();
            child_context.set(item_var_name, item.clone());
            child_context.set("@index", Value::Number(index as i64));
            child_context.set("@first", Value::Bool(index == 0));
            child_context.set("@last", Value::Bool(index == list.len() - 1));

            // Object fields are also reachable without the item prefix.
            if let Value::Object(obj) = item {
                for (key, value) in obj {
                    child_context.set(key.clone(), value.clone());
                }
            }

            output.push_str(&Renderer::new(&child_context).render(body)?);
        }

        Ok(())
    }
}
