//! Template parser.
//!
//! Parses template strings into a tree of nodes.

use super::{Result, TemplateError};

/// A node in the template tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Raw text content.
    Text(String),

    /// Variable reference: `{{name}}` or `{{file.name}}`
    Variable(String),

    /// Conditional block: `{{#if condition}}...{{else}}...{{/if}}`
    If {
        condition: String,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },

    /// Inverse conditional: `{{#unless condition}}...{{/unless}}`
    Unless { condition: String, body: Vec<Node> },

    /// Loop block: `{{#each items}}...{{/each}}` or `{{#each items as item}}`
    Each {
        variable: String,
        item_name: Option<String>,
        body: Vec<Node>,
    },
}

/// Template parser.
pub struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given input.
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Parse the template into a list of nodes.
    pub fn parse(mut self) -> Result<Vec<Node>> {
        self.parse_nodes(None)
    }

    /// Parse nodes until a closing tag for `end_tag` or end of input.
    fn parse_nodes(&mut self, end_tag: Option<&str>) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();

        while self.pos < self.input.len() {
            if self.peek_str("{{/") {
                if end_tag.is_some() {
                    break;
                }
                return Err(TemplateError::Parse("Unmatched closing tag".to_string()));
            }
            if end_tag == Some("if") && self.peek_str("{{else}}") {
                break;
            }

            if self.peek_str("\\{{") {
                self.pos += 3;
                nodes.push(Node::Text("{{".to_string()));
            } else if self.peek_str("{{") {
                nodes.push(self.parse_tag()?);
            } else {
                let text = self.collect_text();
                if !text.is_empty() {
                    nodes.push(Node::Text(text));
                }
            }
        }

        Ok(nodes)
    }

    fn parse_tag(&mut self) -> Result<Node> {
        self.expect("{{")?;
        self.skip_whitespace();

        if self.peek_str("#") {
            self.pos += 1;
            return self.parse_block_tag();
        }

        let name = self.parse_identifier()?;
        self.skip_whitespace();
        self.expect("}}")?;

        Ok(Node::Variable(name))
    }

    fn parse_block_tag(&mut self) -> Result<Node> {
        let tag_name = self.parse_identifier()?;
        self.skip_whitespace();

        match tag_name.as_str() {
            "if" => {
                let condition = self.parse_opening("if")?;
                let then_branch = self.parse_nodes(Some("if"))?;
                let else_branch = if self.peek_str("{{else}}") {
                    self.expect("{{else}}")?;
                    self.parse_nodes(Some("if"))?
                } else {
                    Vec::new()
                };
                self.expect("{{/if}}")?;
                Ok(Node::If {
                    condition,
                    then_branch,
                    else_branch,
                })
            }
            "unless" => {
                let condition = self.parse_opening("unless")?;
                let body = self.parse_nodes(Some("unless"))?;
                self.expect("{{/unless}}")?;
                Ok(Node::Unless { condition, body })
            }
            "each" => {
                let variable = self.parse_identifier()?;
                self.skip_whitespace();
                let item_name = if self.peek_str("as ") {
                    self.pos += 3;
                    self.skip_whitespace();
                    Some(self.parse_identifier()?)
                } else {
                    None
                };
                self.skip_whitespace();
                self.expect("}}")?;

                let body = self.parse_nodes(Some("each"))?;
                self.expect("{{/each}}")?;
                Ok(Node::Each {
                    variable,
                    item_name,
                    body,
                })
            }
            _ => Err(TemplateError::Parse(format!(
                "Unknown block tag: {tag_name}"
            ))),
        }
    }

    /// Parse `condition}}` after a block keyword.
    fn parse_opening(&mut self, tag: &str) -> Result<String> {
        let condition = self
            .parse_identifier()
            .map_err(|_| TemplateError::Parse(format!("Missing condition for #{tag}")))?;
        self.skip_whitespace();
        self.expect("}}")?;
        Ok(condition)
    }

    /// Parse an identifier (variable name, including dot notation and `@index`).
    fn parse_identifier(&mut self) -> Result<String> {
        let start = self.pos;

        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || matches!(ch, '_' | '.' | '-' | '@') {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }

        if self.pos == start {
            return Err(TemplateError::Parse("Expected identifier".to_string()));
        }

        Ok(self.input[start..self.pos].to_string())
    }

    fn collect_text(&mut self) -> String {
        let start = self.pos;

        while let Some(ch) = self.peek_char() {
            if self.peek_str("{{") || self.peek_str("\\{{") {
                break;
            }
            self.pos += ch.len_utf8();
        }

        self.input[start..self.pos].to_string()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn peek_str(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn expect(&mut self, s: &str) -> Result<()> {
        if self.peek_str(s) {
            self.pos += s.len();
            Ok(())
        } else {
            let found: String = self.rest().chars().take(10).collect();
            Err(TemplateError::Parse(format!(
                "Expected '{s}' but found '{found}'"
            )))
        }
    }
}
