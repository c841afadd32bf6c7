//! Built-in frame template engine
//!
//! A deliberately small engine implementing the [`Template`] collaborator:
//!
//! - `{{ name }}` writes the parameter `name`. String values are written
//!   verbatim, anything else as JSON text. A missing parameter fails the
//!   render.
//! - `{{#once scope="token"}} ... {{/once}}` emits its body at most once per
//!   [`TemplateConfig`]. Blocks may nest.

use std::io::Write;
use std::sync::{Arc, LazyLock};

use hotframe_kernel::frame::{Template, TemplateError, TemplateParams, TemplateResult};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::once::{OnceDirective, OnceRegistry};

const TAG_OPEN: &str = "{{";
const TAG_CLOSE: &str = "}}";
const ONCE_OPEN: &str = "#once";
const ONCE_CLOSE: &str = "/once";

static VAR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid variable regex"));

static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)\s*=\s*"([^"]*)""#).expect("valid attribute regex"));

/// Engine configuration shared by the templates it parses.
///
/// Owns the once registry, so once-only fragments are scoped to one
/// configuration. Two configurations never see each other's scopes.
#[derive(Debug, Default)]
pub struct TemplateConfig {
    once: Arc<OnceRegistry>,
}

impl TemplateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn once_registry(&self) -> &Arc<OnceRegistry> {
        &self.once
    }

    fn once_directive(&self) -> OnceDirective {
        OnceDirective::new(Arc::clone(&self.once))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Var(String),
    Once {
        args: Vec<(String, String)>,
        body: Vec<Node>,
    },
}

struct OpenBlock {
    offset: usize,
    args: Vec<(String, String)>,
    outer: Vec<Node>,
}

/// A parsed frame template
#[derive(Debug, Clone)]
pub struct FrameTemplate {
    name: String,
    nodes: Vec<Node>,
    config: Arc<TemplateConfig>,
}

impl FrameTemplate {
    pub fn parse(
        name: impl Into<String>,
        source: &str,
        config: Arc<TemplateConfig>,
    ) -> TemplateResult<Self> {
        let name = name.into();
        let nodes = parse_nodes(source)?;
        debug!("Parsed template '{}' into {} node(s)", name, nodes.len());
        Ok(Self {
            name,
            nodes,
            config,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Arc<TemplateConfig> {
        &self.config
    }

    /// Names of all referenced parameters, in first-use order.
    pub fn variable_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        collect_variables(&self.nodes, &mut names);
        names
    }

    fn render_nodes(
        &self,
        nodes: &[Node],
        params: &TemplateParams,
        out: &mut dyn Write,
    ) -> TemplateResult<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.write_all(text.as_bytes())?,
                Node::Var(name) => {
                    let value = params
                        .get(name)
                        .ok_or_else(|| TemplateError::MissingParameter(name.clone()))?;
                    write_value(value, out)?;
                }
                Node::Once { args, body } => {
                    self.config.once_directive().execute(
                        args,
                        out,
                        Some(|buffer: &mut dyn Write| self.render_nodes(body, params, buffer)),
                    )?;
                }
            }
        }
        Ok(())
    }
}

impl Template for FrameTemplate {
    fn process(&self, params: &TemplateParams, out: &mut dyn Write) -> TemplateResult<()> {
        self.render_nodes(&self.nodes, params, out)
    }
}

fn write_value(value: &Value, out: &mut dyn Write) -> TemplateResult<()> {
    match value {
        Value::String(s) => out.write_all(s.as_bytes())?,
        other => write!(out, "{}", other)?,
    }
    Ok(())
}

fn collect_variables<'a>(nodes: &'a [Node], names: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Var(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Node::Once { body, .. } => collect_variables(body, names),
        }
    }
}

fn parse_nodes(source: &str) -> TemplateResult<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut open_blocks: Vec<OpenBlock> = Vec::new();
    let mut rest = source;
    let mut offset = 0;

    while let Some(start) = rest.find(TAG_OPEN) {
        if start > 0 {
            nodes.push(Node::Text(rest[..start].to_string()));
        }

        let tag_offset = offset + start;
        let inner = &rest[start + TAG_OPEN.len()..];
        let Some(end) = inner.find(TAG_CLOSE) else {
            return Err(TemplateError::parse(tag_offset, "unterminated tag"));
        };
        let tag = inner[..end].trim();

        if let Some(attributes) = tag.strip_prefix(ONCE_OPEN) {
            if !attributes.is_empty() && !attributes.starts_with(char::is_whitespace) {
                return Err(TemplateError::parse(tag_offset, format!("unknown directive '{}'", tag)));
            }
            open_blocks.push(OpenBlock {
                offset: tag_offset,
                args: parse_attributes(attributes, tag_offset)?,
                outer: std::mem::take(&mut nodes),
            });
        } else if tag == ONCE_CLOSE {
            let Some(block) = open_blocks.pop() else {
                return Err(TemplateError::parse(tag_offset, "closing once tag without an open block"));
            };
            let body = std::mem::replace(&mut nodes, block.outer);
            nodes.push(Node::Once {
                args: block.args,
                body,
            });
        } else if VAR_NAME.is_match(tag) {
            nodes.push(Node::Var(tag.to_string()));
        } else {
            return Err(TemplateError::parse(tag_offset, format!("invalid tag '{}'", tag)));
        }

        let consumed = start + TAG_OPEN.len() + end + TAG_CLOSE.len();
        rest = &rest[consumed..];
        offset += consumed;
    }

    if !rest.is_empty() {
        nodes.push(Node::Text(rest.to_string()));
    }

    if let Some(block) = open_blocks.pop() {
        return Err(TemplateError::parse(block.offset, "once block is never closed"));
    }

    Ok(nodes)
}

/// Parse `key="value"` pairs. Anything between pairs other than whitespace
/// is an error; key validity is left to the directive.
fn parse_attributes(text: &str, tag_offset: usize) -> TemplateResult<Vec<(String, String)>> {
    let mut args = Vec::new();
    let mut last = 0;

    for caps in ATTRIBUTE.captures_iter(text) {
        let (Some(whole), Some(key), Some(value)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if !text[last..whole.start()].trim().is_empty() {
            return Err(TemplateError::parse(tag_offset, "malformed once attributes"));
        }
        args.push((key.as_str().to_string(), value.as_str().to_string()));
        last = whole.end();
    }

    if !text[last..].trim().is_empty() {
        return Err(TemplateError::parse(tag_offset, "malformed once attributes"));
    }

    Ok(args)
}
