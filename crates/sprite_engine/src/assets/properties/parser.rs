//! Properties text parser
//!
//! Turns the namespaced block format into a [`Properties`] tree:
//!
//! ```text
//! tilesheet terrain
//! {
//!     path = res/terrain.png
//!     strip water
//!     {
//!         frame { offset = 0, 0
//!                 size = 16, 16 }
//!     }
//! }
//! ```

use std::collections::HashMap;

use super::{Properties, PropertiesError, Property};

/// A lexical line item
#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// `namespace [id] [: parent]`
    Header { namespace: String, id: String, parent: Option<String> },
    /// `name = value`
    Assign { name: String, value: String },
    Open,
    Close,
}

/// Properties text parser
pub struct PropertiesParser;

impl PropertiesParser {
    /// Parse properties text into a root object with an empty namespace
    ///
    /// Top-level blocks become nested namespaces of the returned root. Parent
    /// references (`namespace id : parent`) are resolved after parsing.
    pub fn parse(contents: &str) -> Result<Properties, PropertiesError> {
        let tokens = Self::tokenize(contents)?;

        let mut stack: Vec<Properties> = vec![Properties::new("", "")];
        let mut pending: Option<(Properties, usize)> = None;

        for (line, token) in tokens {
            match token {
                Token::Header { namespace, id, parent } => {
                    if let Some((_, header_line)) = pending {
                        return Err(PropertiesError::Syntax {
                            line: header_line,
                            message: "namespace header without a '{' block".to_string(),
                        });
                    }
                    let mut block = Properties::new(&namespace, &id);
                    block.parent_id = parent;
                    pending = Some((block, line));
                }
                Token::Open => {
                    let (block, _) = pending.take().ok_or_else(|| PropertiesError::Syntax {
                        line,
                        message: "'{' without a namespace header".to_string(),
                    })?;
                    stack.push(block);
                }
                Token::Close => {
                    if pending.is_some() || stack.len() < 2 {
                        return Err(PropertiesError::Syntax {
                            line,
                            message: "unbalanced '}'".to_string(),
                        });
                    }
                    if let Some(done) = stack.pop() {
                        if let Some(parent) = stack.last_mut() {
                            parent.namespaces.push(done);
                        }
                    }
                }
                Token::Assign { name, value } => {
                    if let Some((_, header_line)) = pending {
                        return Err(PropertiesError::Syntax {
                            line: header_line,
                            message: "namespace header without a '{' block".to_string(),
                        });
                    }
                    if let Some(current) = stack.last_mut() {
                        current.properties.push(Property { name, value });
                    }
                }
            }
        }

        if let Some((_, header_line)) = pending {
            return Err(PropertiesError::Syntax {
                line: header_line,
                message: "namespace header without a '{' block".to_string(),
            });
        }
        if stack.len() != 1 {
            return Err(PropertiesError::Syntax {
                line: contents.lines().count(),
                message: "missing '}' at end of input".to_string(),
            });
        }

        let mut root = stack.pop().unwrap_or_else(|| Properties::new("", ""));
        Self::resolve_inheritance(&mut root);
        Ok(root)
    }

    /// Split the input into line-numbered tokens
    fn tokenize(contents: &str) -> Result<Vec<(usize, Token)>, PropertiesError> {
        let stripped = Self::strip_comments(contents);
        let mut tokens = Vec::new();

        for (line_num, raw) in stripped.lines().enumerate() {
            let line_num = line_num + 1;
            let mut rest = raw.trim();

            while !rest.is_empty() {
                if let Some(after) = rest.strip_prefix('{') {
                    tokens.push((line_num, Token::Open));
                    rest = after.trim_start();
                    continue;
                }
                if let Some(after) = rest.strip_prefix('}') {
                    tokens.push((line_num, Token::Close));
                    rest = after.trim_start();
                    continue;
                }

                // Everything up to the next brace belongs to this item
                let end = rest.find(['{', '}']).unwrap_or(rest.len());
                let (item, after) = rest.split_at(end);
                tokens.push((line_num, Self::parse_item(item.trim(), line_num)?));
                rest = after.trim_start();
            }
        }

        Ok(tokens)
    }

    /// Parse a single `name = value` or header item
    fn parse_item(item: &str, line: usize) -> Result<Token, PropertiesError> {
        if let Some((name, value)) = item.split_once('=') {
            let name = name.trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(PropertiesError::Syntax {
                    line,
                    message: format!("invalid property name '{name}'"),
                });
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            return Ok(Token::Assign { name: name.to_string(), value: value.to_string() });
        }

        let (head, parent) = match item.split_once(':') {
            Some((head, parent)) => {
                let parent = parent.trim();
                if parent.is_empty() {
                    return Err(PropertiesError::Syntax {
                        line,
                        message: "missing parent id after ':'".to_string(),
                    });
                }
                (head, Some(parent.to_string()))
            }
            None => (item, None),
        };

        let mut words = head.split_whitespace();
        let namespace = words.next().ok_or_else(|| PropertiesError::Syntax {
            line,
            message: "empty namespace header".to_string(),
        })?;
        let id = words.next().unwrap_or("");
        if words.next().is_some() {
            return Err(PropertiesError::Syntax {
                line,
                message: format!("unexpected content in header '{item}'"),
            });
        }

        Ok(Token::Header { namespace: namespace.to_string(), id: id.to_string(), parent })
    }

    /// Remove `//` line comments and `/* */` block comments, preserving line breaks
    fn strip_comments(contents: &str) -> String {
        let mut out = String::with_capacity(contents.len());
        let mut chars = contents.chars().peekable();
        let mut in_block = false;

        while let Some(c) = chars.next() {
            if in_block {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    in_block = false;
                } else if c == '\n' {
                    out.push('\n');
                }
                continue;
            }
            match (c, chars.peek()) {
                ('/', Some('/')) => {
                    for skipped in chars.by_ref() {
                        if skipped == '\n' {
                            out.push('\n');
                            break;
                        }
                    }
                }
                ('/', Some('*')) => {
                    chars.next();
                    in_block = true;
                }
                _ => out.push(c),
            }
        }

        out
    }

    /// Copy properties inherited through `: parent` references
    ///
    /// Values defined on the block itself win over inherited ones.
    fn resolve_inheritance(root: &mut Properties) {
        let mut by_id: HashMap<String, Vec<Property>> = HashMap::new();
        Self::collect_by_id(root, &mut by_id);
        Self::apply_inheritance(root, &by_id);
    }

    fn collect_by_id(node: &Properties, out: &mut HashMap<String, Vec<Property>>) {
        if !node.id.is_empty() {
            out.entry(node.id.clone()).or_insert_with(|| node.properties.clone());
        }
        for child in &node.namespaces {
            Self::collect_by_id(child, out);
        }
    }

    fn apply_inheritance(node: &mut Properties, by_id: &HashMap<String, Vec<Property>>) {
        if let Some(parent) = node.parent_id.as_ref().and_then(|p| by_id.get(p)) {
            for inherited in parent {
                if !node.exists(&inherited.name) {
                    node.properties.push(inherited.clone());
                }
            }
        }
        for child in &mut node.namespaces {
            Self::apply_inheritance(child, by_id);
        }
    }
}
