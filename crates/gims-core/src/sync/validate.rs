//! Python syntax validation for code payloads.
//!
//! Parsing uses the tree-sitter Python grammar; the first error or missing
//! node is reported with its 1-based line number. The grammar also accepts
//! Python 2 forms and a few constructs Python 3 rejects, so a clean tree is
//! walked once more for those.

use serde::Serialize;
use tree_sitter::{Node, Parser};

use crate::error::{GimsError, Result};

/// `{"valid": bool, "error": Option<String>}` as printed by `validate-code`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub error: Option<String>,
}

/// Check that `code` parses as Python.
///
/// `Ok(None)` means valid; `Ok(Some(msg))` describes the first syntax error.
pub fn check_python_syntax(code: &str) -> Result<Option<String>> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| GimsError::Config(format!("Python grammar unavailable: {e}")))?;

    let tree = parser
        .parse(code, None)
        .ok_or_else(|| GimsError::validation("Python parser gave up", None))?;
    let root = tree.root_node();
    if !root.has_error() {
        return Ok(first_rejected(root, code));
    }

    Ok(Some(match first_error(root) {
        Some(node) => describe(node, code),
        None => format!("Syntax error at line {}", root.start_position().row + 1),
    }))
}

pub fn validate_code(code: &str) -> Result<ValidationReport> {
    let error = check_python_syntax(code)?;
    Ok(ValidationReport {
        valid: error.is_none(),
        error,
    })
}

/// Fail with a validation error if `code` does not parse. `context` names
/// the payload (e.g. a method label) in the message.
pub fn ensure_valid(code: &str, context: Option<&str>) -> Result<()> {
    match check_python_syntax(code)? {
        None => Ok(()),
        Some(error) => Err(match context {
            None => GimsError::validation("Python syntax error", Some(error)),
            Some(what) => GimsError::validation(
                format!("Python syntax error in method {what}"),
                Some(error),
            ),
        }),
    }
}

/// Depth-first, leftmost error or missing node.
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}

/// First node, in source order, that parses here but not under Python 3.
fn first_rejected(root: Node<'_>, code: &str) -> Option<String> {
    let mut cursor = root.walk();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let Some(reason) = rejection(node, code) {
            return Some(format!(
                "Syntax error at line {}: {reason}",
                node.start_position().row + 1
            ));
        }
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

fn rejection(node: Node<'_>, code: &str) -> Option<&'static str> {
    let text = node.utf8_text(code.as_bytes()).unwrap_or("");
    match node.kind() {
        "print_statement" if !called_like_function(text, "print") => {
            Some("Missing parentheses in call to 'print'")
        }
        "exec_statement" if !called_like_function(text, "exec") => {
            Some("Missing parentheses in call to 'exec'")
        }
        "expression_statement" => node
            .named_child(0)
            .filter(|child| child.kind() == "named_expression")
            .map(|_| "unparenthesized assignment expression"),
        "identifier" if matches!(text, "async" | "await") => Some("invalid syntax"),
        "integer" if has_leading_zero(text) => {
            Some("leading zeros in decimal integer literals are not permitted")
        }
        "integer" if text.ends_with(['l', 'L']) => Some("invalid decimal literal"),
        "argument_list" => argument_order(node),
        _ => None,
    }
}

/// `print (x)` parses as a statement but is a call under Python 3.
fn called_like_function(text: &str, keyword: &str) -> bool {
    let rest = text.strip_prefix(keyword).unwrap_or(text).trim_start();
    rest.starts_with('(')
}

fn has_leading_zero(text: &str) -> bool {
    let digits = text.replace('_', "");
    if digits.ends_with(['j', 'J']) {
        return false;
    }
    let mut chars = digits.chars();
    chars.next() == Some('0')
        && chars.next().is_some_and(|c| c.is_ascii_digit())
        && digits.chars().any(|c| c != '0')
}

fn argument_order(list: Node<'_>) -> Option<&'static str> {
    let mut cursor = list.walk();
    let mut seen_keyword = false;
    let mut seen_mapping_splat = false;
    for arg in list.named_children(&mut cursor) {
        match arg.kind() {
            "comment" => {}
            "keyword_argument" => seen_keyword = true,
            "dictionary_splat" => seen_mapping_splat = true,
            "list_splat" if seen_mapping_splat => {
                return Some("iterable argument unpacking follows keyword argument unpacking");
            }
            "list_splat" => {}
            _ if seen_mapping_splat => {
                return Some("positional argument follows keyword argument unpacking");
            }
            _ if seen_keyword => return Some("positional argument follows keyword argument"),
            _ => {}
        }
    }
    None
}

fn describe(node: Node<'_>, code: &str) -> String {
    let line = node.start_position().row + 1;
    if node.is_missing() {
        return format!("Syntax error at line {line}: missing `{}`", node.kind());
    }
    let snippet = code
        .get(node.start_byte()..node.end_byte())
        .unwrap_or("")
        .lines()
        .next()
        .unwrap_or("")
        .trim();
    if snippet.is_empty() {
        format!("Syntax error at line {line}: invalid syntax")
    } else {
        format!("Syntax error at line {line}: unexpected `{snippet}`")
    }
}
