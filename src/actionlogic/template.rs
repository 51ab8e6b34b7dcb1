//! Logic defined by a small text template instead of code.
//!
//! ```text
//! ## comment
//! >action: createSequence
//! >priority: 10
//! >dialect: postgresql
//! >required: sequence
//! >unsupported: sequence.cycle
//! CREATE SEQUENCE #escapeName($sequence.name, sequence)
//! #if($sequence.startValue) START WITH $sequence.startValue #end
//! ```
//!
//! `$name` reads an action attribute, falling back to a scope value; dotted
//! paths descend into nested attributes. `#if` blocks do not nest.

use super::{ActionLogic, ActionResult, ValidationErrors, PRIORITY_NOT_APPLICABLE};
use crate::action::{Action, ActionKind, ExecuteSqlAction};
use crate::error::{ActionError, Result};
use crate::scope::Scope;
use crate::structure::{ObjectName, ObjectType};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

static IF_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)#if\(\s*\$([A-Za-z_][\w.]*)\s*\)(.*?)(?:#else(.*?))?#end").unwrap()
});
static DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#(if|else|end)\b").unwrap());
static ESCAPE_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#escapeName\(([^)]*)\)").unwrap());
static VARIABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone)]
pub struct TemplateLogic {
    name: String,
    action: ActionKind,
    priority: i32,
    dialects: Vec<String>,
    required: Vec<String>,
    unsupported: Vec<String>,
    body: String,
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl TemplateLogic {
    pub fn parse(text: &str) -> Result<Self> {
        let mut name = None;
        let mut action = None;
        let mut priority = None;
        let mut dialects = Vec::new();
        let mut required = Vec::new();
        let mut unsupported = Vec::new();
        let mut body = Vec::new();

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("##") {
                continue;
            }
            let Some(control) = trimmed.strip_prefix('>') else {
                body.push(line);
                continue;
            };
            let (key, value) = control.split_once(':').ok_or_else(|| {
                ActionError::unexpected(format!("Malformed template control line '{}'", trimmed))
            })?;
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "name" => name = Some(value.to_string()),
                "action" => action = Some(value.parse::<ActionKind>()?),
                "priority" => {
                    let parsed = value.parse::<i32>().map_err(|_| {
                        ActionError::unexpected(format!("Invalid template priority '{}'", value))
                    })?;
                    if parsed <= 0 {
                        return Err(ActionError::unexpected(format!(
                            "Template priority must be positive, got {}",
                            parsed
                        )));
                    }
                    priority = Some(parsed);
                }
                "dialect" => dialects.extend(split_list(value)),
                "required" => required.extend(split_list(value)),
                "unsupported" => unsupported.extend(split_list(value)),
                other => {
                    return Err(ActionError::unexpected(format!(
                        "Unknown template control '{}'",
                        other
                    )))
                }
            }
        }

        let action =
            action.ok_or_else(|| ActionError::unexpected("Template does not declare >action"))?;
        let priority =
            priority.ok_or_else(|| ActionError::unexpected("Template does not declare >priority"))?;
        let body = body.join("\n");
        if body.trim().is_empty() {
            return Err(ActionError::unexpected("Template has an empty body"));
        }
        check_blocks(&body)?;

        Ok(TemplateLogic {
            name: name.unwrap_or_else(|| format!("template:{}", action)),
            action,
            priority,
            dialects,
            required,
            unsupported,
            body,
        })
    }

    /// Render the body for `action`.
    pub fn render(&self, action: &Action, scope: &Scope) -> Result<String> {
        let text = IF_BLOCK_RE.replace_all(&self.body, |caps: &Captures| {
            let branch = if is_truthy(lookup(&caps[1], action, scope).as_ref()) {
                caps.get(2)
            } else {
                caps.get(3)
            };
            branch.map_or(String::new(), |m| m.as_str().to_string())
        });

        let mut escape_error = None;
        let text = ESCAPE_NAME_RE.replace_all(&text, |caps: &Captures| {
            match escape_name(&caps[1], action, scope) {
                Ok(escaped) => escaped,
                Err(err) => {
                    escape_error.get_or_insert(err);
                    String::new()
                }
            }
        });
        if let Some(err) = escape_error {
            return Err(err);
        }

        let text = VARIABLE_RE.replace_all(&text, |caps: &Captures| {
            lookup(&caps[1], action, scope)
                .map(|v| value_text(&v))
                .unwrap_or_default()
        });

        Ok(WHITESPACE_RE.replace_all(text.trim(), " ").into_owned())
    }
}

/// `#if` blocks must be closed and cannot contain another `#if`.
fn check_blocks(body: &str) -> Result<()> {
    let mut open = false;
    for caps in DIRECTIVE_RE.captures_iter(body) {
        match (&caps[1], open) {
            ("if", true) => {
                return Err(ActionError::unexpected("Nested #if blocks are not supported"))
            }
            ("if", false) => open = true,
            ("end", true) => open = false,
            (directive, _) if !open => {
                return Err(ActionError::unexpected(format!(
                    "#{} outside of an #if block",
                    directive
                )))
            }
            _ => {}
        }
    }
    if open {
        return Err(ActionError::unexpected("#if block is missing its #end"));
    }
    Ok(())
}

/// Resolve a dotted path against the action, then the scope.
fn lookup(path: &str, action: &Action, scope: &Scope) -> Option<Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut value = action
        .attribute(first)
        .or_else(|| scope.get(first).cloned())?;
    for segment in segments {
        value = value.get(segment)?.clone();
    }
    Some(value).filter(|v| !v.is_null())
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0),
        Some(_) => true,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(parts) if parts.iter().all(|p| p.is_string() || p.is_null()) => parts
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("."),
        other => other.to_string(),
    }
}

/// Evaluate one `#escapeName` argument: a `$path` or literal text.
fn argument(expr: &str, action: &Action, scope: &Scope) -> Option<Value> {
    let expr = expr.trim();
    match expr.strip_prefix('$') {
        Some(path) => lookup(path, action, scope),
        None if expr.is_empty() || expr.eq_ignore_ascii_case("null") => None,
        None => Some(Value::String(expr.to_string())),
    }
}

fn escape_name(args: &str, action: &Action, scope: &Scope) -> Result<String> {
    let args: Vec<&str> = args.split(',').collect();
    let (name_args, type_arg) = match args.split_last() {
        Some((last, rest)) if !rest.is_empty() => (rest, last.trim()),
        _ => {
            return Err(ActionError::unexpected(format!(
                "#escapeName needs a name and an object type, got '{}'",
                args.join(",")
            )))
        }
    };
    let object_type: ObjectType = type_arg
        .parse()
        .map_err(|_| ActionError::unexpected(format!("Unknown object type '{}'", type_arg)))?;

    let name = match name_args {
        [single] => match argument(single, action, scope) {
            Some(Value::Array(parts)) => ObjectName::from(
                parts
                    .iter()
                    .map(|p| p.as_str().map(str::to_string))
                    .collect::<Vec<_>>(),
            ),
            Some(other) => ObjectName::parse(&value_text(&other)),
            None => ObjectName::default(),
        },
        parts => ObjectName::from_parts(
            parts
                .iter()
                .map(|p| argument(p, action, scope).map(|v| value_text(&v))),
        ),
    };
    if name.name.is_none() {
        return Err(ActionError::unexpected(format!(
            "#escapeName({}) resolved to an empty name",
            args.join(",")
        )));
    }
    Ok(scope.database().escape_qualified_name(&name, object_type))
}

#[async_trait]
impl ActionLogic for TemplateLogic {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_action(&self) -> ActionKind {
        self.action
    }

    fn supports_scope(&self, scope: &Scope) -> bool {
        let short_name = scope.database().short_name();
        self.dialects.is_empty() || self.dialects.iter().any(|d| d.eq_ignore_ascii_case(&short_name))
    }

    fn priority(&self, action: &Action, scope: &Scope) -> i32 {
        let uses_unsupported = self
            .unsupported
            .iter()
            .any(|field| is_truthy(lookup(field, action, scope).as_ref()));
        if uses_unsupported {
            PRIORITY_NOT_APPLICABLE
        } else {
            self.priority
        }
    }

    fn validate(&self, action: &Action, scope: &Scope) -> Result<ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for field in &self.required {
            errors.check_required_field(field, &lookup(field, action, scope));
        }
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let sql = self.render(action, scope)?;
        Ok(ActionResult::delegate(ExecuteSqlAction::new(sql)))
    }
}
