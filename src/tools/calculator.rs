//! Arithmetic expression evaluator exposed to the model as `Calculator`.
//!
//! Expressions are evaluated with `meval`; nothing is executed. A malformed
//! expression is answered with an error string so the model can correct
//! itself, while a call without an `expression` argument is a tool failure.

use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Longest expression accepted from the model.
pub const MAX_EXPRESSION_LEN: usize = 1024;

/// Deepest parenthesis nesting, or longest run of sign operators, accepted.
pub const MAX_NESTING_DEPTH: usize = 64;

pub struct Calculator;

#[async_trait]
impl Tool for Calculator {
    fn name(&self) -> &str {
        "Calculator"
    }

    fn description(&self) -> &str {
        "A tool for performing mathematical calculations."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Arithmetic expression, e.g. \"(3 + 4) * 2 ^ 3\" or \"sqrt(16) / 2\""
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let expression = args
            .get("expression")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'expression' parameter".to_string()))?;

        let output = match evaluate(expression) {
            Ok(value) => format_number(value),
            Err(e) => format!("Error: {}", e),
        };

        Ok(Value::String(output))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("expression is longer than {} characters", MAX_EXPRESSION_LEN)]
    TooLong,

    #[error("expression nests deeper than {} levels", MAX_NESTING_DEPTH)]
    TooDeep,

    #[error("unbalanced parentheses")]
    Unbalanced,

    #[error("{0}")]
    Invalid(String),

    #[error("result is not a finite number")]
    NotFinite,
}

/// Evaluate an arithmetic expression.
///
/// Supports `+ - * / %`, `^` (also written `**`), unary signs, parentheses,
/// the constants `pi` and `e`, and the `meval` built-in functions (`sqrt`,
/// `abs`, `ln`, `exp`, `sin`, `cos`, `tan`, `floor`, `ceil`, `round`, ...)
/// plus `log` in base 10.
pub fn evaluate(expression: &str) -> std::result::Result<f64, EvalError> {
    check_shape(expression)?;

    let normalized = expression
        .replace("**", "^")
        .replace('×', "*")
        .replace('÷', "/");

    let expr: meval::Expr = normalized
        .parse()
        .map_err(|e: meval::Error| EvalError::Invalid(e.to_string()))?;

    let mut context = meval::Context::new();
    context.func("log", f64::log10);

    let value = expr
        .eval_with_context(context)
        .map_err(|e| EvalError::Invalid(e.to_string()))?;

    if !value.is_finite() {
        return Err(EvalError::NotFinite);
    }
    Ok(value)
}

/// Rejects input whose size or nesting could exhaust the evaluator.
fn check_shape(expression: &str) -> std::result::Result<(), EvalError> {
    if expression.chars().count() > MAX_EXPRESSION_LEN {
        return Err(EvalError::TooLong);
    }

    let mut depth = 0usize;
    let mut sign_run = 0usize;
    for c in expression.chars() {
        match c {
            '(' => {
                depth += 1;
                if depth > MAX_NESTING_DEPTH {
                    return Err(EvalError::TooDeep);
                }
            }
            ')' => depth = depth.checked_sub(1).ok_or(EvalError::Unbalanced)?,
            _ => {}
        }

        match c {
            '+' | '-' => {
                sign_run += 1;
                if sign_run > MAX_NESTING_DEPTH {
                    return Err(EvalError::TooDeep);
                }
            }
            c if c.is_whitespace() => {}
            _ => sign_run = 0,
        }
    }

    if depth != 0 {
        return Err(EvalError::Unbalanced);
    }
    Ok(())
}

/// Whole numbers print without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
