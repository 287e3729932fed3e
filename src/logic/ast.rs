//! Canonical logic AST.
//!
//! The raw nested logic object is parsed once per clause into a tagged
//! variant tree. For comparisons, operand order is normalized at parse time
//! so `var_path`, `op`, `threshold` form an explicit canonical triple:
//! threshold-on-left inputs (`{">=": [0.3, {"var": "emotions.fear"}]}`) get
//! their operator logically flipped.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison operators supported by clause logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `==`
    Eq,
}

impl CompareOp {
    /// Parses an operator token. Returns `None` for anything unrecognized.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            ">=" => Some(Self::Ge),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            "<" => Some(Self::Lt),
            "==" => Some(Self::Eq),
            _ => None,
        }
    }

    /// The logically flipped operator, for operand-order normalization.
    ///
    /// `t >= x` is the same constraint as `x <= t`.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Ge => Self::Le,
            Self::Le => Self::Ge,
            Self::Gt => Self::Lt,
            Self::Lt => Self::Gt,
            Self::Eq => Self::Eq,
        }
    }

    /// Applies the operator to two numbers.
    #[must_use]
    pub fn compare(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Ge => lhs >= rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Lt => lhs < rhs,
            Self::Eq => (lhs - rhs).abs() < f64::EPSILON,
        }
    }

    /// True for `>=`/`>`: the clause wants the variable *above* the threshold.
    #[must_use]
    pub const fn is_upward(self) -> bool {
        matches!(self, Self::Ge | Self::Gt)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Eq => "==",
        };
        write!(f, "{s}")
    }
}

/// A literal operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    /// A numeric literal.
    Number(f64),
    /// A boolean literal.
    Bool(bool),
    /// A string literal.
    Str(String),
}

impl Literal {
    /// The numeric value, if this literal is a number.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// One node of a parsed clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogicNode {
    /// A bare variable reference, evaluated as a truthiness test.
    Var { path: String },

    /// A bare literal, evaluated as a truthiness test.
    Literal { value: Literal },

    /// A comparison between two operands.
    ///
    /// `var_path` and `threshold` are the canonical extracted triple:
    /// `var_path` is set only when exactly one operand is a variable and the
    /// other a literal (after normalization the variable is on the left);
    /// `threshold` only when that literal is numeric.
    Compare {
        op: CompareOp,
        lhs: Box<LogicNode>,
        rhs: Box<LogicNode>,
        var_path: Option<String>,
        threshold: Option<f64>,
    },

    /// Conjunction over children.
    And { children: Vec<LogicNode> },

    /// Disjunction over children.
    Or { children: Vec<LogicNode> },

    /// Negation.
    Not { child: Box<LogicNode> },

    /// An unrecognized operator: always evaluates false, never errors.
    Unsupported { operator: String },
}

impl LogicNode {
    /// Parses a raw JSON-logic value into the canonical tree.
    ///
    /// Parsing is total: malformed or unrecognized input yields
    /// [`LogicNode::Unsupported`] leaves rather than an error, so a single
    /// bad clause degrades locally instead of aborting the run.
    #[must_use]
    pub fn parse(raw: &serde_json::Value) -> Self {
        match raw {
            serde_json::Value::Bool(b) => Self::Literal {
                value: Literal::Bool(*b),
            },
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(v) => Self::Literal {
                    value: Literal::Number(v),
                },
                None => Self::Unsupported {
                    operator: "non-finite number".to_string(),
                },
            },
            serde_json::Value::String(s) => Self::Literal {
                value: Literal::Str(s.clone()),
            },
            serde_json::Value::Object(map) if map.len() == 1 => match map.iter().next() {
                Some((key, value)) => Self::parse_operator(key, value),
                None => Self::Unsupported {
                    operator: "empty object".to_string(),
                },
            },
            _ => Self::Unsupported {
                operator: "malformed node".to_string(),
            },
        }
    }

    fn parse_operator(key: &str, value: &serde_json::Value) -> Self {
        if key == "var" {
            return match value.as_str() {
                Some(path) => Self::Var {
                    path: path.to_string(),
                },
                None => Self::Unsupported {
                    operator: "var with non-string path".to_string(),
                },
            };
        }

        if let Some(op) = CompareOp::parse(key) {
            let Some(operands) = value.as_array() else {
                return Self::Unsupported {
                    operator: format!("{key} with non-array operands"),
                };
            };
            if operands.len() != 2 {
                return Self::Unsupported {
                    operator: format!("{key} with {} operands", operands.len()),
                };
            }
            return Self::normalize_compare(op, Self::parse(&operands[0]), Self::parse(&operands[1]));
        }

        match key {
            "and" | "or" => {
                let Some(items) = value.as_array() else {
                    return Self::Unsupported {
                        operator: format!("{key} with non-array children"),
                    };
                };
                let children = items.iter().map(Self::parse).collect();
                if key == "and" {
                    Self::And { children }
                } else {
                    Self::Or { children }
                }
            }
            "!" => {
                // Accept both `{"!": node}` and `{"!": [node]}`.
                let inner = match value.as_array() {
                    Some(items) if items.len() == 1 => &items[0],
                    Some(_) => {
                        return Self::Unsupported {
                            operator: "! with multiple children".to_string(),
                        }
                    }
                    None => value,
                };
                Self::Not {
                    child: Box::new(Self::parse(inner)),
                }
            }
            other => Self::Unsupported {
                operator: other.to_string(),
            },
        }
    }

    /// Builds a `Compare` with the variable operand on the left.
    fn normalize_compare(op: CompareOp, lhs: Self, rhs: Self) -> Self {
        let (op, lhs, rhs) = match (&lhs, &rhs) {
            // Threshold on the left: flip so the variable leads.
            (Self::Literal { .. }, Self::Var { .. }) => (op.flip(), rhs, lhs),
            _ => (op, lhs, rhs),
        };

        let var_path = match (&lhs, &rhs) {
            (Self::Var { path }, Self::Literal { .. }) => Some(path.clone()),
            _ => None,
        };
        let threshold = match &rhs {
            Self::Literal { value } if var_path.is_some() => value.as_number(),
            _ => None,
        };

        Self::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            var_path,
            threshold,
        }
    }

    /// Collects every variable path referenced anywhere in the tree.
    pub fn collect_var_paths(&self, out: &mut Vec<String>) {
        match self {
            Self::Var { path } => out.push(path.clone()),
            Self::Compare { lhs, rhs, .. } => {
                lhs.collect_var_paths(out);
                rhs.collect_var_paths(out);
            }
            Self::And { children } | Self::Or { children } => {
                for child in children {
                    child.collect_var_paths(out);
                }
            }
            Self::Not { child } => child.collect_var_paths(out),
            Self::Literal { .. } | Self::Unsupported { .. } => {}
        }
    }

    /// Short human-readable rendering, used in leaf failure descriptions.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Var { path } => path.clone(),
            Self::Literal { value } => value.to_string(),
            Self::Compare { op, lhs, rhs, .. } => {
                format!("{} {op} {}", lhs.describe(), rhs.describe())
            }
            Self::And { children } => {
                let parts: Vec<String> = children.iter().map(Self::describe).collect();
                format!("({})", parts.join(" AND "))
            }
            Self::Or { children } => {
                let parts: Vec<String> = children.iter().map(Self::describe).collect();
                format!("({})", parts.join(" OR "))
            }
            Self::Not { child } => format!("NOT {}", child.describe()),
            Self::Unsupported { operator } => format!("<unsupported: {operator}>"),
        }
    }
}
