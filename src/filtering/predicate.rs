//! JSON document predicates.
//!
//! A predicate is written `<path> <op> <value>`, for example
//! `machine.cpu.count > 4`. The path addresses a nested field of a result's
//! JSON document, the operator is symbolic (`>`, `<`, `=`, `!=`, `>=`, `<=`)
//! or textual (`gt`, `lt`, `eq`, `ne`, `ge`/`gte`, `le`/`lte`) and the value is
//! a number when it parses as one, otherwise a string.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::error::QueryError;

/// Maximum number of nested keys in a path.
const MAX_PATH_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Gt,
    Lt,
    Eq,
    Ne,
    Gte,
    Lte,
}

impl ComparisonOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }

    /// Whether an ordering between two values satisfies this operator.
    #[must_use]
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Gt => ordering == Ordering::Greater,
            Self::Lt => ordering == Ordering::Less,
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Gte => ordering != Ordering::Less,
            Self::Lte => ordering != Ordering::Greater,
        }
    }
}

impl FromStr for ComparisonOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" | "gt" => Ok(Self::Gt),
            "<" | "lt" => Ok(Self::Lt),
            "=" | "==" | "eq" => Ok(Self::Eq),
            "!=" | "<>" | "ne" | "neq" => Ok(Self::Ne),
            ">=" | "ge" | "gte" => Ok(Self::Gte),
            "<=" | "le" | "lte" => Ok(Self::Lte),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
}

impl Literal {
    fn parse(token: &str) -> Self {
        match token.parse::<f64>() {
            Ok(number) if number.is_finite() => Self::Number(number),
            _ => Self::Text(token.to_string()),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Text(_) => "string",
        }
    }

    pub(crate) fn to_value(&self) -> sea_orm::Value {
        match self {
            Self::Number(number) => (*number).into(),
            Self::Text(text) => text.clone().into(),
        }
    }
}

/// Dotted path into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    segments: Vec<String>,
}

impl JsonPath {
    /// Parse a dotted path. Keys may contain ASCII letters, digits, `_` and `-`.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first offending key.
    pub fn parse(path: &str) -> Result<Self, String> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.len() > MAX_PATH_DEPTH {
            return Err(format!("path is deeper than {MAX_PATH_DEPTH} keys"));
        }
        for segment in &segments {
            if segment.is_empty() {
                return Err("path contains an empty key".to_string());
            }
            if !segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(format!("invalid key '{segment}' in path"));
            }
        }
        Ok(Self { segments })
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The `$."a"."b"` form understood by SQLite and MySQL JSON functions.
    #[must_use]
    pub fn to_sql_path(&self) -> String {
        self.segments
            .iter()
            .fold(String::from("$"), |mut path, segment| {
                path.push_str(".\"");
                path.push_str(segment);
                path.push('"');
                path
            })
    }

    /// Look the path up in a document.
    #[must_use]
    pub fn resolve<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(document, |value, segment| value.as_object()?.get(segment))
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub path: JsonPath,
    pub op: ComparisonOp,
    pub value: Literal,
}

impl Predicate {
    pub(crate) fn unsupported(&self) -> QueryError {
        QueryError::UnsupportedPredicateType {
            path: self.path.to_string(),
            operator: self.op.to_string(),
            literal: self.value.kind(),
        }
    }

    /// Evaluate the predicate against one document.
    ///
    /// A missing value or JSON `null` never matches.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnsupportedPredicateType`] when the stored value and the
    /// literal are of different kinds.
    pub fn evaluate(&self, document: &Value) -> Result<bool, QueryError> {
        let ordering = match (self.path.resolve(document), &self.value) {
            (None | Some(Value::Null), _) => return Ok(false),
            (Some(Value::Number(stored)), Literal::Number(literal)) => stored
                .as_f64()
                .and_then(|stored| stored.partial_cmp(literal)),
            (Some(Value::String(stored)), Literal::Text(literal)) => {
                Some(stored.as_str().cmp(literal.as_str()))
            }
            _ => return Err(self.unsupported()),
        };
        Ok(ordering.is_some_and(|ordering| self.op.accepts(ordering)))
    }
}

impl FromStr for Predicate {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        let [path, op, value] = tokens.as_slice() else {
            return Err(QueryError::malformed(
                s,
                format!("expected '<path> <op> <value>', found {} tokens", tokens.len()),
            ));
        };
        let path = JsonPath::parse(path).map_err(|reason| QueryError::malformed(s, reason))?;
        let op = op
            .parse::<ComparisonOp>()
            .map_err(|()| QueryError::malformed(s, format!("unsupported operator '{op}'")))?;
        Ok(Self {
            path,
            op,
            value: Literal::parse(value),
        })
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Literal::Number(number) => write!(f, "{} {} {number}", self.path, self.op),
            Literal::Text(text) => write!(f, "{} {} {text}", self.path, self.op),
        }
    }
}

/// Parse every filter string, keeping input order and duplicates.
///
/// # Errors
///
/// [`QueryError::MalformedPredicate`] for the first string that does not parse.
pub fn parse_predicates<S: AsRef<str>>(filters: &[S]) -> Result<Vec<Predicate>, QueryError> {
    filters.iter().map(|filter| filter.as_ref().parse()).collect()
}
