//! SQL conditions for the individual filter kinds.

use chrono::{DateTime, Days, NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, DatabaseBackend, Value,
    sea_query::{ColumnType, Expr, SimpleExpr},
};

use super::error::QueryError;
use super::predicate::{ComparisonOp, JsonPath, Literal, Predicate};
use super::spec::FieldValue;

/// How one backend names JSON value types and reaches into documents.
struct JsonDialect {
    number_types: &'static [&'static str],
    string_types: &'static [&'static str],
    null_type: &'static str,
}

const SQLITE: JsonDialect = JsonDialect {
    number_types: &["integer", "real"],
    string_types: &["text"],
    null_type: "null",
};

const POSTGRES: JsonDialect = JsonDialect {
    number_types: &["number"],
    string_types: &["string"],
    null_type: "null",
};

const MYSQL: JsonDialect = JsonDialect {
    number_types: &["INTEGER", "UNSIGNED INTEGER", "DOUBLE", "DECIMAL"],
    string_types: &["STRING"],
    null_type: "NULL",
};

const fn dialect(backend: DatabaseBackend) -> &'static JsonDialect {
    match backend {
        DatabaseBackend::Postgres => &POSTGRES,
        DatabaseBackend::MySql => &MYSQL,
        DatabaseBackend::Sqlite => &SQLITE,
    }
}

impl JsonDialect {
    fn comparable_types(&self, literal: &Literal) -> &'static [&'static str] {
        match literal {
            Literal::Number(_) => self.number_types,
            Literal::Text(_) => self.string_types,
        }
    }
}

/// Path argument in the form each backend binds it.
fn path_value(backend: DatabaseBackend, path: &JsonPath) -> SimpleExpr {
    match backend {
        DatabaseBackend::Postgres => format!("{{{}}}", path.segments().join(",")).into(),
        DatabaseBackend::MySql | DatabaseBackend::Sqlite => path.to_sql_path().into(),
    }
}

/// Type name of the value at `path`; SQL NULL when the path is missing.
fn json_type(backend: DatabaseBackend, document: SimpleExpr, path: &JsonPath) -> SimpleExpr {
    let template = match backend {
        DatabaseBackend::Postgres => "json_typeof(($1) #> CAST($2 AS text[]))",
        DatabaseBackend::MySql => "JSON_TYPE(JSON_EXTRACT(?, ?))",
        DatabaseBackend::Sqlite => "json_type(?, ?)",
    };
    Expr::cust_with_exprs(template, [document, path_value(backend, path)])
}

/// Scalar value at `path`, as a SQL number or text depending on `literal`.
fn json_scalar(
    backend: DatabaseBackend,
    document: SimpleExpr,
    path: &JsonPath,
    literal: &Literal,
) -> SimpleExpr {
    let template = match (backend, literal) {
        (DatabaseBackend::Postgres, Literal::Number(_)) => {
            "CASE WHEN json_typeof(($1) #> CAST($2 AS text[])) = 'number' \
             THEN CAST(($1) #>> CAST($2 AS text[]) AS double precision) END"
        }
        (DatabaseBackend::Postgres, Literal::Text(_)) => {
            "(($1) #>> CAST($2 AS text[])) COLLATE \"C\""
        }
        (DatabaseBackend::MySql, Literal::Number(_)) => {
            "CAST(JSON_UNQUOTE(JSON_EXTRACT(?, ?)) AS DOUBLE)"
        }
        (DatabaseBackend::MySql, Literal::Text(_)) => {
            "JSON_UNQUOTE(JSON_EXTRACT(?, ?)) COLLATE utf8mb4_bin"
        }
        (DatabaseBackend::Sqlite, _) => "json_extract(?, ?)",
    };
    Expr::cust_with_exprs(template, [document, path_value(backend, path)])
}

fn compare(lhs: SimpleExpr, op: ComparisonOp, rhs: Value) -> SimpleExpr {
    let lhs = Expr::expr(lhs);
    match op {
        ComparisonOp::Gt => lhs.gt(rhs),
        ComparisonOp::Lt => lhs.lt(rhs),
        ComparisonOp::Eq => lhs.eq(rhs),
        ComparisonOp::Ne => lhs.ne(rhs),
        ComparisonOp::Gte => lhs.gte(rhs),
        ComparisonOp::Lte => lhs.lte(rhs),
    }
}

/// Rows whose document holds a value of the literal's kind at the predicate's
/// path and that value satisfies the comparison.
#[must_use]
pub fn json_predicate(
    backend: DatabaseBackend,
    document: &SimpleExpr,
    predicate: &Predicate,
) -> SimpleExpr {
    let allowed = dialect(backend).comparable_types(&predicate.value);
    let type_matches =
        Expr::expr(json_type(backend, document.clone(), &predicate.path)).is_in(allowed.iter().copied());
    let value_matches = compare(
        json_scalar(backend, document.clone(), &predicate.path, &predicate.value),
        predicate.op,
        predicate.value.to_value(),
    );
    type_matches.and(value_matches)
}

/// Rows holding a present, non-null value at the predicate's path that cannot
/// be compared with its literal.
#[must_use]
pub fn json_type_mismatch(
    backend: DatabaseBackend,
    document: &SimpleExpr,
    predicate: &Predicate,
) -> SimpleExpr {
    let dialect = dialect(backend);
    let tolerated = dialect
        .comparable_types(&predicate.value)
        .iter()
        .copied()
        .chain(std::iter::once(dialect.null_type));
    Expr::expr(json_type(backend, document.clone(), &predicate.path)).is_not_in(tolerated)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// `column` falls on `date` or earlier.
#[must_use]
pub fn on_or_before<C: ColumnTrait>(column: C, date: NaiveDate) -> SimpleExpr {
    match date.checked_add_days(Days::new(1)) {
        Some(next_day) => column.lt(start_of_day(next_day)),
        None => column.is_not_null(),
    }
}

/// `column` falls on `date` or later.
#[must_use]
pub fn on_or_after<C: ColumnTrait>(column: C, date: NaiveDate) -> SimpleExpr {
    column.gte(start_of_day(date))
}

/// Convert a validated value to the type of `column`.
///
/// # Errors
///
/// [`QueryError::TypeMismatch`] when the value cannot be represented in the
/// column's declared type.
pub fn column_value<C: ColumnTrait>(column: C, value: &FieldValue) -> Result<Value, QueryError> {
    let mismatch = || QueryError::TypeMismatch {
        field: column.as_str().to_string(),
        value: value.to_string(),
    };
    let column_type = column.def().get_column_type().clone();
    match (column_type, value) {
        (ColumnType::Uuid, FieldValue::Uuid(id)) => Ok((*id).into()),
        (ColumnType::Uuid, FieldValue::Text(text)) => uuid::Uuid::parse_str(text.trim())
            .map(Into::into)
            .map_err(|_| mismatch()),
        (
            ColumnType::String(_) | ColumnType::Text | ColumnType::Char(_),
            FieldValue::Text(text),
        ) => Ok(text.clone().into()),
        (
            ColumnType::String(_) | ColumnType::Text | ColumnType::Char(_),
            FieldValue::Uuid(id),
        ) => Ok(id.to_string().into()),
        (ColumnType::Boolean, FieldValue::Boolean(flag)) => Ok((*flag).into()),
        (
            ColumnType::Integer | ColumnType::BigInteger | ColumnType::SmallInteger,
            FieldValue::Integer(number),
        ) => i64::try_from(*number).map(Into::into).map_err(|_| mismatch()),
        (
            ColumnType::Integer | ColumnType::BigInteger | ColumnType::SmallInteger,
            FieldValue::Text(text),
        ) => text.trim().parse::<i64>().map(Into::into).map_err(|_| mismatch()),
        _ => Err(mismatch()),
    }
}

/// Exact match of `column` against a validated value.
///
/// # Errors
///
/// See [`column_value`].
pub fn equals<C: ColumnTrait>(column: C, value: &FieldValue) -> Result<SimpleExpr, QueryError> {
    column_value(column, value).map(|value| column.eq(value))
}
