use sea_orm::{
    Condition,
    sea_query::{BinOper, Expr, ExprTrait, Func, SimpleExpr},
};

use super::error::QueryError;

// Basic safety limits
const MAX_KEYWORD_LENGTH: usize = 256;
const MAX_KEYWORDS: usize = 32;

const LIKE_ESCAPE: char = '|';

/// Escape LIKE wildcards so keywords match literally.
fn escape_like_wildcards(input: &str) -> String {
    input
        .replace(LIKE_ESCAPE, "||")
        .replace('%', "|%")
        .replace('_', "|_")
}

/// Split search terms into keywords.
///
/// Every term is tokenized on whitespace, so `terms=a b` and `terms=a&terms=b`
/// search for the same two keywords.
///
/// # Errors
///
/// [`QueryError::Validation`] on `terms` when there are more than
/// `MAX_KEYWORDS` keywords or one is longer than `MAX_KEYWORD_LENGTH` characters.
pub fn keywords<S: AsRef<str>>(terms: &[S]) -> Result<Vec<String>, QueryError> {
    let keywords: Vec<String> = terms
        .iter()
        .flat_map(|term| term.as_ref().split_whitespace())
        .map(str::to_string)
        .collect();
    if keywords.len() > MAX_KEYWORDS {
        return Err(QueryError::validation(
            "terms",
            format!("at most {MAX_KEYWORDS} keywords are allowed, got {}", keywords.len()),
        ));
    }
    if let Some(long) = keywords
        .iter()
        .find(|keyword| keyword.chars().count() > MAX_KEYWORD_LENGTH)
    {
        return Err(QueryError::validation(
            "terms",
            format!(
                "keywords are limited to {MAX_KEYWORD_LENGTH} characters, got {}",
                long.chars().count()
            ),
        ));
    }
    Ok(keywords)
}

/// `UPPER(expr) LIKE UPPER('%keyword%') ESCAPE '|'`
///
/// The store folds both sides, so case-insensitivity follows the backend's
/// `UPPER` (ASCII only on SQLite) and never drops an exact match.
#[must_use]
pub fn contains(expr: impl Into<SimpleExpr>, keyword: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like_wildcards(keyword));
    let pattern = SimpleExpr::Binary(
        Box::new(Func::upper(Expr::val(pattern)).into()),
        BinOper::Escape,
        Box::new(SimpleExpr::Constant(LIKE_ESCAPE.into())),
    );
    Func::upper(expr.into()).binary(BinOper::Like, pattern)
}

/// Case-insensitive containment of `keyword` in any of `columns`.
#[must_use]
pub fn contains_any<C>(columns: &[C], keyword: &str) -> Condition
where
    C: sea_orm::ColumnTrait + Copy,
{
    columns.iter().fold(Condition::any(), |condition, column| {
        condition.add(contains(Expr::col((column.entity_name(), *column)), keyword))
    })
}

/// AND across keywords of the per-keyword condition built by `projection`.
pub fn all_keywords<F>(keywords: &[String], projection: F) -> Condition
where
    F: Fn(&str) -> Condition,
{
    keywords
        .iter()
        .fold(Condition::all(), |condition, keyword| {
            condition.add(projection(keyword))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::{Alias, Query, SqliteQueryBuilder};

    fn render(condition: Condition) -> String {
        Query::select()
            .column(Alias::new("id"))
            .from(Alias::new("site"))
            .cond_where(condition)
            .to_string(SqliteQueryBuilder)
    }

    #[test]
    fn test_keywords_split_on_whitespace() {
        assert_eq!(
            keywords(&["a/b  c", "d"]).unwrap(),
            vec!["a/b".to_string(), "c".to_string(), "d".to_string()]
        );
        assert!(keywords::<&str>(&[]).unwrap().is_empty());
        assert!(keywords(&["   "]).unwrap().is_empty());
    }

    #[test]
    fn test_wildcards_are_escaped() {
        let (sql, values) = Query::select()
            .column(Alias::new("id"))
            .from(Alias::new("site"))
            .and_where(contains(Expr::col(Alias::new("name")), "50%_off"))
            .build(SqliteQueryBuilder);
        assert!(sql.contains(r#"UPPER("name") LIKE UPPER(?) ESCAPE '|'"#), "{sql}");
        assert_eq!(values.0, vec![sea_orm::Value::from("%50|%|_off%")]);
    }

    #[test]
    fn test_quotes_are_bound_not_interpolated() {
        let (sql, values) = Query::select()
            .column(Alias::new("id"))
            .from(Alias::new("site"))
            .and_where(contains(Expr::col(Alias::new("name")), "x' OR '1'='1"))
            .build(SqliteQueryBuilder);
        assert!(!sql.contains("OR '1'"), "{sql}");
        assert_eq!(values.0.len(), 1);
    }

    #[test]
    fn test_keywords_are_anded() {
        let keywords = keywords(&["kit cern"]).unwrap();
        let sql = render(all_keywords(&keywords, |keyword| {
            Condition::any()
                .add(contains(Expr::col(Alias::new("name")), keyword))
                .add(contains(Expr::col(Alias::new("address")), keyword))
        }));
        assert!(sql.contains("UPPER('%kit%')"), "{sql}");
        assert!(sql.contains("UPPER('%cern%')"), "{sql}");
        assert!(sql.contains(") AND ("), "{sql}");
    }

    #[test]
    fn test_keyword_limits_are_rejected() {
        let at_limit = "x".repeat(MAX_KEYWORD_LENGTH);
        assert_eq!(keywords(&[at_limit]).unwrap().len(), 1);

        let long = "é".repeat(MAX_KEYWORD_LENGTH + 1);
        let err = keywords(&[long]).unwrap_err();
        assert!(matches!(err, QueryError::Validation { ref field, .. } if field == "terms"));

        let many = vec!["kit"; MAX_KEYWORDS + 1];
        let err = keywords(&many).unwrap_err();
        assert!(matches!(err, QueryError::Validation { ref field, .. } if field == "terms"));
        assert_eq!(keywords(&many[..MAX_KEYWORDS]).unwrap().len(), MAX_KEYWORDS);
    }

    #[test]
    fn test_keyword_case_is_left_to_the_store() {
        let (sql, values) = Query::select()
            .column(Alias::new("id"))
            .from(Alias::new("site"))
            .and_where(contains(Expr::col(Alias::new("name")), "León"))
            .build(SqliteQueryBuilder);
        assert!(sql.contains("UPPER(?)"), "{sql}");
        assert_eq!(values.0, vec![sea_orm::Value::from("%León%")]);
    }
}
