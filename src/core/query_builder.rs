//! Composition of one listing query from validated parameters.

use std::marker::PhantomData;
use std::str::FromStr;

use sea_orm::{
    ColumnTrait, Condition, DatabaseBackend, EntityTrait, QueryFilter, QueryOrder, Select,
    sea_query::{Expr, Order, SimpleExpr},
};

use super::identity::Identity;
use super::traits::CatalogResource;
use crate::entities::ApprovalStatus;
use crate::filtering::{
    FieldRole, FieldSpec, FieldValue, FilterSpec, PageLimits, PageRequest, Predicate, QueryError,
    QueryParams, STATUS_ALL, SortExpression, conditions, parse_predicates, search,
};

/// A fully composed listing: filters, JSON predicates, total order and page window.
#[derive(Debug, Clone)]
pub struct ListingQuery<R: CatalogResource> {
    condition: Condition,
    predicates: Vec<(Predicate, SimpleExpr, SimpleExpr)>,
    order: Vec<(R::ColumnType, Order)>,
    page: PageRequest,
    _resource: PhantomData<fn() -> R>,
}

impl<R: CatalogResource> ListingQuery<R> {
    /// Every filter except the JSON predicates.
    #[must_use]
    pub fn base_condition(&self) -> Condition {
        self.condition.clone()
    }

    /// Every filter.
    #[must_use]
    pub fn condition(&self) -> Condition {
        self.predicates
            .iter()
            .fold(self.condition.clone(), |condition, (_, matches, _)| {
                condition.add(matches.clone())
            })
    }

    /// Each predicate with the condition selecting rows whose value at its path
    /// has a kind the literal cannot be compared with.
    pub fn type_probes(&self) -> impl Iterator<Item = (&Predicate, &SimpleExpr)> {
        self.predicates
            .iter()
            .map(|(predicate, _, mismatch)| (predicate, mismatch))
    }

    #[must_use]
    pub fn order(&self) -> &[(R::ColumnType, Order)] {
        &self.order
    }

    #[must_use]
    pub const fn page(&self) -> PageRequest {
        self.page
    }

    /// `SELECT` with every filter and the total order applied, without the page window.
    #[must_use]
    pub fn select(&self) -> Select<R::EntityType> {
        self.order.iter().fold(
            R::EntityType::find().filter(self.condition()),
            |select, (column, order)| select.order_by(*column, order.clone()),
        )
    }
}

/// Builds [`ListingQuery`]s for one [`FilterSpec`].
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a> {
    spec: &'a FilterSpec,
    backend: DatabaseBackend,
    limits: PageLimits,
    caller: Option<&'a Identity>,
}

impl<'a> QueryBuilder<'a> {
    #[must_use]
    pub fn new(spec: &'a FilterSpec, backend: DatabaseBackend) -> Self {
        Self {
            spec,
            backend,
            limits: PageLimits::default(),
            caller: None,
        }
    }

    #[must_use]
    pub const fn limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub const fn caller(mut self, caller: Option<&'a Identity>) -> Self {
        self.caller = caller;
        self
    }

    /// Validate `params` against the [`FilterSpec`] and compose the query.
    ///
    /// # Errors
    ///
    /// Any caller error of [`QueryError`]: an undeclared or invalid parameter,
    /// a malformed predicate, a value that does not fit its column, or `mine`
    /// without a caller identity.
    pub fn build<R: CatalogResource>(
        &self,
        params: &QueryParams,
    ) -> Result<ListingQuery<R>, QueryError> {
        let values = self.spec.validate(params)?;
        let page = PageRequest::from_values(&values, self.limits)?;

        let mut condition = Condition::all();
        let mut predicates = Vec::new();
        let mut order = None;

        for field in self.spec.fields() {
            let Some(value) = values.get(field.name) else {
                continue;
            };
            match field.role {
                FieldRole::Equals => {
                    condition = condition.add(conditions::equals(column::<R>(field.name)?, value)?);
                }
                FieldRole::OnOrBefore(target) => {
                    let date = date_value(field, value)?;
                    condition = condition.add(conditions::on_or_before(column::<R>(target)?, date));
                }
                FieldRole::OnOrAfter(target) => {
                    let date = date_value(field, value)?;
                    condition = condition.add(conditions::on_or_after(column::<R>(target)?, date));
                }
                FieldRole::Related => {
                    if let FieldValue::UuidList(ids) = value
                        && !ids.is_empty()
                    {
                        let related = R::related_condition(field.name, ids)
                            .ok_or_else(|| QueryError::unknown_field(field.name))?;
                        condition = condition.add(related);
                    }
                }
                FieldRole::Predicates => {
                    let document = R::document_column()
                        .ok_or_else(|| QueryError::unknown_field(field.name))?;
                    let document: SimpleExpr = Expr::col((document.entity_name(), document)).into();
                    for predicate in parse_predicates(text_list(value))? {
                        let matches = conditions::json_predicate(self.backend, &document, &predicate);
                        let mismatch =
                            conditions::json_type_mismatch(self.backend, &document, &predicate);
                        predicates.push((predicate, matches, mismatch));
                    }
                }
                FieldRole::Terms => {
                    let keywords = search::keywords(text_list(value))?;
                    if !keywords.is_empty() {
                        condition = condition.add(search::all_keywords(&keywords, R::search_condition));
                    }
                }
                FieldRole::Status => {
                    if let Some(status) = status_filter(field, value)? {
                        let column = R::status_column()
                            .ok_or_else(|| QueryError::unknown_field(field.name))?;
                        condition = condition.add(column.eq(status));
                    }
                }
                FieldRole::Mine => {
                    if matches!(value, FieldValue::Boolean(true)) {
                        let identity = self.caller.ok_or_else(|| QueryError::IdentityRequired {
                            field: field.name.to_string(),
                        })?;
                        let (issuer, subject) = R::uploader_columns()
                            .ok_or_else(|| QueryError::unknown_field(field.name))?;
                        condition = condition
                            .add(issuer.eq(identity.issuer.as_str()))
                            .add(subject.eq(identity.subject.as_str()));
                    }
                }
                FieldRole::SortBy => {
                    let expression = value
                        .as_text()
                        .ok_or_else(|| QueryError::validation(field.name, "expected a string"))?;
                    order = Some(
                        SortExpression::parse(expression)?
                            .resolve(&R::sortable_columns(), &R::tie_break_columns())?,
                    );
                }
                FieldRole::Page | FieldRole::PerPage => {}
            }
        }

        let order = order.unwrap_or_else(|| {
            R::tie_break_columns()
                .into_iter()
                .map(|column| (column, Order::Asc))
                .collect()
        });

        tracing::debug!(
            resource = R::RESOURCE_NAME_PLURAL,
            predicates = predicates.len(),
            page = page.page,
            per_page = page.per_page,
            "composed listing query"
        );

        Ok(ListingQuery {
            condition,
            predicates,
            order,
            page,
            _resource: PhantomData,
        })
    }
}

fn column<R: CatalogResource>(name: &str) -> Result<R::ColumnType, QueryError> {
    R::ColumnType::from_str(name).map_err(|_| QueryError::unknown_field(name))
}

fn date_value(field: &FieldSpec, value: &FieldValue) -> Result<chrono::NaiveDate, QueryError> {
    match value {
        FieldValue::Date(date) => Ok(*date),
        other => Err(QueryError::validation(
            field.name,
            format!("expected a date, got '{other}'"),
        )),
    }
}

fn text_list(value: &FieldValue) -> &[String] {
    match value {
        FieldValue::TextList(items) => items,
        _ => &[],
    }
}

fn status_filter(field: &FieldSpec, value: &FieldValue) -> Result<Option<ApprovalStatus>, QueryError> {
    let status = value
        .as_text()
        .ok_or_else(|| QueryError::validation(field.name, "expected a string"))?;
    if status == STATUS_ALL {
        return Ok(None);
    }
    ApprovalStatus::from_filter(status)
        .map(Some)
        .ok_or_else(|| QueryError::validation(field.name, format!("unknown status '{status}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BenchmarkResult, Site, User};
    use sea_orm::QueryTrait;

    fn render<R: CatalogResource>(query: &str, caller: Option<&Identity>) -> Result<String, QueryError> {
        let listing = QueryBuilder::new(R::filter_spec(), DatabaseBackend::Sqlite)
            .caller(caller)
            .build::<R>(&QueryParams::parse(query))?;
        Ok(listing.select().build(DatabaseBackend::Sqlite).to_string())
    }

    #[test]
    fn test_defaults_filter_approved_and_sort_by_name_then_id() {
        let sql = render::<Site>("", None).unwrap();
        assert!(sql.contains(r#""site"."status" = 'approved'"#), "{sql}");
        assert!(sql.contains(r#"ORDER BY "site"."name" ASC, "site"."id" ASC"#), "{sql}");
    }

    #[test]
    fn test_status_all_skips_the_status_filter() {
        let sql = render::<Site>("status=all", None).unwrap();
        assert!(!sql.contains("status"), "{sql}");
    }

    #[test]
    fn test_unknown_field_on_sites() {
        let err = render::<Site>("nonexistent_field=foo", None).unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { ref field } if field == "nonexistent_field"));
    }

    #[test]
    fn test_unknown_sort_column() {
        let err = render::<Site>("sort_by=-color", None).unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { ref field } if field == "color"));
    }

    #[test]
    fn test_mine_requires_identity() {
        let err = render::<Site>("mine=true", None).unwrap_err();
        assert!(matches!(err, QueryError::IdentityRequired { .. }));

        let identity = Identity::new("https://aai.egi.eu/oidc", "alice");
        let sql = render::<Site>("mine=true", Some(&identity)).unwrap();
        assert!(sql.contains(r#""site"."uploader_sub" = 'alice'"#), "{sql}");

        let sql = render::<Site>("mine=false", None).unwrap();
        assert!(!sql.contains("uploader"), "{sql}");
    }

    #[test]
    fn test_result_filters_compose() {
        let tag = uuid::Uuid::new_v4();
        let sql = render::<BenchmarkResult>(
            &format!(
                "execution_after=2019-09-07&tags_ids[]={tag}&filters[]=cpu.count%20%3E%204&sort_by=-execution_datetime"
            ),
            None,
        )
        .unwrap();
        assert!(sql.contains(r#""result"."execution_datetime" >= "#), "{sql}");
        assert!(sql.contains("IN (SELECT"), "{sql}");
        assert!(sql.contains("json_extract"), "{sql}");
        assert!(sql.contains(r#"ORDER BY "result"."execution_datetime" DESC, "result"."id" ASC"#), "{sql}");
    }

    #[test]
    fn test_malformed_predicate_is_reported() {
        let err = render::<BenchmarkResult>("filters=cpu.count%20~%204", None).unwrap_err();
        assert!(matches!(err, QueryError::MalformedPredicate { .. }));
    }

    #[test]
    fn test_users_have_composite_tie_break() {
        let sql = render::<User>("sort_by=-email", None).unwrap();
        assert!(
            sql.contains(r#"ORDER BY "user"."email" DESC, "user"."iss" ASC, "user"."sub" ASC"#),
            "{sql}"
        );
    }

    #[test]
    fn test_search_terms_are_anded() {
        let listing = QueryBuilder::new(Site::search_spec(), DatabaseBackend::Sqlite)
            .build::<Site>(&QueryParams::parse("terms=kit%20karlsruhe"))
            .unwrap();
        let sql = listing.select().build(DatabaseBackend::Sqlite).to_string();
        assert!(sql.contains("%KIT%"), "{sql}");
        assert!(sql.contains("%KARLSRUHE%"), "{sql}");
    }
}
