//! Declarative filter specifications.
//!
//! A [`FilterSpec`] lists every query parameter a resource accepts, its value
//! type, optional allowed values and default. Specifications are assembled
//! from independent [`OptionSet`]s (pagination, upload, status, search) plus
//! the resource's own fields, and validate raw [`QueryParams`] into typed
//! [`FilterValues`] before any query is composed.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use uuid::Uuid;

use super::error::QueryError;

/// Raw query parameters: every key maps to all the values it was given.
///
/// Keys written with a trailing `[]` (`tags_ids[]=...`) are stored without it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    /// Parse an `application/x-www-form-urlencoded` query string.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()))
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            params.insert(key.as_ref(), value);
        }
        params
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let key = key.strip_suffix("[]").unwrap_or(key);
        self.entries
            .entry(key.to_string())
            .or_default()
            .push(value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Value type a parameter is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Uuid,
    /// ISO 8601 calendar date (`YYYY-MM-DD`).
    Date,
    Integer,
    Boolean,
    /// Zero or more UUIDs; a single value may also be comma separated.
    UuidList,
    /// Zero or more free-form strings.
    TextList,
}

impl FieldKind {
    const fn describe(self) -> &'static str {
        match self {
            Self::Text => "a string",
            Self::Uuid => "a UUID",
            Self::Date => "a date (YYYY-MM-DD)",
            Self::Integer => "a non-negative integer",
            Self::Boolean => "a boolean",
            Self::UuidList => "a list of UUIDs",
            Self::TextList => "a list of strings",
        }
    }
}

/// How the query builder uses a validated parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Exact match on the column with the same name as the field.
    Equals,
    /// The named timestamp column falls on or before the given day.
    OnOrBefore(&'static str),
    /// The named timestamp column falls on or after the given day.
    OnOrAfter(&'static str),
    /// At least one related row has an id in the given set.
    Related,
    /// JSON document predicates (`<path> <op> <value>`).
    Predicates,
    /// Free-text search keywords.
    Terms,
    /// Approval status narrowing.
    Status,
    /// Restrict to rows uploaded by the caller.
    Mine,
    SortBy,
    Page,
    PerPage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: FieldKind,
    pub role: FieldRole,
    pub one_of: Option<&'static [&'static str]>,
    pub default: Option<&'static str>,
    pub description: &'static str,
}

impl FieldSpec {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind, role: FieldRole) -> Self {
        Self {
            name,
            aliases: &[],
            kind,
            role,
            one_of: None,
            default: None,
            description: "",
        }
    }

    /// Text field matched exactly against the column of the same name.
    #[must_use]
    pub const fn equals(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text, FieldRole::Equals)
    }

    /// UUID field matched exactly against the column of the same name.
    #[must_use]
    pub const fn uuid(name: &'static str) -> Self {
        Self::new(name, FieldKind::Uuid, FieldRole::Equals)
    }

    #[must_use]
    pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    #[must_use]
    pub const fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.one_of = Some(allowed);
        self
    }

    #[must_use]
    pub const fn default(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    fn answers_to(&self, key: &str) -> bool {
        self.name == key || self.aliases.contains(&key)
    }

    fn invalid(&self, message: impl Into<String>) -> QueryError {
        QueryError::validation(self.name, message)
    }

    fn coerce(&self, given: &[&str]) -> Result<FieldValue, QueryError> {
        match self.kind {
            FieldKind::UuidList => given
                .iter()
                .flat_map(|value| value.split(','))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(|value| self.parse_uuid(value))
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::UuidList),
            FieldKind::TextList => Ok(FieldValue::TextList(
                given.iter().map(|value| (*value).to_string()).collect(),
            )),
            _ => {
                let [single] = given else {
                    return Err(self.invalid(format!(
                        "expected a single value, got {}",
                        given.len()
                    )));
                };
                match self.kind {
                    FieldKind::Text => self.coerce_scalar(single),
                    _ => self.coerce_scalar(single.trim()),
                }
            }
        }
    }

    fn coerce_scalar(&self, value: &str) -> Result<FieldValue, QueryError> {
        let expected = || self.invalid(format!("expected {}, got '{value}'", self.kind.describe()));
        match self.kind {
            FieldKind::Text => {
                if let Some(allowed) = self.one_of
                    && !allowed.contains(&value)
                {
                    return Err(self.invalid(format!(
                        "must be one of {}, got '{value}'",
                        allowed.join(", ")
                    )));
                }
                Ok(FieldValue::Text(value.to_string()))
            }
            FieldKind::Uuid => self.parse_uuid(value).map(FieldValue::Uuid),
            FieldKind::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(FieldValue::Date)
                .map_err(|_| expected()),
            FieldKind::Integer => value
                .parse::<u64>()
                .map(FieldValue::Integer)
                .map_err(|_| expected()),
            FieldKind::Boolean => match value.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(FieldValue::Boolean(true)),
                "false" | "0" | "no" => Ok(FieldValue::Boolean(false)),
                _ => Err(expected()),
            },
            FieldKind::UuidList | FieldKind::TextList => Err(expected()),
        }
    }

    fn parse_uuid(&self, value: &str) -> Result<Uuid, QueryError> {
        Uuid::parse_str(value).map_err(|_| {
            self.invalid(format!(
                "expected {}, got '{value}'",
                FieldKind::Uuid.describe()
            ))
        })
    }
}

/// A parameter value after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Uuid(Uuid),
    Date(NaiveDate),
    Integer(u64),
    Boolean(bool),
    UuidList(Vec<Uuid>),
    TextList(Vec<String>),
}

impl FieldValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Uuid(id) => write!(f, "{id}"),
            Self::Date(date) => write!(f, "{date}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::UuidList(ids) => {
                let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
                write!(f, "{}", ids.join(","))
            }
            Self::TextList(items) => write!(f, "{}", items.join(",")),
        }
    }
}

/// Validated parameters, defaults applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterValues {
    values: BTreeMap<&'static str, FieldValue>,
}

impl FilterValues {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A named group of fields shared between resources.
#[derive(Debug, Clone)]
pub struct OptionSet {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
}

/// `page` (1-based) and `per_page` (alias `size`).
#[must_use]
pub fn pagination_options() -> OptionSet {
    OptionSet {
        name: "pagination",
        fields: vec![
            FieldSpec::new("page", FieldKind::Integer, FieldRole::Page)
                .default("1")
                .describe("Page number, starting at 1"),
            FieldSpec::new("per_page", FieldKind::Integer, FieldRole::PerPage)
                .aliases(&["size"])
                .describe("Number of items per page"),
        ],
    }
}

/// Upload date range and the caller's own uploads.
#[must_use]
pub fn upload_options() -> OptionSet {
    OptionSet {
        name: "upload",
        fields: vec![
            FieldSpec::new(
                "upload_before",
                FieldKind::Date,
                FieldRole::OnOrBefore("upload_datetime"),
            )
            .describe("Uploaded on or before date (ISO8601)"),
            FieldSpec::new(
                "upload_after",
                FieldKind::Date,
                FieldRole::OnOrAfter("upload_datetime"),
            )
            .describe("Uploaded on or after date (ISO8601)"),
            FieldSpec::new("mine", FieldKind::Boolean, FieldRole::Mine)
                .describe("Only items uploaded by the caller"),
        ],
    }
}

pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_ON_REVIEW: &str = "on_review";
pub const STATUS_ALL: &str = "all";

/// Approval status, `approved` unless asked otherwise.
#[must_use]
pub fn status_options() -> OptionSet {
    OptionSet {
        name: "status",
        fields: vec![
            FieldSpec::new("status", FieldKind::Text, FieldRole::Status)
                .one_of(&[STATUS_APPROVED, STATUS_ON_REVIEW, STATUS_ALL])
                .default(STATUS_APPROVED)
                .describe("Approval status of the items"),
        ],
    }
}

/// Free-text search keywords.
#[must_use]
pub fn search_options() -> OptionSet {
    OptionSet {
        name: "search",
        fields: vec![
            FieldSpec::new("terms", FieldKind::TextList, FieldRole::Terms)
                .describe("Keywords that must all appear in the item"),
        ],
    }
}

/// Every parameter one resource listing accepts.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    resource: &'static str,
    fields: Vec<FieldSpec>,
}

impl FilterSpec {
    #[must_use]
    pub fn new(resource: &'static str) -> Self {
        Self {
            resource,
            fields: Vec::new(),
        }
    }

    /// Merge an option set; a field already present under the same name is replaced.
    #[must_use]
    pub fn with(self, options: OptionSet) -> Self {
        options.fields.into_iter().fold(self, Self::field)
    }

    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Declare `sort_by` with the resource's default sort expression.
    #[must_use]
    pub fn sort_default(self, default: &'static str) -> Self {
        self.field(
            FieldSpec::new("sort_by", FieldKind::Text, FieldRole::SortBy)
                .default(default)
                .describe("Order to return the results (comma separated, +/- prefixed)"),
        )
    }

    #[must_use]
    pub fn resource(&self) -> &'static str {
        self.resource
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.answers_to(key))
    }

    /// Validate raw parameters and apply defaults.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownField`] for an undeclared key and
    /// [`QueryError::Validation`] for a value that does not coerce.
    pub fn validate(&self, params: &QueryParams) -> Result<FilterValues, QueryError> {
        let mut given: BTreeMap<&'static str, Vec<&str>> = BTreeMap::new();
        for (key, values) in params.iter() {
            let field = self
                .lookup(key)
                .ok_or_else(|| QueryError::unknown_field(key))?;
            given
                .entry(field.name)
                .or_default()
                .extend(values.iter().map(String::as_str));
        }

        let mut values = BTreeMap::new();
        for field in &self.fields {
            let value = match (given.get(field.name), field.default) {
                (Some(raw), _) => field.coerce(raw)?,
                (None, Some(default)) => field.coerce(&[default])?,
                (None, None) => continue,
            };
            values.insert(field.name, value);
        }

        Ok(FilterValues { values })
    }
}
