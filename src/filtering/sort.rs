use sea_orm::{ColumnTrait, sea_query::Order};

use super::error::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    #[must_use]
    pub const fn order(self) -> Order {
        match self {
            Self::Ascending => Order::Asc,
            Self::Descending => Order::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: Direction,
}

/// Comma separated sort keys, each optionally prefixed with `+` (ascending,
/// the default) or `-` (descending): `+name,-upload_datetime`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortExpression {
    keys: Vec<SortKey>,
}

impl SortExpression {
    /// # Errors
    ///
    /// [`QueryError::Validation`] on an empty key such as `+name,,-id`.
    pub fn parse(expression: &str) -> Result<Self, QueryError> {
        let keys = expression
            .split(',')
            .map(str::trim)
            .map(|key| {
                let (direction, field) = if let Some(field) = key.strip_prefix('-') {
                    (Direction::Descending, field)
                } else {
                    (Direction::Ascending, key.strip_prefix('+').unwrap_or(key))
                };
                if field.is_empty() {
                    return Err(QueryError::validation(
                        "sort_by",
                        format!("empty sort key in '{expression}'"),
                    ));
                }
                Ok(SortKey {
                    field: field.to_string(),
                    direction,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { keys })
    }

    #[must_use]
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Same keys with every direction flipped.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            keys: self
                .keys
                .iter()
                .map(|key| SortKey {
                    field: key.field.clone(),
                    direction: key.direction.reversed(),
                })
                .collect(),
        }
    }

    /// Map keys to columns and append `tie_breaks` not already ordered on, so
    /// the resulting ORDER BY is total.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownField`] when a key is not a sortable column.
    pub fn resolve<C>(
        &self,
        sortable: &[(&'static str, C)],
        tie_breaks: &[C],
    ) -> Result<Vec<(C, Order)>, QueryError>
    where
        C: ColumnTrait + Copy,
    {
        let mut order = Vec::with_capacity(self.keys.len() + tie_breaks.len());
        let mut seen: Vec<&str> = Vec::new();
        for key in &self.keys {
            let &(name, column) = sortable
                .iter()
                .find(|(name, _)| *name == key.field)
                .ok_or_else(|| QueryError::unknown_field(&key.field))?;
            if seen.contains(&name) {
                continue;
            }
            seen.push(name);
            order.push((column, key.direction.order()));
        }
        for column in tie_breaks {
            if !seen.contains(&column.as_str()) {
                order.push((*column, Order::Asc));
            }
        }
        Ok(order)
    }
}

impl std::fmt::Display for SortExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = self
            .keys
            .iter()
            .map(|key| match key.direction {
                Direction::Ascending => format!("+{}", key.field),
                Direction::Descending => format!("-{}", key.field),
            })
            .collect();
        f.write_str(&keys.join(","))
    }
}
