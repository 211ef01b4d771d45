use crate::error::{VidqlError, VidqlResult};
use crate::params::{combination_allowed, DateFilter, Intent, MetricField, QueryParameters};
use chrono::NaiveDate;
use uuid::Uuid;

/// A value bound to a `$n` placeholder, in placeholder order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindValue {
    Date(NaiveDate),
    Uuid(Uuid),
}

/// One read-only aggregate statement over one table. The text contains only
/// identifiers drawn from the closed parameter enums; every date and UUID
/// value is a bound parameter, never interpolated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledQuery {
    pub text: String,
    pub binds: Vec<BindValue>,
}

/// Deterministically assemble the SQL for one validated parameter set.
///
/// WHERE predicates always appear in the same order: date restriction,
/// creator restriction, then (for distinct-active counts only) the
/// positive-metric condition last.
pub fn assemble(params: &QueryParameters) -> VidqlResult<AssembledQuery> {
    // The validator rejects these upstream; refuse to guess if one slips by.
    if !combination_allowed(params.intent, params.table, params.metric) {
        return Err(VidqlError::UnknownIntentCombination {
            intent: params.intent.as_str(),
            table: params.table.as_str(),
            field: params.metric.as_str(),
        });
    }

    let mut conditions: Vec<String> = Vec::new();
    let mut binds: Vec<BindValue> = Vec::new();
    let date_col = params.table.date_column();

    match params.date {
        Some(DateFilter::Exact(day)) => {
            binds.push(BindValue::Date(day));
            conditions.push(format!("{}::DATE = ${}", date_col, binds.len()));
        }
        Some(DateFilter::Range { from, to }) => {
            binds.push(BindValue::Date(from));
            let from_n = binds.len();
            binds.push(BindValue::Date(to));
            let to_n = binds.len();
            conditions.push(format!(
                "{col}::DATE >= ${from_n} AND {col}::DATE <= ${to_n}",
                col = date_col
            ));
        }
        None => {}
    }

    if let Some(creator) = params.creator {
        binds.push(BindValue::Uuid(creator));
        conditions.push(format!("creator_id = ${}", binds.len()));
    }

    if params.intent == Intent::UniqueActive {
        conditions.push(format!("{} > 0", params.metric.as_str()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let select = match params.intent {
        // Counting rows by id, summing any other absolute counter. Absolute
        // counters are never null in this schema, so the sum needs no guard.
        Intent::TotalStatic => {
            if params.metric == MetricField::Id {
                format!("COUNT({})", params.metric.as_str())
            } else {
                format!("SUM({})", params.metric.as_str())
            }
        }
        // A window with no snapshots legitimately sums to zero, not NULL.
        Intent::GrowthDynamic => format!("COALESCE(SUM({}), 0)", params.metric.as_str()),
        // Count the owning videos, not the metric itself.
        Intent::UniqueActive => format!("COUNT(DISTINCT {})", params.table.entity_key()),
    };

    Ok(AssembledQuery {
        text: format!(
            "SELECT {} FROM {}{}",
            select,
            params.table.as_str(),
            where_clause
        ),
        binds,
    })
}
