use crate::error::{VidqlError, VidqlResult};
use crate::params::{
    combination_allowed, DateFilter, Intent, MetricField, QueryParameters, RawParameters,
    TargetTable,
};
use chrono::NaiveDate;
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Turn raw extractor output into validated parameters, or reject with the
/// first failing rule. Purely local: no I/O, total over any input.
pub fn validate(raw: &RawParameters) -> VidqlResult<QueryParameters> {
    let intent = required_member("intent", raw.intent.as_deref(), Intent::parse)?;
    let table = required_member("target_table", raw.target_table.as_deref(), TargetTable::parse)?;
    let metric = required_member("metric_field", raw.metric_field.as_deref(), MetricField::parse)?;

    if !combination_allowed(intent, table, metric) {
        return Err(VidqlError::Validation {
            field: "metric_field",
            reason: format!(
                "field/table/intent mismatch: {} is not valid for {} over {}",
                metric.as_str(),
                intent.as_str(),
                table.as_str()
            ),
        });
    }

    // Exact date wins over a range; a lone range endpoint is ignored.
    let date = if let Some(exact) = raw.date_exact.as_deref() {
        Some(DateFilter::Exact(parse_date("date_exact", exact)?))
    } else if let (Some(from), Some(to)) = (raw.date_from.as_deref(), raw.date_to.as_deref()) {
        let from = parse_date("date_from", from)?;
        let to = parse_date("date_to", to)?;
        if from > to {
            return Err(VidqlError::Validation {
                field: "date_from",
                reason: format!("range start {} is after range end {}", from, to),
            });
        }
        Some(DateFilter::Range { from, to })
    } else {
        None
    };

    let creator = match raw.creator_id.as_deref() {
        Some(id) => Some(Uuid::parse_str(id).map_err(|_| VidqlError::Validation {
            field: "creator_id",
            reason: "not a UUID".to_string(),
        })?),
        None => None,
    };

    Ok(QueryParameters {
        intent,
        table,
        metric,
        date,
        creator,
    })
}

fn required_member<T>(
    field: &'static str,
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
) -> VidqlResult<T> {
    let value = value.ok_or(VidqlError::Validation {
        field,
        reason: "required".to_string(),
    })?;
    parse(value).ok_or_else(|| VidqlError::Validation {
        field,
        reason: format!("unknown value '{}'", value),
    })
}

fn parse_date(field: &'static str, value: &str) -> VidqlResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| VidqlError::Validation {
        field,
        reason: format!("'{}' is not a YYYY-MM-DD date", value),
    })
}
