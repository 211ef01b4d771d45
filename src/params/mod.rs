pub mod validate;

pub use validate::validate;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The coarse category of question being asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// Static totals, extrema or averages over the video table.
    TotalStatic,
    /// Sum of period-over-period deltas inside a window.
    GrowthDynamic,
    /// Count of distinct videos whose delta metric is positive in a window.
    UniqueActive,
}

impl Intent {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TOTAL_STATIC" => Some(Intent::TotalStatic),
            "GROWTH_DYNAMIC" => Some(Intent::GrowthDynamic),
            "UNIQUE_ACTIVE" => Some(Intent::UniqueActive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::TotalStatic => "TOTAL_STATIC",
            Intent::GrowthDynamic => "GROWTH_DYNAMIC",
            Intent::UniqueActive => "UNIQUE_ACTIVE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTable {
    Videos,
    VideoSnapshots,
}

impl TargetTable {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "videos" => Some(TargetTable::Videos),
            "video_snapshots" => Some(TargetTable::VideoSnapshots),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetTable::Videos => "videos",
            TargetTable::VideoSnapshots => "video_snapshots",
        }
    }

    /// Column date predicates compare against: creation time for videos,
    /// measurement time for snapshots.
    pub fn date_column(&self) -> &'static str {
        match self {
            TargetTable::Videos => "video_created_at",
            TargetTable::VideoSnapshots => "created_at",
        }
    }

    /// Foreign key a snapshot uses to reference its owning video.
    pub fn entity_key(&self) -> &'static str {
        match self {
            TargetTable::Videos => "id",
            TargetTable::VideoSnapshots => "video_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Id,
    ViewsCount,
    LikesCount,
    DeltaViewsCount,
    DeltaLikesCount,
    DeltaCommentsCount,
}

impl MetricField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "id" => Some(MetricField::Id),
            "views_count" => Some(MetricField::ViewsCount),
            "likes_count" => Some(MetricField::LikesCount),
            "delta_views_count" => Some(MetricField::DeltaViewsCount),
            "delta_likes_count" => Some(MetricField::DeltaLikesCount),
            "delta_comments_count" => Some(MetricField::DeltaCommentsCount),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricField::Id => "id",
            MetricField::ViewsCount => "views_count",
            MetricField::LikesCount => "likes_count",
            MetricField::DeltaViewsCount => "delta_views_count",
            MetricField::DeltaLikesCount => "delta_likes_count",
            MetricField::DeltaCommentsCount => "delta_comments_count",
        }
    }

    /// Delta fields live on snapshots; absolute fields live on videos.
    pub fn is_delta(&self) -> bool {
        matches!(
            self,
            MetricField::DeltaViewsCount
                | MetricField::DeltaLikesCount
                | MetricField::DeltaCommentsCount
        )
    }
}

/// Whether this intent/table/field combination falls inside the documented
/// partitions. Absolute fields only answer static questions over videos;
/// delta fields only answer growth/activity questions over snapshots.
pub fn combination_allowed(intent: Intent, table: TargetTable, field: MetricField) -> bool {
    match intent {
        Intent::TotalStatic => table == TargetTable::Videos && !field.is_delta(),
        Intent::GrowthDynamic | Intent::UniqueActive => {
            table == TargetTable::VideoSnapshots && field.is_delta()
        }
    }
}

/// Untrusted arguments as returned by the reasoning service. Everything is
/// a string until the validator says otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawParameters {
    pub intent: Option<String>,
    pub target_table: Option<String>,
    pub metric_field: Option<String>,
    pub date_exact: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub creator_id: Option<String>,
}

/// Calendar-date restriction on a query. An exact date takes precedence
/// over a range when the extractor supplies both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    Exact(NaiveDate),
    Range { from: NaiveDate, to: NaiveDate },
}

/// Validated, immutable parameters for one request. Built once by the
/// validator, consumed by the assembler, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameters {
    pub intent: Intent,
    pub table: TargetTable,
    pub metric: MetricField,
    pub date: Option<DateFilter>,
    pub creator: Option<Uuid>,
}
