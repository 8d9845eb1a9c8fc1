use std::cmp::Ordering;

use serde::Serialize;

use crate::alignment::normalize::normalize;
use crate::error::AlignmentError;
use crate::types::{AlignedCaption, AlignmentOutput, CaptionSource};

pub const REPORT_SCHEMA_VERSION: u32 = 1;
const OUTLIER_TOP_N: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub schema_version: u32,
    pub meta: Meta,
    pub cases: Vec<CaseReport>,
    pub aggregates: AggregateReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub generated_at: String,
    pub strategy: String,
    pub rules_version: u32,
    pub case_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub id: String,
    pub has_reference: bool,
    pub duration_ms: u64,
    pub token_count: u32,
    pub caption_count: u32,
    pub structural: StructuralMetrics,
    pub coverage: CoverageMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingMetrics>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructuralMetrics {
    pub overlap_count: u32,
    pub non_monotonic_count: u32,
    pub zero_duration_count: u32,
    /// Silence between consecutive captions over the case duration.
    pub gap_ratio: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageMetrics {
    pub merges: u32,
    pub exact: u32,
    pub concatenated: u32,
    pub contraction: u32,
    pub fuzzy: u32,
    pub interpolated: u32,
    pub uniform_fallback: u32,
    pub interpolated_ratio: f32,
    pub clamped: u32,
    pub dropped_empty: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimingMetrics {
    pub start: EndpointMetrics,
    pub end: EndpointMetrics,
    pub abs_err_ms_median: f32,
    pub abs_err_ms_p90: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointMetrics {
    pub mean_signed_ms: f32,
    pub median_abs_ms: f32,
    pub p90_abs_ms: f32,
    pub max_abs_ms: f32,
}

impl EndpointMetrics {
    fn zero() -> Self {
        Self {
            mean_signed_ms: 0.0,
            median_abs_ms: 0.0,
            p90_abs_ms: 0.0,
            max_abs_ms: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub counts: AggregateCounts,
    pub metrics: AggregateMetrics,
    pub outliers: OutlierReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateCounts {
    pub total: u32,
    pub with_reference: u32,
    pub without_reference: u32,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct AggregateMetrics {
    pub interpolated_ratio: Option<MetricDistribution>,
    pub gap_ratio: Option<MetricDistribution>,
    pub abs_err_ms_median: Option<MetricDistribution>,
    pub abs_err_ms_p90: Option<MetricDistribution>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricDistribution {
    pub mean: f32,
    pub p50: f32,
    pub p90: f32,
    pub p95: f32,
    pub p99: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierReport {
    pub worst_interpolated_ratio: Vec<OutlierEntry>,
    pub worst_abs_err_ms_p90: Vec<OutlierEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierEntry {
    pub id: String,
    pub value: f32,
}

/// Scores one aligned case. `reference` captions are paired with the output
/// by position.
pub fn compute_case_report(
    id: &str,
    output: &AlignmentOutput,
    reference: Option<&[AlignedCaption]>,
    duration_ms: u64,
) -> Result<CaseReport, AlignmentError> {
    let captions = &output.captions;
    let mut notes = Vec::new();
    let has_reference = reference.is_some();
    let reference_captions = reference.unwrap_or(&[]);

    if captions.is_empty() {
        notes.push("no_captions".to_string());
    }
    if output.stats.clamped > 0 {
        notes.push(format!("clamped_starts={}", output.stats.clamped));
    }

    let structural = compute_structural_metrics(captions, duration_ms)?;
    let coverage = compute_coverage_metrics(output)?;

    let timing = if has_reference {
        if captions.len() != reference_captions.len() {
            notes.push(format!(
                "caption_count_mismatch:pred={} ref={}",
                captions.len(),
                reference_captions.len()
            ));
        }
        let mismatches = captions
            .iter()
            .zip(reference_captions)
            .filter(|(pred, reference_caption)| {
                normalize(&pred.text) != normalize(&reference_caption.text)
            })
            .count();
        if mismatches > 0 {
            notes.push(format!("caption_text_mismatches={mismatches}"));
        }
        Some(compute_timing_metrics(captions, reference_captions, &mut notes)?)
    } else {
        None
    };

    Ok(CaseReport {
        id: id.to_string(),
        has_reference,
        duration_ms,
        token_count: to_u32(output.stats.token_count),
        caption_count: to_u32(captions.len()),
        structural,
        coverage,
        timing,
        notes,
    })
}

pub fn aggregate_reports(cases: &[CaseReport]) -> AggregateReport {
    let with_reference = cases.iter().filter(|case| case.timing.is_some()).count();

    let mut interpolated_ratio = Vec::new();
    let mut gap_ratio = Vec::new();
    let mut abs_err_ms_median = Vec::new();
    let mut abs_err_ms_p90 = Vec::new();
    for case in cases {
        interpolated_ratio.push(case.coverage.interpolated_ratio as f64);
        gap_ratio.push(case.structural.gap_ratio as f64);
        if let Some(timing) = case.timing.as_ref() {
            abs_err_ms_median.push(timing.abs_err_ms_median as f64);
            abs_err_ms_p90.push(timing.abs_err_ms_p90 as f64);
        }
    }

    AggregateReport {
        counts: AggregateCounts {
            total: to_u32(cases.len()),
            with_reference: to_u32(with_reference),
            without_reference: to_u32(cases.len().saturating_sub(with_reference)),
        },
        metrics: AggregateMetrics {
            interpolated_ratio: distribution_or_none(&interpolated_ratio),
            gap_ratio: distribution_or_none(&gap_ratio),
            abs_err_ms_median: distribution_or_none(&abs_err_ms_median),
            abs_err_ms_p90: distribution_or_none(&abs_err_ms_p90),
        },
        outliers: OutlierReport {
            worst_interpolated_ratio: ranked_outliers(cases, OUTLIER_TOP_N, |case| {
                (case.coverage.interpolated > 0).then_some(case.coverage.interpolated_ratio as f64)
            }),
            worst_abs_err_ms_p90: ranked_outliers(cases, OUTLIER_TOP_N, |case| {
                case.timing.as_ref().map(|t| t.abs_err_ms_p90 as f64)
            }),
        },
    }
}

fn ranked_outliers(
    cases: &[CaseReport],
    top_n: usize,
    metric: impl Fn(&CaseReport) -> Option<f64>,
) -> Vec<OutlierEntry> {
    let mut entries: Vec<OutlierEntry> = cases
        .iter()
        .filter_map(|case| {
            metric(case).map(|value| OutlierEntry {
                id: case.id.clone(),
                value: value as f32,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    entries.truncate(top_n);
    entries
}

fn distribution_or_none(values: &[f64]) -> Option<MetricDistribution> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    Some(MetricDistribution {
        mean: checked_f32(mean(&sorted), "aggregate.mean").ok()?,
        p50: checked_f32(percentile_sorted(&sorted, 0.5), "aggregate.p50").ok()?,
        p90: checked_f32(percentile_sorted(&sorted, 0.9), "aggregate.p90").ok()?,
        p95: checked_f32(percentile_sorted(&sorted, 0.95), "aggregate.p95").ok()?,
        p99: checked_f32(percentile_sorted(&sorted, 0.99), "aggregate.p99").ok()?,
    })
}

fn compute_structural_metrics(
    captions: &[AlignedCaption],
    duration_ms: u64,
) -> Result<StructuralMetrics, AlignmentError> {
    let zero_duration_count = captions.iter().filter(|c| c.end_ms <= c.start_ms).count();

    let mut overlap_count = 0usize;
    let mut non_monotonic_count = 0usize;
    let mut gap_ms = 0u64;
    for pair in captions.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        if current.end_ms > next.start_ms {
            overlap_count += 1;
        } else {
            gap_ms = gap_ms.saturating_add(next.start_ms - current.end_ms);
        }
        if current.start_ms > next.start_ms {
            non_monotonic_count += 1;
        }
    }

    let gap_ratio = if duration_ms > 0 {
        gap_ms as f64 / duration_ms as f64
    } else {
        0.0
    };

    Ok(StructuralMetrics {
        overlap_count: to_u32(overlap_count),
        non_monotonic_count: to_u32(non_monotonic_count),
        zero_duration_count: to_u32(zero_duration_count),
        gap_ratio: checked_f32(gap_ratio, "structural.gap_ratio")?,
    })
}

fn compute_coverage_metrics(output: &AlignmentOutput) -> Result<CoverageMetrics, AlignmentError> {
    let stats = &output.stats;
    let uniform_fallback = output
        .sources
        .iter()
        .filter(|s| matches!(s, CaptionSource::UniformFallback))
        .count();
    let interpolated_ratio = if stats.token_count > 0 {
        stats.interpolated as f64 / stats.token_count as f64
    } else {
        0.0
    };

    Ok(CoverageMetrics {
        merges: to_u32(stats.merges),
        exact: to_u32(stats.exact),
        concatenated: to_u32(stats.concatenated),
        contraction: to_u32(stats.contraction),
        fuzzy: to_u32(stats.fuzzy),
        interpolated: to_u32(stats.interpolated),
        uniform_fallback: to_u32(uniform_fallback),
        interpolated_ratio: checked_f32(interpolated_ratio, "coverage.interpolated_ratio")?,
        clamped: to_u32(stats.clamped),
        dropped_empty: to_u32(stats.dropped_empty),
    })
}

fn compute_timing_metrics(
    predicted: &[AlignedCaption],
    reference: &[AlignedCaption],
    notes: &mut Vec<String>,
) -> Result<TimingMetrics, AlignmentError> {
    let paired_len = predicted.len().min(reference.len());
    if paired_len == 0 {
        notes.push("no_caption_pairs_for_timing".to_string());
        return Ok(TimingMetrics {
            start: EndpointMetrics::zero(),
            end: EndpointMetrics::zero(),
            abs_err_ms_median: 0.0,
            abs_err_ms_p90: 0.0,
        });
    }

    let mut start_signed = Vec::with_capacity(paired_len);
    let mut end_signed = Vec::with_capacity(paired_len);
    let mut abs_all = Vec::with_capacity(paired_len * 2);
    for (pred, reference_caption) in predicted.iter().zip(reference) {
        let start_err = pred.start_ms as f64 - reference_caption.start_ms as f64;
        let end_err = pred.end_ms as f64 - reference_caption.end_ms as f64;
        start_signed.push(start_err);
        end_signed.push(end_err);
        abs_all.push(start_err.abs());
        abs_all.push(end_err.abs());
    }
    abs_all.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    Ok(TimingMetrics {
        start: endpoint_metrics("timing.start", &start_signed)?,
        end: endpoint_metrics("timing.end", &end_signed)?,
        abs_err_ms_median: checked_f32(median_sorted(&abs_all), "timing.abs_err_ms_median")?,
        abs_err_ms_p90: checked_f32(percentile_sorted(&abs_all, 0.9), "timing.abs_err_ms_p90")?,
    })
}

fn endpoint_metrics(
    metric_prefix: &str,
    signed_errors: &[f64],
) -> Result<EndpointMetrics, AlignmentError> {
    if signed_errors.is_empty() {
        return Ok(EndpointMetrics::zero());
    }

    let mut abs_values: Vec<f64> = signed_errors.iter().map(|value| value.abs()).collect();
    abs_values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let max_abs = abs_values.last().copied().unwrap_or(0.0);

    Ok(EndpointMetrics {
        mean_signed_ms: checked_f32(
            mean(signed_errors),
            &format!("{metric_prefix}.mean_signed_ms"),
        )?,
        median_abs_ms: checked_f32(
            median_sorted(&abs_values),
            &format!("{metric_prefix}.median_abs_ms"),
        )?,
        p90_abs_ms: checked_f32(
            percentile_sorted(&abs_values, 0.9),
            &format!("{metric_prefix}.p90_abs_ms"),
        )?,
        max_abs_ms: checked_f32(max_abs, &format!("{metric_prefix}.max_abs_ms"))?,
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn median_sorted(sorted_values: &[f64]) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    let mid = sorted_values.len() / 2;
    if sorted_values.len() % 2 == 0 {
        (sorted_values[mid - 1] + sorted_values[mid]) / 2.0
    } else {
        sorted_values[mid]
    }
}

/// Linear interpolation between closest ranks.
fn percentile_sorted(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    if sorted_values.len() == 1 {
        return sorted_values[0];
    }

    let rank = percentile.clamp(0.0, 1.0) * (sorted_values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = rank - lower as f64;
        sorted_values[lower] * (1.0 - weight) + sorted_values[upper] * weight
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn checked_f32(value: f64, metric_name: &str) -> Result<f32, AlignmentError> {
    if !value.is_finite() {
        return Err(AlignmentError::invalid_input(format!(
            "metric '{metric_name}' produced non-finite value: {value}"
        )));
    }
    if value < f32::MIN as f64 || value > f32::MAX as f64 {
        return Err(AlignmentError::invalid_input(format!(
            "metric '{metric_name}' out of f32 range: {value}"
        )));
    }
    Ok(value as f32)
}
