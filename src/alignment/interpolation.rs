use crate::types::{AlignedCaption, Token};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub start_ms: u64,
    pub end_ms: u64,
    pub confidence: Option<f32>,
}

/// A script token waiting for its timing; `timing` is `None` when the
/// matcher found no transcribed words for it.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSlot {
    pub text: String,
    pub timing: Option<Timing>,
}

/// Fills every run of untimed slots by splitting the gap between its timed
/// neighbours evenly.
///
/// A run of `g` slots between `prev_end` and `next_start` gets
/// `duration = gap / (g + 1)`; slot `k` (1-based) starts at
/// `prev_end + (k - 1) * duration`. Without a timed predecessor `prev_end`
/// is 0, without a timed successor `next_start` is `right_edge_ms`.
/// Interpolated captions carry no confidence.
pub fn interpolate(slots: &[CaptionSlot], right_edge_ms: u64) -> Vec<AlignedCaption> {
    let mut captions = Vec::with_capacity(slots.len());
    let mut idx = 0usize;

    while idx < slots.len() {
        if let Some(timing) = slots[idx].timing {
            captions.push(AlignedCaption::new(
                slots[idx].text.clone(),
                timing.start_ms,
                timing.end_ms,
                timing.confidence,
            ));
            idx += 1;
            continue;
        }

        let run_start = idx;
        let run_end = slots[run_start..]
            .iter()
            .position(|s| s.timing.is_some())
            .map_or(slots.len(), |offset| run_start + offset);

        let prev_end = run_start
            .checked_sub(1)
            .and_then(|p| slots[p].timing)
            .map_or(0, |t| t.end_ms);
        let next_start = slots
            .get(run_end)
            .and_then(|s| s.timing)
            .map_or(right_edge_ms, |t| t.start_ms);

        let run_len = run_end - run_start;
        let gap = next_start.saturating_sub(prev_end) as f64;
        let duration = gap / (run_len + 1) as f64;

        for (k, slot) in slots[run_start..run_end].iter().enumerate() {
            let start = prev_end as f64 + k as f64 * duration;
            let end = start + duration;
            let caption = AlignedCaption::new(
                slot.text.clone(),
                start.round() as u64,
                end.round() as u64,
                None,
            );
            tracing::debug!(
                token_idx = run_start + k,
                text = caption.text.as_str(),
                start_ms = caption.start_ms,
                end_ms = caption.end_ms,
                "interpolation: estimated timing"
            );
            captions.push(caption);
        }
        idx = run_end;
    }
    captions
}

/// Evenly spreads `total_duration_ms` over every token; used when the
/// transcription is empty and the caller opted into a fallback.
pub fn uniform_split(tokens: &[Token], total_duration_ms: u64) -> Vec<AlignedCaption> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let per_token = total_duration_ms as f64 / tokens.len() as f64;
    tokens
        .iter()
        .enumerate()
        .map(|(k, token)| {
            let start = (k as f64 * per_token).round() as u64;
            let end = ((k + 1) as f64 * per_token).round() as u64;
            AlignedCaption::new(token.text.clone(), start, end, None)
        })
        .collect()
}
