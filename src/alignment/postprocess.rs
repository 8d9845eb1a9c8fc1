use crate::types::AlignedCaption;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PostProcessed {
    pub captions: Vec<AlignedCaption>,
    /// Input index of every kept caption.
    pub kept: Vec<usize>,
    pub dropped_empty: usize,
    pub clamped: usize,
}

/// Drops blank captions and pushes every overlapping start forward to the
/// previous caption's end, so `start_ms[i] >= end_ms[i - 1]` holds.
/// Starts are never moved backwards.
pub fn enforce_invariants(captions: Vec<AlignedCaption>) -> PostProcessed {
    let mut out = PostProcessed::default();

    for (idx, mut caption) in captions.into_iter().enumerate() {
        if caption.text.trim().is_empty() {
            out.dropped_empty += 1;
            continue;
        }
        if let Some(prev) = out.captions.last() {
            if caption.start_ms < prev.end_ms {
                let start = prev.end_ms;
                tracing::debug!(
                    text = caption.text.as_str(),
                    from_ms = caption.start_ms,
                    to_ms = start,
                    "postprocess: clamped overlapping start"
                );
                caption.set_span(start, caption.end_ms.max(start));
                out.clamped += 1;
            }
        }
        out.captions.push(caption);
        out.kept.push(idx);
    }
    out
}
