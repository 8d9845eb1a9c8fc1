pub mod distance;
pub mod interpolation;
pub mod matching;
pub mod merge;
pub mod normalize;
pub mod postprocess;
pub mod report;
pub mod tokenization;
