pub mod annotation_style;
pub mod correlated_triple;
pub mod frame_annotator;
pub mod messages;
pub mod synchronizer;
