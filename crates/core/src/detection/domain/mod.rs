pub mod cascade_classifier;
pub mod face_locator;
pub mod head_image;
pub mod locator_config;
