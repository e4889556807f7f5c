pub mod cascade_face_locator;
pub mod opencv_cascade;
