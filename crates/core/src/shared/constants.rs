/// Cascade artifact location, relative to the data directory.
pub const CASCADE_FILE: &str = "haarcascades/haarcascade_frontalface_alt2.xml";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "FACEWATCH_DATA_DIR";

pub const APP_DIR_NAME: &str = "facewatch";

/// Per-stream queue bound of the approximate-time synchronizer.
pub const DEFAULT_QUEUE_DEPTH: usize = 30;

pub const DEFAULT_SYNC_TOLERANCE_MS: u64 = 100;

/// Detector-origin tag of recognitions produced from a whole head region.
pub const HEAD_DETECTOR_TAG: &str = "head";

/// Face found, but too far from every known identity.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Region proposed as a face that did not qualify at the recognition stage.
pub const NO_FACE_LABEL: &str = "No face";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
