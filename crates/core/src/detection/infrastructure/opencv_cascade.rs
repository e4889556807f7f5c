//! Haar cascade face classifier backed by OpenCV's `objdetect` module.
//!
//! Loads the trained `haarcascade_frontalface_alt2.xml` artifact and runs
//! `detectMultiScale` with the locator's tuning parameters.

use std::error::Error;
use std::path::Path;

use opencv::core::{Mat, Rect, Size, Vector};
use opencv::prelude::*;
use opencv::{imgproc, objdetect};

use crate::detection::domain::cascade_classifier::{CascadeClassifier, CascadeLoadError};
use crate::detection::domain::locator_config::LocatorConfig;
use crate::shared::constants::CASCADE_FILE;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// No CASCADE_* flags; the cascade scales the image itself.
const DETECT_FLAGS: i32 = 0;

pub struct OpenCvCascade {
    classifier: objdetect::CascadeClassifier,
}

impl OpenCvCascade {
    /// Loads `<data_dir>/haarcascades/haarcascade_frontalface_alt2.xml`.
    pub fn load(data_dir: &Path) -> Result<Self, CascadeLoadError> {
        if !data_dir.is_dir() {
            return Err(CascadeLoadError::MissingDirectory(data_dir.to_path_buf()));
        }
        let path = data_dir.join(CASCADE_FILE);
        if !path.is_file() {
            return Err(CascadeLoadError::MissingCascade(path));
        }

        let load_error = |source: Box<dyn Error + Send + Sync>| CascadeLoadError::Load {
            path: path.clone(),
            source,
        };
        let name = path
            .to_str()
            .ok_or_else(|| load_error("path is not valid UTF-8".into()))?;
        let classifier =
            objdetect::CascadeClassifier::new(name).map_err(|e| load_error(Box::new(e)))?;
        if classifier.empty().map_err(|e| load_error(Box::new(e)))? {
            return Err(CascadeLoadError::Empty(path));
        }

        log::info!("Loaded face cascade from {}", path.display());
        Ok(Self { classifier })
    }
}

impl CascadeClassifier for OpenCvCascade {
    fn detect_multi_scale(
        &mut self,
        image: &Frame,
        config: &LocatorConfig,
    ) -> Result<Vec<Region>, Box<dyn Error + Send + Sync>> {
        let gray = to_gray(image)?;
        let (min_neighbors, min_size) = search_args(config);
        let mut found = Vector::<Rect>::new();
        self.classifier.detect_multi_scale(
            &gray,
            &mut found,
            config.scale_step,
            min_neighbors,
            DETECT_FLAGS,
            min_size,
            Size::default(),
        )?;
        Ok(found
            .iter()
            .map(|r| Region::new(r.x, r.y, r.width, r.height))
            .collect())
    }
}

/// `minNeighbors` and `minSize` as OpenCV takes them. `validate` keeps both
/// within `i32`.
fn search_args(config: &LocatorConfig) -> (i32, Size) {
    let min_size = Size::new(
        config.min_window_width as i32,
        config.min_window_height as i32,
    );
    (config.min_neighbors as i32, min_size)
}

/// Single-channel 8-bit view of an RGB or grayscale frame.
fn to_gray(image: &Frame) -> opencv::Result<Mat> {
    let mat = image.to_mat()?;
    if image.channels() == 1 {
        return Ok(mat);
    }
    let mut gray = Mat::default();
    imgproc::cvt_color_def(&mat, &mut gray, imgproc::COLOR_RGB2GRAY)?;
    Ok(gray)
}
