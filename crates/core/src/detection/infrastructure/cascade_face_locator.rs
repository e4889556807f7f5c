use std::path::Path;

use crate::detection::domain::cascade_classifier::CascadeClassifier;
use crate::detection::domain::face_locator::{FaceLocator, LocatorError};
use crate::detection::domain::head_image::HeadImage;
use crate::detection::domain::locator_config::LocatorConfig;
use crate::detection::infrastructure::opencv_cascade::OpenCvCascade;
use crate::shared::region::Region;

/// Multi-scale face search over head crops.
///
/// Each head is searched on its own; the classifier only ever sees one crop
/// and reports boxes local to it.
pub struct CascadeFaceLocator {
    config: LocatorConfig,
    classifier: Option<Box<dyn CascadeClassifier>>,
}

impl CascadeFaceLocator {
    /// Creates an uninitialized locator; call [`Self::init`] before detecting.
    pub fn new(config: LocatorConfig) -> Result<Self, LocatorError> {
        config.validate().map_err(LocatorError::InvalidConfig)?;
        Ok(Self {
            config,
            classifier: None,
        })
    }

    /// Creates a locator and loads the Haar cascade from `data_dir`.
    pub fn from_data_dir(config: LocatorConfig, data_dir: &Path) -> Result<Self, LocatorError> {
        let mut locator = Self::new(config)?;
        locator.init(data_dir)?;
        Ok(locator)
    }

    /// Creates a locator around an already loaded classifier.
    pub fn with_classifier(
        config: LocatorConfig,
        classifier: Box<dyn CascadeClassifier>,
    ) -> Result<Self, LocatorError> {
        let mut locator = Self::new(config)?;
        locator.classifier = Some(classifier);
        Ok(locator)
    }

    /// Loads the cascade artifact. On failure the locator stays uninitialized.
    pub fn init(&mut self, data_dir: &Path) -> Result<(), LocatorError> {
        let cascade = OpenCvCascade::load(data_dir)?;
        self.classifier = Some(Box::new(cascade));
        log::info!(
            "Face locator initialized (scale_step={}, min_neighbors={}, min_window={}x{})",
            self.config.scale_step,
            self.config.min_neighbors,
            self.config.min_window_width,
            self.config.min_window_height
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }
}

impl FaceLocator for CascadeFaceLocator {
    fn detect(&mut self, heads: &[HeadImage]) -> Result<Vec<Vec<Region>>, LocatorError> {
        let config = &self.config;
        let classifier = self
            .classifier
            .as_deref_mut()
            .ok_or(LocatorError::NotInitialized)?;

        if let Some((index, head)) = heads.iter().enumerate().find(|(_, h)| is_degenerate(h)) {
            return Err(LocatorError::PreconditionViolation {
                index,
                width: head.width(),
                height: head.height(),
                channels: head.pixels().channels(),
            });
        }

        let mut faces = Vec::with_capacity(heads.len());
        for (index, head) in heads.iter().enumerate() {
            faces.push(locate(classifier, config, index, head)?);
        }
        Ok(faces)
    }
}

fn locate(
    classifier: &mut dyn CascadeClassifier,
    config: &LocatorConfig,
    index: usize,
    head: &HeadImage,
) -> Result<Vec<Region>, LocatorError> {
    let (width, height) = (head.width(), head.height());
    if config.min_window_width > width || config.min_window_height > height {
        log::debug!(
            "Head {index} ({width}x{height}) is smaller than the {}x{} minimum window",
            config.min_window_width,
            config.min_window_height
        );
        return Ok(Vec::new());
    }

    let found = classifier
        .detect_multi_scale(head.pixels(), config)
        .map_err(|source| LocatorError::Search { index, source })?;
    let faces: Vec<Region> = found
        .iter()
        .filter_map(|r| r.clamp_to(width, height))
        .collect();
    log::debug!(
        "Head {index} at ({}, {}) {width}x{height}: {} faces",
        head.bounds().x,
        head.bounds().y,
        faces.len()
    );
    Ok(faces)
}

fn is_degenerate(head: &HeadImage) -> bool {
    let pixels = head.pixels();
    pixels.is_empty() || !matches!(pixels.channels(), 1 | 3)
}
