use std::time::Instant;

use thiserror::Error;

use crate::fusion::domain::correlated_triple::CorrelatedTriple;
use crate::fusion::domain::frame_annotator::{AnnotationError, FrameAnnotator};
use crate::fusion::domain::messages::{DetectionArray, ImageMessage, RecognitionArray};
use crate::fusion::domain::synchronizer::{ApproximateTimeSynchronizer, SyncConfig};
use crate::pipeline::image_publisher::{ImagePublisher, PublishError};
use crate::pipeline::node_logger::NodeLogger;
use crate::shared::timestamp::Timestamp;

#[derive(Error, Debug)]
pub enum DisplayNodeError {
    #[error("annotation failed: {0}")]
    Annotation(#[from] AnnotationError),
    #[error("publishing failed: {0}")]
    Publish(#[from] PublishError),
}

/// Counters kept over the node's lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub recognitions_received: usize,
    pub detections_received: usize,
    pub images_received: usize,
    pub published: usize,
    pub annotation_failures: usize,
}

/// Joins recognitions, detections and color images, and publishes one
/// annotated image per correlated triple.
///
/// Every callback pushes into the synchronizer; when that completes a
/// triple the frame is annotated and published before the callback
/// returns. A triple that fails to annotate or publish is dropped and the
/// callback returns the error; the node itself stays usable.
pub struct DisplayNode {
    synchronizer: ApproximateTimeSynchronizer<RecognitionArray, DetectionArray, ImageMessage>,
    annotator: Box<dyn FrameAnnotator>,
    publisher: Box<dyn ImagePublisher>,
    logger: Box<dyn NodeLogger>,
    stats: NodeStats,
}

impl DisplayNode {
    pub fn new(
        config: SyncConfig,
        annotator: Box<dyn FrameAnnotator>,
        publisher: Box<dyn ImagePublisher>,
        logger: Box<dyn NodeLogger>,
    ) -> Self {
        Self {
            synchronizer: ApproximateTimeSynchronizer::new(config),
            annotator,
            publisher,
            logger,
            stats: NodeStats::default(),
        }
    }

    /// Returns the stamp of the published frame when this message completed a triple.
    pub fn on_recognitions(&mut self, msg: RecognitionArray) -> Result<Option<Timestamp>, DisplayNodeError> {
        self.stats.recognitions_received += 1;
        let start = Instant::now();
        let matched = self.synchronizer.push_first(msg);
        self.after_push(start, matched)
    }

    pub fn on_detections(&mut self, msg: DetectionArray) -> Result<Option<Timestamp>, DisplayNodeError> {
        self.stats.detections_received += 1;
        let start = Instant::now();
        let matched = self.synchronizer.push_second(msg);
        self.after_push(start, matched)
    }

    pub fn on_color_image(&mut self, msg: ImageMessage) -> Result<Option<Timestamp>, DisplayNodeError> {
        self.stats.images_received += 1;
        let start = Instant::now();
        let matched = self.synchronizer.push_third(msg);
        self.after_push(start, matched)
    }

    pub fn stats(&self) -> NodeStats {
        self.stats
    }

    /// Messages waiting for partners, per stream.
    pub fn pending(&self) -> (usize, usize, usize) {
        self.synchronizer.queue_lens()
    }

    /// Messages dropped by the synchronizer without being published.
    pub fn discarded(&self) -> usize {
        self.synchronizer.discarded()
    }

    /// Logs final counters and the logger's summary.
    pub fn finish(&mut self) {
        let s = self.stats;
        self.logger.info(&format!(
            "Display node done: {} published, {} annotation failures, {} discarded \
             (received {} recognitions, {} detections, {} images)",
            s.published,
            s.annotation_failures,
            self.synchronizer.discarded(),
            s.recognitions_received,
            s.detections_received,
            s.images_received
        ));
        self.logger.summary();
    }

    fn after_push(
        &mut self,
        start: Instant,
        matched: Option<(RecognitionArray, DetectionArray, ImageMessage)>,
    ) -> Result<Option<Timestamp>, DisplayNodeError> {
        self.logger.timing("sync", elapsed_ms(start));
        let (pending_r, pending_d, pending_i) = self.synchronizer.queue_lens();
        self.logger.metric("recognition_queue", pending_r as f64);
        self.logger.metric("detection_queue", pending_d as f64);
        self.logger.metric("image_queue", pending_i as f64);

        match matched {
            Some(triple) => self.publish(CorrelatedTriple::from(triple)).map(Some),
            None => Ok(None),
        }
    }

    fn publish(&mut self, triple: CorrelatedTriple) -> Result<Timestamp, DisplayNodeError> {
        let stamp = triple.stamp();
        self.logger
            .metric("head_count", triple.detections.head_detections.len() as f64);
        self.logger
            .metric("recognition_count", triple.recognitions.detections.len() as f64);

        let start = Instant::now();
        let annotated = match self.annotator.annotate(&triple) {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.annotation_failures += 1;
                log::error!("Dropping frame {stamp}: {e}");
                return Err(e.into());
            }
        };
        self.logger.timing("annotate", elapsed_ms(start));

        let start = Instant::now();
        self.publisher.publish(ImageMessage::from_frame(&annotated))?;
        self.logger.timing("publish", elapsed_ms(start));

        self.stats.published += 1;
        self.logger.published(self.stats.published);
        log::debug!("Published annotated frame {stamp} (spread {:?})", triple.spread());
        Ok(stamp)
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
