use std::thread::JoinHandle;

use crossbeam_channel::{never, select, Receiver, RecvError, Sender};

use crate::fusion::domain::messages::{DetectionArray, ImageMessage, RecognitionArray};
use crate::pipeline::display_node::{DisplayNode, DisplayNodeError};
use crate::pipeline::image_publisher::PublishError;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Runs a [`DisplayNode`] on its own thread, fed by three channels.
///
/// Layout: `recognitions ┐
///          detections   ├→ node [sync → annotate → publish]
///          images       ┘`
///
/// Producers may live on any thread; the node sees one message at a time.
/// A triple that fails to annotate is dropped and the loop keeps serving;
/// a publish failure stops the thread.
pub struct ThreadedDisplayExecutor {
    channel_capacity: usize,
}

/// Producer ends of the node's input channels. Dropping all three lets
/// the node thread finish.
pub struct DisplayInputs {
    pub recognitions: Sender<RecognitionArray>,
    pub detections: Sender<DetectionArray>,
    pub images: Sender<ImageMessage>,
}

/// Handle to a running node thread.
pub struct RunningDisplay {
    handle: JoinHandle<Result<DisplayNode, PublishError>>,
}

impl ThreadedDisplayExecutor {
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_capacity(channel_capacity: usize) -> Self {
        Self {
            channel_capacity: channel_capacity.max(1),
        }
    }

    pub fn spawn(&self, node: DisplayNode) -> (DisplayInputs, RunningDisplay) {
        let cap = self.channel_capacity;
        let (rec_tx, rec_rx) = crossbeam_channel::bounded(cap);
        let (det_tx, det_rx) = crossbeam_channel::bounded(cap);
        let (img_tx, img_rx) = crossbeam_channel::bounded(cap);

        let handle = std::thread::spawn(move || run_node(node, rec_rx, det_rx, img_rx));

        (
            DisplayInputs {
                recognitions: rec_tx,
                detections: det_tx,
                images: img_tx,
            },
            RunningDisplay { handle },
        )
    }
}

impl Default for ThreadedDisplayExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningDisplay {
    /// Waits for the node thread and returns the node, or the publish error
    /// that stopped it.
    pub fn join(self) -> Result<DisplayNode, Box<dyn std::error::Error>> {
        match self.handle.join() {
            Ok(Ok(node)) => Ok(node),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err("Display thread panicked".into()),
        }
    }
}

enum Event {
    Recognitions(Result<RecognitionArray, RecvError>),
    Detections(Result<DetectionArray, RecvError>),
    Image(Result<ImageMessage, RecvError>),
}

/// Consumer loop: serves whichever input is ready until every producer
/// has hung up. Annotation failures are logged by the node and skipped;
/// a publish failure ends the loop.
fn run_node(
    mut node: DisplayNode,
    mut rec_rx: Receiver<RecognitionArray>,
    mut det_rx: Receiver<DetectionArray>,
    mut img_rx: Receiver<ImageMessage>,
) -> Result<DisplayNode, PublishError> {
    let mut open = 3;
    while open > 0 {
        let event = select! {
            recv(rec_rx) -> msg => Event::Recognitions(msg),
            recv(det_rx) -> msg => Event::Detections(msg),
            recv(img_rx) -> msg => Event::Image(msg),
        };

        let result = match event {
            Event::Recognitions(Ok(msg)) => node.on_recognitions(msg),
            Event::Detections(Ok(msg)) => node.on_detections(msg),
            Event::Image(Ok(msg)) => node.on_color_image(msg),
            Event::Recognitions(Err(_)) => {
                rec_rx = never();
                open -= 1;
                continue;
            }
            Event::Detections(Err(_)) => {
                det_rx = never();
                open -= 1;
                continue;
            }
            Event::Image(Err(_)) => {
                img_rx = never();
                open -= 1;
                continue;
            }
        };

        match result {
            Ok(_) | Err(DisplayNodeError::Annotation(_)) => {}
            Err(DisplayNodeError::Publish(e)) => {
                node.finish();
                return Err(e);
            }
        }
    }

    node.finish();
    Ok(node)
}
