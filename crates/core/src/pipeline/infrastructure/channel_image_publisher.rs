use crossbeam_channel::Sender;

use crate::fusion::domain::messages::ImageMessage;
use crate::pipeline::image_publisher::{ImagePublisher, PublishError};

/// Forwards annotated images into a crossbeam channel.
pub struct ChannelImagePublisher {
    tx: Sender<ImageMessage>,
}

impl ChannelImagePublisher {
    pub fn new(tx: Sender<ImageMessage>) -> Self {
        Self { tx }
    }
}

impl ImagePublisher for ChannelImagePublisher {
    fn publish(&mut self, image: ImageMessage) -> Result<(), PublishError> {
        self.tx.send(image).map_err(|_| PublishError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::Frame;
    use crate::shared::timestamp::Timestamp;

    fn image() -> ImageMessage {
        ImageMessage::from_frame(&Frame::new(vec![1, 2, 3], 1, 1, 3, Timestamp::ZERO))
    }

    #[test]
    fn test_publish_sends_image() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut publisher = ChannelImagePublisher::new(tx);
        publisher.publish(image()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), image());
    }

    #[test]
    fn test_publish_after_receiver_dropped() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        let mut publisher = ChannelImagePublisher::new(tx);
        assert!(matches!(publisher.publish(image()), Err(PublishError::Closed)));
    }
}
