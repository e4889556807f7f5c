pub mod channel_image_publisher;
pub mod image_directory_publisher;
pub mod threaded_display_executor;
