pub mod config;
pub mod detect_head_faces_use_case;
pub mod display_node;
pub mod image_publisher;
pub mod infrastructure;
pub mod node_logger;
