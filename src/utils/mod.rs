//! Shared utilities.

pub mod image;

pub use image::{dynamic_to_gray, dynamic_to_rgb, load_image, load_image_from_bytes};
