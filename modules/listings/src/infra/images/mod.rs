pub mod cloudinary;

pub use cloudinary::{CloudinaryImageStore, CloudinarySettings};
