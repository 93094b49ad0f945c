//! Data models for the GTL catalog

pub mod address;
pub mod author;
pub mod material;
pub mod subject;
pub mod volume;

// Re-export commonly used types
pub use address::Address;
pub use author::{Author, AuthorRef};
pub use material::{Material, MaterialInput, MaterialType, MaterialTypeRef};
pub use subject::{Subject, SubjectRef};
pub use volume::{Volume, VolumeFilter, VolumeInput};
