pub mod directory;
pub mod fake;
pub mod source;

pub use directory::DirectoryCamera;
pub use fake::FakeCamera;
pub use source::{Frame, FrameSource};
