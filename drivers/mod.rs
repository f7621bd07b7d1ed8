// Driver package / 驱动包
pub mod gcs;
pub mod memory;

pub use gcs::GcsDriver;
pub use memory::MemoryDriver;
