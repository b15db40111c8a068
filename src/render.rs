pub mod compositor;
pub mod pipeline;
