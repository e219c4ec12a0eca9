pub mod renderers;
pub mod task;
