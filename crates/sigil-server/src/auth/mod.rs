pub mod bootstrap;
pub mod directory;
