pub mod analysis;
pub mod document;
pub mod history;
pub mod plan;
