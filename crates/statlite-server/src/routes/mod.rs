pub mod health;
pub mod heatmap;
pub mod stats;
pub mod track;
