pub mod adjustments;
pub mod fill;
pub mod shapes;
pub mod text;
pub mod transform;
