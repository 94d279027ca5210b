//! Position solving algorithms

pub mod trilateration;

pub use trilateration::RectangularTrilateration;
