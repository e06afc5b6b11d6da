pub mod interval;
pub mod point;
pub mod rect;
pub mod rtree;
