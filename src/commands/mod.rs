pub mod copy;
pub mod select;
