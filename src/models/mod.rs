pub mod frequency;
pub mod productivity;
pub mod user;
