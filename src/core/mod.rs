pub mod capacity;
pub mod orders;
pub mod prep;
pub mod production;
pub mod recipe;
