pub mod orders;
pub mod prep;
pub mod production;
pub mod recipes;
pub mod slots;
