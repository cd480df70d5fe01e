pub mod keywords;
pub mod rules;
pub mod verify;
