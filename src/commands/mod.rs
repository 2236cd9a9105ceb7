pub mod auth;
pub mod label;
pub mod rule;
pub mod run;
pub mod sort;
