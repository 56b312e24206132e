pub mod run;
pub mod scenarios;
pub mod validate;
