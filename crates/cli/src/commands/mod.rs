pub mod catalog;
pub mod doctor;
pub mod serve;
