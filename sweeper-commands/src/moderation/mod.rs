pub mod clear;
pub mod clearall;
pub mod clearold;
pub mod clearuser;
pub mod embeds;
