use chrono::NaiveDate;

pub type Id = i32;
pub type Date = NaiveDate;
