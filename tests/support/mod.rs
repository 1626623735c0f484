#![allow(dead_code)]

pub mod churn_csv;
pub mod http;
pub mod providers;
