use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FilterError {
    #[error("Invalid date filter '{0}': expected today, tomorrow or week")]
    InvalidDateWindow(String),
}
