use thiserror::Error;

pub type BcResult<T> = Result<T, BcError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BcError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Year out of range for {what}: {year}")]
    YearOutOfRange { what: &'static str, year: i32 },
}
