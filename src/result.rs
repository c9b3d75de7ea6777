use super::errors::Error;

pub type DispatchResult<T> = Result<T, Error>;
