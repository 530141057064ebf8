//! Conversions from errors to device-interface status codes.
//!
//! The protocol layer expects zero for success and a non-zero code per
//! failure kind. A clip that leaves nothing to draw is a success.

use super::types::{Error, Result};

/// Status returned for a completed operation.
pub const STATUS_SUCCESS: i32 = 0;

impl Error {
    /// Stable non-zero status code for this error kind.
    pub fn status(&self) -> i32 {
        match self {
            Error::InvalidHandle(_) => 1,
            Error::Geometry(_) => 2,
            Error::UnsupportedDepth(_) => 3,
            Error::ObjectInUse { .. } => 4,
        }
    }
}

impl From<&Error> for i32 {
    fn from(err: &Error) -> Self {
        err.status()
    }
}

/// Collapse an operation result into its status code.
pub fn status_of<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => STATUS_SUCCESS,
        Err(e) => e.status(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ObjectKind;

    #[test]
    fn test_status_codes_are_distinct_and_non_zero() {
        let errors = [
            Error::InvalidHandle("x".into()),
            Error::Geometry("x".into()),
            Error::UnsupportedDepth("x".into()),
            Error::ObjectInUse {
                kind: ObjectKind::Pen,
                dcs: 1,
            },
        ];
        let codes: Vec<i32> = errors.iter().map(i32::from).collect();
        assert_eq!(codes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_status_of() {
        assert_eq!(status_of(&Ok::<(), Error>(())), STATUS_SUCCESS);
        assert_eq!(status_of::<()>(&Err(Error::Geometry("empty".into()))), 2);
    }

    #[test]
    fn test_error_display() {
        let err = Error::wrong_kind(ObjectKind::Brush, ObjectKind::Pen);
        assert_eq!(err.to_string(), "Invalid handle: expected brush, got pen");
    }
}
