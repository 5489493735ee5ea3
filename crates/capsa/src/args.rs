use smallvec::SmallVec;

use crate::{
    Object,
    exception::{ErrorKind, RunResult},
};

/// Positional arguments of a boundary call.
///
/// Every table function takes at most three arguments, so they are stored
/// inline.
#[derive(Debug, Clone, Default)]
pub struct ArgValues(SmallVec<[Object; 3]>);

impl From<Vec<Object>> for ArgValues {
    fn from(args: Vec<Object>) -> Self {
        Self(SmallVec::from_vec(args))
    }
}

impl FromIterator<Object> for ArgValues {
    fn from_iter<I: IntoIterator<Item = Object>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl ArgValues {
    #[must_use]
    pub fn count(&self) -> usize {
        self.0.len()
    }

    /// Checks that exactly one positional argument was passed, returning it.
    pub fn get_one_arg(self, name: &str) -> RunResult<Object> {
        let count = self.count();
        let mut args = self.0.into_iter();
        match (args.next(), args.next()) {
            (Some(a), None) => Ok(a),
            _ => Err(ErrorKind::arg_count(name, 1, count)),
        }
    }

    /// Checks that exactly three positional arguments were passed.
    pub fn get_three_args(self, name: &str) -> RunResult<(Object, Object, Object)> {
        let count = self.count();
        let mut args = self.0.into_iter();
        match (args.next(), args.next(), args.next(), args.next()) {
            (Some(a1), Some(a2), Some(a3), None) => Ok((a1, a2, a3)),
            _ => Err(ErrorKind::arg_count(name, 3, count)),
        }
    }

    /// Checks that two or three positional arguments were passed.
    pub fn get_two_three_args(self, name: &str) -> RunResult<(Object, Object, Option<Object>)> {
        let count = self.count();
        let mut args = self.0.into_iter();
        match (args.next(), args.next(), args.next(), args.next()) {
            (Some(a1), Some(a2), a3, None) => Ok((a1, a2, a3)),
            _ => Err(ErrorKind::arg_count_range(name, 2, 3, count)),
        }
    }
}

impl Object {
    /// Extracts a 64-bit integer argument; bools count as integers.
    ///
    /// `position` is 1-based and only used in the error message.
    pub fn expect_int(&self, name: &str, position: usize) -> RunResult<i64> {
        match self {
            Self::Int(i) => Ok(*i),
            Self::Bool(b) => Ok(i64::from(*b)),
            other => Err(ErrorKind::arg_type(name, position, "int", other.type_name())),
        }
    }

    /// Extracts a 32-bit integer argument; out-of-range values are rejected.
    pub fn expect_i32(&self, name: &str, position: usize) -> RunResult<i32> {
        let value = self.expect_int(name, position)?;
        i32::try_from(value).map_err(|_| ErrorKind::arg_overflow(name, position))
    }

    pub fn expect_str(&self, name: &str, position: usize) -> RunResult<&str> {
        match self {
            Self::String(s) => Ok(s.as_str()),
            other => Err(ErrorKind::arg_type(name, position, "str", other.type_name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[i64]) -> ArgValues {
        values.iter().copied().map(Object::Int).collect()
    }

    #[test]
    fn two_three_accepts_optional_third() {
        let (a, b, c) = args(&[1, 2]).get_two_three_args("range_iterator").unwrap();
        assert_eq!((a, b, c), (Object::Int(1), Object::Int(2), None));
        let (_, _, c) = args(&[1, 2, 3]).get_two_three_args("range_iterator").unwrap();
        assert_eq!(c, Some(Object::Int(3)));
    }

    #[test]
    fn wrong_count_names_expected_shape() {
        let err = args(&[1, 2, 3, 4]).get_two_three_args("range_iterator").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentError);
        assert_eq!(err.message(), "range_iterator() takes from 2 to 3 arguments (4 given)");
        let err = args(&[]).get_one_arg("get_point").unwrap_err();
        assert_eq!(err.message(), "get_point() takes exactly one argument (0 given)");
    }

    #[test]
    fn typed_extraction() {
        assert_eq!(Object::Bool(true).expect_int("f", 1).unwrap(), 1);
        let err = Object::from("x").expect_int("f", 2).unwrap_err();
        assert_eq!(err.message(), "f() argument 2 must be int, not str");
        let err = Object::Int(i64::from(i32::MAX) + 1).expect_i32("create_point", 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentError);
        assert_eq!(Object::from("origin").expect_str("f", 3).unwrap(), "origin");
    }
}
