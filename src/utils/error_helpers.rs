use crate::error::{ReflectionError, Result};

pub trait ParseErrorMapper<T> {
    fn map_parse_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> ParseErrorMapper<T> for std::result::Result<T, E> {
    fn map_parse_err(self, context: &str) -> Result<T> {
        self.map_err(|e| ReflectionError::Parse(format!("{}: {}", context, e)))
    }
}

pub trait InvalidParameterMapper<T> {
    fn map_invalid_param(self, param_name: &str, expected: &str) -> Result<T>;
}

impl<T, E> InvalidParameterMapper<T> for std::result::Result<T, E> {
    fn map_invalid_param(self, param_name: &str, expected: &str) -> Result<T> {
        self.map_err(|_| ReflectionError::InvalidParameter(
            format!("{} must be {}", param_name, expected)
        ))
    }
}

/// Parses an optional clap argument, mapping a bad value to `InvalidParameter`.
#[macro_export]
macro_rules! parse_param {
    ($app_m:expr, $param:expr, $type:ty, $desc:expr) => {
        match $app_m.value_of($param) {
            Some(value) => Some(value.parse::<$type>()
                .map_err(|_| $crate::error::ReflectionError::InvalidParameter(
                    format!("{} must be {}", $param, $desc)
                ))?),
            None => None,
        }
    };
}
