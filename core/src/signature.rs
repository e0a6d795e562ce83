//! Registration metadata an expression engine needs to host an operation,
//! and validation of the raw parameters it passes in.

use std::fmt;

use serde_json::Value;

use crate::body::BodyFormat;
use crate::error::FetchError;
use crate::http::FetchInit;

/// The declared type of one positional parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Enum(&'static [&'static str]),
    String,
    /// An object matching the shape of `FetchInit`.
    FetchInit,
    Optional(&'static ParamType),
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Enum(values) => f.write_str(&values.join(", ")),
            ParamType::String => f.write_str("string"),
            ParamType::FetchInit => f.write_str("FetchInit"),
            ParamType::Optional(inner) => write!(f, "undefined | {inner}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub name: &'static str,
    /// `false` for operations that can only be evaluated asynchronously.
    pub sync: bool,
    pub params: &'static [ParamType],
    /// Position the engine may fill with its contextual value when the
    /// caller leaves it out.
    pub default_param: Option<usize>,
}

pub const BODY_FORMATS: &[&str] = &["arrayBuffer", "blob", "json", "text"];

const BODY_FORMAT_PARAM: ParamType = ParamType::Enum(BODY_FORMATS);
const URL_PARAM: ParamType = ParamType::String;
const INIT_PARAM: ParamType = ParamType::Optional(&ParamType::FetchInit);

pub const HTTP_FETCH: Signature = Signature {
    name: "$httpFetch",
    sync: false,
    params: &[BODY_FORMAT_PARAM, URL_PARAM, INIT_PARAM],
    default_param: Some(1),
};

fn type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

fn mismatch(index: usize, expected: &ParamType, value: Option<&Value>) -> FetchError {
    let shown = value.map_or_else(|| "undefined".to_string(), Value::to_string);
    FetchError::InvalidParameter {
        index,
        message: format!(
            "Expected `{expected}` but got `{}`: {shown}",
            type_name(value)
        ),
    }
}

/// Validated parameters of `$httpFetch`.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchParams {
    pub body_format: BodyFormat,
    pub url: String,
    pub init: Option<FetchInit>,
}

impl FetchParams {
    /// Check `params` against the `HTTP_FETCH` parameter types and convert
    /// them. Fails on the first mismatching position.
    pub fn from_values(params: &[Value]) -> Result<Self, FetchError> {
        let body_format = params
            .first()
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<BodyFormat>().ok())
            .ok_or_else(|| mismatch(0, &BODY_FORMAT_PARAM, params.first()))?;

        let url = params
            .get(1)
            .and_then(Value::as_str)
            .ok_or_else(|| mismatch(1, &URL_PARAM, params.get(1)))?
            .to_string();

        let init = match params.get(2) {
            None => None,
            Some(value @ Value::Object(_)) => Some(
                serde_json::from_value::<FetchInit>(value.clone()).map_err(|e| {
                    FetchError::InvalidParameter {
                        index: 2,
                        message: format!("Expected `{INIT_PARAM}` but got {value}: {e}"),
                    }
                })?,
            ),
            Some(other) => return Err(mismatch(2, &INIT_PARAM, Some(other))),
        };

        Ok(Self {
            body_format,
            url,
            init,
        })
    }
}
