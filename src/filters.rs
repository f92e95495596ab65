//! Filter functions and abstractions.
//!
//! Filters are applied to resolved expression values with the pipe syntax:
//! `{{ user.name | default('anonymous') }}`.  A chain of filters is applied
//! left to right, each receiving the previous result.
//!
//! Filter names resolve in two tiers.  First the fixed builtin table below
//! is consulted; it holds filters that work for any input.  If the name is
//! not a builtin, it is looked up as an operation native to the current
//! value's type: strings understand `repeat`, `toUpperCase`, `toLowerCase`
//! and `trim`, sequences understand `join` and `reverse`.  If neither tier
//! knows the name, rendering fails with an
//! [`UnknownFilter`](crate::ErrorKind::UnknownFilter) error.
use crate::error::{Error, ErrorKind};
use crate::value::Value;

pub(crate) type BuiltinFilter = fn(&Value, &[Value]) -> Result<Value, Error>;
pub(crate) type StringOp = fn(&str, &[Value]) -> Result<Value, Error>;
pub(crate) type SeqOp = fn(&[Value], &[Value]) -> Result<Value, Error>;

/// Looks up a filter in the builtin table.
pub(crate) fn builtin(name: &str) -> Option<BuiltinFilter> {
    match name {
        "default" => Some(default),
        "length" => Some(length),
        _ => None,
    }
}

/// Looks up an operation native to string values.
pub(crate) fn string_op(name: &str) -> Option<StringOp> {
    match name {
        "repeat" => Some(repeat),
        "toUpperCase" => Some(to_upper_case),
        "toLowerCase" => Some(to_lower_case),
        "trim" => Some(trim),
        _ => None,
    }
}

/// Looks up an operation native to sequence values.
pub(crate) fn seq_op(name: &str) -> Option<SeqOp> {
    match name {
        "join" => Some(join),
        "reverse" => Some(reverse),
        _ => None,
    }
}

fn arg(args: &[Value], idx: usize) -> Result<&Value, Error> {
    args.get(idx)
        .ok_or_else(|| Error::new(ErrorKind::InvalidArguments, "missing argument"))
}

fn count_arg(args: &[Value], idx: usize) -> Result<usize, Error> {
    let value = arg(args, idx)?;
    match value {
        Value(crate::value::Repr::I64(val)) if *val >= 0 => Ok(*val as usize),
        _ => Err(Error::new(
            ErrorKind::InvalidArguments,
            "argument must be a non-negative integer",
        )),
    }
}

/// Returns the fallback if the value is undefined or empty.
///
/// ```jinja
/// {{ who | default('Value not set') }}
/// ```
fn default(value: &Value, args: &[Value]) -> Result<Value, Error> {
    let fallback = args.first().cloned().unwrap_or_else(|| Value::from(""));
    if value.is_undefined() || value.len() == Some(0) {
        Ok(fallback)
    } else {
        Ok(value.clone())
    }
}

/// Returns the length of a string, sequence or mapping.
fn length(value: &Value, _args: &[Value]) -> Result<Value, Error> {
    value.len().map(Value::from).ok_or_else(|| {
        Error::new(ErrorKind::InvalidOperation, "cannot calculate the length")
    })
}

/// Repeats a string the given number of times.
///
/// ```jinja
/// {{ who | repeat(2) }}
/// ```
fn repeat(value: &str, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(value.repeat(count_arg(args, 0)?)))
}

fn to_upper_case(value: &str, _args: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(value.to_uppercase()))
}

fn to_lower_case(value: &str, _args: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(value.to_lowercase()))
}

fn trim(value: &str, _args: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(value.trim()))
}

/// Joins a sequence with a separator.
///
/// ```jinja
/// {{ arr | join(',') }}
/// ```
fn join(values: &[Value], args: &[Value]) -> Result<Value, Error> {
    let sep = match args.first() {
        Some(sep) => sep.to_string(),
        None => String::new(),
    };
    Ok(Value::from(
        values
            .iter()
            .map(|x| x.to_string())
            .collect::<Vec<_>>()
            .join(&sep),
    ))
}

fn reverse(values: &[Value], _args: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(
        values.iter().rev().cloned().collect::<Vec<_>>(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let fallback = [Value::from("fallback")];
        assert_eq!(
            default(&Value::UNDEFINED, &fallback).unwrap(),
            Value::from("fallback")
        );
        assert_eq!(
            default(&Value::from(""), &fallback).unwrap(),
            Value::from("fallback")
        );
        assert_eq!(
            default(&Value::from("set"), &fallback).unwrap(),
            Value::from("set")
        );
    }

    #[test]
    fn test_repeat() {
        assert_eq!(
            repeat("ab", &[Value::from(3)]).unwrap(),
            Value::from("ababab")
        );
        assert!(repeat("ab", &[Value::from(-1)]).is_err());
        assert!(repeat("ab", &[]).is_err());
    }

    #[test]
    fn test_join() {
        let seq = [Value::from("qw"), Value::from("er")];
        assert_eq!(join(&seq, &[Value::from(",")]).unwrap(), Value::from("qw,er"));
        assert_eq!(join(&seq, &[]).unwrap(), Value::from("qwer"));
        let nums = [Value::from(4), Value::from(6)];
        assert_eq!(join(&nums, &[Value::from("-")]).unwrap(), Value::from("4-6"));
    }

    #[test]
    fn test_two_tier_lookup() {
        assert!(builtin("default").is_some());
        assert!(builtin("repeat").is_none());
        assert!(string_op("repeat").is_some());
        assert!(string_op("join").is_none());
        assert!(seq_op("join").is_some());
        assert!(seq_op("qwe").is_none());
    }
}
