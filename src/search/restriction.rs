// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Restrictions and their filter-query syntax.
//!
//! ```text
//! equal          field:value
//! less_than      field:[* TO value]
//! greater_than   field:[value TO *]
//! between        field:[lo TO hi]
//! any_of         field:(v1 OR v2)
//! all_of         field:(v1 AND v2)
//! is_null        -field:[* TO *]
//! is_not_null    field:[* TO *]
//! negated        -<positive phrase>
//! ```

use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{MapperError, Result};
use crate::schema::{FieldDeclaration, FieldValue};

use super::escape::escape;

/// Predicate operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    LessThan,
    GreaterThan,
    Between,
    AnyOf,
    AllOf,
    IsNull,
    IsNotNull,
}

impl Operator {
    fn accepts(&self, count: usize) -> bool {
        match self {
            Operator::Equal | Operator::LessThan | Operator::GreaterThan => count == 1,
            Operator::Between => count == 2,
            Operator::AnyOf | Operator::AllOf => count >= 1,
            Operator::IsNull | Operator::IsNotNull => count == 0,
        }
    }
}

/// The shape of a value passed to `with`/`without`
#[derive(Debug, Clone, PartialEq)]
pub enum RestrictionValue {
    /// Single value → equal
    Scalar(FieldValue),
    /// Inclusive range → between
    Range(FieldValue, FieldValue),
    /// Set of values → any_of
    List(Vec<FieldValue>),
    /// Absent value → is_null
    Null,
}

impl RestrictionValue {
    /// Normalize a short-form value into an operator and its bound values.
    pub fn normalize(self) -> (Operator, Vec<FieldValue>) {
        match self {
            RestrictionValue::Scalar(v) => (Operator::Equal, vec![v]),
            RestrictionValue::Range(lo, hi) => (Operator::Between, vec![lo, hi]),
            RestrictionValue::List(values) => (Operator::AnyOf, values),
            RestrictionValue::Null => (Operator::IsNull, Vec::new()),
        }
    }
}

macro_rules! scalar_restriction_value {
    ($($t:ty),*) => {
        $(impl From<$t> for RestrictionValue {
            fn from(v: $t) -> Self {
                RestrictionValue::Scalar(v.into())
            }
        })*
    };
}

scalar_restriction_value!(&str, String, i32, i64, f64, bool, DateTime<Utc>, NaiveDate, FieldValue);

impl<T: Into<FieldValue>> From<Vec<T>> for RestrictionValue {
    fn from(values: Vec<T>) -> Self {
        RestrictionValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<RangeInclusive<T>> for RestrictionValue {
    fn from(range: RangeInclusive<T>) -> Self {
        let (lo, hi) = range.into_inner();
        RestrictionValue::Range(lo.into(), hi.into())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for RestrictionValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => RestrictionValue::Scalar(v.into()),
            None => RestrictionValue::Null,
        }
    }
}

/// Trailing options accepted by `with_args`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestrictionOptions {
    /// Facets whose counts should ignore this filter
    pub exclude_from: Vec<String>,
}

impl RestrictionOptions {
    pub fn exclude_from(mut self, facet: impl Into<String>) -> Self {
        self.exclude_from.push(facet.into());
        self
    }
}

/// A positional argument to `with_args`
#[derive(Debug, Clone, PartialEq)]
pub enum RestrictionArg {
    Value(RestrictionValue),
    Options(RestrictionOptions),
}

/// Split raw arguments into exactly one value plus optional trailing options.
pub fn split_args(
    field: &str,
    args: Vec<RestrictionArg>,
) -> Result<(RestrictionValue, RestrictionOptions)> {
    let positional = args
        .iter()
        .filter(|a| matches!(a, RestrictionArg::Value(_)))
        .count();
    if positional != 1 {
        return Err(MapperError::argument(format!(
            "wrong number of arguments for '{}' ({} for 1)",
            field, positional
        )));
    }
    let total = args.len();
    let mut value = None;
    let mut options = None;
    for (i, arg) in args.into_iter().enumerate() {
        match arg {
            RestrictionArg::Value(v) => value = Some(v),
            RestrictionArg::Options(o) if i + 1 == total && options.is_none() => options = Some(o),
            RestrictionArg::Options(_) => {
                return Err(MapperError::argument(format!(
                    "options for '{}' must be the last argument",
                    field
                )))
            }
        }
    }
    let value = value.ok_or_else(|| {
        MapperError::argument(format!("wrong number of arguments for '{}' (0 for 1)", field))
    })?;
    Ok((value, options.unwrap_or_default()))
}

/// An operator bound to a field and validated values
#[derive(Debug, Clone, PartialEq)]
pub struct Restriction {
    field: FieldDeclaration,
    operator: Operator,
    values: Vec<FieldValue>,
    negated: bool,
}

impl Restriction {
    /// Bind `operator` to `field`, validating arity and every value's type.
    pub fn new(
        field: FieldDeclaration,
        operator: Operator,
        values: Vec<FieldValue>,
        negated: bool,
    ) -> Result<Self> {
        if !operator.accepts(values.len()) {
            return Err(MapperError::argument(format!(
                "{:?} on '{}' does not accept {} value(s)",
                operator,
                field.name(),
                values.len()
            )));
        }
        for value in &values {
            field.field_type().validate(value).map_err(|_| {
                MapperError::argument(format!(
                    "{} is not a valid {} value for '{}'",
                    value,
                    field.field_type(),
                    field.name()
                ))
            })?;
        }
        Ok(Self {
            field,
            operator,
            values,
            negated,
        })
    }

    pub fn field(&self) -> &FieldDeclaration {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Whether the rendered phrase carries a leading `-`.
    pub fn is_negative(&self) -> bool {
        self.negated ^ (self.operator == Operator::IsNull)
    }

    /// Render the complete boolean phrase, including negation.
    pub fn to_boolean_phrase(&self) -> Result<String> {
        let positive = self.to_positive_phrase()?;
        Ok(if self.is_negative() {
            format!("-{}", positive)
        } else {
            positive
        })
    }

    fn to_positive_phrase(&self) -> Result<String> {
        let name = self.field.indexed_name();
        let phrase = match self.operator {
            Operator::Equal => format!("{}:{}", name, self.term(&self.values[0])?),
            Operator::LessThan => format!("{}:[* TO {}]", name, self.term(&self.values[0])?),
            Operator::GreaterThan => format!("{}:[{} TO *]", name, self.term(&self.values[0])?),
            Operator::Between => format!(
                "{}:[{} TO {}]",
                name,
                self.term(&self.values[0])?,
                self.term(&self.values[1])?
            ),
            Operator::AnyOf => format!("{}:({})", name, self.terms(" OR ")?),
            Operator::AllOf => format!("{}:({})", name, self.terms(" AND ")?),
            Operator::IsNull | Operator::IsNotNull => format!("{}:[* TO *]", name),
        };
        Ok(phrase)
    }

    fn terms(&self, separator: &str) -> Result<String> {
        let terms = self
            .values
            .iter()
            .map(|v| self.term(v))
            .collect::<Result<Vec<_>>>()?;
        Ok(terms.join(separator))
    }

    fn term(&self, value: &FieldValue) -> Result<String> {
        let field_type = self.field.field_type();
        let encoded = field_type.encode(value)?;
        Ok(if field_type.is_numeric() {
            encoded
        } else {
            escape(&encoded)
        })
    }
}
