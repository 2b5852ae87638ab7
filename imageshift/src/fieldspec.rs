mod builtin;

use core::fmt;
use std::{ops::Deref, str::FromStr};

use anyhow::{Context as _, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Str,
    resource::{GvkMatcher, Object, Resource},
};

pub use self::builtin::Builtin;

/// Addresses a field inside the resources matched by `matcher`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(flatten)]
    pub matcher: GvkMatcher,
    #[serde(with = "crate::serde_ex::string")]
    pub path: FieldPath,
    /// Whether the field should be created if it does not exist.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub create: bool,
}

impl FieldSpec {
    pub fn overlaps_with(&self, other: &FieldSpec) -> bool {
        self.matcher.overlaps_with(&other.matcher)
            && self.path == other.path
            && self.create == other.create
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Box<[FieldPathSegment]>,
}

impl fmt::Debug for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, r#""{self}""#)
    }
}

impl Deref for FieldPath {
    type Target = [FieldPathSegment];

    fn deref(&self) -> &Self::Target {
        &self.segments
    }
}

pub type PathRef<'a> = &'a [FieldPathSegment];

impl FromStr for FieldPath {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            bail!("path cannot be empty");
        }

        let segments = s
            .split('/')
            .map(|segment| segment.parse::<FieldPathSegment>())
            .collect::<Result<Box<_>, _>>()?;

        Ok(FieldPath { segments })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.segments
                .iter()
                .map(|segment| segment.to_string())
                .collect::<Vec<_>>()
                .join("/")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPathSegment {
    Field(Str),
    /// A field holding a sequence; the rest of the path applies to every element.
    Array(Str),
}

impl fmt::Display for FieldPathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPathSegment::Field(field) => write!(f, "{field}"),
            FieldPathSegment::Array(field) => write!(f, "{field}[]"),
        }
    }
}

impl FromStr for FieldPathSegment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(s) = s.strip_suffix("[]") {
            Ok(FieldPathSegment::Array(s.into()))
        } else {
            Ok(FieldPathSegment::Field(s.into()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSpecs {
    specs: Vec<FieldSpec>,
}

impl Deref for FieldSpecs {
    type Target = [FieldSpec];

    fn deref(&self) -> &Self::Target {
        &self.specs
    }
}

#[derive(Debug)]
pub struct Conflict {
    pub conflicts_with: Box<FieldSpec>,
    pub field_spec: Box<FieldSpec>,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot add field spec `{}` because it conflicts with existing field spec `{}`",
            self.field_spec.matcher, self.conflicts_with.matcher
        )
    }
}

impl std::error::Error for Conflict {}

impl FieldSpecs {
    pub fn merge(&mut self, other: FieldSpecs) -> Result<(), Conflict> {
        for spec in other.specs {
            self.add(spec)?;
        }

        Ok(())
    }

    pub fn add(&mut self, spec: FieldSpec) -> Result<(), Conflict> {
        if let Some(conflicts_with) = self.specs.iter().find(|s| s.overlaps_with(&spec)) {
            Err(Conflict {
                conflicts_with: Box::new(conflicts_with.clone()),
                field_spec: Box::new(spec),
            })
        } else {
            self.specs.push(spec);
            Ok(())
        }
    }

    pub fn apply<T: JsonValue>(
        &self,
        resource: &mut Resource,
        mut f: impl FnMut(&mut T) -> anyhow::Result<()>,
    ) -> anyhow::Result<()> {
        for spec in &self.specs {
            spec.apply(resource, &mut f)?;
        }

        Ok(())
    }
}

impl FieldSpec {
    pub fn apply<T>(
        &self,
        resource: &mut Resource,
        f: &mut impl FnMut(&mut T) -> anyhow::Result<()>,
    ) -> anyhow::Result<()>
    where
        T: JsonValue,
    {
        if !self.matcher.matches(resource.id()) {
            return Ok(());
        }

        go(resource.root_mut(), &self.path, f, self.create).with_context(|| {
            format!(
                "applying field spec `{}` `{}` to resource {}",
                self.matcher,
                self.path,
                resource.id()
            )
        })
    }
}

fn go<T>(
    obj: &mut Object,
    path: PathRef<'_>,
    f: &mut impl FnMut(&mut T) -> anyhow::Result<()>,
    create: bool,
) -> anyhow::Result<()>
where
    T: JsonValue,
{
    let Some((segment, rest)) = path.split_first() else {
        bail!("path cannot be empty")
    };

    match segment {
        FieldPathSegment::Field(field) => {
            if !obj.contains_key(field.as_str()) {
                if !create {
                    return Ok(());
                }

                obj.insert(field.to_string(), T::default().into_value());
            }

            let val = obj.get_mut(field.as_str()).unwrap();
            if rest.is_empty() {
                f(T::try_as_mut(val)?)
            } else {
                descend(val, field, rest, f, create)
            }
        }
        FieldPathSegment::Array(field) => match obj.get_mut(field.as_str()) {
            None | Some(Value::Null) => Ok(()),
            Some(Value::Array(seq)) => {
                for item in seq {
                    if rest.is_empty() {
                        f(T::try_as_mut(item)?)?;
                    } else {
                        descend(item, field, rest, f, create)?;
                    }
                }

                Ok(())
            }
            Some(_) => Err(anyhow::anyhow!(
                "expected a sequence at `{field}` but found a value of different type"
            )),
        },
    }
}

fn descend<T>(
    val: &mut Value,
    field: &Str,
    rest: PathRef<'_>,
    f: &mut impl FnMut(&mut T) -> anyhow::Result<()>,
    create: bool,
) -> anyhow::Result<()>
where
    T: JsonValue,
{
    let obj = val
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("expected an object value at `{field}`"))?;
    go(obj, rest, f, create)
}

pub trait JsonValue: Default {
    fn try_as_mut(value: &mut Value) -> anyhow::Result<&mut Self>;

    fn into_value(self) -> Value
    where
        Self: Sized;
}

impl JsonValue for Value {
    fn try_as_mut(value: &mut Value) -> anyhow::Result<&mut Self> {
        Ok(value)
    }

    fn into_value(self) -> Value {
        self
    }
}

impl JsonValue for Object {
    fn try_as_mut(value: &mut Value) -> anyhow::Result<&mut Self> {
        match value {
            Value::Object(obj) => Ok(obj),
            _ => bail!("expected an object but found a different type"),
        }
    }

    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

impl JsonValue for String {
    fn try_as_mut(value: &mut Value) -> anyhow::Result<&mut Self> {
        match value {
            Value::String(s) => Ok(s),
            _ => bail!("expected a string but found a different type"),
        }
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }
}
