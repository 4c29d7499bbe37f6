//! Kind filtering over a closed set of type tags.

use std::sync::Arc;

use lazyq_core::sequence::{Cursor, Sequence};
use lazyq_core::types::{Scalar, TypeTag};

/// Values that report their kind.
pub trait Typed {
    fn type_tag(&self) -> TypeTag;
}

impl Typed for Scalar {
    fn type_tag(&self) -> TypeTag {
        Scalar::type_tag(self)
    }
}

impl Typed for bool {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Bool
    }
}

impl Typed for i64 {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Int
    }
}

impl Typed for i32 {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Int
    }
}

impl Typed for f64 {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Float
    }
}

impl Typed for String {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Str
    }
}

impl Typed for &str {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Str
    }
}

impl<T: Typed> Typed for Vec<T> {
    fn type_tag(&self) -> TypeTag {
        TypeTag::List
    }
}

impl<T: Typed> Typed for Option<T> {
    fn type_tag(&self) -> TypeTag {
        self.as_ref().map_or(TypeTag::Null, Typed::type_tag)
    }
}

/// What `of_type` keeps: a kind, or an arbitrary capability check.
pub enum TypeFilter<T> {
    Tag(TypeTag),
    Predicate(Arc<dyn Fn(&T) -> bool>),
}

impl<T> TypeFilter<T> {
    pub fn predicate(f: impl Fn(&T) -> bool + 'static) -> Self {
        TypeFilter::Predicate(Arc::new(f))
    }
}

impl<T> Clone for TypeFilter<T> {
    fn clone(&self) -> Self {
        match self {
            TypeFilter::Tag(tag) => TypeFilter::Tag(*tag),
            TypeFilter::Predicate(f) => TypeFilter::Predicate(Arc::clone(f)),
        }
    }
}

impl<T> std::fmt::Debug for TypeFilter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeFilter::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            TypeFilter::Predicate(_) => f.write_str("Predicate"),
        }
    }
}

impl<T> From<TypeTag> for TypeFilter<T> {
    fn from(tag: TypeTag) -> Self {
        TypeFilter::Tag(tag)
    }
}

/// Keeps the elements whose kind (as reported by `tag_of`) passes `filter`.
pub struct OfType<S: Sequence, F> {
    pub(crate) source: S,
    pub(crate) tag_of: F,
    pub(crate) filter: TypeFilter<S::Item>,
}

impl<S: Sequence + Clone, F: Clone> Clone for OfType<S, F> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            tag_of: self.tag_of.clone(),
            filter: self.filter.clone(),
        }
    }
}

pub(crate) fn own_tag<T: Typed>(value: &T) -> TypeTag {
    value.type_tag()
}

impl<S, F> Sequence for OfType<S, F>
where
    S: Sequence,
    F: Fn(&S::Item) -> TypeTag,
{
    type Item = S::Item;

    fn open(&self) -> Cursor<'_, S::Item> {
        let tag_of = &self.tag_of;
        let filter = &self.filter;
        Cursor::new(self.source.open().filter(move |item| match item {
            Ok(value) => match filter {
                TypeFilter::Tag(tag) => tag.admits(tag_of(value)),
                TypeFilter::Predicate(accepts) => accepts(value),
            },
            Err(_) => true,
        }))
    }
}

#[cfg(test)]
mod tests {
    use lazyq_core::terminal::SequenceExt;
    use lazyq_core::types::Record;

    use super::*;
    use crate::traits::QueryExt;

    fn mixed() -> Vec<Scalar> {
        vec![
            Scalar::Int(1),
            Scalar::from("two"),
            Scalar::Float(3.0),
            Scalar::Null,
            Scalar::Int(5),
        ]
    }

    #[test]
    fn filters_by_tag() {
        let ints = mixed().of_type(TypeTag::Int.into()).to_vec().unwrap();
        assert_eq!(ints, vec![Scalar::Int(1), Scalar::Int(5)]);
        let numbers = mixed().of_type(TypeTag::Number.into()).count().unwrap();
        assert_eq!(numbers, 3);
    }

    #[test]
    fn filters_by_predicate() {
        let big = mixed()
            .of_type(TypeFilter::predicate(|v: &Scalar| {
                v.as_f64().is_some_and(|x| x > 2.0)
            }))
            .to_vec()
            .unwrap();
        assert_eq!(big, vec![Scalar::Float(3.0), Scalar::Int(5)]);
    }

    #[test]
    fn options_report_null_when_absent() {
        let xs = vec![Some(1i64), None, Some(3)];
        assert_eq!(xs.of_type(TypeTag::Null.into()).count().unwrap(), 1);
    }

    #[test]
    fn record_fields_via_projection() {
        let rows = vec![
            Record::new().with("v", 1i64),
            Record::new().with("v", "x"),
            Record::new(),
        ];
        let strings = rows
            .of_type_by(|r: &Record| r.get("v").type_tag(), TypeTag::Str.into())
            .to_vec()
            .unwrap();
        assert_eq!(strings, vec![Record::new().with("v", "x")]);
    }
}
