//! Lightweight dynamic values for record pipelines.
//!
//! The typed combinators work over any Rust type; these exist for the
//! pipeline DSL and the CLI, where rows come from JSON.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Scalar>),
}

/// Closed set of value kinds, used by `of_type` filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Null,
    Bool,
    Int,
    Float,
    /// `Int` or `Float`.
    Number,
    Str,
    List,
}

impl TypeTag {
    pub fn matches(self, value: &Scalar) -> bool {
        self.admits(value.type_tag())
    }

    /// Whether a value of kind `actual` passes a filter on `self`.
    pub fn admits(self, actual: TypeTag) -> bool {
        match self {
            TypeTag::Number => matches!(actual, TypeTag::Int | TypeTag::Float | TypeTag::Number),
            tag => actual == tag,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "null" => TypeTag::Null,
            "bool" | "boolean" => TypeTag::Bool,
            "int" | "integer" | "i64" => TypeTag::Int,
            "float" | "f64" => TypeTag::Float,
            "number" => TypeTag::Number,
            "str" | "string" | "utf8" => TypeTag::Str,
            "list" | "array" => TypeTag::List,
            _ => return None,
        })
    }
}

impl Scalar {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Scalar::Null => TypeTag::Null,
            Scalar::Bool(_) => TypeTag::Bool,
            Scalar::Int(_) => TypeTag::Int,
            Scalar::Float(_) => TypeTag::Float,
            Scalar::Str(_) => TypeTag::Str,
            Scalar::List(_) => TypeTag::List,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            _ => None,
        }
    }

    // Position of each kind in the cross-kind order (nulls first). Ints and
    // floats share a rank and compare by value.
    fn rank(&self) -> u8 {
        match self {
            Scalar::Null => 0,
            Scalar::Bool(_) => 1,
            Scalar::Int(_) | Scalar::Float(_) => 2,
            Scalar::Str(_) => 3,
            Scalar::List(_) => 4,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scalar {}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Total order: by kind first, numbers by exact value.
///
/// Floats follow `total_cmp` except that `-0.0 == 0.0`, so an `Int` equal to
/// zero stays equal to both. NaNs sort after every number (before, if the
/// sign bit is set).
impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        use Scalar::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) if a == b => Ordering::Equal,
            (Float(a), Float(b)) => a.total_cmp(b),
            (Int(a), Float(b)) => int_cmp_float(*a, *b),
            (Float(a), Int(b)) => int_cmp_float(*b, *a).reverse(),
            (Str(a), Str(b)) => a.cmp(b),
            (List(a), List(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Scalar::Null => {}
            Scalar::Bool(v) => v.hash(state),
            Scalar::Int(v) => v.hash(state),
            Scalar::Float(v) => match integral(*v) {
                Some(i) => i.hash(state),
                None => v.to_bits().hash(state),
            },
            Scalar::Str(v) => v.hash(state),
            Scalar::List(v) => v.hash(state),
        }
    }
}

// 2^63 as an f64; every float in [-2^63, 2^63) truncates to a valid i64.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Exact comparison of an integer against a float, without rounding `a`.
fn int_cmp_float(a: i64, b: f64) -> Ordering {
    if b.is_nan() {
        return if b.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if b >= I64_BOUND {
        return Ordering::Less;
    }
    if b < -I64_BOUND {
        return Ordering::Greater;
    }
    let whole = b.trunc();
    match a.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0f64.partial_cmp(&(b - whole)).unwrap_or(Ordering::Equal),
        unequal => unequal,
    }
}

/// The `i64` a float equals exactly, if any. Keeps `Hash` in step with `Eq`.
fn integral(v: f64) -> Option<i64> {
    (v.is_finite() && v.trunc() == v && (-I64_BOUND..I64_BOUND).contains(&v)).then(|| v as i64)
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Str(v) => f.write_str(v),
            Scalar::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

/// One row: field name to value. Missing fields read as `Null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Scalar>);

static NULL: Scalar = Scalar::Null;

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> &Scalar {
        self.0.get(field).unwrap_or(&NULL)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Scalar>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Scalar)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Scalar)>>(iter: I) -> Self {
        Record(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_order_across_kinds() {
        let mut values = vec![
            Scalar::from("b"),
            Scalar::Int(3),
            Scalar::Null,
            Scalar::Float(1.5),
            Scalar::Bool(true),
            Scalar::Int(-1),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Scalar::Null,
                Scalar::Bool(true),
                Scalar::Int(-1),
                Scalar::Float(1.5),
                Scalar::Int(3),
                Scalar::from("b"),
            ]
        );
    }

    #[test]
    fn ints_and_floats_compare_by_value() {
        let mut prices = vec![Scalar::Int(3), Scalar::Float(2.5), Scalar::Int(10)];
        prices.sort();
        assert_eq!(prices, vec![Scalar::Float(2.5), Scalar::Int(3), Scalar::Int(10)]);

        assert_eq!(Scalar::Int(1), Scalar::Float(1.0));
        assert_eq!(Scalar::Int(0), Scalar::Float(-0.0));
        assert_eq!(Scalar::Float(0.0), Scalar::Float(-0.0));
        assert!(Scalar::Int(-3) < Scalar::Float(-2.5));
        assert!(Scalar::Float(-3.5) < Scalar::Int(-3));
        assert!(Scalar::Int(i64::MAX) < Scalar::Float(I64_BOUND));
        assert!(Scalar::Int(i64::MIN) == Scalar::Float(-I64_BOUND));
        assert!(Scalar::Int(i64::MAX) < Scalar::Float(f64::INFINITY));
        assert!(Scalar::Int(i64::MIN) > Scalar::Float(f64::NEG_INFINITY));
        assert!(Scalar::Int(i64::MAX) < Scalar::Float(f64::NAN));
        assert!(Scalar::Bool(true) < Scalar::Float(f64::NEG_INFINITY));
        assert!(Scalar::Float(f64::NAN) < Scalar::from(""));
    }

    #[test]
    fn large_ints_order_exactly_against_floats() {
        // 2^53 + 1 has no f64; it must not collapse onto 2^53.
        let big = 1i64 << 53;
        let below = Scalar::Float(big as f64);
        let odd = Scalar::Int(big + 1);
        let above = Scalar::Float((big + 2) as f64);
        assert!(below < odd && odd < above);
        assert_ne!(odd, below);
        assert_eq!(Scalar::Int(big), below);
    }

    #[test]
    fn floats_are_comparable_and_hash_consistently() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Scalar::Float(f64::NAN));
        set.insert(Scalar::Float(f64::NAN));
        set.insert(Scalar::Float(2.0));
        assert_eq!(set.len(), 2);
        set.insert(Scalar::Int(2));
        set.insert(Scalar::Float(-0.0));
        set.insert(Scalar::Int(0));
        set.insert(Scalar::Float(2.25));
        assert_eq!(set.len(), 4);
        assert!(set.contains(&Scalar::Float(0.0)));
    }

    #[test]
    fn json_rows_round_into_records() {
        let rows: Vec<Record> =
            serde_json::from_str(r#"[{"id": 1, "name": "a", "score": 2.5, "tag": null}]"#)
                .unwrap();
        let row = &rows[0];
        assert_eq!(row.get("id"), &Scalar::Int(1));
        assert_eq!(row.get("name"), &Scalar::from("a"));
        assert_eq!(row.get("score"), &Scalar::Float(2.5));
        assert!(row.get("tag").is_null());
        assert!(row.get("missing").is_null());
    }

    #[test]
    fn type_tags() {
        assert!(TypeTag::Number.matches(&Scalar::Int(1)));
        assert!(TypeTag::Number.matches(&Scalar::Float(1.0)));
        assert!(!TypeTag::Int.matches(&Scalar::Float(1.0)));
        assert_eq!(TypeTag::parse("string"), Some(TypeTag::Str));
        assert_eq!(TypeTag::parse("date"), None);
    }
}
