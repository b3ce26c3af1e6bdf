use std::borrow::{Borrow, Cow};
use std::collections::HashMap;
use std::fmt;
use std::iter::FromIterator;
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use std::sync::Arc;

use serde::de;
use serde::Deserializer;

/// Allows access to the parameters of a form encoded body.
///
/// Use one of the listed implementations below. Since those may be a bit confusing due to their
/// abundant use of generics, basically use any type of `HashMap` that maps 'str-likes' to a
/// collection of other 'str-likes', or a vector of pairs. Popular instances may be:
/// * `Vec<(String, String)>`
/// * `HashMap<String, String>`
/// * `HashMap<String, Vec<String>>`
///
/// Unlike in most other places, repeated keys are significant here. Every value is covered by a
/// request signature, so an implementation must not drop or merge any of them.
pub trait QueryParameter {
    /// Grab an owned copy of all pairs.
    fn normalize(&self) -> NormalizedParameter;
}

/// The query parameter normal form.
///
/// When a request wants to give access to its body parameters by reference, it can do so by a
/// reference of the particular trait. But when the representation of the parameters is not stored
/// in the memory associated with the request, it needs to be allocated to outlive the borrow on
/// the request. This normal form is that allocation: all pairs in the order they were received.
///
/// This gives rise to a custom `Cow<QueryParameter>` instance by requiring that normalization into
/// memory with unrelated lifetime is always possible.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedParameter {
    pairs: Vec<(Cow<'static, str>, Cow<'static, str>)>,
}

impl QueryParameter for NormalizedParameter {
    fn normalize(&self) -> NormalizedParameter {
        self.clone()
    }
}

impl NormalizedParameter {
    /// Create an empty parameter list.
    pub fn new() -> Self {
        NormalizedParameter::default()
    }

    /// Append a key-value-pair, keeping any earlier pair with the same key.
    pub fn push(&mut self, key: Cow<'static, str>, val: Cow<'static, str>) {
        self.pairs.push((key, val));
    }

    /// Iterate over all pairs in order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(key, val)| (key.as_ref(), val.as_ref()))
    }

    /// Convert into owned pairs.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
            .into_iter()
            .map(|(key, val)| (key.into_owned(), val.into_owned()))
            .collect()
    }

    /// The number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no pairs at all.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Borrow<dyn QueryParameter> for NormalizedParameter {
    fn borrow(&self) -> &(dyn QueryParameter + 'static) {
        self
    }
}

impl Borrow<dyn QueryParameter + Send> for NormalizedParameter {
    fn borrow(&self) -> &(dyn QueryParameter + Send + 'static) {
        self
    }
}

impl<'de> de::Deserialize<'de> for NormalizedParameter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor(NormalizedParameter);

        impl<'a> de::Visitor<'a> for Visitor {
            type Value = NormalizedParameter;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a sequence of key-value-pairs")
            }

            fn visit_seq<A>(mut self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'a>,
            {
                while let Some((key, value)) = access.next_element::<(String, String)>()? {
                    self.0.push(key.into(), value.into())
                }

                Ok(self.0)
            }
        }

        let visitor = Visitor(NormalizedParameter::default());
        deserializer.deserialize_seq(visitor)
    }
}

impl<K, V> FromIterator<(K, V)> for NormalizedParameter
where
    K: Into<Cow<'static, str>>,
    V: Into<Cow<'static, str>>,
{
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = (K, V)>,
    {
        let mut target = NormalizedParameter::default();
        iter.into_iter().for_each(|(k, v)| target.push(k.into(), v.into()));
        target
    }
}

impl ToOwned for dyn QueryParameter {
    type Owned = NormalizedParameter;

    fn to_owned(&self) -> Self::Owned {
        self.normalize()
    }
}

impl ToOwned for dyn QueryParameter + Send {
    type Owned = NormalizedParameter;

    fn to_owned(&self) -> Self::Owned {
        self.normalize()
    }
}

/// All values stored for one key of a map.
///
/// For example, a vector of string like types returns all its elements while a single string
/// returns just itself.
///
/// If this were done with slices, that would require choosing a particular value type of the
/// underlying slice e.g. `[String]`.
pub trait ParameterValues {
    /// Borrow all value references, in order.
    fn values(&self) -> Vec<&str>;
}

impl<K, V, S: BuildHasher> QueryParameter for HashMap<K, V, S>
where
    K: Borrow<str> + Eq + Hash,
    V: ParameterValues,
{
    fn normalize(&self) -> NormalizedParameter {
        self.iter()
            .flat_map(|(key, val)| {
                val.values()
                    .into_iter()
                    .map(move |value| (key.borrow().to_string(), value.to_string()))
            })
            .collect()
    }
}

impl<K, V> QueryParameter for Vec<(K, V)>
where
    K: Borrow<str>,
    V: Borrow<str>,
{
    fn normalize(&self) -> NormalizedParameter {
        self.iter()
            .map(|(key, val)| (key.borrow().to_string(), val.borrow().to_string()))
            .collect()
    }
}

impl<'a, Q: QueryParameter + 'a + ?Sized> QueryParameter for &'a Q {
    fn normalize(&self) -> NormalizedParameter {
        (**self).normalize()
    }
}

impl<'a, Q: QueryParameter + 'a + ?Sized> QueryParameter for &'a mut Q {
    fn normalize(&self) -> NormalizedParameter {
        (**self).normalize()
    }
}

impl ParameterValues for str {
    fn values(&self) -> Vec<&str> {
        vec![self]
    }
}

impl ParameterValues for String {
    fn values(&self) -> Vec<&str> {
        vec![self.as_str()]
    }
}

impl<'a, V> ParameterValues for &'a V
where
    V: AsRef<str> + ?Sized,
{
    fn values(&self) -> Vec<&str> {
        vec![self.as_ref()]
    }
}

impl<'a> ParameterValues for Cow<'a, str> {
    fn values(&self) -> Vec<&str> {
        vec![self.as_ref()]
    }
}

impl<V: ParameterValues> ParameterValues for Option<V> {
    fn values(&self) -> Vec<&str> {
        self.as_ref().map(V::values).unwrap_or_default()
    }
}

impl<V: ParameterValues> ParameterValues for [V] {
    fn values(&self) -> Vec<&str> {
        self.iter().flat_map(V::values).collect()
    }
}

impl<V: ParameterValues + ?Sized> ParameterValues for Box<V> {
    fn values(&self) -> Vec<&str> {
        (**self).values()
    }
}

impl<V: ParameterValues + ?Sized> ParameterValues for Rc<V> {
    fn values(&self) -> Vec<&str> {
        (**self).values()
    }
}

impl<V: ParameterValues + ?Sized> ParameterValues for Arc<V> {
    fn values(&self) -> Vec<&str> {
        (**self).values()
    }
}

impl<V: ParameterValues> ParameterValues for Vec<V> {
    fn values(&self) -> Vec<&str> {
        self.iter().flat_map(V::values).collect()
    }
}
