//! Serialization as a sequence of values in ascending order.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};

use crate::AvlSet;

impl<T: Serialize> Serialize for AvlSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self)
    }
}

impl<'de, T> Deserialize<'de> for AvlSet<T>
where
    T: Ord + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<AvlSet<T>, D::Error> {
        deserializer.deserialize_seq(AvlSetVisitor {
            phantom: PhantomData,
        })
    }
}

struct AvlSetVisitor<T> {
    phantom: PhantomData<T>,
}

impl<'de, T> Visitor<'de> for AvlSetVisitor<T>
where
    T: Ord + Deserialize<'de>,
{
    type Value = AvlSet<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    // Duplicates in the input are dropped like any repeated insert.
    fn visit_seq<A>(self, mut seq: A) -> Result<AvlSet<T>, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut set = AvlSet::new();
        while let Some(value) = seq.next_element()? {
            set.insert(value);
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use crate::AvlSet;

    #[test]
    fn test_json_round_trip() {
        let set = AvlSet::from([5, 3, 8, 1]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "[1,3,5,8]");

        let parsed: AvlSet<i32> = serde_json::from_str("[9,2,2,7]").unwrap();
        assert_eq!(parsed.iter().copied().collect::<Vec<_>>(), vec![2, 7, 9]);
        parsed.check_consistency();
    }
}
