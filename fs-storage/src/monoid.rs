use std::collections::BTreeMap;

// Values that several writers may update independently need a way to be
// combined instead of overwritten. Only right-biased maps need it so far.

/// A structure with an identity element and an associative binary operation.
pub trait Monoid<V> {
    /// Returns the neutral element of the monoid.
    fn neutral() -> V;

    /// Combines two elements of the monoid into a single element.
    fn combine(a: &V, b: &V) -> V;

    /// Folds `values` starting from `neutral()`.
    fn combine_all<I: IntoIterator<Item = V>>(values: I) -> V {
        values
            .into_iter()
            .fold(Self::neutral(), |acc, val| Self::combine(&acc, &val))
    }
}

/// Key-wise union where entries of `b` win over entries of `a`.
impl<K, V> Monoid<BTreeMap<K, V>> for BTreeMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    fn neutral() -> BTreeMap<K, V> {
        BTreeMap::new()
    }

    fn combine(a: &BTreeMap<K, V>, b: &BTreeMap<K, V>) -> BTreeMap<K, V> {
        let mut result = a.clone();
        result.extend(
            b.iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    type Accounts = BTreeMap<String, bool>;

    #[test]
    fn later_entries_win() {
        let a = Accounts::from([("discord".to_owned(), true), ("google".to_owned(), true)]);
        let b = Accounts::from([("google".to_owned(), false), ("facebook".to_owned(), true)]);

        let combined = Accounts::combine(&a, &b);

        assert_eq!(
            combined,
            Accounts::from([
                ("discord".to_owned(), true),
                ("facebook".to_owned(), true),
                ("google".to_owned(), false),
            ])
        );
    }

    #[quickcheck]
    fn prop_neutral_is_identity(a: Accounts) -> bool {
        Accounts::combine(&Accounts::neutral(), &a) == a
            && Accounts::combine(&a, &Accounts::neutral()) == a
    }

    #[quickcheck]
    fn prop_combine_is_associative(a: Accounts, b: Accounts, c: Accounts) -> bool {
        let left = Accounts::combine(&Accounts::combine(&a, &b), &c);
        let right = Accounts::combine(&a, &Accounts::combine(&b, &c));
        left == right
    }

    #[test]
    fn combine_all_folds_in_order() {
        let updates = vec![
            Accounts::from([("discord".to_owned(), true)]),
            Accounts::from([("discord".to_owned(), false)]),
            Accounts::from([("google".to_owned(), true)]),
        ];

        let combined = Accounts::combine_all(updates);

        assert_eq!(combined.get("discord"), Some(&false));
        assert_eq!(combined.get("google"), Some(&true));
    }
}
