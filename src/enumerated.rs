//! Native ENUMERATED types.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.


//------------ EnumSpec ------------------------------------------------------

/// The items of an ENUMERATED type.
///
/// Values of an ENUMERATED type are kept as their native `i64` value. The
/// packed encoding doesn’t encode that value, though, but the index of the
/// item within the sorted list of items. This type translates between
/// values and these indexes.
///
/// The items of the extension root come first, followed by the extension
/// additions. Within each part, the items must be sorted by value.
#[derive(Debug)]
pub struct EnumSpec {
    /// The values and names of the items.
    pub items: &'static [(i64, &'static str)],

    /// The number of items in the extension root.
    pub root_count: usize,

    /// Whether the type is extensible.
    pub extensible: bool,
}

impl EnumSpec {
    /// Creates a non-extensible enumeration.
    pub const fn new(items: &'static [(i64, &'static str)]) -> Self {
        EnumSpec { items, root_count: items.len(), extensible: false }
    }

    /// Creates an extensible enumeration with `root_count` root items.
    pub const fn extensible(
        items: &'static [(i64, &'static str)], root_count: usize
    ) -> Self {
        EnumSpec { items, root_count, extensible: true }
    }

    /// Returns the items of the extension root.
    fn root(&self) -> &'static [(i64, &'static str)] {
        let items = self.items;
        items.get(..self.root_count).unwrap_or(items)
    }

    /// Returns the extension additions.
    fn additions(&self) -> &'static [(i64, &'static str)] {
        let items = self.items;
        items.get(self.root_count..).unwrap_or(&[])
    }

    /// Returns the index of the item with the given value.
    ///
    /// Root items have indexes from zero up. Extension additions have
    /// indexes starting at the number of root items.
    pub fn value_to_index(&self, value: i64) -> Option<usize> {
        if let Ok(idx) = self.root().binary_search_by_key(&value, |x| x.0) {
            return Some(idx)
        }
        self.additions().binary_search_by_key(&value, |x| x.0).ok().map(
            |idx| idx + self.root_count
        )
    }

    /// Returns the value of the item with the given index.
    pub fn index_to_value(&self, index: usize) -> Option<i64> {
        self.items.get(index).map(|x| x.0)
    }

    /// Returns whether the value is an extension root item.
    pub fn is_root(&self, value: i64) -> bool {
        matches!(self.value_to_index(value), Some(idx) if idx < self.root_count)
    }

    /// Returns whether the value is acceptable for the type.
    ///
    /// Extensible types accept unknown values.
    pub fn accepts(&self, value: i64) -> bool {
        self.extensible || self.value_to_index(value).is_some()
    }

    /// Returns the value of the item with the given name.
    pub fn name_to_value(&self, name: &str) -> Option<i64> {
        self.items.iter().find(|x| x.1 == name).map(|x| x.0)
    }

    /// Returns the name of the item with the given value.
    pub fn value_to_name(&self, value: i64) -> Option<&'static str> {
        self.value_to_index(value).and_then(|idx| {
            self.items.get(idx)
        }).map(|x| x.1)
    }
}


//============ Tests =========================================================
