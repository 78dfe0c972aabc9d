//! Sparse kerning pair storage

use crate::paged::PagedArray;

/// Adjustments for one left glyph, indexed by right glyph
#[derive(Debug, Clone, Default)]
pub struct KerningRow {
    values: PagedArray<i16>,
}

impl KerningRow {
    /// Adjustment against `right`, 0 when absent
    pub fn get(&self, right: u16) -> i16 {
        self.values.get(right as u32).copied().unwrap_or(0)
    }

    /// Iterate over the non-zero `(right, value)` pairs
    pub fn pairs(&self) -> impl Iterator<Item = (u16, i16)> + '_ {
        self.values
            .iter()
            .filter(|(_, v)| **v != 0)
            .map(|(right, v)| (right as u16, *v))
    }
}

/// Paged mapping from (left glyph, right glyph) to a signed adjustment.
///
/// Zero adjustments are never materialized: inserting a zero value for a
/// pair that is not stored does not allocate, and lookups default to 0.
/// The unit of the values is up to the owner (font units for the
/// whole-font table, pixels for a per-size table).
#[derive(Debug, Clone, Default)]
pub struct KerningTable {
    rows: PagedArray<Option<KerningRow>>,
    pairs: usize,
}

impl KerningTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an adjustment; later writes for the same pair win
    pub fn insert(&mut self, left: u16, right: u16, value: i16) {
        if value == 0 {
            if self.lookup(left, right) == 0 {
                return;
            }
            let row_vacant = match self.rows.slot_mut(left as u32) {
                Some(row) => {
                    row.values.clear(right as u32, |v| *v == 0);
                    row.values.allocated_pages() == 0
                }
                None => false,
            };
            self.pairs -= 1;
            if row_vacant {
                self.rows.clear(left as u32, Option::is_none);
            }
            return;
        }

        let row = self
            .rows
            .slot_mut(left as u32)
            .get_or_insert_with(KerningRow::default);
        let slot = row.values.slot_mut(right as u32);
        if *slot == 0 {
            self.pairs += 1;
        }
        *slot = value;
    }

    /// Adjustment between `left` and `right`, 0 when absent
    pub fn lookup(&self, left: u16, right: u16) -> i16 {
        self.row(left).map_or(0, |row| row.get(right))
    }

    /// The row for `left`, if it has any stored pair
    pub fn row(&self, left: u16) -> Option<&KerningRow> {
        self.rows.get(left as u32)?.as_ref()
    }

    /// Whether `left` has any stored pair
    pub fn has_row(&self, left: u16) -> bool {
        self.row(left).is_some()
    }

    /// Number of non-zero pairs stored
    pub fn len(&self) -> usize {
        self.pairs
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.pairs == 0
    }

    /// Fill the row of `left` from the pairs `source` holds for it.
    ///
    /// The values come from a single `query(left, rights)` call over every
    /// right glyph `source` pairs with `left`, which lets a per-size table
    /// hold scaled values for the pairs listed in the whole-font table.
    /// Returns the number of non-zero pairs stored.
    pub fn fill_row<F>(&mut self, left: u16, source: &KerningTable, query: F) -> usize
    where
        F: FnOnce(u16, &[u16]) -> Vec<i32>,
    {
        let Some(source_row) = source.row(left) else {
            return 0;
        };
        let rights: Vec<u16> = source_row.pairs().map(|(right, _)| right).collect();
        let values = query(left, &rights);

        let mut stored = 0;
        for (&right, value) in rights.iter().zip(values) {
            let value = value.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
            if value != 0 {
                self.insert(left, right, value);
                stored += 1;
            }
        }
        stored
    }
}
