//! Paged sparse arrays
//!
//! Large sparse index spaces (Unicode code points, glyph indices) are split
//! into fixed-size pages that are only allocated on first write.

/// log2 of the page size
pub const LOG2_PAGE_SIZE: u32 = 9;

/// Entries per page
pub const PAGE_SIZE: usize = 1 << LOG2_PAGE_SIZE;

const PAGE_MASK: u32 = PAGE_SIZE as u32 - 1;

/// Sparse array of `T` split into lazily allocated 512-entry pages.
///
/// Reads of never-written slots yield `None`; a page is only allocated by
/// [`PagedArray::slot_mut`] or [`PagedArray::set`].
#[derive(Debug, Clone)]
pub struct PagedArray<T> {
    pages: Vec<Option<Box<[T]>>>,
}

impl<T> Default for PagedArray<T> {
    fn default() -> Self {
        Self { pages: Vec::new() }
    }
}

impl<T: Clone + Default> PagedArray<T> {
    /// Create an empty array
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the slot at `index`, if its page exists
    pub fn get(&self, index: u32) -> Option<&T> {
        let page = self.pages.get((index >> LOG2_PAGE_SIZE) as usize)?.as_ref()?;
        page.get((index & PAGE_MASK) as usize)
    }

    /// Get a mutable slot at `index`, allocating its page on demand
    pub fn slot_mut(&mut self, index: u32) -> &mut T {
        let page_idx = (index >> LOG2_PAGE_SIZE) as usize;
        if page_idx >= self.pages.len() {
            self.pages.resize_with(page_idx + 1, || None);
        }
        let page = self.pages[page_idx]
            .get_or_insert_with(|| vec![T::default(); PAGE_SIZE].into_boxed_slice());
        &mut page[(index & PAGE_MASK) as usize]
    }

    /// Store `value` at `index`
    pub fn set(&mut self, index: u32, value: T) {
        *self.slot_mut(index) = value;
    }

    /// Reset the slot at `index` to its default value.
    ///
    /// The page is freed once `is_vacant` holds for every slot it contains.
    pub fn clear(&mut self, index: u32, is_vacant: impl Fn(&T) -> bool) {
        let page_idx = (index >> LOG2_PAGE_SIZE) as usize;
        let Some(slot) = self.pages.get_mut(page_idx) else {
            return;
        };
        let Some(page) = slot.as_mut() else {
            return;
        };
        page[(index & PAGE_MASK) as usize] = T::default();
        if page.iter().all(|v| is_vacant(v)) {
            *slot = None;
        }
    }

    /// Number of allocated pages
    pub fn allocated_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.is_some()).count()
    }

    /// Iterate over every slot of every allocated page with its index
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.pages
            .iter()
            .enumerate()
            .filter_map(|(page_idx, page)| page.as_ref().map(|p| (page_idx, p)))
            .flat_map(|(page_idx, page)| {
                let base = (page_idx as u32) << LOG2_PAGE_SIZE;
                page.iter()
                    .enumerate()
                    .map(move |(slot, value)| (base | slot as u32, value))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritten_slot_is_absent() {
        let array: PagedArray<u8> = PagedArray::new();
        assert!(array.get(0).is_none());
        assert!(array.get(70_000).is_none());
        assert_eq!(array.allocated_pages(), 0);
    }

    #[test]
    fn test_set_allocates_single_page() {
        let mut array = PagedArray::new();
        array.set(1000, 7i16);
        assert_eq!(array.get(1000), Some(&7));
        // Same page, default value
        assert_eq!(array.get(1001), Some(&0));
        // Other page untouched
        assert!(array.get(10).is_none());
        assert_eq!(array.allocated_pages(), 1);
    }

    #[test]
    fn test_page_boundaries() {
        let mut array = PagedArray::new();
        array.set(511, 1u8);
        array.set(512, 2u8);
        assert_eq!(array.allocated_pages(), 2);
        assert_eq!(array.get(511), Some(&1));
        assert_eq!(array.get(512), Some(&2));
    }

    #[test]
    fn test_clear_frees_vacant_page() {
        let mut array = PagedArray::new();
        array.set(3, 9u8);
        array.set(4, 1u8);

        array.clear(3, |v| *v == 0);
        assert_eq!(array.get(3), Some(&0));
        assert_eq!(array.allocated_pages(), 1);

        array.clear(4, |v| *v == 0);
        assert!(array.get(4).is_none());
        assert_eq!(array.allocated_pages(), 0);

        // Clearing an unallocated page allocates nothing
        array.clear(5000, |v| *v == 0);
        assert_eq!(array.allocated_pages(), 0);
    }

    #[test]
    fn test_code_point_range() {
        let mut array = PagedArray::new();
        array.set(0x10FFFF, Some(3u16));
        assert_eq!(array.get(0x10FFFF), Some(&Some(3)));
    }

    #[test]
    fn test_iter_yields_indices() {
        let mut array = PagedArray::new();
        array.set(3, 9u8);
        array.set(600, 4u8);
        let set: Vec<_> = array.iter().filter(|(_, v)| **v != 0).collect();
        assert_eq!(set, vec![(3, &9), (600, &4)]);
    }
}
