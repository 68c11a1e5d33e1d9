//! Per-chip instance registry
//!
//! A [`Registry`] owns exactly one driver per physical peripheral block.
//! It is built eagerly, once, at startup; callers borrow drivers from it
//! instead of constructing their own. Drivers are neither `Clone` nor
//! `Copy`, so the table is the only owner of each block.

use core::marker::PhantomData;

/// Identifier of one physical peripheral block
///
/// The set of instances is fixed per chip. Conversion from a raw number is
/// total: unknown numbers map to the first instance.
pub trait InstanceId: Copy + Eq {
    /// Number of instances on the chip
    const COUNT: usize;

    /// Position of this instance in `0..COUNT`
    fn index(self) -> usize;

    /// Instance at `index`, or the first instance when out of range
    fn from_index(index: usize) -> Self;
}

/// Fixed table of `N` drivers keyed by instance id
///
/// `N` is expected to equal `I::COUNT`; indexes past the table resolve to
/// the first entry.
pub struct Registry<I, D, const N: usize> {
    drivers: [D; N],
    _id: PhantomData<I>,
}

impl<I: InstanceId, D, const N: usize> Registry<I, D, N> {
    /// Build every driver up front, calling `build` once per instance in
    /// index order
    pub fn new(mut build: impl FnMut(I) -> D) -> Self {
        Self {
            drivers: core::array::from_fn(|index| build(I::from_index(index))),
            _id: PhantomData,
        }
    }

    /// The driver for `id`
    pub fn get(&self, id: I) -> &D {
        &self.drivers[Self::slot(id.index())]
    }

    pub fn get_mut(&mut self, id: I) -> &mut D {
        &mut self.drivers[Self::slot(id.index())]
    }

    /// The driver for a raw instance number; unknown numbers give instance 0
    pub fn get_raw(&self, raw: u8) -> &D {
        self.get(I::from_index(usize::from(raw)))
    }

    pub fn get_raw_mut(&mut self, raw: u8) -> &mut D {
        self.get_mut(I::from_index(usize::from(raw)))
    }

    /// Number of drivers in the table
    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Every `(id, driver)` pair in index order
    pub fn iter(&self) -> impl Iterator<Item = (I, &D)> {
        self.drivers
            .iter()
            .enumerate()
            .map(|(index, driver)| (I::from_index(index), driver))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut D)> {
        self.drivers
            .iter_mut()
            .enumerate()
            .map(|(index, driver)| (I::from_index(index), driver))
    }

    fn slot(index: usize) -> usize {
        if index < N {
            index
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Bus {
        Bus0,
        Bus1,
    }

    impl InstanceId for Bus {
        const COUNT: usize = 2;

        fn index(self) -> usize {
            self as usize
        }

        fn from_index(index: usize) -> Self {
            match index {
                1 => Bus::Bus1,
                _ => Bus::Bus0,
            }
        }
    }

    struct Driver {
        id: Bus,
        configured: bool,
    }

    fn registry() -> Registry<Bus, Driver, { Bus::COUNT }> {
        Registry::new(|id| Driver {
            id,
            configured: false,
        })
    }

    #[test]
    fn test_one_driver_per_id() {
        let reg = registry();
        assert!(core::ptr::eq(reg.get(Bus::Bus0), reg.get(Bus::Bus0)));
        assert!(!core::ptr::eq(reg.get(Bus::Bus0), reg.get(Bus::Bus1)));
        assert_eq!(reg.get(Bus::Bus1).id, Bus::Bus1);
    }

    #[test]
    fn test_unknown_raw_id_defaults_to_first() {
        let reg = registry();
        assert!(core::ptr::eq(reg.get_raw(7), reg.get(Bus::Bus0)));
        assert!(core::ptr::eq(reg.get_raw(1), reg.get(Bus::Bus1)));
    }

    #[test]
    fn test_state_persists_across_lookups() {
        let mut reg = registry();
        reg.get_mut(Bus::Bus1).configured = true;
        assert!(reg.get_raw(1).configured);
        assert!(!reg.get(Bus::Bus0).configured);

        let ids: heapless::Vec<Bus, 2> = reg.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, [Bus::Bus0, Bus::Bus1]);
    }
}
