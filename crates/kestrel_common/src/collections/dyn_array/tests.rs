use std::{
    cell::Cell,
    collections::hash_map::DefaultHasher,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
};

use super::*;
use crate::{
    alloc::memory_stats,
    collections::{DoubleOrMinReserveStrategy, Pow2ReserveStrategy},
    dynarray,
};

/// Element that keeps track of how many instances are alive.
#[derive(Debug)]
struct Tracked {
    value: i32,
    live:  Rc<Cell<isize>>,
}

impl Tracked {
    fn new(value: i32, live: &Rc<Cell<isize>>) -> Self {
        live.set(live.get() + 1);
        Self { value, live: live.clone() }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Self::new(self.value, &self.live)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

impl PartialEq<i32> for Tracked {
    fn eq(&self, other: &i32) -> bool {
        self.value == *other
    }
}

/// Element whose clone panics once a shared budget is used up.
#[derive(Debug)]
struct PanicOnClone {
    value:  i32,
    budget: Rc<Cell<usize>>,
    live:   Rc<Cell<isize>>,
}

impl PanicOnClone {
    fn new(value: i32, budget: &Rc<Cell<usize>>, live: &Rc<Cell<isize>>) -> Self {
        live.set(live.get() + 1);
        Self { value, budget: budget.clone(), live: live.clone() }
    }
}

impl Clone for PanicOnClone {
    fn clone(&self) -> Self {
        if self.budget.get() == 0 {
            panic!("clone budget exhausted");
        }
        self.budget.set(self.budget.get() - 1);
        Self::new(self.value, &self.budget, &self.live)
    }
}

impl Drop for PanicOnClone {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

fn values<R: ReserveStrategy>(arr: &DynArray<PanicOnClone, R>) -> Vec<i32> {
    arr.iter().map(|elem| elem.value).collect()
}

//--------------------------------------------------------------

#[test]
fn dynarray_new() {
    let before = memory_stats();
    let arr = DynArray::<i32>::new();
    assert_eq!(arr.capacity(), 0);
    assert_eq!(arr.len(), 0);
    assert!(arr.is_empty());
    assert_eq!(memory_stats(), before);

    let arr = DynArray::<i32>::with_capacity(21);
    assert_eq!(arr.capacity(), 21);
    assert_eq!(arr.len(), 0);

    let arr: DynArray<i32> = Default::default();
    assert_eq!(arr.capacity(), 0);
}

#[test]
fn dynarray_sized_construction() {
    let arr = DynArray::<i32>::with_len(4);
    assert_eq!(arr, [0, 0, 0, 0]);
    assert_eq!(arr.capacity(), 4);

    let arr = DynArray::<String>::from_elem("a".to_string(), 3);
    assert_eq!(arr, ["a", "a", "a"]);
    assert_eq!(arr.capacity(), 3);

    let arr = DynArray::<String>::from_elem("a".to_string(), 0);
    assert!(arr.is_empty());
    assert_eq!(arr.capacity(), 0);
}

#[test]
fn dynarray_range_construction() {
    let src = [1, 2, 3, 4];

    let cloned = DynArray::<i32>::from_slice(&src);
    let copied = DynArray::<i32>::from_copied(&src);
    assert_eq!(cloned, copied);
    assert_eq!(cloned.capacity(), 4);
    assert_eq!(copied.capacity(), 4);

    let collected: DynArray<i32> = src.iter().map(|x| x * 2).collect();
    assert_eq!(collected, [2, 4, 6, 8]);
    assert_eq!(collected.capacity(), 4);

    let from_array = DynArray::<i32>::from([5, 6]);
    assert_eq!(from_array, [5, 6]);
    assert_eq!(from_array.capacity(), 2);

    let from_slice: DynArray<i32> = DynArray::from(&src[1..3]);
    assert_eq!(from_slice, [2, 3]);
}

#[test]
fn dynarray_macro() {
    let arr: DynArray<i32> = dynarray![];
    assert!(arr.is_empty());

    let arr = dynarray![1, 2, 3];
    assert_eq!(arr, [1, 2, 3]);
    assert_eq!(arr.capacity(), 3);

    let arr = dynarray![7u8; 5];
    assert_eq!(arr, [7, 7, 7, 7, 7]);
}

#[test]
fn dynarray_push_and_access() {
    let mut arr = DynArray::<i32>::new();

    *arr.push(42) += 1;
    assert_eq!(arr.capacity(), 1);
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0], 43);

    arr.push(84);
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[1], 84);

    let elem = arr.emplace_back(|| 7);
    assert_eq!(*elem, 7);
    assert_eq!(arr, [43, 84, 7]);

    assert_eq!(*arr.front(), 43);
    assert_eq!(*arr.back(), 7);
    assert_eq!(*arr.at(1), 84);

    *arr.front_mut() = 1;
    *arr.back_mut() = 3;
    *arr.at_mut(1) = 2;
    arr[1] += 10;
    assert_eq!(arr, [1, 12, 3]);
    assert_eq!(&arr[1..], &[12, 3]);
}

#[test]
fn dynarray_growth_policy() {
    let mut arr = DynArray::<u32>::new();
    let mut caps = Vec::new();
    for i in 0..12 {
        arr.push(i);
        if caps.last() != Some(&arr.capacity()) {
            caps.push(arr.capacity());
        }
    }
    assert_eq!(caps, [1, 2, 4, 7, 11, 17]);

    // Multi element growth reserves one slot past the new length
    let mut arr = DynArray::<u32>::with_capacity(4);
    arr.extend_from_copied(&[0; 4]);
    arr.extend_from_copied(&[1; 6]);
    assert_eq!(arr.len(), 10);
    assert_eq!(arr.capacity(), 13);

    let mut arr = dynarray![1, 2, 3, 4];
    arr.insert_slice(1, &[7, 8, 9]);
    assert_eq!(arr, [1, 7, 8, 9, 2, 3, 4]);
    assert_eq!(arr.capacity(), 10);
}

#[test]
fn dynarray_other_strategies() {
    let mut arr = DynArray::<u32, Pow2ReserveStrategy>::new();
    for i in 0..5 {
        arr.push(i);
    }
    assert_eq!(arr.capacity(), 8);

    let mut arr = DynArray::<u32, DoubleOrMinReserveStrategy>::new();
    for i in 0..5 {
        arr.push(i);
    }
    assert_eq!(arr.capacity(), 8);
    assert_eq!(arr, DynArray::<u32>::from([0, 1, 2, 3, 4]));
}

#[test]
fn dynarray_insert_erase_round_trip() {
    let mut arr = dynarray![1, 2, 3];
    let pos = arr.insert(1, 9);
    assert_eq!(pos, 1);
    assert_eq!(arr, [1, 9, 2, 3]);

    let pos = arr.erase(pos);
    assert_eq!(pos, 1);
    assert_eq!(arr, [1, 2, 3]);
}

#[test]
fn dynarray_insert_positions() {
    // Within capacity
    let mut arr = DynArray::<i32>::with_capacity(8);
    arr.extend_from_slice(&[1, 2, 3]);
    arr.insert(0, 0);
    assert_eq!(arr, [0, 1, 2, 3]);
    arr.insert(4, 4);
    assert_eq!(arr, [0, 1, 2, 3, 4]);
    arr.emplace(2, || 7);
    assert_eq!(arr, [0, 1, 7, 2, 3, 4]);
    assert_eq!(arr.capacity(), 8);

    // Reallocating
    let mut arr = dynarray![1, 2, 3];
    arr.insert(1, 5);
    assert_eq!(arr, [1, 5, 2, 3]);
    assert_eq!(arr.capacity(), 5);
}

#[test]
fn dynarray_insert_ranges() {
    let mut arr = dynarray![1, 5];
    assert_eq!(arr.insert_array(1, [2, 3]), 1);
    assert_eq!(arr, [1, 2, 3, 5]);

    assert_eq!(arr.insert_slice(3, &[4]), 3);
    assert_eq!(arr, [1, 2, 3, 4, 5]);

    assert_eq!(arr.insert_copied(0, &[-1, 0]), 0);
    assert_eq!(arr, [-1, 0, 1, 2, 3, 4, 5]);

    let len = arr.len();
    assert_eq!(arr.insert_iter(len, 6..9), 7);
    assert_eq!(arr, [-1, 0, 1, 2, 3, 4, 5, 6, 7, 8]);

    assert_eq!(arr.insert_slice(2, &[]), 2);
    assert_eq!(arr.len(), 10);
}

#[test]
fn dynarray_insert_iter_short() {
    // An iterator that reports more elements than it yields
    struct Liar(std::ops::Range<i32>);

    impl Iterator for Liar {
        type Item = i32;
        fn next(&mut self) -> Option<i32> {
            self.0.next()
        }
    }

    impl ExactSizeIterator for Liar {
        fn len(&self) -> usize {
            self.0.len() + 2
        }
    }

    let mut arr = dynarray![0, 10, 11];
    arr.insert_iter(1, Liar(1..3));
    assert_eq!(arr, [0, 1, 2, 10, 11]);
}

#[test]
#[should_panic(expected = "insertion index (is 4) should be <= len (is 3)")]
fn dynarray_insert_out_of_bounds() {
    let mut arr = dynarray![1, 2, 3];
    arr.insert(4, 0);
}

#[test]
fn dynarray_erase() {
    let mut arr = dynarray![0, 1, 2, 3, 4, 5];
    assert_eq!(arr.erase(5), 5);
    assert_eq!(arr, [0, 1, 2, 3, 4]);

    assert_eq!(arr.erase_range(1..3), 1);
    assert_eq!(arr, [0, 3, 4]);

    assert_eq!(arr.erase_range(1..), 1);
    assert_eq!(arr, [0]);
    assert_eq!(arr.capacity(), 6);

    let mut arr = dynarray![0, 1, 2, 3];
    assert_eq!(arr.erase_range(..=1), 0);
    assert_eq!(arr, [2, 3]);

    let mut arr = dynarray![0, 1, 2, 3];
    assert_eq!(arr.remove(1), 1);
    assert_eq!(arr.swap_remove(0), 0);
    assert_eq!(arr, [3, 2]);
}

#[test]
#[should_panic(expected = "erase range (is 2..2)")]
fn dynarray_erase_empty_range() {
    let mut arr = dynarray![1, 2, 3];
    arr.erase_range(2..2);
}

#[test]
#[should_panic(expected = "erase range (is 1..4)")]
fn dynarray_erase_range_out_of_bounds() {
    let mut arr = dynarray![1, 2, 3];
    arr.erase_range(1..4);
}

#[test]
#[should_panic(expected = "removal index (is 0) should be < len (is 0)")]
fn dynarray_erase_empty() {
    let mut arr = DynArray::<i32>::new();
    arr.erase(0);
}

#[test]
fn dynarray_pop() {
    let mut arr = dynarray![1, 2];
    assert_eq!(arr.pop(), Some(2));
    arr.pop_back();
    assert!(arr.is_empty());
    assert_eq!(arr.pop(), None);
    assert_eq!(arr.capacity(), 2);
}

#[test]
#[should_panic(expected = "`pop_back` called on an empty array")]
fn dynarray_pop_back_empty() {
    let mut arr = DynArray::<i32>::new();
    arr.pop_back();
}

#[test]
#[should_panic(expected = "index (is 3) should be < len (is 3)")]
fn dynarray_at_out_of_bounds() {
    let arr = dynarray![1, 2, 3];
    arr.at(3);
}

#[test]
#[should_panic(expected = "`front` called on an empty array")]
fn dynarray_front_empty() {
    let arr = DynArray::<i32>::new();
    arr.front();
}

#[test]
fn dynarray_reserve() {
    let mut arr = DynArray::<i32>::new();
    arr.reserve(21);
    assert_eq!(arr.capacity(), 21);
    assert!(arr.is_empty());

    arr.extend_from_copied(&[1, 2, 3, 4]);
    arr.reserve(10);
    assert_eq!(arr.capacity(), 10);
    assert_eq!(arr, [1, 2, 3, 4]);

    // Reserving less than the length truncates
    arr.reserve(2);
    assert_eq!(arr.capacity(), 2);
    assert_eq!(arr, [1, 2]);

    let before = memory_stats();
    arr.reserve(0);
    assert!(arr.is_empty());
    assert_eq!(arr.capacity(), 0);
    #[cfg(feature = "memory_tracking")]
    assert_eq!(memory_stats().live_allocations, before.live_allocations - 1);

    let mut arr = DynArray::<u64>::new();
    assert!(matches!(arr.try_reserve(21), Ok(())));
    assert_eq!(arr.capacity(), 21);
    assert!(matches!(arr.try_reserve(usize::MAX), Err(TryReserveError::CapacityOverflow)));
    assert_eq!(arr.capacity(), 21);
}

#[test]
fn dynarray_reserve_drops_truncated() {
    let live = Rc::new(Cell::new(0));
    let mut arr = DynArray::<Tracked>::new();
    for i in 0..5 {
        arr.push(Tracked::new(i, &live));
    }
    arr.reserve(3);
    assert_eq!(live.get(), 3);
    assert_eq!(arr, [0, 1, 2]);
}

#[test]
fn dynarray_shrink_to_fit() {
    let mut arr = DynArray::<i32>::with_capacity(10);
    arr.extend_from_copied(&[1, 2, 3]);
    arr.shrink_to_fit();
    assert_eq!(arr.capacity(), 3);
    arr.shrink_to_fit();
    assert_eq!(arr.capacity(), 3);
    assert_eq!(arr, [1, 2, 3]);

    arr.clear();
    arr.shrink_to_fit();
    assert_eq!(arr.capacity(), 0);
}

#[test]
fn dynarray_resize() {
    let mut arr = dynarray![1, 2, 3];
    arr.resize(5, 9);
    assert_eq!(arr, [1, 2, 3, 9, 9]);
    assert_eq!(arr.capacity(), 5);

    arr.resize(2, 5);
    assert_eq!(arr, [1, 2]);

    arr.resize_default(4);
    assert_eq!(arr, [1, 2, 0, 0]);

    let mut counter = 10;
    arr.resize_with(6, || { counter += 1; counter });
    assert_eq!(arr, [1, 2, 0, 0, 11, 12]);
    assert_eq!(arr.capacity(), 6);

    arr.resize_with(1, || unreachable!());
    assert_eq!(arr, [1]);
    assert_eq!(arr.capacity(), 6);

    let mut arr = DynArray::<i32>::with_len(4);
    arr.resize_default(10);
    assert_eq!(arr.len(), 10);
    assert_eq!(arr.capacity(), 10);
}

#[test]
fn dynarray_assign() {
    let mut arr = dynarray![1, 2, 3];
    arr.assign_len(2);
    assert_eq!(arr, [0, 0]);

    arr.assign_elem(3, 4);
    assert_eq!(arr, [4, 4, 4]);

    arr.assign_slice(&[5, 6]);
    assert_eq!(arr, [5, 6]);

    arr.assign_iter((0..4).rev());
    assert_eq!(arr, [3, 2, 1, 0]);

    arr.assign_array([8, 9]);
    assert_eq!(arr, [8, 9]);
    assert_eq!(arr.capacity(), 6);
}

#[test]
fn dynarray_fill() {
    let live = Rc::new(Cell::new(0));
    let mut arr = DynArray::<Tracked>::from_elem(Tracked::new(1, &live), 3);
    assert_eq!(live.get(), 3);

    arr.fill(Tracked::new(5, &live));
    assert_eq!(arr, [5, 5, 5]);
    assert_eq!(live.get(), 3);

    let mut next = 0;
    let mut arr = dynarray![0, 0, 0];
    arr.fill_with(|| { next += 2; next });
    assert_eq!(arr, [2, 4, 6]);

    let mut empty = DynArray::<Tracked>::new();
    empty.fill(Tracked::new(0, &live));
    assert!(empty.is_empty());
}

#[test]
fn dynarray_clone_independence() {
    let a1 = dynarray![1, 2, 3];
    let mut a2 = a1.clone();
    assert_eq!(a1, a2);
    assert_eq!(a2.capacity(), 3);

    a2[0] = 10;
    a2.push(4);
    assert_eq!(a1, [1, 2, 3]);
    assert_eq!(a2, [10, 2, 3, 4]);

    let mut with_room = DynArray::<i32>::with_capacity(10);
    with_room.clone_from(&a1);
    assert_eq!(with_room, a1);
    assert_eq!(with_room.capacity(), 10);

    let mut small = dynarray![9];
    small.clone_from(&a2);
    assert_eq!(small, a2);
}

#[test]
fn dynarray_move_empties_source() {
    let mut a1 = dynarray!["a".to_string(), "b".to_string(), "c".to_string()];
    let a2 = a1.take();
    assert_eq!(a1.len(), 0);
    assert_eq!(a1.capacity(), 0);
    assert_eq!(a2, ["a", "b", "c"]);

    // The source stays usable
    a1.push("d".to_string());
    assert_eq!(a1, ["d"]);
}

#[test]
fn dynarray_swap() {
    let mut a = dynarray![1, 2, 3];
    let mut b = DynArray::<i32>::with_capacity(8);
    b.push(4);

    a.swap(&mut b);
    assert_eq!(a, [4]);
    assert_eq!(a.capacity(), 8);
    assert_eq!(b, [1, 2, 3]);
    assert_eq!(b.capacity(), 3);
}

#[test]
fn dynarray_sizes() {
    let mut arr = DynArray::<u32>::with_capacity(6);
    arr.extend_from_copied(&[1, 2]);
    assert_eq!(arr.size_in_bytes(), 8);
    assert_eq!(arr.capacity_in_bytes(), 24);
}

#[test]
fn dynarray_iteration() {
    let mut arr = dynarray![1, 2, 3];
    assert_eq!(arr.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
    assert_eq!(arr.rev_iter().copied().collect::<Vec<_>>(), [3, 2, 1]);

    for (i, elem) in arr.rev_iter_mut().enumerate() {
        *elem += i as i32 * 10;
    }
    assert_eq!(arr, [21, 12, 3]);

    for elem in &mut arr {
        *elem -= 1;
    }
    let sum: i32 = (&arr).into_iter().sum();
    assert_eq!(sum, 33);

    let mut iter = arr.into_iter();
    assert_eq!(iter.len(), 3);
    assert_eq!(iter.next_back(), Some(2));
    assert_eq!(iter.as_slice(), &[20, 11]);
    assert_eq!(iter.next(), Some(20));
    assert_eq!(iter.next(), Some(11));
    assert_eq!(iter.next(), None);
}

#[test]
fn dynarray_into_iter_drops_rest() {
    let before = memory_stats();
    let live = Rc::new(Cell::new(0));
    {
        let mut arr = DynArray::<Tracked>::new();
        for i in 0..4 {
            arr.push(Tracked::new(i, &live));
        }

        let mut iter = arr.into_iter();
        let first = iter.next();
        assert!(matches!(first, Some(ref elem) if elem.value == 0));
        assert_eq!(live.get(), 4);
        drop(iter);
        assert_eq!(live.get(), 1);
    }
    assert_eq!(live.get(), 0);
    assert_eq!(memory_stats().live_allocations, before.live_allocations);
}

#[test]
fn dynarray_drops_every_element_once() {
    let before = memory_stats();
    let live = Rc::new(Cell::new(0));
    {
        let mut arr = DynArray::<Tracked>::new();
        for i in 0..10 {
            arr.push(Tracked::new(i, &live));
        }
        arr.insert(3, Tracked::new(100, &live));
        arr.insert_slice(0, &[Tracked::new(-1, &live), Tracked::new(-2, &live)]);
        assert_eq!(live.get(), 13);

        arr.erase_range(2..5);
        assert_eq!(live.get(), 10);

        let copy = arr.clone();
        assert_eq!(live.get(), 20);
        drop(copy);

        arr.resize(12, Tracked::new(7, &live));
        assert_eq!(live.get(), 12);
        arr.truncate(4);
        assert_eq!(live.get(), 4);
        arr.shrink_to_fit();
        assert_eq!(live.get(), 4);
    }
    assert_eq!(live.get(), 0);
    assert_eq!(memory_stats().live_allocations, before.live_allocations);
    assert_eq!(memory_stats().live_bytes, before.live_bytes);
}

#[test]
fn dynarray_zero_sized() {
    let before = memory_stats();
    let mut arr = DynArray::<()>::new();
    for _ in 0..100 {
        arr.push(());
    }
    arr.insert(50, ());
    arr.erase_range(0..10);
    assert_eq!(arr.len(), 91);
    assert_eq!(arr.size_in_bytes(), 0);
    assert_eq!(arr.into_iter().count(), 91);
    assert_eq!(memory_stats(), before);
}

#[test]
fn dynarray_panic_in_insert_closes_gap() {
    let live = Rc::new(Cell::new(0));
    let budget = Rc::new(Cell::new(usize::MAX));

    let mut arr = DynArray::<PanicOnClone>::with_capacity(8);
    arr.push(PanicOnClone::new(0, &budget, &live));
    arr.push(PanicOnClone::new(9, &budget, &live));
    let src = [
        PanicOnClone::new(1, &budget, &live),
        PanicOnClone::new(2, &budget, &live),
        PanicOnClone::new(3, &budget, &live),
    ];

    budget.set(1);
    let res = panic::catch_unwind(AssertUnwindSafe(|| { arr.insert_slice(1, &src); }));
    assert!(res.is_err());

    assert_eq!(values(&arr), [0, 1, 9]);
    assert_eq!(live.get(), 6);

    drop(src);
    drop(arr);
    assert_eq!(live.get(), 0);
}

#[test]
fn dynarray_panic_in_realloc_insert_closes_gap() {
    let live = Rc::new(Cell::new(0));
    let budget = Rc::new(Cell::new(usize::MAX));

    let mut arr = DynArray::<PanicOnClone>::new();
    arr.push(PanicOnClone::new(0, &budget, &live));
    arr.push(PanicOnClone::new(9, &budget, &live));
    assert_eq!(arr.capacity(), 2);

    budget.set(0);
    let value = PanicOnClone::new(5, &budget, &live);
    let res = panic::catch_unwind(AssertUnwindSafe(|| { arr.resize(6, value); }));
    assert!(res.is_err());

    assert_eq!(values(&arr), [0, 9]);
    assert!(arr.capacity() >= 6);
    assert_eq!(live.get(), 2);
}

#[test]
fn dynarray_comparisons() {
    use core::hash::{Hash, Hasher};

    let a = dynarray![1, 2, 3];
    let b = DynArray::<i32, Pow2ReserveStrategy>::from([1, 2, 3]);
    assert_eq!(a, b);
    assert_eq!(a, [1, 2, 3]);
    assert_eq!(a, &[1, 2, 3][..]);
    assert_eq!(vec![1, 2, 3], a);
    assert!(a < dynarray![1, 2, 4]);
    assert_eq!(a.cmp(&dynarray![1, 2]), Ordering::Greater);

    let mut ha = DefaultHasher::new();
    let mut hs = DefaultHasher::new();
    a.hash(&mut ha);
    [1, 2, 3][..].hash(&mut hs);
    assert_eq!(ha.finish(), hs.finish());

    assert_eq!(format!("{a:?}"), "[1, 2, 3]");
    assert!(a.contains(&2));
}

#[test]
fn dynarray_extend() {
    let mut arr = DynArray::<i32>::new();
    arr.extend([1, 2]);
    arr.extend(&[3, 4]);
    arr.extend_from_slice(&[5]);
    arr.extend_from_copied(&[6]);
    assert_eq!(arr, [1, 2, 3, 4, 5, 6]);
}
