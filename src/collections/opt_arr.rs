use core::{
    fmt,
    hash::{Hash, Hasher},
    mem::size_of,
    ops::{Deref, DerefMut, Index, IndexMut},
    ptr, slice,
    slice::SliceIndex,
};

use static_assertions::const_assert;

use super::{
    imp::array::{handle_error, RawArray},
    impl_slot_partial_eq, GeometricGrowth, ReserveStrategy, TryReserveError,
};

mod into_iter;

pub use into_iter::IntoIter;

/// A contiguous growable array of *optional* elements.
///
/// Every logical position of an `OptArr` holds an `Option<T>`: it can own a
/// value, or it can hold the empty sentinel (`None`) while still counting
/// towards the length. The same sentinel fills the spare capacity, so every
/// allocated slot is an initialized `Option<T>` at all times: live elements
/// below [`len`], sentinels from [`len`] up to [`capacity`]. That discipline
/// is what makes the shifting mutators and the destructor simple: a vacated
/// slot is reset to the sentinel, and dropping the array sweeps the whole
/// capacity (sentinels drop as no-ops).
///
/// # Examples
///
/// ```
/// use optarr::optarr;
///
/// let mut arr = optarr![1, 2];
/// arr.push_back(3);
/// arr.push_back(None);
///
/// assert_eq!(arr.len(), 4);
/// assert_eq!(arr, [Some(1), Some(2), Some(3), None]);
/// ```
///
/// # Capacity and growth
///
/// A fresh array allocates the smallest growth tier covering
/// [`INITIAL_CAPACITY`] slots. When an operation
/// needs more room it asks [`reserve`] for the minimal sufficient target
/// (`len + 1` for single-element growth), and `reserve` picks the smallest
/// growth tier covering that target. With the default [`GeometricGrowth`]
/// strategy, the smallest power of two. Growth is therefore geometric and a
/// run of `N` appends costs amortized *O*(N).
///
/// Capacity never shrinks: [`clear`], [`truncate`], and [`resize`] only ever
/// release elements, and there is no shrink operation at all.
///
/// # Reference invalidation
///
/// Any raw pointer obtained from [`as_ptr`]/[`as_mut_ptr`] is invalidated by
/// every operation that can grow capacity; safe references are policed by the
/// borrow checker as usual.
///
/// [`len`]: OptArr::len
/// [`capacity`]: OptArr::capacity
/// [`reserve`]: OptArr::reserve
/// [`clear`]: OptArr::clear
/// [`truncate`]: OptArr::truncate
/// [`resize`]: OptArr::resize
/// [`as_ptr`]: OptArr::as_ptr
/// [`as_mut_ptr`]: OptArr::as_mut_ptr
/// [`INITIAL_CAPACITY`]: OptArr::INITIAL_CAPACITY
pub struct OptArr<T, R: ReserveStrategy = GeometricGrowth<2>> {
    buf: RawArray<Option<T>, R>,
    len: usize,
}

const_assert!(OptArr::<u8>::INITIAL_CAPACITY > 0);
// Sits exactly on a tier of the default factor-2 strategy.
const_assert!(OptArr::<u8>::INITIAL_CAPACITY.is_power_of_two());

// The plain constructors pin the default strategy so that `OptArr::new()`
// and `optarr![...]` infer without annotations; type-parameter defaults do
// not take part in expression inference. Any other strategy goes through the
// `*_strategy` constructors, in the manner of `HashMap::with_hasher`.
impl<T> OptArr<T> {
    /// Constructs a new `OptArr<T>` with [`INITIAL_CAPACITY`] sentinel
    /// slots.
    ///
    /// [`INITIAL_CAPACITY`]: OptArr::INITIAL_CAPACITY
    ///
    /// # Aborts
    ///
    /// Aborts on OOM.
    #[must_use]
    pub fn new() -> Self {
        Self::with_strategy()
    }

    /// Tries to construct a new `OptArr<T>`, reporting allocation failure
    /// instead of aborting.
    pub fn try_new() -> Result<Self, TryReserveError> {
        Self::try_with_strategy()
    }

    /// Constructs a new `OptArr<T>` able to hold at least `capacity`
    /// elements without reallocating.
    ///
    /// The allocated capacity is the smallest growth tier covering
    /// `max(capacity, 1)`, so it may exceed the request.
    ///
    /// # Panics / Aborts
    ///
    /// Panics if the requested capacity overflows; aborts on OOM.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_strategy(capacity)
    }

    /// Tries to construct a new `OptArr<T>` able to hold at least `capacity`
    /// elements without reallocating.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        Self::try_with_capacity_and_strategy(capacity)
    }
}

impl<T, R: ReserveStrategy> OptArr<T, R> {
    /// The capacity target of a freshly constructed array: construction
    /// allocates the smallest growth tier covering this many slots.
    pub const INITIAL_CAPACITY: usize = 8;

    /// Constructs a new `OptArr<T, R>` with an explicitly chosen reserve
    /// strategy, holding the smallest `R` tier covering
    /// [`INITIAL_CAPACITY`] sentinel slots.
    ///
    /// [`INITIAL_CAPACITY`]: OptArr::INITIAL_CAPACITY
    ///
    /// # Aborts
    ///
    /// Aborts on OOM.
    #[must_use]
    pub fn with_strategy() -> Self {
        match Self::try_with_strategy() {
            Ok(arr) => arr,
            Err(err) => handle_error(err),
        }
    }

    /// Tries to construct a new `OptArr<T, R>`, reporting allocation failure
    /// instead of aborting.
    pub fn try_with_strategy() -> Result<Self, TryReserveError> {
        Self::try_with_capacity_and_strategy(Self::INITIAL_CAPACITY)
    }

    /// Constructs a new `OptArr<T, R>` with an explicitly chosen reserve
    /// strategy, able to hold at least `capacity` elements without
    /// reallocating.
    ///
    /// # Panics / Aborts
    ///
    /// Panics if the requested capacity overflows; aborts on OOM.
    #[must_use]
    pub fn with_capacity_and_strategy(capacity: usize) -> Self {
        match Self::try_with_capacity_and_strategy(capacity) {
            Ok(arr) => arr,
            Err(err) => handle_error(err),
        }
    }

    /// Tries to construct a new `OptArr<T, R>` with an explicitly chosen
    /// reserve strategy, able to hold at least `capacity` elements without
    /// reallocating.
    pub fn try_with_capacity_and_strategy(capacity: usize) -> Result<Self, TryReserveError> {
        let tier = match R::calculate(0, capacity.max(1)) {
            Ok(tier) => tier,
            Err(()) => return Err(TryReserveError::CapacityOverflow),
        };

        let buf = RawArray::try_with_capacity(tier)?;
        let mut arr = Self { buf, len: 0 };
        let cap = arr.buf.capacity();
        // SAFETY: the buffer was just allocated and holds no elements.
        unsafe { arr.fill_sentinels(0, cap) };
        Ok(arr)
    }

    /// Returns the number of logical elements in the array.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the array holds no logical elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots the array has allocated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Ensures the array can hold at least `capacity` elements without
    /// further reallocation.
    ///
    /// Unlike [`Vec::reserve`], `capacity` is an *absolute* target: the call
    /// is a no-op when `capacity <= self.capacity()`, and otherwise grows to
    /// the smallest strategy tier covering it, filling the new slots with the
    /// sentinel. This is the only path that grows storage.
    ///
    /// # Examples
    ///
    /// ```
    /// let mut arr = optarr::OptArr::<i32>::new();
    /// assert_eq!(arr.capacity(), 8);
    ///
    /// arr.reserve(100);
    /// assert_eq!(arr.capacity(), 128);
    ///
    /// arr.reserve(5); // no-op
    /// assert_eq!(arr.capacity(), 128);
    /// ```
    ///
    /// # Panics / Aborts
    ///
    /// Panics if the new capacity overflows; aborts on OOM.
    pub fn reserve(&mut self, capacity: usize) {
        if let Err(err) = self.try_reserve(capacity) {
            handle_error(err);
        }
    }

    /// The same as [`reserve`], but returns on errors instead of panicking or
    /// aborting. On failure the array is left exactly as it was.
    ///
    /// [`reserve`]: OptArr::reserve
    pub fn try_reserve(&mut self, capacity: usize) -> Result<(), TryReserveError> {
        if capacity <= self.capacity() {
            return Ok(());
        }

        let old_cap = self.buf.capacity();
        self.buf.try_grow(capacity)?;
        let new_cap = self.buf.capacity();
        // SAFETY: the slots past the old capacity are freshly allocated and
        // hold no elements.
        unsafe { self.fill_sentinels(old_cap, new_cap) };
        Ok(())
    }

    /// Resizes the array so that `len` becomes `new_len`.
    ///
    /// Growing appends default-valued elements; shrinking releases the
    /// truncated elements and resets their slots to the sentinel. Capacity
    /// grows if needed and never shrinks.
    ///
    /// # Examples
    ///
    /// ```
    /// use optarr::optarr;
    ///
    /// let mut arr = optarr![1, 9, 3];
    /// arr.resize(5);
    /// assert_eq!(arr, [Some(1), Some(9), Some(3), Some(0), Some(0)]);
    /// ```
    pub fn resize(&mut self, new_len: usize)
    where
        T: Default,
    {
        self.resize_with(new_len, || Some(T::default()));
    }

    /// Resizes the array so that `len` becomes `new_len`, filling new slots
    /// with the result of calling `f`.
    pub fn resize_with<F>(&mut self, new_len: usize, mut f: F)
    where
        F: FnMut() -> Option<T>,
    {
        if new_len > self.capacity() {
            self.reserve(new_len);
        }

        if new_len > self.len {
            while self.len < new_len {
                // SAFETY: the slot at `len` holds the sentinel. The length is
                // bumped per element, so a panicking constructor leaves the
                // array coherent.
                unsafe { ptr::write(self.slots().add(self.len), f()) };
                self.len += 1;
            }
        } else {
            self.truncate(new_len);
        }
    }

    /// Shortens the array to `new_len` elements, releasing the rest.
    ///
    /// Has no effect when `new_len >= len`. Capacity is unchanged.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len {
            return;
        }

        let old_len = self.len;
        // The length is cut before any element drops, so a panicking drop
        // cannot expose the half-released tail; the slots themselves stay
        // initialized either way.
        self.len = new_len;
        for i in new_len..old_len {
            // SAFETY: every slot in the old logical range is initialized, and
            // the sentinel takes the released element's place.
            unsafe { ptr::replace(self.slots().add(i), None) };
        }
    }

    /// Releases every element and resets the length to 0.
    ///
    /// Capacity is unchanged, so a subsequent push does not reallocate.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Returns a reference to the slot at `index`, or `None` when
    /// `index >= len`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Option<T>> {
        self.as_slice().get(index)
    }

    /// Returns a mutable reference to the slot at `index`, or `None` when
    /// `index >= len`.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Option<T>> {
        self.as_mut_slice().get_mut(index)
    }

    /// Returns a reference to the first slot, or `None` if the array is
    /// empty.
    #[inline]
    pub fn front(&self) -> Option<&Option<T>> {
        self.as_slice().first()
    }

    /// Returns a reference to the last slot, or `None` if the array is
    /// empty.
    #[inline]
    pub fn back(&self) -> Option<&Option<T>> {
        self.as_slice().last()
    }

    /// The logical elements as a slice of slots.
    #[inline]
    pub fn as_slice(&self) -> &[Option<T>] {
        // SAFETY: every slot below `len` is initialized.
        unsafe { slice::from_raw_parts(self.slots(), self.len) }
    }

    /// The logical elements as a mutable slice of slots.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Option<T>] {
        // SAFETY: every slot below `len` is initialized.
        unsafe { slice::from_raw_parts_mut(self.slots(), self.len) }
    }

    /// A raw pointer to the start of storage. Invalidated by any operation
    /// that can grow capacity.
    #[inline]
    pub fn as_ptr(&self) -> *const Option<T> {
        self.slots()
    }

    /// A raw mutable pointer to the start of storage. Invalidated by any
    /// operation that can grow capacity.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut Option<T> {
        self.slots()
    }

    /// Appends an element (or the empty sentinel) to the back of the array.
    ///
    /// Accepts both `T` and `Option<T>`, so `arr.push_back(1)` and
    /// `arr.push_back(None)` read naturally. Pushing `None` stores the
    /// sentinel and owns nothing.
    pub fn push_back(&mut self, value: impl Into<Option<T>>) {
        self.push_slot(value.into());
    }

    /// Removes the last slot and returns it, or `None` if the array is
    /// empty.
    ///
    /// The returned slot is `Some(None)` when the last position held the
    /// empty sentinel.
    pub fn pop_back(&mut self) -> Option<Option<T>> {
        if self.len == 0 {
            return None;
        }

        self.len -= 1;
        // SAFETY: the slot at the old `len - 1` is initialized, and the
        // sentinel takes its place.
        Some(unsafe { ptr::replace(self.slots().add(self.len), None) })
    }

    /// Inserts an element (or the empty sentinel) at `index`, shifting the
    /// elements at `[index, len)` one slot rightward.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use optarr::optarr;
    ///
    /// let mut arr = optarr![1, 3];
    /// arr.insert(1, 9);
    /// assert_eq!(arr, [Some(1), Some(9), Some(3)]);
    /// ```
    pub fn insert(&mut self, index: usize, value: impl Into<Option<T>>) {
        let len = self.len;
        assert!(index <= len, "insert index (is {index}) should be <= len (is {len})");

        let value = value.into();
        if len == self.capacity() {
            self.reserve(len + 1);
        }

        unsafe {
            let base = self.slots();
            // Shift [index, len) rightward. `ptr::copy` handles the overlap,
            // so inserting at 0 never reads before the start of storage.
            ptr::copy(base.add(index), base.add(index + 1), len - index);
            ptr::write(base.add(index), value);
        }
        self.len += 1;
    }

    /// Removes the slot at `index` and returns it, shifting the elements at
    /// `[index + 1, len)` one slot leftward.
    ///
    /// An out-of-range `index` is tolerated: nothing is removed and `None` is
    /// returned. The vacated last slot is reset to the sentinel.
    ///
    /// # Examples
    ///
    /// ```
    /// use optarr::optarr;
    ///
    /// let mut arr = optarr![1, 2, 3];
    /// assert_eq!(arr.remove(1), Some(Some(2)));
    /// assert_eq!(arr, [Some(1), Some(3)]);
    /// assert_eq!(arr.remove(7), None);
    /// ```
    pub fn remove(&mut self, index: usize) -> Option<Option<T>> {
        if index >= self.len {
            return None;
        }

        unsafe {
            let base = self.slots();
            let removed = ptr::read(base.add(index));
            // Close the gap, then put the sentinel in the vacated last slot.
            ptr::copy(base.add(index + 1), base.add(index), self.len - index - 1);
            ptr::write(base.add(self.len - 1), None);
            self.len -= 1;
            Some(removed)
        }
    }

    /// Stores an element (or the empty sentinel) at `index`.
    ///
    /// Three regimes:
    /// - `index < len`: the existing element is released and the new value
    ///   takes its slot.
    /// - `index == len`: appends, exactly like [`push_back`].
    /// - `index > len`: tolerated, nothing happens.
    ///
    /// [`push_back`]: OptArr::push_back
    pub fn set(&mut self, index: usize, value: impl Into<Option<T>>) {
        let value = value.into();
        if index < self.len {
            // SAFETY: the slot holds a live element, which is dropped here.
            unsafe { ptr::replace(self.slots().add(index), value) };
        } else if index == self.len {
            self.push_slot(value);
        }
    }

    #[inline]
    fn slots(&self) -> *mut Option<T> {
        self.buf.ptr()
    }

    fn push_slot(&mut self, slot: Option<T>) {
        if self.len == self.capacity() {
            self.reserve(self.len + 1);
        }

        // SAFETY: the slot at `len` holds the sentinel, which needs no drop.
        unsafe { ptr::write(self.slots().add(self.len), slot) };
        self.len += 1;
    }

    /// Writes the empty sentinel into the slots `[from, to)`.
    ///
    /// # Safety
    ///
    /// The range must lie inside the allocation and must not contain live
    /// elements.
    unsafe fn fill_sentinels(&mut self, from: usize, to: usize) {
        // Zero-sized slots have nothing to initialize.
        if size_of::<Option<T>>() == 0 {
            return;
        }

        let base = self.slots();
        for i in from..to {
            ptr::write(base.add(i), None);
        }
    }
}

//--------------------------------------------------------------

impl<T, R: ReserveStrategy> Drop for OptArr<T, R> {
    fn drop(&mut self) {
        // Every slot below capacity is initialized: live elements below
        // `len`, sentinels above. Sentinels drop as no-ops, and the buffer
        // itself is released by `RawArray`.
        let init = if size_of::<Option<T>>() == 0 { self.len } else { self.buf.capacity() };
        // SAFETY: see above.
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.slots(), init)) };
    }
}

impl<T, R: ReserveStrategy> Default for OptArr<T, R> {
    fn default() -> Self {
        Self::with_strategy()
    }
}

impl<T, R: ReserveStrategy> Deref for OptArr<T, R> {
    type Target = [Option<T>];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T, R: ReserveStrategy> DerefMut for OptArr<T, R> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T: Clone, R: ReserveStrategy> Clone for OptArr<T, R> {
    fn clone(&self) -> Self {
        let mut arr = Self::with_capacity_and_strategy(self.capacity());
        for slot in self.as_slice() {
            arr.push_slot(slot.clone());
        }
        arr
    }

    fn clone_from(&mut self, source: &Self) {
        // Drop anything that will not be overwritten, then clone into the
        // surviving slots and append the rest.
        self.truncate(source.len());
        self.reserve(source.len());

        let common = self.len;
        for (dst, src) in self.as_mut_slice().iter_mut().zip(source.as_slice()) {
            dst.clone_from(src);
        }
        for slot in &source.as_slice()[common..] {
            self.push_slot(slot.clone());
        }
    }
}

impl<T: fmt::Debug, R: ReserveStrategy> fmt::Debug for OptArr<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: Hash, R: ReserveStrategy> Hash for OptArr<T, R> {
    /// The hash of an `OptArr` is the same as that of the corresponding
    /// slice of slots.
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        Hash::hash(&**self, state)
    }
}

impl<T, I: SliceIndex<[Option<T>]>, R: ReserveStrategy> Index<I> for OptArr<T, R> {
    type Output = I::Output;

    #[inline]
    fn index(&self, index: I) -> &Self::Output {
        Index::index(&**self, index)
    }
}

impl<T, I: SliceIndex<[Option<T>]>, R: ReserveStrategy> IndexMut<I> for OptArr<T, R> {
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        IndexMut::index_mut(&mut **self, index)
    }
}

impl<T, R: ReserveStrategy, V: Into<Option<T>>> FromIterator<V> for OptArr<T, R> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut arr = Self::with_strategy();
        arr.extend(iter);
        arr
    }
}

impl<T, R: ReserveStrategy, V: Into<Option<T>>> Extend<V> for OptArr<T, R> {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        if lower > 0 {
            let needed = self.len.saturating_add(lower);
            if needed > self.capacity() {
                self.reserve(needed);
            }
        }

        for value in iter {
            self.push_slot(value.into());
        }
    }
}

impl<T, R: ReserveStrategy> IntoIterator for OptArr<T, R> {
    type Item = Option<T>;
    type IntoIter = IntoIter<T, R>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T, R: ReserveStrategy> IntoIterator for &'a OptArr<T, R> {
    type Item = &'a Option<T>;
    type IntoIter = slice::Iter<'a, Option<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, R: ReserveStrategy> IntoIterator for &'a mut OptArr<T, R> {
    type Item = &'a mut Option<T>;
    type IntoIter = slice::IterMut<'a, Option<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

//--------------------------------------------------------------

impl_slot_partial_eq! { [R: ReserveStrategy, R2: ReserveStrategy] OptArr<T, R>, OptArr<T, R2> }
impl_slot_partial_eq! { [R: ReserveStrategy] OptArr<T, R>, [Option<T>] }
impl_slot_partial_eq! { [R: ReserveStrategy] OptArr<T, R>, &[Option<T>] }
impl_slot_partial_eq! { [R: ReserveStrategy, const N: usize] OptArr<T, R>, [Option<T>; N] }
impl_slot_partial_eq! { [R: ReserveStrategy, const N: usize] OptArr<T, R>, &[Option<T>; N] }

impl<T: Eq, R: ReserveStrategy> Eq for OptArr<T, R> {}

// The raw buffer pointer suppresses the auto impls; ownership semantics are
// those of `Option<T>`.
unsafe impl<T: Send, R: ReserveStrategy> Send for OptArr<T, R> {}
unsafe impl<T: Sync, R: ReserveStrategy> Sync for OptArr<T, R> {}

//--------------------------------------------------------------

/// Convenient initialization of an [`OptArr`], in the manner of `vec!`.
///
/// Elements go through `Into<Option<T>>`, so values and `None` can be mixed:
///
/// ```
/// use optarr::optarr;
///
/// let arr = optarr![1, None, 3];
/// assert_eq!(arr, [Some(1), None, Some(3)]);
///
/// let fives = optarr![5; 4];
/// assert_eq!(fives, [Some(5), Some(5), Some(5), Some(5)]);
/// ```
#[macro_export]
macro_rules! optarr {
    () => {
        $crate::OptArr::new()
    };
    ($elem:expr; $n:expr) => {{
        let mut arr = $crate::OptArr::new();
        let template = $elem;
        for _ in 0..$n {
            arr.push_back(::core::clone::Clone::clone(&template));
        }
        arr
    }};
    ($($elem:expr),+ $(,)?) => {{
        let mut arr = $crate::OptArr::new();
        $(arr.push_back($elem);)+
        arr
    }};
}

//--------------------------------------------------------------

/// The preconfigured element kinds of the classic per-primitive constructors.
///
/// Each alias is a pure composition of [`OptArr`] with a concrete element
/// type; none adds behavior. The "shallow" (no-ownership) kind of the C API
/// corresponds to instantiating [`OptArr`] with any `Copy` handle type and
/// needs no alias.
pub type StrArr = OptArr<String>;
pub type CharArr = OptArr<char>;
pub type DoubleArr = OptArr<f64>;
pub type FloatArr = OptArr<f32>;
pub type IntArr = OptArr<i32>;
pub type UIntArr = OptArr<u32>;
pub type LongArr = OptArr<i64>;
pub type ULongArr = OptArr<u64>;
pub type ShortArr = OptArr<i16>;
pub type UShortArr = OptArr<u16>;
pub type ByteArr = OptArr<u8>;
pub type SByteArr = OptArr<i8>;
