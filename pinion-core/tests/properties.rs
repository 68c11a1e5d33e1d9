//! Property-based tests for the bit utilities, serializer and containers.

use pinion_core::bits::{check_bit, check_bits, clear_bit, set_bit, toggle_bit};
use pinion_core::{BoundedVector, RingBuffer, TypeSerializer, ValueSerializer};
use proptest::prelude::*;

proptest! {
    /// Setting then clearing a bit gives the same result as only clearing it.
    #[test]
    fn set_then_clear_equals_clear(x in any::<u32>(), p in 0u32..32) {
        let mut a = x;
        set_bit(&mut a, p);
        clear_bit(&mut a, p);

        let mut b = x;
        clear_bit(&mut b, p);
        prop_assert_eq!(a, b);
    }

    /// Toggling twice is the identity.
    #[test]
    fn double_toggle_is_identity(x in any::<u64>(), p in 0u32..64) {
        let mut a = x;
        toggle_bit(&mut a, p);
        toggle_bit(&mut a, p);
        prop_assert_eq!(a, x);
    }

    /// A set bit always reads back as set.
    #[test]
    fn set_bit_is_observable(x in any::<u16>(), p in 0u32..16) {
        let mut a = x;
        set_bit(&mut a, p);
        prop_assert!(check_bit(a, p));
    }

    /// `check_bits` means every bit of the mask is set.
    #[test]
    fn check_bits_matches_mask(x in any::<u8>(), m in any::<u8>()) {
        prop_assert_eq!(check_bits(x, m), (x & m) == m);
    }

    /// Out-of-range positions leave the field untouched.
    #[test]
    fn out_of_range_bit_is_noop(x in any::<u8>(), p in 8u32..200) {
        let mut a = x;
        set_bit(&mut a, p);
        toggle_bit(&mut a, p);
        prop_assert_eq!(a, x);
        prop_assert!(!check_bit(a, p));
    }

    /// Integers survive insert/extract unchanged.
    #[test]
    fn serializer_roundtrip_integers(a in any::<u8>(), b in any::<i16>(), c in any::<u32>(), d in any::<i64>()) {
        let mut s = TypeSerializer::new();
        s.insert(a);
        prop_assert_eq!(s.extract::<u8>(), a);
        s.insert(b);
        prop_assert_eq!(s.extract::<i16>(), b);
        s.insert(c);
        prop_assert_eq!(s.extract::<u32>(), c);
        s.insert(d);
        prop_assert_eq!(s.extract::<i64>(), d);
    }

    /// Floats survive insert/extract with their exact bit pattern, NaN included.
    #[test]
    fn serializer_roundtrip_float_bits(bits32 in any::<u32>(), bits64 in any::<u64>()) {
        let mut s = TypeSerializer::new();
        s.insert(f32::from_bits(bits32));
        prop_assert_eq!(s.extract::<f32>().to_bits(), bits32);
        s.insert(f64::from_bits(bits64));
        prop_assert_eq!(s.extract::<f64>().to_bits(), bits64);
    }

    /// Packing never copies more than the cell holds, and unpacking zero-fills
    /// whatever the cell cannot supply.
    #[test]
    fn serializer_copy_is_bounded(input in proptest::collection::vec(any::<u8>(), 0..16), out_len in 0usize..16) {
        let mut s = ValueSerializer::<4>::new();
        let copied = s.pack(&input);
        prop_assert_eq!(copied, input.len().min(4));

        let mut out = [0xAAu8; 16];
        let unpacked = s.unpack(&mut out[..out_len]);
        prop_assert_eq!(unpacked, out_len.min(4));
        for (i, byte) in out[..out_len].iter().enumerate() {
            let expected = if i < copied { input[i] } else { 0 };
            prop_assert_eq!(*byte, expected);
        }
    }

    /// L writes then L reads give back the same sequence and leave the buffer empty.
    #[test]
    fn ring_buffer_fifo(values in proptest::array::uniform8(any::<u8>())) {
        let mut ring: RingBuffer<u8, 8> = RingBuffer::new();
        for v in values {
            ring.write(v);
        }
        for v in values {
            prop_assert_eq!(ring.read(), Some(v));
        }
        prop_assert!(ring.is_empty());
    }

    /// Overfilling keeps only the newest L entries and never reports more than L.
    #[test]
    fn ring_buffer_overwrites_oldest(values in proptest::collection::vec(any::<u16>(), 0..40)) {
        let mut ring: RingBuffer<u16, 5> = RingBuffer::new();
        for v in &values {
            ring.write(*v);
            prop_assert!(ring.len() <= 5);
        }

        let kept = values.len().min(5);
        prop_assert_eq!(ring.len(), kept);
        for v in &values[values.len() - kept..] {
            prop_assert_eq!(ring.read(), Some(*v));
        }
        prop_assert_eq!(ring.read(), None);
    }

    /// Pushing past capacity is rejected and the length stays at capacity.
    #[test]
    fn bounded_vector_capacity(pushes in 0usize..20, pops in 0usize..30) {
        let mut vec: BoundedVector<usize, 6> = BoundedVector::new();
        for i in 0..pushes {
            let accepted = vec.push_back(i).is_ok();
            prop_assert_eq!(accepted, i < 6);
        }
        prop_assert_eq!(vec.len(), pushes.min(6));

        for _ in 0..pops {
            vec.pop_back();
        }
        prop_assert_eq!(vec.len(), pushes.min(6).saturating_sub(pops));
    }
}
