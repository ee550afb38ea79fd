use ark_std::vec::Vec;

/// Convert an 8 byte array (little-endian) into a u64
pub fn u8_le_slice_to_u64(slice: &[u8]) -> u64 {
    let mut a = [0u8; 8];
    a.copy_from_slice(slice);
    u64::from_le_bytes(a)
}

/// Compute the little-endian bits of the low `n_bits` bits of `value`.
pub fn u64_to_bits_le(value: u64, n_bits: usize) -> Vec<bool> {
    (0..n_bits)
        .map(|i| i < 64 && (value >> i) & 1 == 1)
        .collect()
}

/// Reverse the low `num_bits` bits of `n`.
pub fn reverse_bits(n: usize, num_bits: usize) -> usize {
    if num_bits == 0 {
        return 0;
    }
    n.reverse_bits() >> (usize::BITS as usize - num_bits)
}

/// Permute a slice in place by bit-reversing the indices; the length must be
/// a power of two.
pub fn reverse_index_bits_in_place<T>(values: &mut [T]) {
    let n = values.len();
    let log_n = log2_strict(n);
    for i in 0..n {
        let j = reverse_bits(i, log_n);
        if i < j {
            values.swap(i, j);
        }
    }
}

/// The base-2 logarithm of `n`, which must be a power of two.
pub fn log2_strict(n: usize) -> usize {
    assert!(n.is_power_of_two(), "{} is not a power of two", n);
    n.trailing_zeros() as usize
}

/// The base-2 logarithm of `n`, rounded up.
pub fn log2_ceil(n: usize) -> usize {
    (usize::BITS - n.saturating_sub(1).leading_zeros()) as usize
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bit_helpers() {
        assert_eq!(reverse_bits(0b0011, 4), 0b1100);
        assert_eq!(reverse_bits(1, 1), 1);
        assert_eq!(reverse_bits(5, 0), 0);
        assert_eq!(log2_strict(1), 0);
        assert_eq!(log2_strict(16), 4);
        assert_eq!(log2_ceil(1), 0);
        assert_eq!(log2_ceil(5), 3);
        assert_eq!(log2_ceil(8), 3);
        assert_eq!(u64_to_bits_le(6, 4), vec![false, true, true, false]);

        let mut v: Vec<usize> = (0..8).collect();
        reverse_index_bits_in_place(&mut v);
        assert_eq!(v, vec![0, 4, 2, 6, 1, 5, 3, 7]);
    }
}
