/// Map a possibly out-of-range index onto `0..len` by mirroring about the edge samples.
///
/// The edge sample itself is not repeated: for `len = 5`, `-1 -> 1`, `-2 -> 2` and
/// `5 -> 3`. Indices further out keep bouncing between the two edges, so the mapping
/// is total for any `len > 0`. A single-sample axis maps everything to `0`.
///
/// # Arguments
///
/// * `i` - The index to map, relative to the start of the axis.
/// * `len` - The extent of the axis. Must be greater than zero.
#[inline]
pub fn mirror_index(i: isize, len: usize) -> usize {
    if i >= 0 && (i as usize) < len {
        return i as usize;
    }
    if len <= 1 {
        return 0;
    }
    let period = (2 * len - 2) as isize;
    let r = i.rem_euclid(period) as usize;
    if r < len {
        r
    } else {
        2 * len - 2 - r
    }
}

#[cfg(test)]
mod tests {
    use super::mirror_index;

    #[test]
    fn mirror_inside_is_identity() {
        for i in 0..7 {
            assert_eq!(mirror_index(i, 7), i as usize);
        }
    }

    #[test]
    fn mirror_len1_len2_len5() {
        for i in -8..=8 {
            assert_eq!(mirror_index(i, 1), 0);
        }

        let expected_len2 = [0, 1, 0, 1, 0, 1, 0, 1, 0];
        for (offset, expected) in (-4..=4).zip(expected_len2) {
            assert_eq!(mirror_index(offset, 2), expected);
        }

        let cases_len5 = [
            (-7, 1),
            (-6, 2),
            (-5, 3),
            (-4, 4),
            (-3, 3),
            (-2, 2),
            (-1, 1),
            (5, 3),
            (6, 2),
            (7, 1),
            (8, 0),
        ];
        for (i, expected) in cases_len5 {
            assert_eq!(mirror_index(i, 5), expected);
        }
    }

    #[test]
    fn mirror_is_symmetric_at_both_edges() {
        let len = 9;
        for d in 1..len as isize {
            assert_eq!(mirror_index(-d, len), mirror_index(d, len));
            let last = len as isize - 1;
            assert_eq!(mirror_index(last + d, len), mirror_index(last - d, len));
        }
    }
}
