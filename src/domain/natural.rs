//! Natural, case-insensitive string ordering.
//!
//! Digit runs compare by numeric value (`Q2 < Q10`). Runs starting with a
//! zero compare digit by digit from the left, so `1.05 < 1.5`. Leading
//! whitespace at every comparison step is ignored.

use std::cmp::Ordering;

/// Compare two strings in natural, case-insensitive order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (mut ai, mut bi) = (0usize, 0usize);

    loop {
        while a.get(ai).is_some_and(|c| c.is_whitespace()) {
            ai += 1;
        }
        while b.get(bi).is_some_and(|c| c.is_whitespace()) {
            bi += 1;
        }

        let (ca, cb) = match (a.get(ai), b.get(bi)) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(&ca), Some(&cb)) => (ca, cb),
        };

        if ca.is_ascii_digit() && cb.is_ascii_digit() {
            let run_a = digit_run(&a[ai..]);
            let run_b = digit_run(&b[bi..]);
            let ord = if ca == '0' || cb == '0' {
                compare_left(run_a, run_b)
            } else {
                compare_right(run_a, run_b)
            };
            if ord != Ordering::Equal {
                return ord;
            }
            ai += run_a.len();
            bi += run_b.len();
            continue;
        }

        let (fa, fb) = (fold(ca), fold(cb));
        if fa != fb {
            return fa.cmp(&fb);
        }
        ai += 1;
        bi += 1;
    }
}

/// Sort a slice in place by a string key using [`natural_cmp`].
///
/// The sort is stable: items with naturally equal keys keep their input order.
pub fn natural_sort_by_key<T, F>(items: &mut [T], mut key: F)
where
    F: FnMut(&T) -> &str,
{
    items.sort_by(|a, b| natural_cmp(key(a), key(b)));
}

fn digit_run(chars: &[char]) -> &[char] {
    let len = chars.iter().take_while(|c| c.is_ascii_digit()).count();
    &chars[..len]
}

/// Integer comparison: the longer run is bigger, otherwise first difference wins.
fn compare_right(a: &[char], b: &[char]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Fractional comparison: digit by digit, a run that ends first is smaller.
fn compare_left(a: &[char], b: &[char]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        if x != y {
            return x.cmp(y);
        }
    }
    a.len().cmp(&b.len())
}

fn fold(c: char) -> char {
    if c.is_ascii() {
        c.to_ascii_uppercase()
    } else {
        c.to_uppercase().next().unwrap_or(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sorted(input: &[&str]) -> Vec<String> {
        let mut items: Vec<String> = input.iter().map(|s| s.to_string()).collect();
        natural_sort_by_key(&mut items, |s| s.as_str());
        items
    }

    #[test]
    fn test_numeric_runs_compare_by_value() {
        assert_eq!(sorted(&["Q10", "Q2", "Q1"]), vec!["Q1", "Q2", "Q10"]);
    }

    #[rstest]
    #[case("q1", "Q1", Ordering::Equal)]
    #[case("a", "B", Ordering::Less)]
    #[case("Q9", "Q10", Ordering::Less)]
    #[case("Q100", "Q20", Ordering::Greater)]
    #[case("x 1", "x1", Ordering::Equal)]
    #[case("1.05", "1.5", Ordering::Less)]
    #[case("SQ001", "SQ002", Ordering::Less)]
    #[case("A", "A1", Ordering::Less)]
    #[case("", "A", Ordering::Less)]
    fn test_natural_cmp(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(natural_cmp(a, b), expected);
        assert_eq!(natural_cmp(b, a), expected.reverse());
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let mut items = vec![("q1", 1), ("Q1", 2), ("q1", 3)];
        natural_sort_by_key(&mut items, |(k, _)| *k);
        let order: Vec<i32> = items.iter().map(|(_, n)| *n).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_sorting_twice_is_idempotent() {
        let once = sorted(&["b10", "B2", "a", "b1", "A10", "a2"]);
        let refs: Vec<&str> = once.iter().map(String::as_str).collect();
        assert_eq!(sorted(&refs), once);
    }
}
