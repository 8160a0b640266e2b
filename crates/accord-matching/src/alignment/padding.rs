/// Resize `items` to `size`: pad with `filler` or truncate.
pub fn pad_to<T: Clone>(items: &[T], size: usize, filler: T) -> Vec<T> {
    let mut padded: Vec<T> = items.iter().take(size).cloned().collect();
    padded.resize(size, filler);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pads_shorter_list() {
        assert_eq!(pad_to(&[1, 2], 4, 0), vec![1, 2, 0, 0]);
    }

    #[test]
    fn test_truncates_longer_list() {
        assert_eq!(pad_to(&[1, 2, 3, 4], 2, 0), vec![1, 2]);
    }

    #[test]
    fn test_same_size_is_unchanged() {
        assert_eq!(pad_to(&["a", "b"], 2, "z"), vec!["a", "b"]);
        assert!(pad_to::<u8>(&[], 0, 9).is_empty());
    }
}
