/// `part` as a whole percentage of `total`, rounded half up. Zero when `total` is zero.
pub fn percentage(part: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let part = part.min(total);
    ((part * 200 + total) / (total * 2)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(1, 8), 13);
    }

    #[test]
    fn bounds() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(7, 5), 100);
    }
}
