/// Bounded Levenshtein distance over Unicode scalar values.
///
/// Exact for every distance `<= max_distance`; anything farther is reported as
/// `max_distance + 1`. Uses two DP rows and stops as soon as a whole row is
/// already above the cap.
pub fn levenshtein(a: &str, b: &str, max_distance: usize) -> usize {
    let over = max_distance.saturating_add(1);
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.len().abs_diff(b.len()) > max_distance {
        return over;
    }
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (curr[j] + 1).min(prev[j + 1] + 1).min(prev[j] + cost);
            row_min = row_min.min(curr[j + 1]);
        }
        if row_min > max_distance {
            return over;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()].min(over)
}
