use sha2::{Digest, Sha256};

/// Shuffles the characters inside every alphanumeric run of `value`.
///
/// The generator is seeded from the value's own digest, so the same input
/// always scrambles to the same output. Separators stay where they are.
pub fn scramble(value: &str) -> String {
    let mut rng = fastrand::Rng::with_seed(seed_for(value));
    let mut chars: Vec<char> = value.chars().collect();

    let mut start = 0;
    while start < chars.len() {
        if !chars[start].is_alphanumeric() {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < chars.len() && chars[end].is_alphanumeric() {
            end += 1;
        }
        shuffle(&mut chars[start..end], &mut rng);
        start = end;
    }

    chars.into_iter().collect()
}

fn shuffle(word: &mut [char], rng: &mut fastrand::Rng) {
    for i in (1..word.len()).rev() {
        let j = rng.usize(..=i);
        word.swap(i, j);
    }
}

fn seed_for(value: &str) -> u64 {
    let digest = Sha256::digest(value.as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed)
}
