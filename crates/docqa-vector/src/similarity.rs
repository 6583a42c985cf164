/// Cosine similarity; 0.0 when either vector has zero norm, lengths differ or
/// the inputs contain NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let cos = dot / (norm_a * norm_b);
    if cos.is_nan() { 0.0 } else { cos }
}

/// Cosine mapped onto `[0, 1]`, order preserving.
pub fn similarity_score(a: &[f32], b: &[f32]) -> f32 {
    ((1.0 + cosine_similarity(a, b)) / 2.0).clamp(0.0, 1.0)
}
