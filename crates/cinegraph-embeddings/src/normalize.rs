//! Vector arithmetic shared by the embedders and the flat index.

/// Euclidean length.
pub fn l2_norm(vector: &[f32]) -> f32 {
    dot_product(vector, vector).sqrt()
}

/// Scale to unit length in place, so inner product equals cosine.
/// Zero vectors stay zero.
pub fn normalize_l2(vector: &mut [f32]) {
    let norm = l2_norm(vector);
    if norm == 0.0 {
        return;
    }
    vector.iter_mut().for_each(|v| *v /= norm);
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let denominator = l2_norm(a) * l2_norm(b);
    if denominator == 0.0 {
        0.0
    } else {
        dot_product(a, b) / denominator
    }
}

pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Squared Euclidean distance, the score a flat L2 index reports.
/// Mismatched lengths are infinitely far apart.
pub fn squared_l2_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_inner_product_is_cosine() {
        let mut query = vec![2.0, 1.0, 0.0];
        let mut movie = vec![1.0, 3.0, 1.0];
        let expected = cosine_similarity(&query, &movie);

        normalize_l2(&mut query);
        normalize_l2(&mut movie);
        assert!((l2_norm(&query) - 1.0).abs() < 1e-6);
        assert!((dot_product(&query, &movie) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_stays_zero() {
        let mut v = vec![0.0; 4];
        normalize_l2(&mut v);
        assert_eq!(v, vec![0.0; 4]);
        assert_eq!(cosine_similarity(&v, &[1.0, 0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_squared_l2_distance() {
        assert!((squared_l2_distance(&[0.0, 0.0], &[3.0, 4.0]) - 25.0).abs() < 1e-6);
        assert!(squared_l2_distance(&[0.0, 0.0], &[1.0]).is_infinite());
    }
}
