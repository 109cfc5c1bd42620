use crate::{Error, Result};

pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> Option<f32> {
	if lhs.is_empty() || lhs.len() != rhs.len() {
		return None;
	}

	let mut dot = 0.0_f32;
	let mut lhs_norm = 0.0_f32;
	let mut rhs_norm = 0.0_f32;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	if lhs_norm <= f32::EPSILON || rhs_norm <= f32::EPSILON {
		return None;
	}

	Some((dot / (lhs_norm.sqrt() * rhs_norm.sqrt())).clamp(-1.0, 1.0))
}

/// Cosine similarity with undefined cases (zero vectors, length mismatch) scored as unrelated.
pub fn similarity_or_zero(lhs: &[f32], rhs: &[f32]) -> f32 {
	cosine_similarity(lhs, rhs).unwrap_or(0.0)
}

pub fn validate_vector(vector: &[f32], expected_dim: usize) -> Result<()> {
	if vector.len() != expected_dim {
		return Err(Error::InvalidArgument {
			message: format!(
				"vector dimension mismatch; expected={expected_dim} actual={}",
				vector.len()
			),
		});
	}
	if vector.iter().any(|value| !value.is_finite()) {
		return Err(Error::InvalidArgument {
			message: "vector contains a non-finite value".to_string(),
		});
	}

	Ok(())
}
