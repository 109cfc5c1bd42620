use weft_domain::similarity_or_zero;

/// `λ·sim − (1−λ)·redundancy`.
pub fn mmr_score(lambda_mult: f32, similarity: f32, redundancy: f32) -> f32 {
	lambda_mult * similarity - (1.0 - lambda_mult) * redundancy
}

/// Highest cosine similarity between `embedding` and any selected embedding; 0 with nothing
/// selected.
pub fn max_redundancy(embedding: &[f32], selected: &[Vec<f32>]) -> f32 {
	selected
		.iter()
		.map(|other| similarity_or_zero(embedding, other))
		.reduce(f32::max)
		.unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy)]
pub struct Pick {
	pub mmr_score: f32,
	pub seq: usize,
}
impl Pick {
	/// Higher score wins; equal scores go to the earlier inserted candidate.
	pub fn better_than(self, other: &Self) -> bool {
		self.mmr_score > other.mmr_score
			|| (self.mmr_score == other.mmr_score && self.seq < other.seq)
	}
}
