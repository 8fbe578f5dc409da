use log::debug;

// Difficulty schedule constants
pub const DIFFICULTY_FACTOR: usize = 5; // One extra leading zero every 5 blocks
pub const MAX_DIFFICULTY: u32 = 62; // Ceiling used by the reward formula

/// Difficulty as a step function of chain length (never of wall-clock time)
pub struct DifficultySchedule;

impl DifficultySchedule {
    /// Difficulty in force for the next block of a chain holding `chain_length` blocks
    pub fn for_chain_length(chain_length: usize) -> u32 {
        let difficulty = chain_length.div_ceil(DIFFICULTY_FACTOR) as u32;
        debug!("Difficulty for chain length {chain_length}: {difficulty}");
        difficulty
    }

    /// Difficulty that was in force when block `index` was mined.
    /// The chain held exactly `index` blocks at that moment.
    pub fn for_block(index: usize) -> u32 {
        Self::for_chain_length(index)
    }

    /// Required hash prefix for a difficulty
    pub fn target_prefix(difficulty: u32) -> String {
        "0".repeat(difficulty as usize)
    }

    /// Whether a hash carries enough leading zeros for `difficulty`
    pub fn meets_target(hash: &str, difficulty: u32) -> bool {
        hash.starts_with(&Self::target_prefix(difficulty))
    }
}
