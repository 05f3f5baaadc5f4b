pub mod test_matrix;
pub mod test_replay_memory;
