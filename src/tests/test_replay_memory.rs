use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::replay_buffer::ReplayMemory;

fn push_numbered(memory: &mut ReplayMemory, n: usize) {
    for i in 0..n {
        let v = i as f64;
        memory.push(&[v, v + 0.5], &[-v], v * 10.0, &[v + 1.0, v + 1.5], i % 2 == 1);
    }
}

#[test]
fn test_wraparound_keeps_most_recent() {
    let mut memory = ReplayMemory::new(3, 2, 1);
    push_numbered(&mut memory, 5);

    assert_eq!(memory.len(), 3);
    assert_eq!(memory.write_index(), 2);

    let rewards: Vec<f64> = memory.iter_chronological().map(|t| t.reward).collect();
    assert_eq!(rewards, vec![20.0, 30.0, 40.0]);
}

#[test]
fn test_partial_fill_is_in_insertion_order() {
    let mut memory = ReplayMemory::new(5, 2, 1);
    push_numbered(&mut memory, 2);

    assert_eq!(memory.len(), 2);
    assert!(!memory.is_empty());
    let rewards: Vec<f64> = memory.iter_chronological().map(|t| t.reward).collect();
    assert_eq!(rewards, vec![0.0, 10.0]);
}

#[test]
fn test_transition_view() {
    let mut memory = ReplayMemory::new(4, 2, 1);
    push_numbered(&mut memory, 2);

    let t = memory.transition(1);
    assert_eq!(t.state.to_vec(), vec![1.0, 1.5]);
    assert_eq!(t.action.to_vec(), vec![-1.0]);
    assert_eq!(t.reward, 10.0);
    assert_eq!(t.next_state.to_vec(), vec![2.0, 2.5]);
    assert!(t.terminal);
    assert!(!memory.terminal(0));
}

#[test]
fn test_offsets() {
    let memory = ReplayMemory::new(1, 3, 2);
    assert_eq!(memory.action_offset(), 3);
    assert_eq!(memory.reward_offset(), 5);
    assert_eq!(memory.next_state_offset(), 6);
    assert_eq!(memory.terminal_offset(), 9);
    assert_eq!(memory.matrix().columns(), 10);
}

#[test]
fn test_clear() {
    let mut memory = ReplayMemory::new(3, 2, 1);
    push_numbered(&mut memory, 4);
    memory.clear();

    assert!(memory.is_empty());
    assert_eq!(memory.write_index(), 0);
    assert_eq!(memory.iter_chronological().count(), 0);
    assert_eq!(memory.capacity(), 3);
}

#[test]
fn test_sampling_reaches_every_row() {
    let mut memory = ReplayMemory::new(4, 2, 1);
    push_numbered(&mut memory, 4);

    let mut rng = StdRng::seed_from_u64(3);
    let mut indices = vec![0; 256];
    memory.sample_indices(&mut rng, &mut indices);
    for row in 0..4 {
        assert!(indices.contains(&row));
    }
}
