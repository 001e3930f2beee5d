//! Property tests for the append-only transcript

use proptest::prelude::*;
use sshdeck_core::{CommandResult, SessionError, Transcript, TranscriptEntry};

/// Strictly increasing sequence numbers with random gaps
fn arb_increasing_sequences() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(1u64..5, 1..30).prop_map(|gaps| {
        gaps.iter()
            .scan(0u64, |current, gap| {
                *current += gap;
                Some(*current)
            })
            .collect()
    })
}

fn entry(sequence: u64) -> TranscriptEntry {
    TranscriptEntry::command(
        sequence,
        format!("echo {sequence}"),
        CommandResult::exited(sequence.to_string(), "", 0),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Iteration yields entries in append order, every time
    #[test]
    fn iteration_follows_append_order(sequences in arb_increasing_sequences()) {
        let mut transcript = Transcript::new();
        for &sequence in &sequences {
            transcript.append(entry(sequence)).unwrap();
        }

        prop_assert_eq!(transcript.len(), sequences.len());
        for _ in 0..2 {
            let seen: Vec<u64> = transcript.iter().map(TranscriptEntry::sequence).collect();
            prop_assert_eq!(&seen, &sequences);
        }
        prop_assert_eq!(transcript.last().map(TranscriptEntry::sequence), sequences.last().copied());
    }

    /// A sequence number at or below the last one is refused without side effects
    #[test]
    fn stale_sequence_is_rejected(
        sequences in arb_increasing_sequences(),
        offset in 0u64..10,
    ) {
        let mut transcript = Transcript::new();
        for &sequence in &sequences {
            transcript.append(entry(sequence)).unwrap();
        }
        let last = *sequences.last().unwrap();
        let stale = last.saturating_sub(offset);

        let result = transcript.append(entry(stale));
        prop_assert_eq!(result.unwrap_err(), SessionError::OutOfOrder { last, got: stale });
        prop_assert_eq!(transcript.len(), sequences.len());
    }

    /// Snapshots are unaffected by later appends and by clearing
    #[test]
    fn snapshots_are_frozen(
        sequences in arb_increasing_sequences(),
        extra in 1u64..5,
    ) {
        let mut transcript = Transcript::new();
        for &sequence in &sequences {
            transcript.append(entry(sequence)).unwrap();
        }
        let snapshot = transcript.snapshot();

        let next = sequences.last().unwrap() + extra;
        transcript.append(entry(next)).unwrap();
        transcript.clear();

        prop_assert!(transcript.is_empty());
        prop_assert_eq!(snapshot.len(), sequences.len());
        let frozen: Vec<u64> = snapshot.iter().map(|entry| entry.sequence()).collect();
        prop_assert_eq!(frozen, sequences);
    }
}
