/// Words per transcript chunk.
pub const MAX_WORDS_PER_CHUNK: usize = 400;

/// Hard ceiling on chunks pulled back per retrieval query.
pub const MAX_CHUNKS_TO_RETRIEVE: usize = 30;

/// Fraction of a video's chunks worth retrieving per query.
const RETRIEVAL_RATIO: f64 = 0.3;

/// Split a transcript into chunks of at most `max_words` whitespace-separated
/// words. The final chunk carries the remainder. Chunk boundaries ignore
/// sentence structure; retrieval granularity matters more than prose flow.
pub fn chunk_transcript(transcript: &str, max_words: usize) -> Vec<String> {
    if max_words == 0 {
        return Vec::new();
    }

    let words: Vec<&str> = transcript.split_whitespace().collect();
    words
        .chunks(max_words)
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// How many chunks to retrieve for a transcript of `word_count` words:
/// 30% of the estimated chunk count, rounded up, clamped to 1..=30.
pub fn num_chunks_to_retrieve(word_count: usize) -> usize {
    let estimated_chunks = word_count.div_ceil(MAX_WORDS_PER_CHUNK);
    let target = (estimated_chunks as f64 * RETRIEVAL_RATIO).ceil() as usize;
    target.clamp(1, MAX_CHUNKS_TO_RETRIEVE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_transcript_splits_on_word_boundaries() {
        let chunks = chunk_transcript("a b c d e", 2);
        assert_eq!(chunks, vec!["a b", "c d", "e"]);
    }

    #[test]
    fn test_chunk_transcript_collapses_whitespace() {
        let chunks = chunk_transcript("  one\n two\tthree   four ", 3);
        assert_eq!(chunks, vec!["one two three", "four"]);
    }

    #[test]
    fn test_chunk_transcript_short_input_is_single_chunk() {
        let chunks = chunk_transcript("just a few words", MAX_WORDS_PER_CHUNK);
        assert_eq!(chunks, vec!["just a few words"]);
    }

    #[test]
    fn test_chunk_transcript_empty_input() {
        assert!(chunk_transcript("", MAX_WORDS_PER_CHUNK).is_empty());
        assert!(chunk_transcript("   \n\t ", MAX_WORDS_PER_CHUNK).is_empty());
    }

    #[test]
    fn test_chunk_transcript_zero_max_words() {
        assert!(chunk_transcript("some words", 0).is_empty());
    }

    #[test]
    fn test_chunk_transcript_exact_multiple() {
        let transcript = (0..800).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let chunks = chunk_transcript(&transcript, MAX_WORDS_PER_CHUNK);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].split_whitespace().count(), 400);
        assert_eq!(chunks[1].split_whitespace().count(), 400);
    }

    #[test]
    fn test_num_chunks_floor_is_one() {
        assert_eq!(num_chunks_to_retrieve(0), 1);
        assert_eq!(num_chunks_to_retrieve(50), 1);
        assert_eq!(num_chunks_to_retrieve(400), 1);
    }

    #[test]
    fn test_num_chunks_scales_with_word_count() {
        // 4000 words -> 10 chunks -> ceil(10 * 0.3) = 3
        assert_eq!(num_chunks_to_retrieve(4000), 3);
        // 4001 words -> 11 chunks -> ceil(3.3) = 4
        assert_eq!(num_chunks_to_retrieve(4001), 4);
    }

    #[test]
    fn test_num_chunks_capped_at_max() {
        // 100 chunks -> 30 without the cap mattering, but push well past it
        assert_eq!(num_chunks_to_retrieve(400 * 200), MAX_CHUNKS_TO_RETRIEVE);
    }
}
