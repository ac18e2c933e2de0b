use ludex_core::{Combinator, Document, FieldWeights, IndexBuilder, ScoreMode, SearchIndex};
use serde_json::json;

fn halo_corpus() -> Vec<Document> {
    vec![
        Document::from_value(&json!({"full_name": "Halo"})),
        Document::from_value(&json!({"full_name": "Halo Infinite"})),
        Document::from_value(&json!({"description": "space halo ring"})),
    ]
}

fn halo_index() -> SearchIndex {
    let corpus = halo_corpus();
    IndexBuilder::build(&corpus, &FieldWeights::default()).seal(corpus.len() as u32)
}

#[test]
fn doc_freq_matches_postings() {
    let index = halo_index();
    for entry in index.entries() {
        assert_eq!(entry.doc_freq as usize, entry.postings.len());
    }
}

#[test]
fn idf_formulas() {
    let index = halo_index();
    let n = index.num_docs() as f64;
    let halo = index.entry("halo").expect("halo indexed");
    assert_eq!(halo.doc_freq, 3);
    assert!((halo.idf - (n / 3.0).ln()).abs() < 1e-12);
    assert!((halo.idf_smooth - ((n / 4.0).ln() + 1.0)).abs() < 1e-12);

    let infinite = index.entry("infinit").expect("infinite indexed");
    assert_eq!(infinite.doc_freq, 1);
    // idf_smooth strictly decreases as doc_freq grows
    assert!(infinite.idf_smooth > halo.idf_smooth);
}

#[test]
fn weighted_tf_accumulates_across_fields() {
    let corpus = vec![Document::from_value(&json!({
        "full_name": "Halo",
        "description": "halo halo",
    }))];
    let index = IndexBuilder::build(&corpus, &FieldWeights::default()).seal(1);
    let entry = index.entry("halo").unwrap();
    // full_name weight 3.25 once + description weight 1.0 twice
    assert!((entry.postings[&0] - 5.25).abs() < 1e-12);
}

#[test]
fn fields_outside_the_weight_table_are_ignored() {
    let corpus = vec![Document::from_value(&json!({
        "url": "https://example.com/zelda",
        "full_name": "Zelda",
    }))];
    let index = IndexBuilder::build(&corpus, &FieldWeights::default()).seal(1);
    assert!(index.entry("zelda").is_some());
    assert!(index.entry("example").is_none());
}

#[test]
fn build_is_idempotent() {
    let corpus = halo_corpus();
    let weights = FieldWeights::default();
    let a = IndexBuilder::build(&corpus, &weights).seal(corpus.len() as u32);
    let b = IndexBuilder::build(&corpus, &weights).seal(corpus.len() as u32);
    assert_eq!(a, b);
}

#[test]
fn magnitudes_cover_every_document() {
    let index = halo_index();
    for doc_id in 0..index.num_docs() {
        let m = index.magnitude(doc_id).expect("magnitude present");
        assert!(m > 0.0);
    }
}

#[test]
fn or_weighted_sum_ranks_by_field_weight() {
    let index = halo_index();
    let hits = index
        .search("halo", ScoreMode::WeightedSum, Combinator::Or)
        .unwrap();
    assert_eq!(hits.len(), 3);
    // Name hits outrank the description hit; the 0/1 tie breaks by ordinal.
    assert_eq!(hits[0].doc_id, 0);
    assert_eq!(hits[1].doc_id, 1);
    assert_eq!(hits[2].doc_id, 2);
    assert!(hits[0].score > hits[2].score);
    assert_eq!(hits[0].score, hits[1].score);
}

#[test]
fn and_requires_every_token() {
    let index = halo_index();
    let hits = index
        .search("halo infinite", ScoreMode::WeightedSum, Combinator::And)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].doc_id, 1);
}

#[test]
fn and_with_unknown_token_is_empty() {
    let index = halo_index();
    let hits = index
        .search("halo warthog", ScoreMode::WeightedSum, Combinator::And)
        .unwrap();
    assert!(hits.is_empty());
}

#[test]
fn and_candidates_subset_of_or() {
    let index = halo_index();
    let and_hits = index
        .search("halo ring", ScoreMode::WeightedSum, Combinator::And)
        .unwrap();
    let or_hits = index
        .search("halo ring", ScoreMode::WeightedSum, Combinator::Or)
        .unwrap();
    let or_docs: Vec<u32> = or_hits.iter().map(|h| h.doc_id).collect();
    for hit in &and_hits {
        assert!(or_docs.contains(&hit.doc_id));
    }
    assert!(and_hits.len() <= or_hits.len());
}

#[test]
fn cosine_scores_stay_within_unit_range() {
    let index = halo_index();
    for combinator in [Combinator::And, Combinator::Or] {
        let hits = index
            .search("halo infinite ring", ScoreMode::Cosine, combinator)
            .unwrap();
        for hit in hits {
            assert!(hit.score >= -1e-9 && hit.score <= 1.0 + 1e-9);
        }
    }
}

#[test]
fn cosine_favors_the_closest_vector() {
    let index = halo_index();
    let hits = index
        .search("halo infinite", ScoreMode::Cosine, Combinator::Or)
        .unwrap();
    assert_eq!(hits[0].doc_id, 1);
}

#[test]
fn stopword_only_query_is_empty_in_all_modes() {
    let index = halo_index();
    for mode in [ScoreMode::WeightedSum, ScoreMode::Cosine] {
        for combinator in [Combinator::And, Combinator::Or] {
            let hits = index.search("show me games", mode, combinator).unwrap();
            assert!(hits.is_empty());
        }
    }
}

#[test]
fn unknown_query_is_empty_not_an_error() {
    let index = halo_index();
    let hits = index
        .search("chocobo breeding", ScoreMode::Cosine, Combinator::Or)
        .unwrap();
    assert!(hits.is_empty());
}

#[test]
fn results_are_capped_at_ten() {
    let corpus: Vec<Document> = (0..25)
        .map(|i| Document::from_value(&json!({"full_name": format!("Halo {i}")})))
        .collect();
    let index = IndexBuilder::build(&corpus, &FieldWeights::default()).seal(corpus.len() as u32);
    let hits = index
        .search("halo", ScoreMode::WeightedSum, Combinator::Or)
        .unwrap();
    assert_eq!(hits.len(), 10);
    // Equal scores: deterministic ascending-ordinal order.
    let ids: Vec<u32> = hits.iter().map(|h| h.doc_id).collect();
    assert_eq!(ids, (0..10).collect::<Vec<u32>>());
}
