mod helpers;

use helpers::{test_conn, test_project, write_file, MockEmbedder};
use memory_forge::knowledge::search::{search_knowledge, SearchOptions};
use memory_forge::knowledge::store;
use memory_forge::knowledge::types::{ChunkType, SourceType};

#[test]
fn distinctive_phrase_roundtrips_with_high_score() {
    let project = test_project();
    let root = project.path();
    let mut conn = test_conn();
    let embedder = MockEmbedder::default();

    write_file(
        root,
        "knowledge/zebra.md",
        "The zebra migration toggles quantum flags.\n",
    );
    write_file(
        root,
        "knowledge/other.md",
        "Unrelated notes about release calendars.\n",
    );

    let hits = search_knowledge(
        &mut conn,
        &embedder,
        root,
        "zebra migration toggles quantum flags",
        &SearchOptions::default(),
    )
    .unwrap();

    assert!(!hits.is_empty());
    assert_eq!(hits[0].file_path, "knowledge/zebra.md");
    assert!(hits[0].score > 0.5, "score too low: {}", hits[0].score);
    assert!(hits[0]
        .content
        .as_deref()
        .unwrap()
        .contains("zebra migration"));
}

#[test]
fn empty_corpus_returns_empty_not_error() {
    let project = test_project();
    let root = project.path();
    let mut conn = test_conn();
    let embedder = MockEmbedder::default();

    let hits = search_knowledge(
        &mut conn,
        &embedder,
        root,
        "anything at all",
        &SearchOptions::default(),
    )
    .unwrap();
    assert!(hits.is_empty());
}

#[test]
fn threshold_filters_unrelated_content() {
    let project = test_project();
    let root = project.path();
    let mut conn = test_conn();
    let embedder = MockEmbedder::default();

    write_file(root, "knowledge/a.md", "Completely separate vocabulary here.\n");

    let hits = search_knowledge(
        &mut conn,
        &embedder,
        root,
        "unrelated query words entirely",
        &SearchOptions::default(),
    )
    .unwrap();
    assert!(hits.is_empty());
}

#[test]
fn search_is_automatically_fresh() {
    let project = test_project();
    let root = project.path();
    let mut conn = test_conn();
    let embedder = MockEmbedder::default();

    write_file(root, "knowledge/live.md", "The old phrase about walruses.\n");

    let hits = search_knowledge(
        &mut conn,
        &embedder,
        root,
        "old phrase about walruses",
        &SearchOptions::default(),
    )
    .unwrap();
    assert_eq!(hits.len(), 1);

    // Overwrite with unrelated text, then search again without any
    // explicit sync — the freshness check runs inside the search.
    write_file(root, "knowledge/live.md", "Fresh material covering penguins.\n");

    let new_hits = search_knowledge(
        &mut conn,
        &embedder,
        root,
        "fresh material covering penguins",
        &SearchOptions::default(),
    )
    .unwrap();
    assert_eq!(new_hits.len(), 1);
    assert_eq!(new_hits[0].file_path, "knowledge/live.md");

    let stale_hits = search_knowledge(
        &mut conn,
        &embedder,
        root,
        "old phrase about walruses",
        &SearchOptions::default(),
    )
    .unwrap();
    assert!(stale_hits.is_empty(), "stale content must not be returned");
}

#[test]
fn unique_files_folds_to_one_hit_per_file() {
    let project = test_project();
    let root = project.path();
    let mut conn = test_conn();
    let embedder = MockEmbedder::default();

    // Three sections sharing vocabulary in one file, plus a second file
    write_file(
        root,
        "knowledge/multi.md",
        "## A\n\ngalaxy cluster observations\n\n## B\n\ngalaxy cluster measurements\n\n## C\n\ngalaxy cluster surveys\n",
    );
    write_file(root, "knowledge/single.md", "galaxy cluster catalog\n");

    let opts = SearchOptions {
        unique_files: true,
        limit: 5,
        threshold: 0.1,
        ..SearchOptions::default()
    };
    let hits = search_knowledge(&mut conn, &embedder, root, "galaxy cluster", &opts).unwrap();

    let mut files: Vec<&str> = hits.iter().map(|h| h.file_path.as_str()).collect();
    files.sort();
    files.dedup();
    assert_eq!(files.len(), hits.len(), "each file at most once");
    assert!(hits.len() >= 2);
}

#[test]
fn search_touches_access_accounting() {
    let project = test_project();
    let root = project.path();
    let mut conn = test_conn();
    let embedder = MockEmbedder::default();

    write_file(root, "knowledge/hit.md", "Special marker phrase lives here.\n");
    write_file(root, "knowledge/miss.md", "Different content altogether.\n");

    search_knowledge(
        &mut conn,
        &embedder,
        root,
        "special marker phrase",
        &SearchOptions::default(),
    )
    .unwrap();

    let hit = store::get_file(&conn, "knowledge/hit.md").unwrap().unwrap();
    assert_eq!(hit.access_count, 1);
    assert!(hit.last_accessed.is_some());

    let miss = store::get_file(&conn, "knowledge/miss.md").unwrap().unwrap();
    assert_eq!(miss.access_count, 0);
    assert!(miss.last_accessed.is_none());
}

#[test]
fn include_content_false_returns_provenance_only() {
    let project = test_project();
    let root = project.path();
    let mut conn = test_conn();
    let embedder = MockEmbedder::default();

    write_file(root, "knowledge/a.md", "Searchable content body.\n");

    let opts = SearchOptions {
        include_content: false,
        ..SearchOptions::default()
    };
    let hits =
        search_knowledge(&mut conn, &embedder, root, "searchable content body", &opts).unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].content.is_none());
    assert_eq!(hits[0].file_path, "knowledge/a.md");
}

#[test]
fn source_type_filter_restricts_results() {
    let project = test_project();
    let root = project.path();
    let mut conn = test_conn();
    let embedder = MockEmbedder::default();

    write_file(
        root,
        "knowledge/skills/deploy.md",
        "---\nname: deploy\ndescription: shipping procedure checklist\n---\n\n## Solution\n\nshipping procedure checklist steps\n",
    );
    write_file(root, "knowledge/notes.md", "shipping procedure checklist notes\n");

    let skills_only = SearchOptions {
        source_types: Some(vec![SourceType::Skill]),
        threshold: 0.1,
        ..SearchOptions::default()
    };
    let hits = search_knowledge(
        &mut conn,
        &embedder,
        root,
        "shipping procedure checklist",
        &skills_only,
    )
    .unwrap();

    assert!(!hits.is_empty());
    assert!(hits.iter().all(|h| h.source_type == SourceType::Skill));

    // Legacy source types match nothing on a current index
    let legacy = SearchOptions {
        source_types: Some(vec![SourceType::ClaudeMd]),
        threshold: 0.1,
        ..SearchOptions::default()
    };
    let none = search_knowledge(
        &mut conn,
        &embedder,
        root,
        "shipping procedure checklist",
        &legacy,
    )
    .unwrap();
    assert!(none.is_empty());
}

#[test]
fn priority_boost_breaks_similarity_ties() {
    let project = test_project();
    let root = project.path();
    let mut conn = test_conn();
    let embedder = MockEmbedder::default();

    // Identical text as a skill trigger (priority 9) and as context
    // (priority 6) — the boost must rank the trigger first.
    write_file(
        root,
        "knowledge/skills/rotate.md",
        "---\nname: rotate\ndescription: credential rotation\n---\n\n## Trigger\n\nrotate expired signing keys\n",
    );
    write_file(root, "knowledge/keys.md", "## Keys\n\nrotate expired signing keys\n");

    let opts = SearchOptions {
        threshold: 0.1,
        ..SearchOptions::default()
    };
    let hits = search_knowledge(
        &mut conn,
        &embedder,
        root,
        "rotate expired signing keys",
        &opts,
    )
    .unwrap();

    let trigger_pos = hits
        .iter()
        .position(|h| h.chunk_type == ChunkType::Trigger)
        .expect("trigger chunk in results");
    let section_pos = hits
        .iter()
        .position(|h| h.chunk_type == ChunkType::Section && h.file_path == "knowledge/keys.md")
        .expect("section chunk in results");
    assert!(trigger_pos < section_pos);
}

#[test]
fn limit_caps_result_count() {
    let project = test_project();
    let root = project.path();
    let mut conn = test_conn();
    let embedder = MockEmbedder::default();

    for i in 0..8 {
        write_file(
            root,
            &format!("knowledge/doc{i}.md"),
            "shared repeated vocabulary everywhere\n",
        );
    }

    let opts = SearchOptions {
        limit: 3,
        threshold: 0.1,
        ..SearchOptions::default()
    };
    let hits = search_knowledge(
        &mut conn,
        &embedder,
        root,
        "shared repeated vocabulary",
        &opts,
    )
    .unwrap();
    assert_eq!(hits.len(), 3);
}
