mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::*;
use serde_json::json;
use twin_rag::{
    Answer, ContextAssembler, DEFAULT_PERSONA, ERROR_MARKER, Generator, NOT_FOUND_TEXT, RagPipeline,
    Retriever,
};
use vector_store::ingest::chunks_from_profile;
use vector_store::{
    Embedder, FailureKind, Hit, IngestOptions, Ingestor, QueryResponse, ScoredRecord,
    VectorStoreGateway,
};

fn embedder(width: usize) -> (Arc<FakeModel>, Arc<Embedder>) {
    let model = FakeModel::new(width);
    let embedder = Arc::new(Embedder::with_model(model.clone(), D));
    (model, embedder)
}

#[tokio::test]
async fn embeddings_always_have_target_width() {
    for width in [384, 768, 2048] {
        let (model, embedder) = embedder(width);
        let v = embedder.embed("Where did you study?").await.unwrap();
        assert_eq!(v.len(), D, "native width {width}");

        let native = model.vector("Where did you study?");
        let kept = width.min(D);
        assert_eq!(&v[..kept], &native[..kept]);
        assert!(v[kept..].iter().all(|x| *x == 0.0));
    }
}

#[tokio::test]
async fn embeddings_are_deterministic() {
    let (_, embedder) = embedder(384);
    let a = embedder.embed("What are your skills?").await.unwrap();
    let b = embedder.embed("What are your skills?").await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn every_response_shape_yields_the_same_hits() {
    let rows = vec![
        json!({"id": "a", "score": 0.75, "metadata": {"title": "Skills", "content": "Python, Go"}}),
        json!({"id": "b", "score": 0.5, "metadata": {"text": "BSc"}}),
    ];
    let typed: Vec<ScoredRecord> = rows
        .iter()
        .map(|r| ScoredRecord {
            id: r["id"].as_str().map(str::to_string),
            score: r["score"].as_f64().map(|s| s as f32),
            metadata: r["metadata"].as_object().cloned(),
        })
        .collect();

    let shapes = [
        QueryResponse::from_json(json!({"results": rows})).unwrap(),
        QueryResponse::from_json(json!({"matches": rows})).unwrap(),
        QueryResponse::from_json(json!(rows)).unwrap(),
        QueryResponse::Typed(typed),
    ];

    let mut normalized = Vec::new();
    for shape in shapes {
        let gateway = VectorStoreGateway::new(Arc::new(FixedIndex(shape)), D);
        normalized.push(gateway.query(&vec![0.0; D], 2).await);
    }

    assert_eq!(normalized[0].len(), 2);
    assert_eq!(normalized[0][0].text, "Python, Go");
    assert_eq!(normalized[0][1].text, "BSc");
    for other in &normalized[1..] {
        assert_eq!(other, &normalized[0]);
    }
}

#[test]
fn assembly_drops_blank_text_and_keeps_order() {
    let hit = |title: &str, text: &str| {
        let mut h = Hit::new(
            Some(1.0),
            json!({"title": title}).as_object().cloned().unwrap_or_default(),
        );
        h.text = text.to_string();
        h
    };
    let hits = [hit("A", ""), hit("B", "x"), hit("", "y")];
    let block = ContextAssembler::new(6000).assemble(&hits);
    assert_eq!(block.lines(), ["B: x".to_string(), "y".to_string()]);
}

#[tokio::test]
async fn empty_question_never_reaches_retrieval() {
    let (model, embedder) = embedder(384);
    let index = Arc::new(MemIndex::default());
    let backend = Arc::new(EchoBackend::default());
    let pipeline = pipeline(
        embedder,
        Arc::new(VectorStoreGateway::new(index.clone(), D)),
        backend.clone(),
    );

    for q in ["", "   \n"] {
        let answer = pipeline.answer(q).await;
        assert!(matches!(answer, Answer::MissingQuestion));
    }
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    assert_eq!(index.queries.load(Ordering::SeqCst), 0);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn zero_hits_skip_generation() {
    let (_, embedder) = embedder(384);
    let index = Arc::new(MemIndex::default());
    let backend = Arc::new(EchoBackend::default());
    let pipeline = pipeline(
        embedder,
        Arc::new(VectorStoreGateway::new(index.clone(), D)),
        backend.clone(),
    );

    let answer = pipeline.answer("What are your skills?").await;
    assert!(matches!(answer, Answer::NotFound));
    assert_eq!(answer.text(), NOT_FOUND_TEXT);
    assert_eq!(index.queries.load(Ordering::SeqCst), 1);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn hits_without_text_skip_generation() {
    let (_, embedder) = embedder(384);
    let response = QueryResponse::from_json(json!([{"score": 0.9, "metadata": {"category": "x"}}]))
        .unwrap();
    let backend = Arc::new(EchoBackend::default());
    let pipeline = pipeline(
        embedder,
        Arc::new(VectorStoreGateway::new(Arc::new(FixedIndex(response)), D)),
        backend.clone(),
    );

    assert!(matches!(pipeline.answer("anything").await, Answer::NotFound));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ingested_chunk_reaches_the_prompt() {
    let (_, embedder) = embedder(384);
    let gateway = Arc::new(VectorStoreGateway::new(Arc::new(MemIndex::default()), D));
    let chunks = chunks_from_profile(&json!({
        "content_chunks": [{"id": "c1", "title": "Skills", "content": "Python, Go"}]
    }));

    let written = Ingestor::new(embedder.clone(), gateway.clone())
        .ingest(&chunks, &IngestOptions::default())
        .await
        .unwrap();
    assert_eq!(written, 1);

    let backend = Arc::new(EchoBackend::default());
    let pipeline = pipeline(embedder, gateway, backend.clone());
    let qa = pipeline
        .answer_with_context("What are your skills?", 3)
        .await;

    let prompt = qa.answer.text();
    assert!(qa.answer.is_generated());
    assert!(prompt.contains("Skills: Python, Go"), "{prompt}");
    assert!(prompt.contains("What are your skills?"), "{prompt}");
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

    assert_eq!(qa.context.len(), 1);
    assert_eq!(qa.context[0].title, "Skills");
    assert_eq!(qa.context[0].text, "Python, Go");
}

#[tokio::test]
async fn generation_failure_is_a_marked_answer() {
    let (_, embedder) = embedder(768);
    let gateway = Arc::new(VectorStoreGateway::new(Arc::new(MemIndex::default()), D));
    let chunks = chunks_from_profile(&json!({
        "content_chunks": [{"id": "c1", "title": "Education", "content": "BSc Computer Science"}]
    }));
    Ingestor::new(embedder.clone(), gateway.clone())
        .ingest(&chunks, &IngestOptions::default())
        .await
        .unwrap();

    let answer = pipeline(embedder, gateway, Arc::new(FailingBackend))
        .answer("Where did you study?")
        .await;

    assert!(answer.is_failure());
    let text = answer.to_string();
    assert!(text.contains(ERROR_MARKER), "{text}");
    assert!(text.contains("rate limit exceeded"), "{text}");
}

#[tokio::test]
async fn failed_model_load_degrades_and_stays_failed() {
    let loader = Arc::new(BrokenLoader::default());
    let embedder = Arc::new(Embedder::new(loader.clone(), D));
    let sink = Arc::new(RecordingSink::default());
    let index = Arc::new(MemIndex::default());
    let gateway = Arc::new(VectorStoreGateway::with_sink(index.clone(), sink.clone(), D));
    let backend = Arc::new(EchoBackend::default());
    let pipeline = pipeline(embedder.clone(), gateway, backend.clone());

    for _ in 0..2 {
        assert!(matches!(pipeline.answer("What are your skills?").await, Answer::NotFound));
    }

    assert_eq!(loader.attempts.load(Ordering::SeqCst), 1);
    assert!(embedder.is_failed().await);
    assert_eq!(index.queries.load(Ordering::SeqCst), 0);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        *sink.kinds.lock().unwrap(),
        vec![FailureKind::Embedding, FailureKind::Embedding]
    );

    embedder.reset().await;
    assert!(!embedder.is_failed().await);
    assert!(embedder.embed("again").await.is_err());
    assert_eq!(loader.attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn reported_context_matches_the_prompt_budget() {
    let (_, embedder) = embedder(384);
    let response = QueryResponse::from_json(json!({"matches": [
        {"score": 0.9, "metadata": {"text": "aaaa"}},
        {"score": 0.8, "metadata": {"text": "bbbb"}}
    ]}))
    .unwrap();
    let gateway = Arc::new(VectorStoreGateway::new(Arc::new(FixedIndex(response)), D));
    let pipeline = RagPipeline::new(
        Retriever::new(embedder, gateway),
        ContextAssembler::new(9),
        Generator::new(Arc::new(EchoBackend::default()), params()),
        DEFAULT_PERSONA,
        3,
    );

    let qa = pipeline.answer_with_context("What do you know?", 3).await;
    let prompt = qa.answer.text();
    assert!(prompt.contains("aaaa"), "{prompt}");
    assert!(!prompt.contains("bbbb"), "{prompt}");

    let texts: Vec<&str> = qa.context.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["aaaa"]);
}
