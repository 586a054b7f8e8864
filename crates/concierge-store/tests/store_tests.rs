use chrono::{DateTime, Duration, Utc};
use tempfile::TempDir;

use concierge_core::traits::{AnalyticsSink, ChatLogStore, FaqStore, HotelStore, VectorStore};
use concierge_core::types::{AnalyticsEvent, ChatLogRecord, FaqEntry, HotelProfile, ReportRange};
use concierge_store::seed::SeedFile;
use concierge_store::{DocumentWriter, MemoryStore, NewDocument, SqliteStore};

fn hotel(slug: &str) -> HotelProfile {
    HotelProfile { name: format!("Hotel {slug}"), slug: slug.into(), phone: Some("+1 555 0100".into()), is_active: true, ..Default::default() }
}

fn faq(hotel_id: i64, question: &str, order_index: i32) -> FaqEntry {
    FaqEntry { hotel_id, question: question.into(), answer: format!("answer to {question}"), order_index, is_active: true, ..Default::default() }
}

fn record(hotel_id: i64, session: &str, question: &str, offset_secs: i64) -> ChatLogRecord {
    ChatLogRecord {
        hotel_id,
        session_id: session.into(),
        question: question.into(),
        answer: "ok".into(),
        confidence: 0.9,
        was_ai_response: true,
        escalated: false,
        language: "en".into(),
        created_at: Utc::now() + Duration::seconds(offset_secs),
    }
}

#[tokio::test]
async fn sqlite_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("concierge.db");

    let id = {
        let store = SqliteStore::open(&db_path).unwrap();
        store.insert_hotel(&hotel("harbor")).await.unwrap()
    };

    let reopened = SqliteStore::open(&db_path).unwrap();
    let loaded = reopened.active_hotel(id).await.unwrap().expect("hotel persisted");
    assert_eq!(loaded.slug, "harbor");
    assert_eq!(loaded.phone(), Some("+1 555 0100"));
}

#[tokio::test]
async fn inactive_hotels_are_invisible() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = store.insert_hotel(&HotelProfile { is_active: false, ..hotel("closed") }).await.unwrap();
    assert!(store.active_hotel(id).await.unwrap().is_none());
    assert!(store.active_hotel(id + 100).await.unwrap().is_none());
}

#[tokio::test]
async fn faqs_come_back_in_display_order_and_respect_limit() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = store.insert_hotel(&hotel("ordered")).await.unwrap();
    store.insert_faq(&faq(id, "third", 3)).await.unwrap();
    store.insert_faq(&faq(id, "first", 1)).await.unwrap();
    store.insert_faq(&FaqEntry { is_active: false, ..faq(id, "hidden", 0) }).await.unwrap();
    store.insert_faq(&faq(id, "second", 2)).await.unwrap();

    let all = store.active_faqs(id, None).await.unwrap();
    let questions: Vec<_> = all.iter().map(|f| f.question.as_str()).collect();
    assert_eq!(questions, vec!["first", "second", "third"]);

    let capped = store.active_faqs(id, Some(2)).await.unwrap();
    assert_eq!(capped.len(), 2);
}

#[tokio::test]
async fn hotel_chunks_are_capped_by_document_count() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = store.insert_hotel(&hotel("docs")).await.unwrap();
    for n in 0..3 {
        store
            .insert_document(NewDocument {
                hotel_id: id,
                name: format!("doc{n}.txt"),
                content_hash: format!("hash{n}"),
                embedder_id: "hashing:xxh64:d2".into(),
                chunks: vec![(format!("doc {n} a"), vec![1.0, 0.0]), (format!("doc {n} b"), vec![0.0, 1.0])],
            })
            .await
            .unwrap();
    }

    let chunks = store.hotel_chunks(id, "hashing:xxh64:d2", 2).await.unwrap();
    assert_eq!(chunks.len(), 4);
    assert_eq!(chunks[0].content, "doc 0 a");
    assert_eq!(chunks[1].embedding, vec![0.0, 1.0]);
    assert_eq!(store.count_rows("documents").await.unwrap(), 3);

    let found = store.find_document(id, "hash1", "hashing:xxh64:d2").await.unwrap();
    assert!(found.is_some());
    assert!(store.find_document(id, "hash1", "openai:other").await.unwrap().is_none());
}

#[tokio::test]
async fn hotel_chunks_skip_documents_from_other_embedders() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = store.insert_hotel(&hotel("mixed")).await.unwrap();
    for (n, embedder_id) in ["hashing:xxh64:d2", "hashing:xxh64:d2", "hashing:xxh64:d2", "hashing:xxh64:d3"].iter().enumerate() {
        store
            .insert_document(NewDocument {
                hotel_id: id,
                name: format!("doc{n}.txt"),
                content_hash: format!("hash{n}"),
                embedder_id: (*embedder_id).into(),
                chunks: vec![(format!("doc {n}"), vec![1.0; if n == 3 { 3 } else { 2 }])],
            })
            .await
            .unwrap();
    }

    // the older documents do not crowd the newer embedder out of the cap
    let current = store.hotel_chunks(id, "hashing:xxh64:d3", 2).await.unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].content, "doc 3");
    assert_eq!(current[0].embedding.len(), 3);

    let previous = store.hotel_chunks(id, "hashing:xxh64:d2", 10).await.unwrap();
    assert_eq!(previous.len(), 3);
    assert!(previous.iter().all(|c| c.embedding.len() == 2));

    assert!(store.hotel_chunks(id, "openai:text-embedding-3-small", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn chat_history_is_scoped_to_session_and_ordered() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.append(&record(1, "s1", "second", 10)).await.unwrap();
    store.append(&record(1, "s1", "first", 0)).await.unwrap();
    store.append(&record(1, "s2", "other session", 5)).await.unwrap();
    store.append(&record(2, "s1", "other hotel", 5)).await.unwrap();

    let history = store.history(1, "s1", 50).await.unwrap();
    let questions: Vec<_> = history.iter().map(|e| e.question.as_str()).collect();
    assert_eq!(questions, vec!["first", "second"]);
    assert!((history[0].confidence - 0.9).abs() < 1e-6);
}

fn logged(hotel_id: i64, question: &str, at: &str, was_ai_response: bool, escalated: bool, confidence: f32) -> ChatLogRecord {
    ChatLogRecord {
        was_ai_response,
        escalated,
        confidence,
        created_at: at.parse::<DateTime<Utc>>().unwrap(),
        ..record(hotel_id, "dash", question, 0)
    }
}

#[tokio::test]
async fn chat_summary_aggregates_the_hotel_log() {
    let store = SqliteStore::open_in_memory().unwrap();
    for hour in 9..12 {
        store.append(&logged(1, "Pool hours?", &format!("2026-03-01T{hour:02}:00:00Z"), true, false, 0.9)).await.unwrap();
    }
    store.append(&logged(1, "Late checkout?", "2026-03-02T10:00:00Z", false, true, 0.6)).await.unwrap();
    store.append(&logged(1, "Late checkout?", "2026-03-02T11:30:00.250Z", true, true, 0.5)).await.unwrap();
    store.append(&logged(1, "Parking?", "2026-02-27T18:00:00Z", true, false, 0.7)).await.unwrap();
    store.append(&logged(2, "Other hotel", "2026-03-01T09:00:00Z", true, false, 0.9)).await.unwrap();

    let summary = store.chat_summary(1, None).await.unwrap();
    assert_eq!(summary.total_chat_messages, 6);
    assert!((summary.ai_resolution_rate - 400.0 / 6.0).abs() < 1e-9);
    assert!((summary.escalation_rate - 200.0 / 6.0).abs() < 1e-9);
    assert!((summary.average_confidence - 0.78).abs() < 1e-6, "only model answers count: {}", summary.average_confidence);
    assert!((summary.estimated_hours_saved - 0.4).abs() < 1e-9);

    let top: Vec<_> = summary.top_questions.iter().map(|q| (q.question.as_str(), q.count)).collect();
    assert_eq!(top, vec![("Pool hours?", 3), ("Late checkout?", 2), ("Parking?", 1)]);
    let daily: Vec<_> = summary.daily_activity.iter().map(|d| (d.date.as_str(), d.count)).collect();
    assert_eq!(daily, vec![("2026-03-02", 2), ("2026-03-01", 3), ("2026-02-27", 1)]);

    let march = ReportRange::parse("2026-03-01", "2026-03-02").unwrap();
    let summary = store.chat_summary(1, Some(march)).await.unwrap();
    assert_eq!(summary.total_chat_messages, 5);
    assert!(summary.top_questions.iter().all(|q| q.question != "Parking?"));
    assert!((summary.estimated_hours_saved - 0.3).abs() < 1e-9);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["totalChatMessages"], 5);
    assert!(json.get("dailyActivity").is_some());
}

#[tokio::test]
async fn chat_summary_of_a_quiet_hotel_is_all_zero() {
    let store = SqliteStore::open_in_memory().unwrap();
    let summary = store.chat_summary(9, None).await.unwrap();
    assert_eq!(summary.total_chat_messages, 0);
    assert!(summary.ai_resolution_rate.abs() < f64::EPSILON);
    assert!(summary.average_confidence.abs() < f64::EPSILON);
    assert!(summary.top_questions.is_empty());
    assert!(summary.daily_activity.is_empty());
}

#[tokio::test]
async fn analytics_events_are_stored() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.record(AnalyticsEvent::chat_message(&record(1, "s1", "hi", 0))).await;
    assert_eq!(store.count_rows("analytics_events").await.unwrap(), 1);
}

#[tokio::test]
async fn seeding_skips_existing_slugs() {
    let store = SqliteStore::open_in_memory().unwrap();
    let seed = SeedFile::from_json(
        r#"{"hotels": [{"name": "Harbor Inn", "slug": "harbor", "phone": "555",
             "faqs": [{"question": "Pool?", "answer": "Yes"}, {"question": "Gym?", "answer": "No"}]}]}"#,
    )
    .unwrap();

    let first = seed.apply(&store).await.unwrap();
    assert_eq!(first.hotels_created, 1);
    assert_eq!(first.faqs_created, 2);

    let second = seed.apply(&store).await.unwrap();
    assert_eq!(second.hotels_skipped, 1);
    assert_eq!(store.count_rows("faqs").await.unwrap(), 2);

    let id = store.hotel_id_by_slug("harbor").await.unwrap().unwrap();
    let faqs = store.active_faqs(id, None).await.unwrap();
    assert_eq!(faqs[0].question, "Pool?");
    assert_eq!(faqs[1].question, "Gym?");
}

#[test]
fn malformed_seed_is_rejected() {
    assert!(SeedFile::from_json(r#"{"hotels": [{"slug": "no-name"}]}"#).is_err());
}

#[tokio::test]
async fn memory_store_failure_switches() {
    let store = MemoryStore::new();
    let id = store.add_hotel(hotel("mem"));
    store.add_faq(faq(id, "q", 0));
    store.add_chunks(id, "hashing:xxh64:d1", vec![("text".into(), vec![1.0])]);
    assert_eq!(store.hotel_chunks(id, "hashing:xxh64:d1", 10).await.unwrap().len(), 1);
    assert!(store.hotel_chunks(id, "hashing:xxh64:d2", 10).await.unwrap().is_empty());

    assert_eq!(store.active_faqs(id, None).await.unwrap().len(), 1);
    store.set_fail_faqs(true);
    assert!(store.active_faqs(id, None).await.is_err());

    store.set_fail_vectors(true);
    assert!(store.hotel_chunks(id, "hashing:xxh64:d1", 10).await.is_err());

    store.set_fail_chat_log(true);
    assert!(store.append(&record(id, "s", "q", 0)).await.is_err());
    assert!(store.chat_logs().is_empty());

    store.set_fail_analytics(true);
    store.record(AnalyticsEvent::chat_message(&record(id, "s", "q", 0))).await;
    assert!(store.analytics_events().is_empty());
}

#[tokio::test]
async fn memory_store_assigns_ids_after_the_highest_existing_one() {
    let store = MemoryStore::new();
    let id = store.add_hotel(hotel("ids"));

    assert_eq!(store.add_faq(FaqEntry { id: 1, ..faq(id, "explicit one", 0) }), 1);
    assert_eq!(store.add_faq(FaqEntry { id: 5, ..faq(id, "explicit five", 1) }), 5);
    assert_eq!(store.add_faq(faq(id, "auto", 2)), 6);
    assert_eq!(store.add_faq(faq(id, "auto again", 3)), 7);

    let ids: Vec<_> = store.active_faqs(id, None).await.unwrap().iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![1, 5, 6, 7]);

    let first = store.add_chunks(id, "e", vec![("a".into(), vec![1.0])]);
    let second = store.add_chunks(id, "e", vec![("b".into(), vec![1.0])]);
    assert_ne!(first, second);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_get_distinct_ids() {
    let memory = std::sync::Arc::new(MemoryStore::new());
    let sqlite = std::sync::Arc::new(SqliteStore::open_in_memory().unwrap());

    let mut tasks = Vec::new();
    for n in 0..16 {
        let (memory, sqlite) = (memory.clone(), sqlite.clone());
        tasks.push(tokio::spawn(async move {
            let entry = record(1, "busy", &format!("question {n}"), 0);
            (memory.append(&entry).await.unwrap(), sqlite.append(&entry).await.unwrap())
        }));
    }
    let mut memory_ids = Vec::new();
    let mut sqlite_ids = Vec::new();
    for task in tasks {
        let (m, s) = task.await.unwrap();
        memory_ids.push(m);
        sqlite_ids.push(s);
    }
    memory_ids.sort_unstable();
    sqlite_ids.sort_unstable();
    assert_eq!(memory_ids, (1..=16).collect::<Vec<i64>>());
    assert_eq!(sqlite_ids, (1..=16).collect::<Vec<i64>>());
    assert_eq!(memory.history(1, "busy", 50).await.unwrap().len(), 16);
    assert_eq!(sqlite.history(1, "busy", 50).await.unwrap().len(), 16);
}
