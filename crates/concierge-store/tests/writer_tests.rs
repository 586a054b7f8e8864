use std::sync::Arc;

use concierge_core::data_processor::{ChunkingConfig, DataProcessor, SourceDocument};
use concierge_core::traits::VectorStore;
use concierge_core::types::HotelProfile;
use concierge_embed::HashingEmbedder;
use concierge_store::{DocumentIndexer, IndexOutcome, MemoryStore, SqliteStore};

#[tokio::test]
async fn reindexing_identical_text_is_skipped() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let hotel_id = store
        .insert_hotel(&HotelProfile { name: "Lakeside".into(), slug: "lakeside".into(), is_active: true, ..Default::default() })
        .await
        .unwrap();
    let indexer = DocumentIndexer::new(store.clone(), Arc::new(HashingEmbedder::new(64)), DataProcessor::new());

    let first = indexer.index_text(hotel_id, "spa.txt", "The spa opens at 9.  Book at reception.").await.unwrap();
    let IndexOutcome::Indexed { document_id, chunks } = first else { panic!("expected a fresh index, got {first:?}") };
    assert_eq!(chunks, 1);

    // whitespace differences normalize to the same content
    let again = indexer.index_text(hotel_id, "spa.txt", "The spa opens at 9. Book at reception.\n").await.unwrap();
    assert_eq!(again, IndexOutcome::Unchanged { document_id });

    let stored = store.hotel_chunks(hotel_id, "hashing:xxh64:d64", 10).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].embedding.len(), 64);
}

#[tokio::test]
async fn switching_embedders_reindexes_without_mixing_vectors() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let hotel_id = store
        .insert_hotel(&HotelProfile { name: "Dunes".into(), slug: "dunes".into(), is_active: true, ..Default::default() })
        .await
        .unwrap();
    let text = "Beach towels are at the pool desk.";

    let old = DocumentIndexer::new(store.clone(), Arc::new(HashingEmbedder::new(32)), DataProcessor::new());
    let new = DocumentIndexer::new(store.clone(), Arc::new(HashingEmbedder::new(64)), DataProcessor::new());
    assert!(matches!(old.index_text(hotel_id, "towels.txt", text).await.unwrap(), IndexOutcome::Indexed { .. }));
    assert!(matches!(new.index_text(hotel_id, "towels.txt", text).await.unwrap(), IndexOutcome::Indexed { .. }));

    let current = store.hotel_chunks(hotel_id, "hashing:xxh64:d64", 10).await.unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].embedding.len(), 64);
    assert_eq!(store.hotel_chunks(hotel_id, "hashing:xxh64:d32", 10).await.unwrap()[0].embedding.len(), 32);
}

#[tokio::test]
async fn long_documents_are_split_into_several_chunks() {
    let store = Arc::new(MemoryStore::new());
    let processor = DataProcessor::with_config(ChunkingConfig { max_tokens: 5 });
    let indexer = DocumentIndexer::new(store.clone(), Arc::new(HashingEmbedder::new(16)), processor);

    let docs = vec![SourceDocument {
        name: "rules.txt".into(),
        path: "rules.txt".into(),
        content: "Quiet hours start at ten. Pets are welcome. Smoking is not allowed.".into(),
    }];
    let outcomes = indexer.index_documents(1, &docs).await.unwrap();
    let IndexOutcome::Indexed { chunks, .. } = outcomes[0] else { panic!("expected indexed outcome") };
    assert_eq!(chunks, 3);
    assert_eq!(store.hotel_chunks(1, "hashing:xxh64:d16", 10).await.unwrap().len(), 3);
}

#[tokio::test]
async fn blank_documents_are_rejected() {
    let store = Arc::new(MemoryStore::new());
    let indexer = DocumentIndexer::new(store, Arc::new(HashingEmbedder::new(8)), DataProcessor::new());
    let err = indexer.index_text(1, "empty.txt", " \n\t ").await.unwrap_err();
    assert!(err.to_string().contains("No text content"));
}
