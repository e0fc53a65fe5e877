//! Generic round-trip suite runnable against any `Client`.
//!
//! Backend tests and the coordinator tests all exercise the same contract:
//! put n random payloads, list them back, get each one and verify its
//! digest. Panics on contract violations, so callers just await the helper
//! inside a test.

use std::sync::Arc;

use rand::{Rng, RngCore};

use umbra_core::{Client, Digest};

fn random_payload(max_len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let len = rng.gen_range(1..=max_len);
    let mut payload = vec![0u8; len];
    rng.fill_bytes(&mut payload);
    payload
}

/// Puts `n` random file records, then lists and gets them all back.
pub async fn file_round_trip(client: &dyn Client, n: usize) {
    let mut stored = Vec::with_capacity(n);
    for _ in 0..n {
        let payload = random_payload(256);
        let digest = Digest::of(&payload);
        client
            .put_file(&digest, payload.clone())
            .await
            .unwrap_or_else(|e| panic!("put_file({}) failed: {}", digest, e));
        stored.push((digest, payload));
    }

    let listed = client.list_files().await.expect("list_files failed");
    for (digest, payload) in &stored {
        assert!(
            listed.contains(digest),
            "list_files missing stored digest {}",
            digest
        );
        let fetched = client
            .get_file(digest)
            .await
            .unwrap_or_else(|e| panic!("get_file({}) failed: {}", digest, e));
        assert_eq!(&fetched, payload, "get_file({}) returned wrong bytes", digest);
    }
}

/// Puts `n` random chunks, then lists and gets them all back.
pub async fn chunk_round_trip(client: &dyn Client, n: usize) {
    let mut stored = Vec::with_capacity(n);
    for _ in 0..n {
        let payload = random_payload(256);
        let digest = Digest::of(&payload);
        client
            .put_chunk(&digest, payload.clone(), None)
            .await
            .unwrap_or_else(|e| panic!("put_chunk({}) failed: {}", digest, e));
        stored.push((digest, payload));
    }

    let listed = client.list_chunks().await.expect("list_chunks failed");
    for (digest, payload) in &stored {
        assert!(
            listed.contains(digest),
            "list_chunks missing stored digest {}",
            digest
        );
        let fetched = client
            .get_chunk(digest, None)
            .await
            .unwrap_or_else(|e| panic!("get_chunk({}) failed: {}", digest, e));
        assert_eq!(&fetched, payload, "get_chunk({}) returned wrong bytes", digest);
    }
}

/// Runs `n` concurrent put-then-get chunk round trips.
///
/// Two racing puts of the same (digest, payload) pair must both succeed;
/// content addressing makes duplicate writes harmless.
pub async fn parallel_chunk_round_trip(client: Arc<dyn Client>, n: usize) {
    let mut handles = Vec::with_capacity(n);
    for _ in 0..n {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let payload = random_payload(256);
            let digest = Digest::of(&payload);
            client.put_chunk(&digest, payload.clone(), None).await?;
            // Put the same pair again: idempotence under race.
            client.put_chunk(&digest, payload.clone(), None).await?;
            let fetched = client.get_chunk(&digest, None).await?;
            assert_eq!(fetched, payload);
            umbra_core::DriveResult::Ok(())
        }));
    }
    for handle in handles {
        handle.await.expect("task panicked").expect("round trip failed");
    }
}
