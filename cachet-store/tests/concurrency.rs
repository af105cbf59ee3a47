//! Concurrent access properties: many users on one store, and many workers
//! of one user, must not interfere.

use cachet_store::{digest_public_key, Database, RevValue};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const THREADS: usize = 8;
const REPEAT: usize = 10;

/// The fixed index/revision/value triples each worker cycles through.
fn test_cases() -> Vec<(Vec<u8>, Vec<u8>, Vec<u8>)> {
    vec![
        (b"index-a".to_vec(), vec![0x01], b"value one".to_vec()),
        (b"index-b".to_vec(), vec![0x02], b"value two".to_vec()),
        (b"index-c".to_vec(), vec![0x03], vec![]),
        (vec![0x00, 0x2F, 0xFF], vec![0x04], b"binary index".to_vec()),
    ]
}

#[test]
fn multi_user_register_work_unregister() {
    let dir = TempDir::new().unwrap();
    let db = Database::instance(dir.path()).unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                let public_key = format!("worker-{worker}-key").into_bytes();
                let hash = digest_public_key(&public_key);

                for iteration in 0..REPEAT {
                    assert!(db.add_user(&public_key, &hash), "not registered: {iteration}");
                    let user = db.get_user(&hash).unwrap();

                    for (index, revision, value) in test_cases() {
                        assert!(db.put_record(&user, &index, &revision, &value));
                        assert_eq!(
                            db.get_revision(&user, &index, &revision).unwrap().unwrap(),
                            RevValue { revision: revision.clone(), value: value.clone() }
                        );
                        assert!(db.delete_record(&user, &index));
                        assert_eq!(db.get_record(&user, &index).unwrap(), None);
                    }

                    assert!(db.delete_user(&user), "not unregistered: {iteration}");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread failed");
    }
}

#[test]
fn single_user_many_workers_disjoint_indices() {
    let dir = TempDir::new().unwrap();
    let db = Database::instance(dir.path()).unwrap();

    let public_key = b"shared-user-key".to_vec();
    let hash = digest_public_key(&public_key);
    assert!(db.add_user(&public_key, &hash));
    let user = db.get_user(&hash).unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let db = Arc::clone(&db);
            let user = user.clone();
            thread::spawn(move || {
                for iteration in 0..REPEAT {
                    // Worker-tagged random index keeps the key sets disjoint
                    let tail: [u8; 8] = rand::random();
                    let mut index = vec![worker as u8, iteration as u8];
                    index.extend_from_slice(&tail);

                    let revision = vec![0x01];
                    let value = format!("payload {worker}/{iteration}").into_bytes();

                    assert!(db.put_record(&user, &index, &revision, &value));
                    assert_eq!(
                        db.get_revision(&user, &index, &revision).unwrap().unwrap().value,
                        value
                    );
                    assert!(db.delete_record(&user, &index));
                    assert_eq!(db.get_record(&user, &index).unwrap(), None);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread failed");
    }

    assert!(db.get_indices(&user).unwrap().is_empty());
    assert!(db.delete_user(&user));
}

#[test]
fn concurrent_users_observe_only_their_own_data() {
    let dir = TempDir::new().unwrap();
    let db = Database::instance(dir.path()).unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                let public_key = format!("observer-{worker}").into_bytes();
                let hash = digest_public_key(&public_key);
                assert!(db.add_user(&public_key, &hash));
                let user = db.get_user(&hash).unwrap();

                // Everyone writes to the same index name
                let marker = vec![worker as u8];
                assert!(db.put_record(&user, b"common", &[0x01], &marker));

                let record = db.get_record(&user, b"common").unwrap().unwrap();
                assert_eq!(record, vec![RevValue { revision: vec![0x01], value: marker }]);
                assert_eq!(db.get_indices(&user).unwrap(), vec![b"common".to_vec()]);
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread failed");
    }
}
