use std::{
    sync::{
        Arc, Barrier,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use rucks_cursor::{DB, DBOptions, ForwardCursor, KeyRange, ReadOptions, Slice, WriteOptions};

fn key(i: usize) -> String {
    format!("key{i:05}")
}

#[test]
fn test_scans_see_a_stable_view_under_writes() {
    let db = Arc::new(DB::open(DBOptions::default()).unwrap());
    let num_keys = 500;
    for i in 0..num_keys {
        db.put(
            &WriteOptions::default(),
            Slice::from(key(i)),
            Slice::from("v0"),
        )
        .unwrap();
    }

    let num_readers = 4;
    let num_writers = 2;
    let barrier = Arc::new(Barrier::new(num_readers + num_writers));
    let stop = Arc::new(AtomicBool::new(false));
    let mut handles = Vec::new();

    for w in 0..num_writers {
        let db = Arc::clone(&db);
        let barrier = Arc::clone(&barrier);
        let stop = Arc::clone(&stop);
        handles.push(thread::spawn(move || {
            barrier.wait();
            let mut round = 0usize;
            while !stop.load(Ordering::Relaxed) {
                let i = (round * 7 + w) % num_keys;
                db.put(
                    &WriteOptions::default(),
                    Slice::from(key(i)),
                    Slice::from(format!("v{round}")),
                )
                .unwrap();
                if round % 50 == 0 {
                    db.compact().unwrap();
                }
                round += 1;
            }
        }));
    }

    let mut readers = Vec::new();
    for _ in 0..num_readers {
        let db = Arc::clone(&db);
        let barrier = Arc::clone(&barrier);
        readers.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..20 {
                let snapshot = db.get_snapshot().unwrap();
                let mut cursor = db
                    .cursor(&ReadOptions::at(&snapshot), KeyRange::all())
                    .unwrap();

                let mut count = 0;
                let mut prev: Option<Slice> = None;
                while let Some((k, v)) = cursor.next() {
                    if let Some(p) = &prev {
                        assert!(p < &k, "keys must be strictly ascending");
                    }
                    let point = db
                        .get(&ReadOptions::at(&snapshot), &k)
                        .unwrap()
                        .unwrap();
                    assert_eq!(point, v, "cursor and point read disagree");
                    prev = Some(k);
                    count += 1;
                }
                assert!(cursor.status().is_ok());
                cursor.close().unwrap();
                assert_eq!(count, num_keys);
            }
        }));
    }

    for reader in readers {
        reader.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(db.live_views(), 0);
    assert_eq!(db.statistics().cursors_outstanding(), 0);
    assert_eq!(db.statistics().cursors_opened(), (num_readers * 20) as u64);
}

#[test]
fn test_close_while_scanning() {
    let db = Arc::new(DB::open(DBOptions::default()).unwrap());
    for i in 0..1000 {
        db.put(
            &WriteOptions::default(),
            Slice::from(key(i)),
            Slice::from("v"),
        )
        .unwrap();
    }

    let mut cursor = db
        .cursor(&ReadOptions::default(), KeyRange::all())
        .unwrap();
    for _ in 0..10 {
        assert!(cursor.next().is_some());
    }

    let closer = {
        let db = Arc::clone(&db);
        thread::spawn(move || db.close().unwrap())
    };
    closer.join().unwrap();

    let mut rest = 0;
    while cursor.next().is_some() {
        rest += 1;
    }
    assert_eq!(rest, 0);
    assert!(cursor.status().unwrap_err().is_view_invalidated());
    assert!(cursor.close().unwrap_err().is_release_failed());
    assert_eq!(db.statistics().release_failures(), 1);
}
