#![no_main]

use std::collections::BTreeMap;

use libfuzzer_sys::fuzz_target;
use rucks_cursor::{DB, DBOptions, ForwardCursor, KeyRange, ReadOptions, Slice, WriteOptions};

// Interleaves writes, compactions and cursor operations, checking every open
// cursor against the model captured when it was created.
fuzz_target!(|data: &[u8]| {
    let db = match DB::open(DBOptions::default()) {
        Ok(db) => db,
        Err(_) => return,
    };
    let write_opts = WriteOptions::default();

    let mut model: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
    // (cursor, expected remaining pairs)
    let mut cursors: Vec<(_, std::vec::IntoIter<(Vec<u8>, Vec<u8>)>)> = Vec::new();

    let mut i = 0;
    while i + 2 < data.len() {
        let op = data[i] % 6;
        let key = vec![data[i + 1] % 16];
        let arg = data[i + 2];
        i += 3;

        match op {
            0 => {
                db.put(&write_opts, Slice::from(key.as_slice()), Slice::from(vec![arg]))
                    .unwrap();
                model.insert(key, vec![arg]);
            },
            1 => {
                db.delete(&write_opts, Slice::from(key.as_slice())).unwrap();
                model.remove(&key);
            },
            2 => {
                if cursors.len() < 8 {
                    let start = key[0];
                    let end = start.saturating_add(arg % 16);
                    let cursor = db
                        .cursor(&ReadOptions::default(), KeyRange::new([start], [end]))
                        .unwrap();
                    let expected: Vec<_> = model
                        .range(vec![start]..vec![end])
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    cursors.push((cursor, expected.into_iter()));
                }
            },
            3 => {
                if !cursors.is_empty() {
                    let idx = arg as usize % cursors.len();
                    let (cursor, expected) = &mut cursors[idx];
                    let got = cursor.next().map(|(k, v)| (k.to_vec(), v.to_vec()));
                    assert_eq!(got, expected.next());
                    assert!(cursor.status().is_ok());
                }
            },
            4 => {
                if !cursors.is_empty() {
                    let idx = arg as usize % cursors.len();
                    let (mut cursor, _) = cursors.swap_remove(idx);
                    cursor.close().unwrap();
                    cursor.close().unwrap();
                }
            },
            _ => {
                db.compact().unwrap();
            },
        }
    }

    let open = cursors.len();
    assert_eq!(db.live_views(), open);
    drop(cursors);
    assert_eq!(db.live_views(), 0);
});
