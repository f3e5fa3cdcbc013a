//! # Seek Pagination
//!
//! Pages are located by position, not offset. A `next` cursor returns the
//! items strictly after its position; a `prev` cursor returns the page that
//! ends strictly before its position. Inserting or deleting other rows
//! between requests therefore never shifts an item into two pages.
//!
//! When deletes leave a `next` window empty, its `previous` cursor uses the
//! `through` direction so the page that ends at the cursor item is shown.

use crate::cursor::{Cursor, CursorDirection};
use crate::note::Note;
use crate::ordering::{Ordering, Position};

/// One page of a list result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Notes on this page, in display order.
    pub results: Vec<Note>,
    /// Cursor to the following page, `None` at the end.
    pub next: Option<Cursor>,
    /// Cursor to the preceding page, `None` at the start.
    pub previous: Option<Cursor>,
}

/// Order `notes` and cut the page addressed by `cursor`.
///
/// `cursor` must already have been checked against `ordering`
/// (see [`Cursor::decode`]). A `page_size` of zero is treated as one.
pub fn paginate(
    mut notes: Vec<Note>,
    ordering: Ordering,
    cursor: Option<&Cursor>,
    page_size: usize,
) -> Page {
    let size = page_size.max(1);
    ordering.sort(&mut notes);
    let position = |n: &Note| Position::of(n, ordering.field);

    let (begin, end, previous_anchor) = match cursor {
        None => (0, size.min(notes.len()), None),
        Some(c) => match c.direction {
            CursorDirection::Next => {
                let start = notes.partition_point(|n| {
                    ordering.compare(&position(n), &c.position) != std::cmp::Ordering::Greater
                });
                let end = (start + size).min(notes.len());
                // An exhausted window pages back through the cursor item itself.
                let anchor = match notes.get(start) {
                    Some(first) => (CursorDirection::Prev, position(first)),
                    None => (CursorDirection::Through, c.position.clone()),
                };
                (start, end, Some(anchor))
            }
            CursorDirection::Prev | CursorDirection::Through => {
                let inclusive = c.direction == CursorDirection::Through;
                let end = notes.partition_point(|n| {
                    match ordering.compare(&position(n), &c.position) {
                        std::cmp::Ordering::Less => true,
                        std::cmp::Ordering::Equal => inclusive,
                        std::cmp::Ordering::Greater => false,
                    }
                });
                if end <= size {
                    (0, size.min(notes.len()), None)
                } else {
                    let begin = end - size;
                    let anchor = (CursorDirection::Prev, position(&notes[begin]));
                    (begin, end, Some(anchor))
                }
            }
        },
    };

    let previous = if begin > 0 {
        previous_anchor.map(|(direction, position)| Cursor {
            ordering,
            direction,
            position,
        })
    } else {
        None
    };

    let next = if end < notes.len() && end > begin {
        Some(Cursor {
            ordering,
            direction: CursorDirection::Next,
            position: position(&notes[end - 1]),
        })
    } else {
        None
    };

    notes.truncate(end);
    let results = notes.split_off(begin);

    Page {
        results,
        next,
        previous,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::identity::{NoteId, Principal};
    use crate::ordering::OrderField;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    /// Narrow value ranges so ties on the primary key are common.
    fn note_for(owner: &Principal, (title, created, extra): (u8, i64, i64)) -> Note {
        let base: DateTime<Utc> = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let created_at = base + Duration::microseconds(created);
        Note::from_parts(
            NoteId::new(),
            format!("title {title}"),
            String::new(),
            owner.clone(),
            created_at,
            created_at + Duration::microseconds(extra),
        )
        .unwrap()
    }

    fn row() -> impl Strategy<Value = (u8, i64, i64)> {
        (0u8..3, 0i64..5, 0i64..5)
    }

    fn ordering_strategy() -> impl Strategy<Value = Ordering> {
        (0usize..3, any::<bool>()).prop_map(|(i, descending)| Ordering {
            field: OrderField::ALL[i],
            descending,
        })
    }

    fn owned_by<'a>(store: &'a [Note], owner: &'a Principal) -> Vec<Note> {
        store.iter().filter(|n| n.is_owned_by(owner)).cloned().collect()
    }

    proptest! {
        /// Walking `next` cursors visits every owned note exactly once, in
        /// sorted order, even while another principal keeps inserting.
        #[test]
        fn forward_walk_covers_sequence_once(
            rows in prop::collection::vec(row(), 0..40),
            foreign in prop::collection::vec(row(), 0..20),
            ordering in ordering_strategy(),
            size in 1usize..7,
        ) {
            let alice = Principal::new("alice").unwrap();
            let bob = Principal::new("bob").unwrap();
            let mut store: Vec<Note> = rows.into_iter().map(|r| note_for(&alice, r)).collect();

            let mut expected = owned_by(&store, &alice);
            ordering.sort(&mut expected);

            let mut foreign = foreign.into_iter();
            let mut seen = Vec::new();
            let mut cursor: Option<Cursor> = None;
            loop {
                let page = paginate(owned_by(&store, &alice), ordering, cursor.as_ref(), size);
                prop_assert!(page.results.len() <= size);
                seen.extend(page.results);
                if let Some(r) = foreign.next() {
                    store.push(note_for(&bob, r));
                }
                match page.next {
                    Some(next) => cursor = Some(next),
                    None => break,
                }
            }

            let seen_ids: Vec<NoteId> = seen.iter().map(Note::id).collect();
            let expected_ids: Vec<NoteId> = expected.iter().map(Note::id).collect();
            prop_assert_eq!(seen_ids, expected_ids);
        }

        /// Walking `previous` cursors back from the last page reproduces
        /// the same pages in reverse.
        #[test]
        fn backward_walk_mirrors_forward_walk(
            rows in prop::collection::vec(row(), 0..40),
            ordering in ordering_strategy(),
            size in 1usize..7,
        ) {
            let alice = Principal::new("alice").unwrap();
            let store: Vec<Note> = rows.into_iter().map(|r| note_for(&alice, r)).collect();

            let mut forward = Vec::new();
            let mut page = paginate(store.clone(), ordering, None, size);
            loop {
                let next = page.next.clone();
                forward.push(page.clone());
                match next {
                    Some(c) => page = paginate(store.clone(), ordering, Some(&c), size),
                    None => break,
                }
            }

            let mut backward = vec![page.clone()];
            while let Some(prev) = page.previous.clone() {
                page = paginate(store.clone(), ordering, Some(&prev), size);
                backward.push(page.clone());
            }
            backward.reverse();

            let ids = |pages: &[Page]| -> Vec<Vec<NoteId>> {
                pages.iter().map(|p| p.results.iter().map(Note::id).collect()).collect()
            };
            prop_assert_eq!(ids(&backward), ids(&forward));
        }
    }
}
