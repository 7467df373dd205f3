//! Read-only views recomputed from a source store.

use lunch_shared::{Boost, Place, Roll, Room};
use tokio::sync::watch;

/// Spawn a task that recomputes `view` from `source` on every change.
///
/// The task ends once the source store is gone or every receiver of the
/// derived store has been dropped.
pub fn derive<S, T, F>(mut source: watch::Receiver<S>, view: F) -> watch::Receiver<T>
where
    S: Send + Sync + 'static,
    T: Send + Sync + 'static,
    F: Fn(&S) -> T + Send + 'static,
{
    let initial = view(&source.borrow_and_update());
    let (tx, rx) = watch::channel(initial);

    tokio::spawn(async move {
        while source.changed().await.is_ok() {
            let next = view(&source.borrow_and_update());
            if tx.send(next).is_err() {
                break;
            }
        }
    });

    rx
}

/// Highest chance first; equal chances by name.
pub fn places_by_chance(places: &Vec<Place>) -> Vec<Place> {
    let mut sorted = places.clone();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted.sort_by(|a, b| b.chance.total_cmp(&a.chance));
    sorted
}

pub fn rolls_newest_first(rolls: &Vec<Roll>) -> Vec<Roll> {
    let mut sorted = rolls.clone();
    sorted.sort_by(|a, b| b.time.cmp(&a.time));
    sorted
}

pub fn boosts_newest_first(boosts: &Vec<Boost>) -> Vec<Boost> {
    let mut sorted = boosts.clone();
    sorted.sort_by(|a, b| b.time.cmp(&a.time));
    sorted
}

pub fn rooms_oldest_first(rooms: &Vec<Room>) -> Vec<Room> {
    let mut sorted = rooms.clone();
    sorted.sort_by(|a, b| a.time.cmp(&b.time));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::Store;
    use chrono::{DateTime, TimeZone, Utc};
    use lunch_shared::User;

    fn place(id: &str, name: &str, chance: f64) -> Place {
        Place {
            id: id.into(),
            name: name.into(),
            time: Utc.timestamp_opt(0, 0).unwrap(),
            chance,
            user_id: None,
            user: None,
        }
    }

    #[test]
    fn places_sort_by_chance_then_name() {
        let places = vec![
            place("1", "Tacos", 1.0),
            place("2", "Burgers", 3.0),
            place("3", "Pho", 1.0),
            place("4", "Curry", 3.0),
            place("5", "Alpha", 0.5),
        ];

        let names: Vec<_> = places_by_chance(&places).into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Burgers", "Curry", "Pho", "Tacos", "Alpha"]);
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn roll(place_id: &str, secs: i64) -> Roll {
        Roll {
            place_id: place_id.into(),
            user_id: "u1".into(),
            time: at(secs),
            user: None,
            place: None,
        }
    }

    fn boost(place_id: &str, secs: i64) -> Boost {
        Boost {
            time: at(secs),
            user_id: "u1".into(),
            place_id: place_id.into(),
            user: None,
            place: None,
        }
    }

    fn room(id: &str, secs: i64) -> Room {
        Room {
            id: id.into(),
            name: id.into(),
            time: at(secs),
            user: User {
                id: "u1".into(),
                name: "ann".into(),
            },
            members: Vec::new(),
        }
    }

    #[test]
    fn rolls_newest_first_keeps_ties_in_arrival_order() {
        let rolls = vec![roll("a", 10), roll("b", 30), roll("c", 20), roll("d", 30)];

        let order: Vec<_> = rolls_newest_first(&rolls).into_iter().map(|r| r.place_id).collect();
        assert_eq!(order, vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn boosts_newest_first_keeps_ties_in_arrival_order() {
        let boosts = vec![boost("a", 5), boost("b", 50), boost("c", 5), boost("d", 7)];

        let order: Vec<_> = boosts_newest_first(&boosts).into_iter().map(|b| b.place_id).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn rooms_oldest_first_keeps_ties_in_arrival_order() {
        let rooms = vec![room("late", 90), room("early", 10), room("mid", 40), room("early-too", 10)];

        let order: Vec<_> = rooms_oldest_first(&rooms).into_iter().map(|r| r.id).collect();
        assert_eq!(order, vec!["early", "early-too", "mid", "late"]);
    }

    #[test]
    fn views_of_an_empty_store_are_empty() {
        assert!(rolls_newest_first(&Vec::new()).is_empty());
        assert!(boosts_newest_first(&Vec::new()).is_empty());
        assert!(rooms_oldest_first(&Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn derived_store_follows_source() {
        let store = Store::new();
        store.merge(vec![place("1", "Tacos", 1.0)]);

        let mut sorted = derive(store.subscribe(), places_by_chance);
        assert_eq!(sorted.borrow_and_update().len(), 1);

        store.merge(vec![place("2", "Pho", 5.0)]);
        sorted.changed().await.unwrap();

        let names: Vec<_> = sorted.borrow_and_update().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["Pho", "Tacos"]);
    }

    #[tokio::test]
    async fn derived_store_closes_with_source() {
        let store: Store<Place> = Store::new();
        let mut sorted = derive(store.subscribe(), places_by_chance);

        drop(store);

        assert!(sorted.changed().await.is_err());
    }
}
