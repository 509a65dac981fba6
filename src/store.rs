// 📡 Equipment Store - persistence plus full-snapshot change feed
// Subscribers receive the complete current record set after every mutation,
// never a diff. Single-threaded: notifications run in mutation order on the
// caller's thread.

use crate::db::{
    delete_equipo, get_all_equipos, insert_equipos, setup_database, update_equipo, Equipo,
};
use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

/// Handle returned by `subscribe`, used to drop the listener later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type SnapshotListener = Box<dyn FnMut(&[Equipo])>;

/// Owns the database connection and the subscriber list.
///
/// One store instance per screen/session; the subscriber list is explicit
/// instance state, never ambient. Each mutation re-reads the full record set
/// and pushes it to every subscriber in registration order.
pub struct EquipmentStore {
    conn: Connection,
    listeners: Vec<(SubscriptionId, SnapshotListener)>,
    next_subscription: u64,
}

impl EquipmentStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        setup_database(&conn)?;
        Ok(EquipmentStore {
            conn,
            listeners: Vec::new(),
            next_subscription: 0,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(EquipmentStore {
            conn,
            listeners: Vec::new(),
            next_subscription: 0,
        })
    }

    /// Register a snapshot listener. It immediately receives the current
    /// record set, then the full set again after every mutation.
    pub fn subscribe<F>(&mut self, listener: F) -> Result<SubscriptionId>
    where
        F: FnMut(&[Equipo]) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));

        let snapshot = get_all_equipos(&self.conn)?;
        if let Some((_, listener)) = self.listeners.iter_mut().find(|(lid, _)| *lid == id) {
            listener(&snapshot);
        }

        Ok(id)
    }

    /// Remove a listener; returns false if the id is unknown
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Current full record set
    pub fn snapshot(&self) -> Result<Vec<Equipo>> {
        get_all_equipos(&self.conn)
    }

    pub fn add(&mut self, equipo: Equipo) -> Result<usize> {
        let inserted = insert_equipos(&self.conn, std::slice::from_ref(&equipo))?;
        if inserted > 0 {
            self.notify_all()?;
        }
        Ok(inserted)
    }

    /// Bulk import (CSV path); duplicates are skipped, one notification at
    /// the end rather than per record. No notification if nothing landed.
    pub fn import(&mut self, equipos: &[Equipo]) -> Result<usize> {
        let inserted = insert_equipos(&self.conn, equipos)?;
        if inserted > 0 {
            self.notify_all()?;
        }
        Ok(inserted)
    }

    pub fn update(&mut self, equipo: &Equipo) -> Result<bool> {
        let changed = update_equipo(&self.conn, equipo)?;
        if changed {
            self.notify_all()?;
        }
        Ok(changed)
    }

    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let deleted = delete_equipo(&self.conn, id)?;
        if deleted {
            self.notify_all()?;
        }
        Ok(deleted)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn notify_all(&mut self) -> Result<()> {
        let snapshot = get_all_equipos(&self.conn)?;
        for (_, listener) in &mut self.listeners {
            listener(&snapshot);
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::CategoryAggregator;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sample(modelo: &str, serie: &str, categoria: &str) -> Equipo {
        Equipo::new(
            modelo.to_string(),
            "Equipo de oficina".to_string(),
            serie.to_string(),
            "Operativo".to_string(),
            categoria.to_string(),
            None,
        )
    }

    #[test]
    fn test_subscribe_receives_initial_snapshot() {
        let mut store = EquipmentStore::open_in_memory().unwrap();
        store.add(sample("MacBook Pro", "SN-001", "laptop")).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store
            .subscribe(move |equipos| {
                sink.borrow_mut().push(equipos.len());
            })
            .unwrap();

        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn test_mutations_push_full_snapshots() {
        let mut store = EquipmentStore::open_in_memory().unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store
            .subscribe(move |equipos| {
                sink.borrow_mut().push(equipos.len());
            })
            .unwrap();

        let equipo = sample("MacBook Pro", "SN-001", "laptop");
        let id = equipo.id.clone();
        store.add(equipo).unwrap();
        store.add(sample("Dell U2720Q", "SN-002", "monitor")).unwrap();
        store.remove(&id).unwrap();

        // initial empty snapshot, then one per mutation, each the full set
        assert_eq!(*seen.borrow(), vec![0, 1, 2, 1]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut store = EquipmentStore::open_in_memory().unwrap();

        let seen = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&seen);
        let id = store
            .subscribe(move |_| {
                *sink.borrow_mut() += 1;
            })
            .unwrap();

        store.add(sample("MacBook Pro", "SN-001", "laptop")).unwrap();
        assert!(store.unsubscribe(id));
        store.add(sample("Dell U2720Q", "SN-002", "monitor")).unwrap();

        assert_eq!(*seen.borrow(), 2); // initial + first add only
        assert!(!store.unsubscribe(id));
    }

    #[test]
    fn test_no_notification_when_nothing_changed() {
        let mut store = EquipmentStore::open_in_memory().unwrap();

        let seen = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&seen);
        store
            .subscribe(move |_| {
                *sink.borrow_mut() += 1;
            })
            .unwrap();

        assert!(!store.remove("no-such-id").unwrap());
        assert!(!store.update(&sample("X", "SN-404", "laptop")).unwrap());

        assert_eq!(*seen.borrow(), 1); // only the initial snapshot
    }

    #[test]
    fn test_no_notification_for_duplicate_inserts() {
        let mut store = EquipmentStore::open_in_memory().unwrap();
        store.add(sample("MacBook Pro", "SN-001", "laptop")).unwrap();

        let seen = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&seen);
        store
            .subscribe(move |_| {
                *sink.borrow_mut() += 1;
            })
            .unwrap();

        // same modelo + numero_serie, skipped by the idempotency hash
        assert_eq!(store.add(sample("MacBook Pro", "SN-001", "laptop")).unwrap(), 0);
        assert_eq!(
            store
                .import(&[sample("MacBook Pro", "SN-001", "laptop")])
                .unwrap(),
            0
        );

        assert_eq!(*seen.borrow(), 1); // only the initial snapshot
    }

    #[test]
    fn test_feed_drives_aggregator_recompute() {
        let mut store = EquipmentStore::open_in_memory().unwrap();

        let tallies = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&tallies);
        let aggregator = Rc::new(RefCell::new(CategoryAggregator::new()));
        let agg = Rc::clone(&aggregator);
        store
            .subscribe(move |equipos| {
                sink.borrow_mut().push(agg.borrow_mut().recompute(equipos));
            })
            .unwrap();

        store.add(sample("MacBook Pro", "SN-001", "laptop")).unwrap();
        store.add(sample("Dell U2720Q", "SN-002", "monitor")).unwrap();

        let tallies = tallies.borrow();
        let last = tallies.last().unwrap();
        assert_eq!(last.labels, vec!["laptop", "monitor"]);
        assert_eq!(last.counts, vec![1, 1]);
        // color assigned on first appearance survives later snapshots
        assert_eq!(last.color_for("laptop"), Some("#FF6384"));
    }
}
