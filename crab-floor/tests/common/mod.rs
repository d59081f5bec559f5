// crab-floor/tests/common/mod.rs
// Scripted in-memory backend for engine tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use crab_floor::{
    ClientError, ClientResult, DiningTable, FloorApi, FloorConfig, FloorFilter, FloorManager,
    Reservation, ReservationQuery, ReservationStatus, TableQuery, TableStatus,
};
use tokio::sync::oneshot;

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

pub fn table(id: i64, number: u32, status: TableStatus) -> DiningTable {
    DiningTable {
        id,
        number,
        capacity: 4,
        status,
    }
}

pub fn reservation(id: i64, code: &str, date: NaiveDate, time: &str) -> Reservation {
    Reservation {
        id,
        table_code: code.into(),
        date,
        time: Some(time.into()),
        party_size: 2,
        status: ReservationStatus::Pending,
    }
}

/// Tables 1..=3; table id 30 is number 3 ("M03")
pub fn floor_tables() -> Vec<DiningTable> {
    vec![
        table(10, 1, TableStatus::Available),
        table(20, 2, TableStatus::Cleaning),
        table(30, 3, TableStatus::Reserved),
    ]
}

#[derive(Default)]
pub struct FakeFloorApi {
    pub tables: Mutex<Vec<DiningTable>>,
    pub reservations: Mutex<Vec<Reservation>>,

    pub fail_fetch_tables: AtomicBool,
    pub fail_fetch_reservations: AtomicBool,
    pub fail_set_table_status: AtomicBool,
    pub fail_set_reservation_status: AtomicBool,

    pub table_fetches: AtomicUsize,
    pub reservation_fetches: AtomicUsize,
    pub table_queries: Mutex<Vec<TableQuery>>,
    pub reservation_queries: Mutex<Vec<ReservationQuery>>,
    pub table_updates: Mutex<Vec<(i64, TableStatus)>>,
    pub reservation_updates: Mutex<Vec<(i64, ReservationStatus)>>,

    /// When non-empty, each table fetch waits for the next scripted response
    pub scripted_tables: Mutex<VecDeque<oneshot::Receiver<Vec<DiningTable>>>>,
    /// When set, the next table status update waits for this signal
    pub hold_table_update: Mutex<Option<oneshot::Receiver<()>>>,
    /// Same for the next reservation status update
    pub hold_reservation_update: Mutex<Option<oneshot::Receiver<()>>>,
}

impl FakeFloorApi {
    pub fn new(tables: Vec<DiningTable>, reservations: Vec<Reservation>) -> Arc<Self> {
        let api = Self::default();
        *api.tables.lock().unwrap() = tables;
        *api.reservations.lock().unwrap() = reservations;
        Arc::new(api)
    }

    pub fn fail(&self, flag: &AtomicBool, on: bool) {
        flag.store(on, Ordering::SeqCst);
    }

    pub fn table_fetch_count(&self) -> usize {
        self.table_fetches.load(Ordering::SeqCst)
    }

    pub fn reservation_fetch_count(&self) -> usize {
        self.reservation_fetches.load(Ordering::SeqCst)
    }

    pub fn table_updates(&self) -> Vec<(i64, TableStatus)> {
        self.table_updates.lock().unwrap().clone()
    }

    pub fn reservation_updates(&self) -> Vec<(i64, ReservationStatus)> {
        self.reservation_updates.lock().unwrap().clone()
    }

    /// Queue a response the next table fetch will wait for
    pub fn script_table_fetch(&self) -> oneshot::Sender<Vec<DiningTable>> {
        let (tx, rx) = oneshot::channel();
        self.scripted_tables.lock().unwrap().push_back(rx);
        tx
    }

    /// Make the next table status update wait for the returned signal
    pub fn hold_next_update(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.hold_table_update.lock().unwrap() = Some(rx);
        tx
    }

    pub fn hold_next_reservation_update(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.hold_reservation_update.lock().unwrap() = Some(rx);
        tx
    }
}

#[async_trait]
impl FloorApi for FakeFloorApi {
    async fn fetch_tables(&self, query: TableQuery) -> ClientResult<Vec<DiningTable>> {
        self.table_fetches.fetch_add(1, Ordering::SeqCst);
        self.table_queries.lock().unwrap().push(query);

        let scripted = self.scripted_tables.lock().unwrap().pop_front();
        if let Some(rx) = scripted {
            return rx
                .await
                .map_err(|_| ClientError::Internal("script dropped".into()));
        }
        if self.fail_fetch_tables.load(Ordering::SeqCst) {
            return Err(ClientError::Internal("tables unavailable".into()));
        }
        Ok(self.tables.lock().unwrap().clone())
    }

    async fn fetch_reservations(&self, query: ReservationQuery) -> ClientResult<Vec<Reservation>> {
        self.reservation_fetches.fetch_add(1, Ordering::SeqCst);
        self.reservation_queries.lock().unwrap().push(query.clone());

        if self.fail_fetch_reservations.load(Ordering::SeqCst) {
            return Err(ClientError::Internal("reservations unavailable".into()));
        }
        let all = self.reservations.lock().unwrap().clone();
        Ok(all
            .into_iter()
            .filter(|r| query.status.is_none_or(|s| r.status == s))
            .collect())
    }

    async fn set_table_status(&self, table_id: i64, status: TableStatus) -> ClientResult<()> {
        self.table_updates.lock().unwrap().push((table_id, status));

        let hold = self.hold_table_update.lock().unwrap().take();
        if let Some(rx) = hold {
            let _ = rx.await;
        }
        if self.fail_set_table_status.load(Ordering::SeqCst) {
            return Err(ClientError::Validation("status rejected".into()));
        }
        let mut tables = self.tables.lock().unwrap();
        match tables.iter_mut().find(|t| t.id == table_id) {
            Some(table) => {
                table.status = status;
                Ok(())
            }
            None => Err(ClientError::NotFound(format!("table {}", table_id))),
        }
    }

    async fn set_reservation_status(
        &self,
        reservation_id: i64,
        status: ReservationStatus,
    ) -> ClientResult<()> {
        self.reservation_updates
            .lock()
            .unwrap()
            .push((reservation_id, status));

        let hold = self.hold_reservation_update.lock().unwrap().take();
        if let Some(rx) = hold {
            let _ = rx.await;
        }
        if self.fail_set_reservation_status.load(Ordering::SeqCst) {
            return Err(ClientError::Internal("backend down".into()));
        }
        let mut reservations = self.reservations.lock().unwrap();
        if let Some(r) = reservations.iter_mut().find(|r| r.id == reservation_id) {
            r.status = status;
        }
        Ok(())
    }
}

pub fn floor_manager(api: &Arc<FakeFloorApi>, filter: FloorFilter) -> FloorManager {
    let config = FloorConfig::default().with_refresh_interval(Duration::from_secs(30));
    FloorManager::with_filter(api.clone(), &config, filter)
}

/// Yield until `cond` holds (bounded)
pub async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
